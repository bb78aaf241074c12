//! Encoding of drawing operations into sketch byte code.
//!
//! # Loading values
//!
//! Values wider than an operand (colour words, absolute coordinates) are
//! split into six 6-bit groups, most significant first, and loaded with one
//! `DATA` instruction per group. Leading all-zero groups are dropped, down
//! to a single group for zero:
//!
//! | Value range | `DATA` bytes |
//! |-------------|--------------|
//! | 0 - 63 | 1 |
//! | 64 - 4,095 | 2 |
//! | 4,096 - 262,143 | 3 |
//! | 262,144 - 16,777,215 | 4 |
//! | 16,777,216 - 1,073,741,823 | 5 |
//! | 1,073,741,824+ | 6 |
//!
//! A `TOOL` instruction naming `COLOUR`, `TARGETX` or `TARGETY` then
//! commits the accumulated value.
//!
//! # Rectangles
//!
//! A [`Rectangle`] becomes: tool `NONE`, commit colour, commit `x1`/`y1`,
//! `DY 0` (moves without drawing), commit `x2`/`y2`, tool `BLOCK`, `DY 0`
//! (draws the block and moves).

use crate::{
    decompose::Rectangle,
    isa::{Instruction, OPERAND_BITS, OPERAND_MASK, Tool},
};

/// Maximum number of `DATA` loads needed for a 32-bit value.
pub const MAX_LOAD: usize = 6;

/// Encoded size of a black rectangle whose coordinates each fit in one group.
const SHORT_RECTANGLE_LEN: usize = 15;

/// Expand a grey level to the packed RGBA word the interpreter expects.
pub const fn grey_to_rgba(grey: u8) -> u32 {
    u32::from_be_bytes([grey, grey, grey, 0xFF])
}

/// Grey level held in the top byte of an RGBA word.
pub const fn rgba_to_grey(rgba: u32) -> u8 {
    (rgba >> 24) as u8
}

/// The 6-bit groups loading `value`, most significant first, with leading
/// zero groups trimmed.
pub fn data_groups(value: u32) -> impl Iterator<Item = u8> {
    let significant_bits = u32::BITS - value.leading_zeros();
    let groups = significant_bits.div_ceil(OPERAND_BITS).max(1);

    (0..groups)
        .rev()
        .map(move |group| ((value >> (group * OPERAND_BITS)) as u8) & OPERAND_MASK)
}

/// An appendable sketch program. Insertion order is execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.bytes.push(instruction.encode());
        self
    }

    /// Relative horizontal move of the target position.
    pub fn dx(&mut self, delta: i8) -> &mut Self {
        self.push(Instruction::Dx(delta))
    }

    /// Relative vertical move, drawing with the current tool.
    pub fn dy(&mut self, delta: i8) -> &mut Self {
        self.push(Instruction::Dy(delta))
    }

    pub fn tool(&mut self, tool: Tool) -> &mut Self {
        self.push(Instruction::Tool(tool))
    }

    /// Shift `value` into the accumulator.
    pub fn load(&mut self, value: u32) -> &mut Self {
        self.bytes
            .extend(data_groups(value).map(|group| Instruction::Data(group).encode()));
        self
    }

    /// Load `value` and commit it with `target`.
    pub fn commit(&mut self, target: Tool, value: u32) -> &mut Self {
        self.load(value).tool(target)
    }

    pub fn rectangle(&mut self, rect: &Rectangle) -> &mut Self {
        self.tool(Tool::None)
            .commit(Tool::Colour, grey_to_rgba(rect.colour))
            .commit(Tool::TargetX, rect.x1)
            .commit(Tool::TargetY, rect.y1)
            .dy(0)
            .commit(Tool::TargetX, rect.x2)
            .commit(Tool::TargetY, rect.y2)
            .tool(Tool::Block)
            .dy(0)
    }

    pub fn show(&mut self) -> &mut Self {
        self.tool(Tool::Show)
    }

    pub fn pause(&mut self, millis: u32) -> &mut Self {
        self.load(millis).tool(Tool::Pause)
    }

    pub fn next_frame(&mut self) -> &mut Self {
        self.tool(Tool::NextFrame)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn instructions(&self) -> impl Iterator<Item = Instruction> + '_ {
        self.bytes.iter().copied().map(Instruction::decode)
    }
}

impl From<Vec<u8>> for Program {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for Program {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Extend<Rectangle> for Program {
    fn extend<T: IntoIterator<Item = Rectangle>>(&mut self, iter: T) {
        for rect in iter {
            self.rectangle(&rect);
        }
    }
}

/// Encode rectangles in order.
pub fn encode(rects: &[Rectangle]) -> Program {
    let mut program = Program::with_capacity(rects.len() * SHORT_RECTANGLE_LEN);
    program.extend(rects.iter().copied());
    program
}
