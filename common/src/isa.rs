//! Instruction set of the sketch byte code.
//!
//! Every instruction is exactly one byte:
//!
//! ```text
//! 7 6 5 4 3 2 1 0
//! O O N N N N N N
//!   O = opcode (Dx, Dy, Tool, Data)
//!   N = operand
//! ```
//!
//! `Dx`/`Dy` operands are signed two's-complement values in `-32..=31`,
//! `Tool` operands select a [`Tool`] and `Data` operands are raw 6-bit
//! fragments shifted into the accumulator.

use std::fmt;

/// Number of operand bits in an instruction byte.
pub const OPERAND_BITS: u32 = 6;

/// Mask selecting the operand bits of an instruction byte.
pub const OPERAND_MASK: u8 = 0x3F;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Dx = 0,
    Dy = 1,
    Tool = 2,
    Data = 3,
}

impl Opcode {
    /// Opcode stored in the top two bits of `byte`.
    pub const fn of(byte: u8) -> Self {
        match byte >> OPERAND_BITS {
            0 => Self::Dx,
            1 => Self::Dy,
            2 => Self::Tool,
            _ => Self::Data,
        }
    }
}

/// Drawing modes and directives selected by a `Tool` instruction.
///
/// Codes `0..=8` are named, `9` is reserved. Any other code is kept as
/// [`Tool::Custom`] and simply becomes the current drawing mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    #[default]
    None,
    Line,
    Block,
    Colour,
    TargetX,
    TargetY,
    Show,
    Pause,
    NextFrame,
    Custom(u8),
}

impl Tool {
    pub const fn from_code(code: u8) -> Self {
        match code & OPERAND_MASK {
            0 => Self::None,
            1 => Self::Line,
            2 => Self::Block,
            3 => Self::Colour,
            4 => Self::TargetX,
            5 => Self::TargetY,
            6 => Self::Show,
            7 => Self::Pause,
            8 => Self::NextFrame,
            other => Self::Custom(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Line => 1,
            Self::Block => 2,
            Self::Colour => 3,
            Self::TargetX => 4,
            Self::TargetY => 5,
            Self::Show => 6,
            Self::Pause => 7,
            Self::NextFrame => 8,
            Self::Custom(code) => code & OPERAND_MASK,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Line => f.write_str("line"),
            Self::Block => f.write_str("block"),
            Self::Colour => f.write_str("colour"),
            Self::TargetX => f.write_str("targetx"),
            Self::TargetY => f.write_str("targety"),
            Self::Show => f.write_str("show"),
            Self::Pause => f.write_str("pause"),
            Self::NextFrame => f.write_str("nextframe"),
            Self::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

/// Reinterpret the low six bits of `byte` as a two's-complement value.
pub const fn signed_operand(byte: u8) -> i8 {
    let raw = (byte & OPERAND_MASK) as i8;
    if raw > 31 { raw - 64 } else { raw }
}

/// Assemble an instruction byte. Operand bits above the sixth are dropped.
pub const fn pack(opcode: Opcode, operand: u8) -> u8 {
    ((opcode as u8) << OPERAND_BITS) | (operand & OPERAND_MASK)
}

/// A decoded instruction byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Move the target position horizontally.
    Dx(i8),
    /// Move the target position vertically, draw with the current tool
    /// and commit the target as the new position.
    Dy(i8),
    Tool(Tool),
    /// Shift a 6-bit fragment into the accumulator.
    Data(u8),
}

impl Instruction {
    pub const fn decode(byte: u8) -> Self {
        match Opcode::of(byte) {
            Opcode::Dx => Self::Dx(signed_operand(byte)),
            Opcode::Dy => Self::Dy(signed_operand(byte)),
            Opcode::Tool => Self::Tool(Tool::from_code(byte)),
            Opcode::Data => Self::Data(byte & OPERAND_MASK),
        }
    }

    /// Pack into a byte. Relative moves outside `-32..=31` wrap.
    pub const fn encode(self) -> u8 {
        match self {
            Self::Dx(delta) => pack(Opcode::Dx, delta as u8),
            Self::Dy(delta) => pack(Opcode::Dy, delta as u8),
            Self::Tool(tool) => pack(Opcode::Tool, tool.code()),
            Self::Data(fragment) => pack(Opcode::Data, fragment),
        }
    }

    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Dx(_) => Opcode::Dx,
            Self::Dy(_) => Opcode::Dy,
            Self::Tool(_) => Opcode::Tool,
            Self::Data(_) => Opcode::Data,
        }
    }
}

impl From<u8> for Instruction {
    fn from(byte: u8) -> Self {
        Self::decode(byte)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dx(delta) => write!(f, "dx {delta}"),
            Self::Dy(delta) => write!(f, "dy {delta}"),
            Self::Tool(tool) => write!(f, "tool {tool}"),
            Self::Data(fragment) => write!(f, "data {fragment:#04x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_operand_range() {
        for value in -32i8..=31 {
            let byte = pack(Opcode::Dx, value as u8);
            assert_eq!(Instruction::decode(byte), Instruction::Dx(value));

            let byte = pack(Opcode::Dy, value as u8);
            assert_eq!(Instruction::decode(byte), Instruction::Dy(value));
        }
    }

    #[test]
    fn test_operand_boundary_wraps() {
        // 0b100000 is the most negative operand
        assert_eq!(signed_operand(pack(Opcode::Dx, 32)), -32);
        assert_eq!(Instruction::decode(Instruction::Dx(32).encode()), Instruction::Dx(-32));
        assert_eq!(signed_operand(0b0011_1111), -1);
        assert_eq!(signed_operand(0b0001_1111), 31);
    }

    #[test]
    fn test_opcode_bits() {
        assert_eq!(Opcode::of(0x00), Opcode::Dx);
        assert_eq!(Opcode::of(0x40), Opcode::Dy);
        assert_eq!(Opcode::of(0x80), Opcode::Tool);
        assert_eq!(Opcode::of(0xC0), Opcode::Data);
        assert_eq!(Instruction::decode(0xFF).opcode(), Opcode::Data);
    }

    #[test]
    fn test_data_and_tool_operands_are_unsigned() {
        assert_eq!(Instruction::decode(0xFF), Instruction::Data(63));
        assert_eq!(Instruction::decode(0xC0 | 40), Instruction::Data(40));
        assert_eq!(Instruction::decode(0x80 | 40), Instruction::Tool(Tool::Custom(40)));
    }

    #[test]
    fn test_tool_codes() {
        for code in 0..=63u8 {
            assert_eq!(Tool::from_code(code).code(), code);
        }
        assert_eq!(Tool::from_code(2), Tool::Block);
        assert_eq!(Tool::from_code(8), Tool::NextFrame);
        assert_eq!(Tool::from_code(9), Tool::Custom(9));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::Dx(-3).to_string(), "dx -3");
        assert_eq!(Instruction::Tool(Tool::TargetX).to_string(), "tool targetx");
        assert_eq!(Instruction::Data(0x3F).to_string(), "data 0x3f");
    }
}
