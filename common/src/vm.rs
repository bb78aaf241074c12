//! The sketch interpreter.
//!
//! # Register file
//!
//! | Register | Meaning |
//! |----------|---------|
//! | `x`, `y` | current position |
//! | `tx`, `ty` | target position |
//! | `tool` | drawing mode applied on `DY` |
//! | `colour` | packed RGBA colour |
//! | `data` | accumulator loaded by `DATA` |
//! | `frame_start` | byte offset the next frame starts at |
//! | `frame_ended` | set by `NEXTFRAME` |
//!
//! The accumulator is 32 bits wide and shifting past that drops the high
//! bits. Commits to `tx`/`ty` reinterpret the word as a signed value.
//!
//! The canvas bounds are not registers: the [`Surface`] owns them.

use crate::{
    isa::{Instruction, OPERAND_BITS, Tool},
    surface::Surface,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub x: i32,
    pub y: i32,
    pub tx: i32,
    pub ty: i32,
    pub tool: Tool,
    pub colour: u32,
    pub data: u32,
    pub frame_start: usize,
    pub frame_ended: bool,
}

/// Why a frame stopped executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEnd {
    /// A `NEXTFRAME` directive was reached.
    NextFrame,
    /// The stream ran out; the next frame restarts from the beginning.
    EndOfProgram,
}

/// Record of one frame-stepped run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Offset of the first byte executed.
    pub start: usize,
    /// Offset one past the last byte executed.
    pub end: usize,
    pub outcome: FrameEnd,
}

impl Frame {
    pub fn instructions(&self) -> usize {
        self.end - self.start
    }
}

#[derive(Clone, Debug, Default)]
pub struct Interpreter {
    registers: Registers,
    initial_tool: Tool,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interpreter whose tool register starts (and resets) to `tool`.
    pub fn with_initial_tool(tool: Tool) -> Self {
        Self {
            registers: Registers {
                tool,
                ..Registers::default()
            },
            initial_tool: tool,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Zero every register.
    pub fn reset(&mut self) {
        self.registers = Registers {
            tool: self.initial_tool,
            ..Registers::default()
        };
    }

    /// Zero every register except `frame_start`, ready for the next frame.
    pub fn reset_transient(&mut self) {
        self.registers = Registers {
            tool: self.initial_tool,
            frame_start: self.registers.frame_start,
            ..Registers::default()
        };
    }

    /// Execute the instruction `byte` found at `offset` in the stream.
    pub fn step<S: Surface + ?Sized>(&mut self, byte: u8, offset: usize, surface: &mut S) {
        let instruction = Instruction::decode(byte);
        trace!(offset, %instruction, "dispatch");

        let regs = &mut self.registers;
        match instruction {
            Instruction::Dx(delta) => regs.tx = regs.tx.wrapping_add(delta.into()),
            Instruction::Dy(delta) => {
                regs.ty = regs.ty.wrapping_add(delta.into());
                match regs.tool {
                    Tool::Block => {
                        surface.fill_rect(regs.x, regs.y, regs.tx, regs.ty, regs.colour)
                    }
                    Tool::Line => surface.line(regs.x, regs.y, regs.tx, regs.ty, regs.colour),
                    _ => {}
                }
                regs.x = regs.tx;
                regs.y = regs.ty;
            }
            Instruction::Tool(tool) => {
                match tool {
                    Tool::Colour => regs.colour = regs.data,
                    Tool::TargetX => regs.tx = regs.data as i32,
                    Tool::TargetY => regs.ty = regs.data as i32,
                    Tool::Show => surface.show(),
                    Tool::Pause => surface.pause(regs.data),
                    Tool::NextFrame => {
                        regs.frame_start = offset + 1;
                        regs.frame_ended = true;
                    }
                    mode => regs.tool = mode,
                }
                regs.data = 0;
            }
            Instruction::Data(fragment) => {
                regs.data = (regs.data << OPERAND_BITS) | u32::from(fragment);
            }
        }
    }

    /// Execute a whole program from a zeroed register file.
    ///
    /// A value left half-loaded in the accumulator at the end of the stream
    /// is discarded.
    pub fn run<S: Surface + ?Sized>(&mut self, program: &[u8], surface: &mut S) -> usize {
        self.reset();
        for (offset, byte) in program.iter().copied().enumerate() {
            self.step(byte, offset, surface);
        }

        debug!(instructions = program.len(), "program finished");
        program.len()
    }

    /// Execute one frame, starting at `frame_start`.
    ///
    /// Stops after a `NEXTFRAME` directive, leaving `frame_start` just past
    /// it, or at the end of the stream, rewinding `frame_start` to zero so
    /// playback loops. Registers other than `frame_start` carry over; call
    /// [`reset_transient`](Self::reset_transient) between frames.
    pub fn run_frame<S: Surface + ?Sized>(&mut self, program: &[u8], surface: &mut S) -> Frame {
        let start = match self.registers.frame_start {
            start if start > program.len() => {
                debug!(start, len = program.len(), "frame start past end of program, rewinding");
                0
            }
            start => start,
        };

        self.registers.frame_ended = false;
        for (offset, byte) in program.iter().copied().enumerate().skip(start) {
            self.step(byte, offset, surface);

            if self.registers.frame_ended {
                return Frame {
                    start,
                    end: offset + 1,
                    outcome: FrameEnd::NextFrame,
                };
            }
        }

        self.registers.frame_start = 0;
        Frame {
            start,
            end: program.len(),
            outcome: FrameEnd::EndOfProgram,
        }
    }
}
