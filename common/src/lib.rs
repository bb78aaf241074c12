//! # scrawl - rectangle byte code for grayscale rasters
//!
//! A raster is decomposed into solid rectangles, each rectangle becomes a
//! handful of one-byte instructions, and an interpreter replays those
//! instructions onto any [`Surface`].
//!
//! ```
//! use scrawl_common::{Canvas, RasterBuffer, decode, encode_raster};
//!
//! let raster = RasterBuffer::filled(4, 4, 0);
//! let program = encode_raster(&raster);
//! let canvas = decode(program.as_bytes(), Canvas::new(0, 0));
//!
//! assert_eq!(canvas.into_raster(), raster);
//! ```

#[macro_use]
extern crate tracing;

pub mod canvas;
pub mod codec;
pub mod decompose;
pub mod error;
pub mod isa;
pub mod raster;
pub mod surface;
pub mod vm;

pub use canvas::Canvas;
pub use codec::{Program, encode, grey_to_rgba};
pub use decompose::{CoverageMask, Rectangle, decompose, decompose_masked};
pub use error::{Error, Result};
pub use isa::{Instruction, Opcode, Tool};
pub use raster::RasterBuffer;
pub use surface::Surface;
pub use vm::{Frame, FrameEnd, Interpreter, Registers};

/// Decompose `raster` and encode every rectangle in scan order.
pub fn encode_raster(raster: &RasterBuffer) -> Program {
    let blocks = decompose(raster);
    debug!(
        width = raster.width(),
        height = raster.height(),
        rectangles = blocks.len(),
        "decomposed raster"
    );

    encode(&blocks)
}

/// Run `program` to completion on `canvas`.
pub fn decode(program: &[u8], mut canvas: Canvas) -> Canvas {
    Interpreter::new().run(program, &mut canvas);
    canvas
}
