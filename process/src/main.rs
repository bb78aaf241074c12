#[macro_use]
extern crate tracing;

mod animation;

use anyhow::{Context, bail};
use scrawl_common::{
    Canvas, Instruction, RasterBuffer, canvas::DEFAULT_DIMENSION_LIMIT, decode, encode_raster,
};
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(argh::FromArgs)]
/// convert between greymaps and sketch programs
///
/// a `.pgm` input is encoded into a `.sk` program, a `.sk` input is decoded
/// into a `.pgm` greymap and a directory of images becomes an animation
struct Args {
    #[argh(positional)]
    /// raster, program or directory of frames to read
    input: PathBuf,

    #[argh(positional)]
    /// path to output file
    output: PathBuf,

    #[argh(option, default = "200")]
    /// width of the canvas a program is decoded onto
    width: usize,

    #[argh(option, default = "200")]
    /// height of the canvas a program is decoded onto
    height: usize,

    #[argh(option, default = "DEFAULT_DIMENSION_LIMIT")]
    /// largest width or height a decoded canvas may grow to; larger rasters
    /// are refused when encoding
    max_dimension: usize,

    #[argh(option, default = "0")]
    /// delay after each animation frame, in milliseconds
    pause: u32,

    #[argh(switch)]
    /// encode every animation frame in full instead of only what changed
    full_frames: bool,

    #[argh(switch)]
    /// print a disassembly of the program to stdout
    listing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Encode,
    Decode,
    Animate,
}

impl Mode {
    fn detect(input: &Path) -> Option<Self> {
        if input.is_dir() {
            return Some(Self::Animate);
        }

        match input.extension()?.to_str()? {
            "pgm" => Some(Self::Encode),
            "sk" => Some(Self::Decode),
            _ => None,
        }
    }
}

/// Refuse rasters that a canvas capped at `limit` could not reproduce.
fn check_decodable(raster: &RasterBuffer, limit: usize) -> anyhow::Result<()> {
    if raster.width() as usize > limit || raster.height() as usize > limit {
        bail!(
            "{}x{} raster exceeds the decode limit of {limit} (raise it with --max-dimension)",
            raster.width(),
            raster.height()
        );
    }

    Ok(())
}

fn write_program(path: &Path, program: &[u8]) -> anyhow::Result<()> {
    fs::write(path, program).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = program.len(), "wrote program");

    Ok(())
}

fn print_listing(program: &[u8]) -> io::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for (offset, byte) in program.iter().enumerate() {
        writeln!(out, "{offset:>8}  {byte:02x}  {}", Instruction::decode(*byte))?;
    }

    out.flush()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let Some(mode) = Mode::detect(&args.input) else {
        bail!(
            "don't know how to convert {}: expected a .pgm raster, a .sk program or a directory of frames",
            args.input.display()
        );
    };

    let program = match mode {
        Mode::Encode => {
            let raster = RasterBuffer::load(&args.input)?;
            info!(
                width = raster.width(),
                height = raster.height(),
                "loaded raster"
            );
            check_decodable(&raster, args.max_dimension)?;

            let program = encode_raster(&raster).into_bytes();
            write_program(&args.output, &program)?;
            program
        }
        Mode::Animate => {
            let files = animation::frame_paths(&args.input)?;
            if files.is_empty() {
                bail!("no frames found in {}", args.input.display());
            }
            info!(frames = files.len(), "encoding animation");

            let options = animation::Options {
                pause: args.pause,
                full_frames: args.full_frames,
                max_dimension: args.max_dimension,
            };
            let program = animation::encode_frames(&files, &options)?.into_bytes();
            write_program(&args.output, &program)?;
            program
        }
        Mode::Decode => {
            let program = fs::read(&args.input)
                .with_context(|| format!("failed to read {}", args.input.display()))?;
            info!(bytes = program.len(), "loaded program");

            let canvas = Canvas::with_limit(args.width, args.height, args.max_dimension);
            let raster = decode(&program, canvas).into_raster();
            raster.save(&args.output)?;
            info!(
                path = %args.output.display(),
                width = raster.width(),
                height = raster.height(),
                "wrote raster"
            );
            program
        }
    };

    if args.listing {
        print_listing(&program)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        assert_eq!(Mode::detect(Path::new("in.pgm")), Some(Mode::Encode));
        assert_eq!(Mode::detect(Path::new("dir/in.sk")), Some(Mode::Decode));
        assert_eq!(Mode::detect(Path::new("in.png")), None);
        assert_eq!(Mode::detect(Path::new("noext")), None);
        assert_eq!(Mode::detect(&std::env::temp_dir()), Some(Mode::Animate));
    }

    #[test]
    fn test_decode_limit_boundary() {
        let limit = 64;
        let widest = RasterBuffer::filled(limit as u32, 1, 7);
        assert!(check_decodable(&widest, limit).is_ok());
        assert!(check_decodable(&RasterBuffer::filled(1, limit as u32 + 1, 7), limit).is_err());

        let canvas = Canvas::with_limit(0, 0, limit);
        let decoded = decode(encode_raster(&widest).as_bytes(), canvas).into_raster();
        assert_eq!(decoded, widest);
    }
}
