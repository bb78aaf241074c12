use anyhow::bail;
use itertools::Itertools;
use scrawl_common::{CoverageMask, Program, RasterBuffer, decompose_masked};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Options {
    /// delay requested after each frame, in milliseconds
    pub pause: u32,
    /// encode every frame in full instead of only the changed pixels
    pub full_frames: bool,
    /// largest frame width or height accepted
    pub max_dimension: usize,
}

/// Mark every pixel that did not change since the previous frame as
/// already covered, so only the difference gets encoded.
fn differential_analysis(
    previous_frame: &RasterBuffer,
    new_frame: &RasterBuffer,
) -> CoverageMask {
    let mut mask = CoverageMask::for_raster(new_frame);
    if previous_frame.width() != new_frame.width()
        || previous_frame.height() != new_frame.height()
    {
        warn!("frame dimensions changed, encoding the full frame");
        return mask;
    }

    for (y, (previous_row, new_row)) in previous_frame.rows().zip(new_frame.rows()).enumerate() {
        for (x, (previous, new)) in previous_row.iter().zip(new_row).enumerate() {
            if previous == new {
                mask.mark(x as u32, y as u32);
            }
        }
    }

    mask
}

fn read_frame(entry_path: &Path) -> anyhow::Result<RasterBuffer> {
    let image = image::open(entry_path)?.into_luma8();

    let (width, height) = image.dimensions();
    Ok(RasterBuffer::new(width, height, image.into_raw())?)
}

/// The image files of `dir`, ordered by file name.
pub fn frame_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let files: Vec<PathBuf> = fs::read_dir(dir)?
        .map_ok(|entry| entry.path())
        .filter_ok(|path| path.is_file())
        .try_collect()?;

    Ok(files.into_iter().sorted().collect())
}

/// Encode each frame followed by an optional pause and a `NEXTFRAME`.
pub fn encode_frames(files: &[PathBuf], options: &Options) -> anyhow::Result<Program> {
    let mut program = Program::new();
    let mut previous_frame: Option<RasterBuffer> = None;

    for (idx, path) in files.iter().enumerate() {
        let frame = read_frame(path)?;
        if frame.width() as usize > options.max_dimension
            || frame.height() as usize > options.max_dimension
        {
            bail!(
                "frame {} is {}x{}, larger than the decode limit of {}",
                path.display(),
                frame.width(),
                frame.height(),
                options.max_dimension
            );
        }

        let mask = match &previous_frame {
            Some(previous_frame) if !options.full_frames => {
                differential_analysis(previous_frame, &frame)
            }
            _ => CoverageMask::for_raster(&frame),
        };
        let changed = mask.uncovered();
        let blocks = decompose_masked(&frame, mask);

        info!(
            frame = idx,
            path = %path.display(),
            changed,
            rectangles = blocks.len(),
            "encoded frame"
        );

        program.extend(blocks);
        if options.pause > 0 {
            program.pause(options.pause);
        }
        program.next_frame();

        previous_frame = Some(frame);
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_common::{Canvas, Instruction, Interpreter, Tool};

    #[test]
    fn test_differential_mask() {
        let previous = RasterBuffer::new(3, 1, vec![1, 2, 3]).unwrap();
        let next = RasterBuffer::new(3, 1, vec![1, 9, 3]).unwrap();

        let mask = differential_analysis(&previous, &next);
        assert_eq!(mask.uncovered(), 1);
        assert!(!mask.is_covered(1, 0));
    }

    #[test]
    fn test_resized_frame_is_encoded_in_full() {
        let previous = RasterBuffer::filled(2, 2, 0);
        let next = RasterBuffer::filled(3, 2, 0);

        assert_eq!(differential_analysis(&previous, &next).uncovered(), 6);
    }

    #[test]
    fn test_encode_frames() {
        let dir = std::env::temp_dir().join(format!("scrawl-frames-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let first = image::GrayImage::from_raw(2, 2, vec![10, 10, 10, 10]).unwrap();
        let second = image::GrayImage::from_raw(2, 2, vec![10, 10, 10, 200]).unwrap();
        first.save(dir.join("000.png")).unwrap();
        second.save(dir.join("001.png")).unwrap();

        let files = frame_paths(&dir).unwrap();
        let options = Options {
            pause: 0,
            full_frames: false,
            max_dimension: 2,
        };
        let program = encode_frames(&files, &options).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        let mut canvas = Canvas::new(2, 2);
        let mut vm = Interpreter::new();

        vm.run_frame(program.as_bytes(), &mut canvas);
        vm.reset_transient();
        assert_eq!(canvas.get(1, 1), Some(10));

        let frame = vm.run_frame(program.as_bytes(), &mut canvas);
        assert_eq!(canvas.get(1, 1), Some(200));
        assert_eq!(canvas.get(0, 0), Some(10));
        // the second frame only redraws the changed pixel
        let block = Instruction::Tool(Tool::Block).encode();
        let redrawn = program.as_bytes()[frame.start..frame.end]
            .iter()
            .filter(|byte| **byte == block)
            .count();
        assert_eq!(redrawn, 1);
    }

    #[test]
    fn test_oversized_frame_is_refused() {
        let dir = std::env::temp_dir().join(format!("scrawl-big-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        image::GrayImage::from_raw(3, 1, vec![0, 0, 0])
            .unwrap()
            .save(dir.join("000.png"))
            .unwrap();

        let files = frame_paths(&dir).unwrap();
        let options = Options {
            pause: 0,
            full_frames: true,
            max_dimension: 2,
        };
        let result = encode_frames(&files, &options);
        fs::remove_dir_all(&dir).unwrap();

        assert!(result.is_err());
    }
}
