//! Grayscale raster buffers and the binary greymap (`P5`) file format.
//!
//! ```text
//! P5 <width> <height> 255\n<width * height raw samples, row-major>
//! ```
//!
//! Header tokens may be separated by any whitespace and `#` comments.
//! Exactly one whitespace byte separates the maxval from the samples.

use crate::error::{Error, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

const MAGIC: &[u8] = b"P5";
const MAXVAL: u32 = 255;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    // layout: Y(X(sample))
    samples: Vec<u8>,
}

impl RasterBuffer {
    /// Wrap row-major samples, rejecting a buffer whose length disagrees
    /// with the declared dimensions.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        let expected = sample_count(width, height)?;
        if samples.len() != expected {
            return Err(Error::SampleCount {
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.samples[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        let idx = self.index(x, y);
        self.samples[idx] = value;
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.index(0, y);
        &self.samples[start..start + self.width as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on a zero chunk size
        self.samples.chunks_exact(self.width.max(1) as usize)
    }

    /// Parse a binary greymap.
    pub fn read_pgm<R: BufRead>(mut reader: R) -> Result<Self> {
        let magic = next_token(&mut reader)?.ok_or(Error::Magic)?;
        if magic != MAGIC {
            return Err(Error::Magic);
        }

        let width = header_number(&mut reader, "width")?;
        let height = header_number(&mut reader, "height")?;
        let maxval = header_number(&mut reader, "maxval")?;
        if maxval != MAXVAL {
            return Err(Error::Maxval(maxval));
        }

        // the header is untrusted, so grow with the data instead of reserving
        // up front; one extra byte is enough to spot trailing garbage
        let expected = sample_count(width, height)?;
        let mut samples = Vec::new();
        reader
            .take(expected as u64 + 1)
            .read_to_end(&mut samples)?;

        Self::new(width, height, samples)
    }

    pub fn write_pgm<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "P5 {} {} {MAXVAL}", self.width, self.height)?;
        writer.write_all(&self.samples)?;
        writer.flush()?;

        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let attach = |source: Error| Error::Read {
            path: path.to_path_buf(),
            source: Box::new(source),
        };

        let file = File::open(path).map_err(|error| attach(error.into()))?;
        Self::read_pgm(BufReader::new(file)).map_err(attach)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let attach = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(attach)?;
        self.write_pgm(BufWriter::new(file)).map_err(|error| match error {
            Error::Io(source) => attach(source),
            other => other,
        })
    }
}

fn sample_count(width: u32, height: u32) -> Result<usize> {
    usize::try_from(u64::from(width) * u64::from(height))
        .ok()
        .filter(|&count| count <= isize::MAX as usize)
        .ok_or(Error::Header {
            field: "dimensions",
        })
}

fn header_number<R: BufRead>(reader: &mut R, field: &'static str) -> Result<u32> {
    let token = next_token(reader)?.ok_or(Error::Header { field })?;

    std::str::from_utf8(&token)
        .ok()
        .and_then(|token| token.parse().ok())
        .ok_or(Error::Header { field })
}

/// Read one whitespace-delimited header token, consuming the single
/// whitespace byte that terminates it. Returns `None` at end of input.
fn next_token<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut token = Vec::new();
    let mut in_comment = false;

    loop {
        let Some(byte) = next_byte(reader)? else {
            break;
        };

        if in_comment {
            in_comment = byte != b'\n';
            continue;
        }

        match byte {
            b'#' if token.is_empty() => in_comment = true,
            byte if byte.is_ascii_whitespace() => {
                if !token.is_empty() {
                    break;
                }
            }
            byte => token.push(byte),
        }
    }

    Ok((!token.is_empty()).then_some(token))
}

fn next_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let byte = reader.fill_buf()?.first().copied();
    if byte.is_some() {
        reader.consume(1);
    }

    Ok(byte)
}
