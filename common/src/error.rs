use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while reading or writing raster files.
///
/// Decoding and interpreting programs never fails; these only come out of
/// the file boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("raster file is not a binary greymap (expected `P5` magic)")]
    Magic,

    #[error("raster header has a missing or malformed {field}")]
    Header { field: &'static str },

    #[error("raster maxval {0} is not supported (expected 255)")]
    Maxval(u32),

    #[error("raster declares {expected} samples but {actual} were supplied")]
    SampleCount { expected: usize, actual: usize },
}
