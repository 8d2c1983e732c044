//! Error type for the filesystem-facing loader entry points. Parsing
//! failures come straight from [`jr100_core::error::FormatError`]; this only
//! adds the I/O error a path-based load can also fail with, in the same
//! shape as `rom_loader.rs::RomLoadError`.

use std::fmt;

use jr100_core::error::FormatError;

#[derive(Debug)]
pub enum LoaderError {
    Io(std::io::Error),
    Format(FormatError),
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Io(e) => write!(f, "I/O error: {e}"),
            LoaderError::Format(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoaderError {}

impl From<std::io::Error> for LoaderError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FormatError> for LoaderError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}
