//! Loaders for the two JR-100 program formats: the binary `PROG` container
//! and plain-text BASIC listings. Both are format parsers over a
//! [`jr100_core::bus::MemoryBus`], not hardware, so they live in their own
//! crate next to the core rather than inside it.

mod cursor;

pub mod basic_text;
pub mod error;
pub mod prog;
pub mod program;

use std::fs;
use std::path::Path;

use jr100_core::bus::MemoryBus;

pub use error::LoaderError;
pub use program::{AddressRegion, ProgramImage};

/// Read a PROG file from `path` and load it into `bus`.
pub fn load_prog_from_path(path: &Path, bus: &MemoryBus) -> Result<ProgramImage, LoaderError> {
    let data = fs::read(path)?;
    Ok(prog::load_prog(&data, bus)?)
}

/// Read a BASIC text listing from `path` and load it into `bus`.
pub fn load_basic_text_from_path(path: &Path, bus: &MemoryBus) -> Result<ProgramImage, LoaderError> {
    let text = fs::read_to_string(path)?;
    Ok(basic_text::load_basic_text(&text, bus)?)
}
