//! Error types surfaced by the bus, CPU and loaders.
//!
//! Matching the rest of this crate, errors are plain enums with a hand
//! written `Display` impl rather than a derive-macro based scheme — there is
//! exactly one error per failure family and none of them need to carry
//! another crate's error as a source.

use std::fmt;

/// Raised when the memory map is misconfigured. These only ever happen at
/// machine-assembly time; once a [`crate::bus::MemoryBus`] is built, reads
/// and writes cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `allocate_space` was called with a capacity outside `1..=0x10000`.
    InvalidCapacity { capacity: usize },
    /// `register_memory` was called before `allocate_space`.
    NotAllocated,
    /// The device's `[start, end]` range does not fit inside the allocated space.
    OutOfRange { start: u16, end: u16, capacity: usize },
    /// The device reports `end < start`.
    InvertedRange { start: u16, end: u16 },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::InvalidCapacity { capacity } => {
                write!(f, "capacity {capacity} out of range (1-65536)")
            }
            ConfigurationError::NotAllocated => {
                write!(f, "memory space not allocated")
            }
            ConfigurationError::OutOfRange { start, end, capacity } => {
                write!(
                    f,
                    "memory region {start:#06x}-{end:#06x} exceeds allocated space ({capacity} bytes)"
                )
            }
            ConfigurationError::InvertedRange { start, end } => {
                write!(f, "memory end {end:#06x} precedes start {start:#06x}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Raised by the PROG / BASIC-text loaders on malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The magic bytes at the start of a PROG file did not read `"PROG"`.
    BadMagic,
    /// The PROG version field was not 1 or 2.
    UnsupportedVersion { version: u32 },
    /// The file ended before a length-prefixed field could be read in full.
    UnexpectedEof { context: &'static str },
    /// A BASIC text line number fell outside `1..=32767`.
    LineNumberOutOfRange { value: i64 },
    /// An encoded BASIC record exceeded the 72-byte physical length limit.
    RecordTooLong { length: usize },
    /// A `\HH` escape was not followed by two uppercase hex digits.
    InvalidEscape,
    /// A PROG payload's `start + length` overruns the 64 KiB address space.
    AddressOutOfRange { start: u16, length: u32 },
    /// A length-prefixed PROG string (name/comment) exceeded its field's
    /// maximum byte length.
    StringTooLong { length: u32, max: u32 },
    /// A PROG v2 section's declared length didn't match the bytes consumed
    /// while parsing its fields.
    SectionLengthMismatch,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadMagic => write!(f, "missing or corrupt \"PROG\" magic"),
            FormatError::UnsupportedVersion { version } => {
                write!(f, "unsupported PROG version {version}")
            }
            FormatError::UnexpectedEof { context } => {
                write!(f, "unexpected end of file while reading {context}")
            }
            FormatError::LineNumberOutOfRange { value } => {
                write!(f, "line number {value} out of range (1-32767)")
            }
            FormatError::RecordTooLong { length } => {
                write!(f, "encoded record of {length} bytes exceeds the 72-byte limit")
            }
            FormatError::InvalidEscape => write!(f, "invalid \\HH escape in BASIC text"),
            FormatError::AddressOutOfRange { start, length } => {
                write!(f, "payload at {start:#06x} of length {length} exceeds the 64K address space")
            }
            FormatError::StringTooLong { length, max } => {
                write!(f, "string of length {length} exceeds the {max}-byte limit")
            }
            FormatError::SectionLengthMismatch => {
                write!(f, "PROG section length did not match its declared fields")
            }
        }
    }
}

impl std::error::Error for FormatError {}

/// Raised by [`crate::cpu::mb8861::Mb8861::step`] when the opcode table has
/// no entry for the fetched byte. Fatal to the current run: the frame driver
/// must stop and surface this to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalOpcode {
    pub opcode: u8,
    pub pc: u16,
}

impl fmt::Display for IllegalOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal opcode {:#04x} fetched at {:#06x}",
            self.opcode, self.pc
        )
    }
}

impl std::error::Error for IllegalOpcode {}
