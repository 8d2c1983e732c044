//! Loader for the binary `PROG` format (versions 1 and 2): a magic header,
//! a version tag, then either a single-payload v1 body or a sequence of
//! `PNAM`/`PBAS`/`PBIN`/`CMNT` v2 sections.

use jr100_core::bus::MemoryBus;
use jr100_core::error::FormatError;

use crate::cursor::Cursor;
use crate::program::ProgramImage;

const MAGIC: u32 = 0x474F_5250; // "PROG", little-endian on disk
const MIN_VERSION: u32 = 1;
const MAX_VERSION: u32 = 2;

const SECTION_PNAM: u32 = 0x4D41_4E50;
const SECTION_PBAS: u32 = 0x5341_4250;
const SECTION_PBIN: u32 = 0x4E49_4250;
const SECTION_CMNT: u32 = 0x544E_4D43;

const MAX_PROGRAM_NAME_LENGTH: u32 = 256;
const MAX_PROGRAM_LENGTH: u32 = 0x1_0000;
const MAX_COMMENT_LENGTH: u32 = 1_024;
const MAX_BINARY_SECTIONS: usize = 256;

/// `PBAS` sections and v1 BASIC payloads both land here — the same address
/// BASIC text programs start at (see [`crate::basic_text`]).
const ADDRESS_START_OF_BASIC_PROGRAM: u16 = 0x0246;
const SENTINEL_VALUE: u8 = 0xDF;

/// Load a PROG image from `data` into `bus`, returning the metadata it
/// carried (name, comment, written regions).
pub fn load_prog(data: &[u8], bus: &MemoryBus) -> Result<ProgramImage, FormatError> {
    let mut cursor = Cursor::new(data);

    let magic = cursor.read_u32_optional()?;
    if magic != Some(MAGIC) {
        return Err(FormatError::BadMagic);
    }

    let version = cursor.read_u32()?;
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(FormatError::UnsupportedVersion { version });
    }

    let mut program = ProgramImage::new();
    if version == 1 {
        load_v1(&mut cursor, bus, &mut program)?;
    } else {
        load_v2(&mut cursor, bus, &mut program)?;
    }
    Ok(program)
}

fn load_v1(cursor: &mut Cursor, bus: &MemoryBus, program: &mut ProgramImage) -> Result<(), FormatError> {
    let name = cursor.read_string(MAX_PROGRAM_NAME_LENGTH)?;
    let start_addr = cursor.read_u32()?;
    let length = cursor.read_u32()?;
    let flag = cursor.read_u32()?;

    validate_bounds(start_addr, length)?;
    let payload = cursor.read_exact(length as usize)?;
    write_block(bus, start_addr as u16, payload);

    program.name = name;

    let end_addr = if length > 0 { (start_addr + length - 1) as u16 } else { (start_addr.wrapping_sub(1)) as u16 };
    if flag == 0 {
        if length > 0 {
            write_basic_trailer(bus, end_addr);
        }
        program.basic_area = true;
    } else if length > 0 {
        program.add_region(start_addr as u16, end_addr, "");
    }
    Ok(())
}

fn load_v2(cursor: &mut Cursor, bus: &MemoryBus, program: &mut ProgramImage) -> Result<(), FormatError> {
    let mut binary_sections = 0usize;

    while let Some(section_id) = cursor.read_u32_optional()? {
        let section_length = cursor.read_u32()?;
        let payload = cursor.read_exact(section_length as usize)?;
        let mut reader = Cursor::new(payload);

        match section_id {
            SECTION_PNAM => {
                program.name = reader.read_string(MAX_PROGRAM_NAME_LENGTH)?;
                ensure_consumed(&reader)?;
            }
            SECTION_PBAS => {
                let program_length = reader.read_u32()?;
                validate_bounds(ADDRESS_START_OF_BASIC_PROGRAM as u32, program_length)?;
                let payload = reader.read_exact(program_length as usize)?;
                write_block(bus, ADDRESS_START_OF_BASIC_PROGRAM, payload);

                let end_addr = if program_length > 0 {
                    ADDRESS_START_OF_BASIC_PROGRAM + program_length as u16 - 1
                } else {
                    ADDRESS_START_OF_BASIC_PROGRAM.wrapping_sub(1)
                };
                if program_length > 0 {
                    write_basic_trailer(bus, end_addr);
                }
                program.basic_area = true;

                ensure_consumed(&reader)?;
            }
            SECTION_PBIN => {
                if binary_sections >= MAX_BINARY_SECTIONS {
                    continue;
                }

                let start_addr = reader.read_u32()?;
                let data_length = reader.read_u32()?;
                validate_bounds(start_addr, data_length)?;
                let payload = reader.read_exact(data_length as usize)?;
                write_block(bus, start_addr as u16, payload);
                let comment = reader.read_string(MAX_COMMENT_LENGTH)?;
                let end_addr = (start_addr + data_length - 1) as u16;
                program.add_region(start_addr as u16, end_addr, comment);

                binary_sections += 1;
                ensure_consumed(&reader)?;
            }
            SECTION_CMNT => {
                program.comment = reader.read_string(MAX_COMMENT_LENGTH)?;
                ensure_consumed(&reader)?;
            }
            _ => {
                // Unknown sections are skipped; the payload was already
                // consumed by the outer `read_exact`.
            }
        }
    }
    Ok(())
}

fn write_block(bus: &MemoryBus, start_addr: u16, payload: &[u8]) {
    for (offset, &value) in payload.iter().enumerate() {
        bus.store8(start_addr.wrapping_add(offset as u16), value);
    }
}

/// Writes the three trailing `0xDF` sentinel bytes plus the `0x0006..0x000C`
/// pointer words. Deliberately does *not* touch `0x0002`/`0x0004` — those
/// only get written by the BASIC text loader's `_write_basic_vectors`
/// equivalent, a documented asymmetry between the two loaders.
fn write_basic_trailer(bus: &MemoryBus, end_addr: u16) {
    let sentinel_base = end_addr.wrapping_add(1);
    for offset in 0..3u16 {
        bus.store8(sentinel_base.wrapping_add(offset), SENTINEL_VALUE);
    }

    let words: [(u16, u16); 4] = [
        (0x0006, end_addr),
        (0x0008, end_addr.wrapping_add(1)),
        (0x000A, end_addr.wrapping_add(2)),
        (0x000C, end_addr.wrapping_add(3)),
    ];
    for (addr, value) in words {
        bus.store16(addr, value);
    }
}

fn validate_bounds(start: u32, length: u32) -> Result<(), FormatError> {
    let end = start.checked_add(length).filter(|&end| end <= MAX_PROGRAM_LENGTH);
    if end.is_none() {
        return Err(FormatError::AddressOutOfRange { start: start as u16, length });
    }
    Ok(())
}

fn ensure_consumed(reader: &Cursor) -> Result<(), FormatError> {
    if reader.remaining() > 0 {
        return Err(FormatError::SectionLengthMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jr100_core::bus::Ram;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fresh_bus() -> MemoryBus {
        let mut bus = MemoryBus::new();
        bus.allocate_space(0x1_0000).unwrap();
        let ram: jr100_core::bus::AddressableHandle = Rc::new(RefCell::new(Ram::new(0x0000, 0x1_0000)));
        bus.register_memory(ram).unwrap();
        bus
    }

    fn le(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    #[test]
    fn rejects_bad_magic() {
        let bus = fresh_bus();
        let data = [0u8; 8];
        assert_eq!(load_prog(&data, &bus), Err(FormatError::BadMagic));
    }

    #[test]
    fn rejects_unsupported_version() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(99));
        assert_eq!(load_prog(&data, &bus), Err(FormatError::UnsupportedVersion { version: 99 }));
    }

    #[test]
    fn v1_binary_payload_writes_memory_and_region() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(1)); // version
        data.extend(le(0)); // name length
        data.extend(le(0x1000)); // start addr
        data.extend(le(4)); // length
        data.extend(le(1)); // flag != 0 => binary, not BASIC
        data.extend([0xDE, 0xAD, 0xBE, 0xEF]);

        let program = load_prog(&data, &bus).unwrap();
        assert!(!program.basic_area);
        assert_eq!(program.regions.len(), 1);
        assert_eq!(program.regions[0].start, 0x1000);
        assert_eq!(program.regions[0].end, 0x1003);
        assert_eq!(bus.load8(0x1000), 0xDE);
        assert_eq!(bus.load8(0x1003), 0xEF);
    }

    #[test]
    fn v1_basic_payload_writes_trailer_but_not_pointer_words() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(1));
        data.extend(le(0));
        data.extend(le(ADDRESS_START_OF_BASIC_PROGRAM as u32));
        data.extend(le(2));
        data.extend(le(0)); // flag == 0 => BASIC area
        data.extend([0x11, 0x22]);

        let program = load_prog(&data, &bus).unwrap();
        assert!(program.basic_area);
        let end_addr = ADDRESS_START_OF_BASIC_PROGRAM + 1;
        assert_eq!(bus.load8(end_addr.wrapping_add(1)), SENTINEL_VALUE);
        assert_eq!(bus.load16(0x0006), end_addr);
        // v1/v2 PROG trailer never writes 0x0002/0x0004.
        assert_eq!(bus.load16(0x0002), 0x0000);
    }

    #[test]
    fn v2_pnam_and_cmnt_sections_populate_metadata() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(2));

        let name = b"DEMO";
        data.extend(le(SECTION_PNAM));
        data.extend(le(4 + name.len() as u32));
        data.extend(le(name.len() as u32));
        data.extend(name);

        let comment = b"hello";
        data.extend(le(SECTION_CMNT));
        data.extend(le(4 + comment.len() as u32));
        data.extend(le(comment.len() as u32));
        data.extend(comment);

        let program = load_prog(&data, &bus).unwrap();
        assert_eq!(program.name, "DEMO");
        assert_eq!(program.comment, "hello");
    }

    #[test]
    fn v2_pbin_section_writes_region_and_comment() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(2));

        let comment = b"blk";
        let section_body_len = 4 + 4 + 3 + 4 + comment.len() as u32;
        data.extend(le(SECTION_PBIN));
        data.extend(le(section_body_len));
        data.extend(le(0x3000)); // start
        data.extend(le(3)); // length
        data.extend([0x01, 0x02, 0x03]);
        data.extend(le(comment.len() as u32));
        data.extend(comment);

        let program = load_prog(&data, &bus).unwrap();
        assert_eq!(program.regions.len(), 1);
        assert_eq!(program.regions[0].comment, "blk");
        assert_eq!(bus.load8(0x3000), 0x01);
        assert_eq!(bus.load8(0x3002), 0x03);
    }

    #[test]
    fn unknown_v2_section_is_skipped() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(2));
        data.extend(le(0x5A5A_5A5A)); // unknown section id
        data.extend(le(2));
        data.extend([0xAA, 0xBB]);

        let program = load_prog(&data, &bus).unwrap();
        assert_eq!(program.name, "");
    }

    #[test]
    fn out_of_range_payload_is_rejected() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(1));
        data.extend(le(0));
        data.extend(le(0xFFF0));
        data.extend(le(0x20)); // start + length > 0x10000
        data.extend(le(1));
        data.extend([0u8; 0x20]);

        let result = load_prog(&data, &bus);
        assert!(matches!(result, Err(FormatError::AddressOutOfRange { .. })));
    }

    #[test]
    fn truncated_file_is_unexpected_eof() {
        let bus = fresh_bus();
        let mut data = Vec::new();
        data.extend(le(MAGIC));
        data.extend(le(1));
        // Missing the rest of the v1 header.
        assert!(matches!(load_prog(&data, &bus), Err(FormatError::UnexpectedEof { .. })));
    }
}
