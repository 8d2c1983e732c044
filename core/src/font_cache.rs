//! "Plane 1" glyph cache.
//!
//! The JR-100 renderer draws characters from a 256-entry, 8-bytes-per-glyph
//! bitmap table assembled from three sources: the BASIC ROM's built-in font
//! (codes `0x00..=0x7F`), user-defined character RAM (`0x80..=0x9F`), and the
//! low 0x300 bytes of video RAM, which doubles as glyph storage for codes
//! `0xA0..=0xFF` when the JR-100 is in CMODE1. The cache is rebuilt
//! incrementally from store-hooks installed on the backing RAM blocks rather
//! than recomputed from scratch on every write.

const UDC_BASE_CODE: usize = 0x80;
const VRAM_BASE_CODE: usize = 0xA0;
const VRAM_FONT_GLYPHS: usize = 96;

pub struct FontCache {
    plane1: [[u8; 8]; 256],
    revision: u64,
}

impl FontCache {
    pub fn new() -> Self {
        Self { plane1: [[0; 8]; 256], revision: 0 }
    }

    /// Seed codes `0x00..=0x7F` from the BASIC ROM's font table at startup.
    pub fn initialize_rom(&mut self, rom_font: &[u8]) {
        for code in 0..0x80usize {
            for line in 0..8usize {
                let index = code * 8 + line;
                self.plane1[code][line] = rom_font.get(index).copied().unwrap_or(0);
            }
        }
        self.revision += 1;
    }

    /// Called by UDC-RAM on every store; `offset` is relative to 0xC000.
    pub fn update_udc(&mut self, offset: u16, value: u8) {
        let code = UDC_BASE_CODE + (offset / 8) as usize;
        let line = (offset % 8) as usize;
        self.plane1[code][line] = value;
        self.revision += 1;
    }

    /// Called by video RAM on every store; `offset` is relative to 0xC100.
    /// Writes past the first 96 glyphs (0x300 bytes) do not touch the font.
    pub fn update_vram(&mut self, offset: u16, value: u8) {
        let glyph = (offset / 8) as usize;
        if glyph >= VRAM_FONT_GLYPHS {
            return;
        }
        let code = VRAM_BASE_CODE + glyph;
        let line = (offset % 8) as usize;
        self.plane1[code][line] = value;
        self.revision += 1;
    }

    pub fn glyph(&self, code: u8) -> &[u8; 8] {
        &self.plane1[code as usize]
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}
