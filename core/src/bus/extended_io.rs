use super::Addressable;

const GAMEPAD_OFFSET: u16 = 0x02;
const DEFAULT_STATUS: u8 = 0xDF;
const BIT_RIGHT: u8 = 0x01;
const BIT_LEFT: u8 = 0x02;
const BIT_UP: u8 = 0x04;
const BIT_DOWN: u8 = 0x08;
const BIT_BUTTON: u8 = 0x10;

/// Logical state of the gamepad wired to the extended I/O port. All bits
/// are active-low; undriven bits (5-7) read as 1.
#[derive(Default)]
pub struct GamepadState {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    button: bool,
    base: u8,
}

impl GamepadState {
    pub fn new() -> Self {
        Self { base: DEFAULT_STATUS, ..Default::default() }
    }

    /// The 8-bit status byte as presented on the bus.
    pub fn read(&self) -> u8 {
        let mut status = self.base;
        if self.right {
            status &= !BIT_RIGHT;
        }
        if self.left {
            status &= !BIT_LEFT;
        }
        if self.up {
            status &= !BIT_UP;
        }
        if self.down {
            status &= !BIT_DOWN;
        }
        if self.button {
            status &= !BIT_BUTTON;
        }
        status
    }

    /// Update the baseline byte the CPU last wrote (used when no directional
    /// input is currently active).
    pub fn write(&mut self, value: u8) {
        self.base = value;
    }

    pub fn set_button(&mut self, pressed: bool) {
        self.button = pressed;
    }

    pub fn set_directions(&mut self, left: bool, right: bool, up: bool, down: bool) {
        self.left = left;
        self.right = right;
        self.up = up;
        self.down = down;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// The JR-100's extended I/O block (0xCC00-0xCFFF). Only the gamepad
/// register at offset 0x02 does anything; every other address reads 0x00
/// and ignores writes.
pub struct ExtendedIo {
    start: u16,
    length: u32,
    gamepad: GamepadState,
}

impl ExtendedIo {
    pub fn new(start: u16, length: u32) -> Self {
        Self { start, length, gamepad: GamepadState::new() }
    }

    pub fn gamepad_mut(&mut self) -> &mut GamepadState {
        &mut self.gamepad
    }

    pub fn set_button(&mut self, pressed: bool) {
        self.gamepad.set_button(pressed);
    }

    pub fn set_directions(&mut self, left: bool, right: bool, up: bool, down: bool) {
        self.gamepad.set_directions(left, right, up, down);
    }

    pub fn reset_gamepad(&mut self) {
        self.gamepad.reset();
    }
}

impl Addressable for ExtendedIo {
    fn start(&self) -> u16 {
        self.start
    }

    fn end(&self) -> u16 {
        self.start + self.length as u16 - 1
    }

    fn load8(&mut self, addr: u16) -> u8 {
        if addr == self.start + GAMEPAD_OFFSET {
            self.gamepad.read()
        } else {
            0x00
        }
    }

    fn store8(&mut self, addr: u16, value: u8) {
        if addr == self.start + GAMEPAD_OFFSET {
            self.gamepad.write(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_gamepad_reads_df() {
        let mut io = ExtendedIo::new(0xCC00, 0x400);
        assert_eq!(io.load8(0xCC02), 0xDF);
    }

    #[test]
    fn direction_and_button_bits_clear_active_low() {
        let mut io = ExtendedIo::new(0xCC00, 0x400);
        io.gamepad_mut().set_directions(true, false, true, false);
        assert_eq!(io.load8(0xCC02), 0xD9);
        io.gamepad_mut().set_button(true);
        assert_eq!(io.load8(0xCC02), 0xC9);
        io.gamepad_mut().set_directions(false, false, false, false);
        io.gamepad_mut().set_button(false);
        assert_eq!(io.load8(0xCC02), 0xDF);
    }

    #[test]
    fn other_offsets_read_zero_and_ignore_writes() {
        let mut io = ExtendedIo::new(0xCC00, 0x400);
        io.store8(0xCC00, 0xFF);
        assert_eq!(io.load8(0xCC00), 0x00);
    }
}
