//! The VIA6522 peripheral (0xC800-0xC80F): timers, the keyboard matrix,
//! the cassette/buzzer line and the UDC/VRAM font-plane select, all wired
//! the way the JR-100 motherboard wires them.
//!
//! The tick loop advances one clock cycle at a time rather than in bulk,
//! since `WAI`-driven idle chunks and timer reloads both need cycle-accurate
//! interleaving with the CPU.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::Addressable;
use crate::cpu::interrupt::InterruptLatches;
use crate::keyboard::KeyboardMatrix;

/// CPU clock, in Hz, that the timer-1 buzzer frequency is derived from.
pub const CLOCK_HZ: f64 = 894_886.25;

const IFR_CA2: u8 = 0x01;
const IFR_CA1: u8 = 0x02;
const IFR_SR: u8 = 0x04;
const IFR_CB2: u8 = 0x08;
const IFR_CB1: u8 = 0x10;
const IFR_T2: u8 = 0x20;
const IFR_T1: u8 = 0x40;
const IFR_IRQ: u8 = 0x80;

/// Port-B bit the JR-100 wires to the video/UDC font-plane select line.
const FONT_SELECT_BIT: u8 = 0x20;

/// `set_buzzer(enabled, frequency_hz)` and `select_font_plane(use_vram_plane)`
/// are both infallible — there is no `HostCallbackFailure` to report for
/// this port, unlike an embedder that can reject a callback.
type BuzzerCallback = Box<dyn FnMut(bool, f64)>;
type FontPlaneCallback = Box<dyn FnMut(bool)>;

pub struct Via6522 {
    start: u16,
    keyboard: Rc<RefCell<KeyboardMatrix>>,
    latches: InterruptLatches,
    set_buzzer: BuzzerCallback,
    select_font_plane: FontPlaneCallback,

    ora: u8,
    orb: u8,
    ira: u8,
    irb: u8,
    ddr_a: u8,
    ddr_b: u8,
    acr: u8,
    pcr: u8,
    ifr: u8,
    ier: u8,
    sr: u8,

    t1: i32,
    t1_latch: u16,
    t2: i32,
    t2_latch: u16,

    ca1: bool,
    ca2: bool,
    ca2_timer: i32,

    timer1_initialized: bool,
    timer1_enable: bool,
    timer2_enable: bool,
    previous_pb6: bool,
    pb7: bool,
    port_b_value: u8,
}

impl Via6522 {
    pub fn new(
        start: u16,
        keyboard: Rc<RefCell<KeyboardMatrix>>,
        latches: InterruptLatches,
        set_buzzer: BuzzerCallback,
        select_font_plane: FontPlaneCallback,
    ) -> Self {
        let mut via = Self {
            start,
            keyboard,
            latches,
            set_buzzer,
            select_font_plane,
            ora: 0,
            orb: 0,
            ira: 0,
            irb: 0,
            ddr_a: 0,
            ddr_b: 0,
            acr: 0,
            pcr: 0,
            ifr: 0,
            // The JR-100 ROM relies on CA1 (keyboard row strobe) being
            // enabled from power-on; it never writes IER itself for this bit.
            ier: IFR_CA1,
            sr: 0,
            t1: 0xFFFF,
            t1_latch: 0xFFFF,
            t2: 0xFFFF,
            t2_latch: 0xFFFF,
            ca1: true,
            ca2: true,
            ca2_timer: -1,
            timer1_initialized: false,
            timer1_enable: false,
            timer2_enable: false,
            previous_pb6: true,
            pb7: true,
            port_b_value: 0,
        };
        via.compose_port_b();
        via
    }

    /// Advance the VIA by exactly `cycles` clock ticks. Called by the cycle
    /// coupler with however many cycles the CPU just retired (including the
    /// bounded idle chunks it hands out while `WAI`-latched).
    pub fn tick(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.tick_one();
        }
    }

    /// Recompute port-B/CA1 from the keyboard matrix. Called by the machine
    /// assembly whenever a key changes state, since the row refresh must
    /// happen on any key event, not only on an ORA write.
    pub fn notify_keyboard_changed(&mut self) {
        self.refresh_keyboard_row();
    }

    fn tick_one(&mut self) {
        if self.ca2_timer > 0 {
            self.ca2_timer -= 1;
            if self.ca2_timer == 0 {
                self.ca2 = true;
            }
        }

        if self.timer1_initialized {
            self.timer1_initialized = false;
        } else if self.timer1_enable {
            self.t1 -= 1;
            if self.t1 < 0 {
                self.raise_ifr(IFR_T1);
                match self.acr & 0xC0 {
                    0x00 => {
                        // One-shot, no PB7 output: fire once, then disable.
                        self.timer1_enable = false;
                        self.update_buzzer(false);
                    }
                    0x40 => {
                        // Free-running, PB7 toggles every underflow.
                        self.toggle_pb7();
                    }
                    0x80 => {
                        // One-shot with a single PB7 pulse, then disable high.
                        self.timer1_enable = false;
                        self.pb7 = true;
                        self.compose_port_b();
                        self.update_buzzer(false);
                    }
                    0xC0 => {
                        // Continuous square wave: the buzzer drive mode.
                        self.toggle_pb7();
                    }
                    _ => unreachable!(),
                }
                self.t1 = self.t1_latch as i32;
            }
        }

        if self.acr & 0x20 == 0 {
            if self.timer2_enable {
                self.t2 -= 1;
                if self.t2 < 0 {
                    self.raise_ifr(IFR_T2);
                    self.timer2_enable = false;
                    self.t2 = self.t2_latch as i32;
                }
            }
        } else {
            let current_pb6 = self.port_b_value & 0x40 != 0;
            if self.previous_pb6 && !current_pb6 && self.timer2_enable {
                self.t2 -= 1;
                if self.t2 < 0 {
                    self.raise_ifr(IFR_T2);
                    self.timer2_enable = false;
                    self.t2 = self.t2_latch as i32;
                }
            }
            self.previous_pb6 = current_pb6;
        }

        // Shift-register / CB1 free-running modes: the JR-100 ROM never
        // configures the shift register, so there is nothing to advance.
    }

    fn toggle_pb7(&mut self) {
        self.pb7 = !self.pb7;
        self.compose_port_b();
    }

    fn raise_ifr(&mut self, mask: u8) {
        if self.ifr & mask != 0 {
            return;
        }
        self.ifr |= mask;
        self.recompute_irq();
    }

    fn clear_ifr(&mut self, mask: u8) {
        let mask = if mask & IFR_IRQ != 0 { 0x7F } else { mask };
        if self.ifr & mask == 0 {
            return;
        }
        self.ifr &= !mask;
        self.recompute_irq();
    }

    fn recompute_irq(&mut self) {
        let was_active = self.ifr & IFR_IRQ != 0;
        let active = self.ifr & self.ier & 0x7F != 0;
        if active {
            self.ifr |= IFR_IRQ;
        } else {
            self.ifr &= !IFR_IRQ;
        }
        if active && !was_active {
            self.latches.request_irq();
        } else if !active && was_active {
            self.latches.clear_irq();
        }
    }

    fn update_buzzer(&mut self, enabled: bool) {
        let frequency = if enabled {
            CLOCK_HZ / (2.0 * (self.t1_latch as f64 + 2.0))
        } else {
            0.0
        };
        (self.set_buzzer)(enabled, frequency);
    }

    fn notify_font_change(&mut self) {
        (self.select_font_plane)(self.orb & FONT_SELECT_BIT != 0);
    }

    /// Port-B composition: externally driven bits (keyboard row, `PB7`
    /// timer output) merge with `ORB`'s output bits per `DDRB`, `PB6`
    /// mirrors `PB7` (the JR-100's motherboard jumper), and `IRB` only
    /// latches the result when `ACR[1]` has latching disabled.
    fn compose_port_b(&mut self) {
        let keyboard_bits = self.keyboard_input_bits() & 0x1F;
        let mut input = keyboard_bits;
        if self.pb7 {
            input |= 0x80;
        }
        let mut value = (input & !self.ddr_b) | (self.orb & self.ddr_b);
        if value & 0x80 != 0 {
            value |= 0x40;
        } else {
            value &= !0x40;
        }
        self.port_b_value = value;
        if self.acr & 0x02 == 0 {
            self.irb = value;
        }
    }

    fn keyboard_input_bits(&self) -> u8 {
        let row = (self.ora & 0x0F) as usize;
        let pressed = self.keyboard.borrow().snapshot()[row] & 0x1F;
        !pressed & 0x1F
    }

    fn compose_port_a(&mut self) -> u8 {
        // Port A has no external drivers on the JR-100; undriven bits are
        // pulled high.
        let value = (0xFFu8 & !self.ddr_a) | (self.ora & self.ddr_a);
        if self.acr & 0x01 == 0 {
            self.ira = value;
        }
        value
    }

    fn refresh_keyboard_row(&mut self) {
        self.compose_port_b();
        let row = (self.ora & 0x0F) as usize;
        let any_pressed = self.keyboard.borrow().snapshot()[row] & 0x1F != 0;
        self.update_ca1(any_pressed);
    }

    /// `CA1` is driven low while any key in the selected row is pressed.
    /// A transition only raises `IFR.CA1` when it matches the edge polarity
    /// `PCR[0]` selects (0 = falling edge, 1 = rising edge).
    fn update_ca1(&mut self, key_pressed: bool) {
        let new_level = !key_pressed;
        if new_level == self.ca1 {
            return;
        }
        self.ca1 = new_level;
        let trigger_on_rising = self.pcr & 0x01 != 0;
        if new_level == trigger_on_rising {
            self.raise_ifr(IFR_CA1);
        }
    }

    fn ca2_handshake_enabled(&self) -> bool {
        self.pcr & 0x0E == 0x08
    }

    fn handle_ca2_handshake(&mut self) {
        if self.ca2_handshake_enabled() {
            self.ca2 = false;
            self.ca2_timer = 1;
        }
    }

    fn read_io_rb(&mut self) -> u8 {
        // CA1/CA2 clear only on the IORA read; IORB clears CB1/CB2 instead.
        // The JR-100 never drives CB2 handshake, so both clear
        // unconditionally here.
        self.clear_ifr(IFR_CB1 | IFR_CB2);
        self.irb
    }

    fn write_io_rb(&mut self, value: u8) {
        self.orb = value;
        self.compose_port_b();
        self.clear_ifr(IFR_CB1 | IFR_CB2);
        self.notify_font_change();
    }

    fn read_io_ra(&mut self) -> u8 {
        self.clear_ifr(IFR_CA1 | IFR_CA2);
        self.handle_ca2_handshake();
        self.compose_port_a()
    }

    fn write_io_ra(&mut self, value: u8) {
        self.ora = value;
        self.refresh_keyboard_row();
        self.handle_ca2_handshake();
    }

    fn write_t1ch(&mut self, value: u8) {
        self.t1_latch = (self.t1_latch & 0x00FF) | ((value as u16) << 8);
        self.t1 = self.t1_latch as i32;
        self.timer1_initialized = true;
        self.timer1_enable = true;
        self.pb7 = false;
        self.compose_port_b();
        self.clear_ifr(IFR_T1);
        let square_wave = self.acr & 0xC0 == 0xC0;
        self.update_buzzer(square_wave);
    }

    fn write_t2ch(&mut self, value: u8) {
        self.t2_latch = (self.t2_latch & 0x00FF) | ((value as u16) << 8);
        self.t2 = self.t2_latch as i32;
        self.timer2_enable = true;
        self.clear_ifr(IFR_T2);
    }

    fn write_acr(&mut self, value: u8) {
        let was_square_wave = self.acr & 0xC0 == 0xC0;
        self.acr = value;
        self.compose_port_b();
        if was_square_wave && self.acr & 0xC0 != 0xC0 {
            self.update_buzzer(false);
        }
    }

    fn write_ier(&mut self, value: u8) {
        if value & 0x80 != 0 {
            self.ier |= value & 0x7F;
        } else {
            self.ier &= !(value & 0x7F);
        }
        self.recompute_irq();
    }
}

impl Addressable for Via6522 {
    fn start(&self) -> u16 {
        self.start
    }

    fn end(&self) -> u16 {
        self.start + 0x0F
    }

    fn load8(&mut self, addr: u16) -> u8 {
        match addr - self.start {
            0x00 => self.read_io_rb(),
            0x01 => self.read_io_ra(),
            0x02 => self.ddr_b,
            0x03 => self.ddr_a,
            0x04 => {
                let value = self.t1 as u16 as u8;
                self.clear_ifr(IFR_T1);
                value
            }
            0x05 => (self.t1 as u16 >> 8) as u8,
            0x06 => self.t1_latch as u8,
            0x07 => (self.t1_latch >> 8) as u8,
            0x08 => {
                let value = self.t2 as u16 as u8;
                self.clear_ifr(IFR_T2);
                value
            }
            0x09 => (self.t2 as u16 >> 8) as u8,
            0x0A => self.sr,
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.ifr,
            0x0E => self.ier | 0x80,
            0x0F => self.compose_port_a(),
            _ => 0x00,
        }
    }

    fn store8(&mut self, addr: u16, value: u8) {
        match addr - self.start {
            0x00 => self.write_io_rb(value),
            0x01 => self.write_io_ra(value),
            0x02 => {
                self.ddr_b = value;
                self.compose_port_b();
                self.notify_font_change();
            }
            0x03 => self.ddr_a = value,
            0x04 => self.t1_latch = (self.t1_latch & 0xFF00) | value as u16,
            0x05 => self.write_t1ch(value),
            0x06 => self.t1_latch = (self.t1_latch & 0xFF00) | value as u16,
            0x07 => self.t1_latch = (self.t1_latch & 0x00FF) | ((value as u16) << 8),
            0x08 => self.t2_latch = (self.t2_latch & 0xFF00) | value as u16,
            0x09 => self.write_t2ch(value),
            0x0A => self.sr = value,
            0x0B => self.write_acr(value),
            0x0C => {
                self.pcr = value;
                self.refresh_keyboard_row();
            }
            0x0D => self.clear_ifr(value),
            0x0E => self.write_ier(value),
            0x0F => self.write_io_ra(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn via() -> Via6522 {
        Via6522::new(
            0xC800,
            Rc::new(RefCell::new(KeyboardMatrix::new())),
            InterruptLatches::new(),
            Box::new(|_, _| {}),
            Box::new(|_| {}),
        )
    }

    #[test]
    fn ifr_irq_bit_mirrors_enabled_pending_bits() {
        let mut via = via();
        via.store8(0xC80E, 0x80 | IFR_T1); // enable T1
        via.raise_ifr(IFR_T1);
        assert_eq!(via.load8(0xC80D) & IFR_IRQ, IFR_IRQ);
        via.load8(0xC804); // clear T1 via T1CL read
        assert_eq!(via.load8(0xC80D) & IFR_IRQ, 0);
    }

    #[test]
    fn timer1_square_wave_toggles_pb7_and_sets_ifr() {
        let mut via = via();
        via.store8(0xC80B, 0xC0); // ACR: continuous, square-wave PB7
        via.store8(0xC806, 0x10); // T1LL
        via.store8(0xC807, 0x00); // T1LH
        via.store8(0xC805, 0x00); // T1CH: load + arm
        assert_eq!(via.port_b_value & 0x80, 0); // driven low by the T1CH write

        via.tick(0x14);
        assert_ne!(via.ifr & IFR_T1, 0);
        assert_ne!(via.port_b_value & 0x80, 0);
        assert_ne!(via.port_b_value & 0x40, 0); // PB6 mirrors PB7

        via.tick(0x14);
        assert_eq!(via.port_b_value & 0x80, 0);
        assert_eq!(via.port_b_value & 0x40, 0);
    }

    #[test]
    fn timer2_one_shot_fires_once_then_stays_disarmed() {
        let mut via = via();
        via.store8(0xC808, 0x10); // T2CL
        via.store8(0xC809, 0x00); // T2CH: load + arm

        via.tick(0x11);
        assert_ne!(via.ifr & IFR_T2, 0);

        via.load8(0xC808); // T2CL read clears IFR.T2
        assert_eq!(via.ifr & IFR_T2, 0);

        via.tick(0x10);
        assert_eq!(via.ifr & IFR_T2, 0);
    }

    #[test]
    fn keyboard_press_drives_ca1_and_clears_only_on_iora_read() {
        let keyboard = Rc::new(RefCell::new(KeyboardMatrix::new()));
        let mut via = Via6522::new(
            0xC800,
            keyboard.clone(),
            InterruptLatches::new(),
            Box::new(|_, _| {}),
            Box::new(|_| {}),
        );
        via.store8(0xC801, 0x00); // select row 0

        keyboard.borrow_mut().set_key(0, 0, true);
        via.notify_keyboard_changed();
        assert_ne!(via.ifr & IFR_CA1, 0);
        assert_eq!(via.port_b_value & 0x01, 0); // active-low pressed bit

        via.load8(0xC800); // IORB read must NOT clear CA1
        assert_ne!(via.ifr & IFR_CA1, 0);

        via.load8(0xC801); // IORA read clears it
        assert_eq!(via.ifr & IFR_CA1, 0);

        keyboard.borrow_mut().set_key(0, 0, false);
        via.notify_keyboard_changed();
        assert_ne!(via.port_b_value & 0x01, 0);
    }

    #[test]
    fn font_select_callback_fires_on_orb_write() {
        let selected = Rc::new(RefCell::new(false));
        let selected_clone = selected.clone();
        let mut via = Via6522::new(
            0xC800,
            Rc::new(RefCell::new(KeyboardMatrix::new())),
            InterruptLatches::new(),
            Box::new(|_, _| {}),
            Box::new(move |plane| *selected_clone.borrow_mut() = plane),
        );
        via.store8(0xC803, 0xFF); // DDRB all-output
        via.store8(0xC800, 0x20); // ORB bit 5 set
        assert!(*selected.borrow());
        via.store8(0xC800, 0x00);
        assert!(!*selected.borrow());
    }

    #[test]
    fn ier_read_always_reports_bit7_set() {
        let mut via = via();
        via.store8(0xC80E, 0x00); // disable-all write has bit7 clear
        assert_eq!(via.load8(0xC80E) & 0x80, 0x80);
    }
}
