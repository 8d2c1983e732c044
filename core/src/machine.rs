//! Machine assembly: wires a [`MemoryBus`], the [`Mb8861`] CPU, the
//! [`Via6522`] and the shared [`FontCache`] into one JR-100 and drives it a
//! frame at a time.
//!
//! The address map and the `run_frame` cycle coupler both follow the
//! reference port's `create_machine`/`_step_cpu` pair: RAM at the bottom of
//! the space, UDC-RAM and video RAM sharing one font cache, the VIA and
//! extended I/O block above that, and the BASIC ROM filling the top 8 KiB.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::bus::{AddressableHandle, ExtendedIo, MemoryBus, Ram, Rom, UdcRam, VideoRam};
use crate::cpu::state::{CpuStateTrait, Mb8861State};
use crate::cpu::{InterruptLatches, Mb8861};
use crate::error::IllegalOpcode;
use crate::event_queue::{Event, EventQueue};
use crate::font_cache::FontCache;
use crate::keyboard::KeyboardMatrix;
use crate::via::Via6522;

const UDC_RAM_START: u16 = 0xC000;
const UDC_RAM_LENGTH: u32 = 0x0100;
const VIDEO_RAM_START: u16 = 0xC100;
const VIDEO_RAM_LENGTH: u32 = 0x0300;
const VIA_START: u16 = 0xC800;
const EXTENDED_IO_START: u16 = 0xCC00;
const EXTENDED_IO_LENGTH: u32 = 0x0400;
const ROM_START: u16 = 0xE000;
const ROM_LENGTH: u32 = 0x2000;

/// CPU clock, 60 Hz frame rate, and the integer-divided per-frame cycle
/// budget the reference port derives from them.
const CPU_HZ: u64 = 894_886;
const FRAME_RATE: u64 = 60;
const CYCLES_PER_FRAME: u32 = (CPU_HZ / FRAME_RATE) as u32;

/// `run_frame` hands the VIA an idle chunk of at most this many cycles
/// whenever `step()` retires nothing (`WAI`-latched or halted), so a VIA
/// timer due mid-idle still fires on time instead of waiting for the whole
/// remaining budget to elapse at once.
const MAX_IDLE_CHUNK: u32 = 32;

/// Onboard RAM capacity. The JR-100 shipped with 4 KiB but the near-universal
/// 16 KiB/32 KiB extension boards are what every surviving ROM and program
/// image assumes, so only those two sizes are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamSize {
    Standard16K,
    Extended32K,
}

impl RamSize {
    fn bytes(self) -> u32 {
        match self {
            RamSize::Standard16K => 0x4000,
            RamSize::Extended32K => 0x8000,
        }
    }
}

pub type BuzzerCallback = Box<dyn FnMut(bool, f64)>;
pub type FontPlaneCallback = Box<dyn FnMut(bool)>;

/// A fully wired JR-100: memory map, CPU, VIA and font cache, plus the
/// lifecycle queue that serializes reset/pause/resume/power-off requests to
/// frame boundaries.
pub struct Jr100 {
    bus: MemoryBus,
    cpu: Mb8861,
    via: Rc<RefCell<Via6522>>,
    font_cache: Rc<RefCell<FontCache>>,
    keyboard: Rc<RefCell<KeyboardMatrix>>,
    gamepad: Rc<RefCell<ExtendedIo>>,
    rom: Rc<RefCell<Rom>>,
    events: EventQueue,
    clock: u64,
    powered: bool,
    running: bool,
}

impl Jr100 {
    /// Assemble a fresh machine. `set_buzzer`/`select_font_plane` are the
    /// host callbacks the VIA drives on timer-1 buzzer changes and port-B
    /// font-plane-select writes; both are infallible closures, so there is
    /// no `HostCallbackFailure` to report back through this API.
    pub fn new(
        ram_size: RamSize,
        set_buzzer: BuzzerCallback,
        select_font_plane: FontPlaneCallback,
    ) -> Self {
        let mut bus = MemoryBus::new();
        bus.allocate_space(0x1_0000).expect("64K address space always allocates");

        let ram: AddressableHandle = Rc::new(RefCell::new(Ram::new(0x0000, ram_size.bytes())));
        bus.register_memory(ram).expect("RAM fits below 0x8000");

        let font_cache = Rc::new(RefCell::new(FontCache::new()));

        let udc: AddressableHandle =
            Rc::new(RefCell::new(UdcRam::new(UDC_RAM_START, UDC_RAM_LENGTH, font_cache.clone())));
        bus.register_memory(udc).expect("UDC-RAM region is fixed and in range");

        let vram: AddressableHandle = Rc::new(RefCell::new(VideoRam::new(
            VIDEO_RAM_START,
            VIDEO_RAM_LENGTH,
            font_cache.clone(),
        )));
        bus.register_memory(vram).expect("video RAM region is fixed and in range");

        let gamepad = Rc::new(RefCell::new(ExtendedIo::new(EXTENDED_IO_START, EXTENDED_IO_LENGTH)));
        let gamepad_handle: AddressableHandle = gamepad.clone();
        bus.register_memory(gamepad_handle).expect("extended I/O region is fixed and in range");

        let rom = Rc::new(RefCell::new(Rom::new(ROM_START, ROM_LENGTH)));
        let rom_handle: AddressableHandle = rom.clone();
        bus.register_memory(rom_handle).expect("ROM region is fixed and in range");

        let keyboard = Rc::new(RefCell::new(KeyboardMatrix::new()));
        let latches = InterruptLatches::new();

        let via = Rc::new(RefCell::new(Via6522::new(
            VIA_START,
            keyboard.clone(),
            latches.clone(),
            set_buzzer,
            select_font_plane,
        )));
        let via_handle: AddressableHandle = via.clone();
        bus.register_memory(via_handle).expect("VIA region is fixed and in range");

        let cpu = Mb8861::new(latches);

        Self {
            bus,
            cpu,
            via,
            font_cache,
            keyboard,
            gamepad,
            rom,
            events: EventQueue::new(),
            clock: 0,
            powered: true,
            running: true,
        }
    }

    /// Load a BASIC ROM image into the top 8 KiB and seed the font cache's
    /// ROM-backed half (codes `0x00..=0x7F`) from the same bytes, matching
    /// how the reference port's `_build_font_set` reads glyph data straight
    /// back out of mapped ROM.
    pub fn load_rom_image(&mut self, image: &[u8]) {
        self.rom.borrow_mut().load_image(image);
        self.font_cache.borrow_mut().initialize_rom(image);
    }

    /// Access the memory bus directly — used by loaders to write a PROG or
    /// BASIC text image before the machine starts running.
    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    pub fn keyboard_mut(&mut self) -> KeyboardGuard<'_> {
        KeyboardGuard { keyboard: &self.keyboard, via: &self.via }
    }

    pub fn gamepad_mut(&mut self) -> std::cell::RefMut<'_, ExtendedIo> {
        self.gamepad.borrow_mut()
    }

    pub fn font_cache(&self) -> Ref<'_, FontCache> {
        self.font_cache.borrow()
    }

    /// Snapshot the CPU register file, for debugging tools and integration
    /// tests that need to see past the bus into register state.
    pub fn cpu_snapshot(&self) -> Mb8861State {
        self.cpu.snapshot()
    }

    /// Request a reset at the next frame boundary. Lifecycle requests never
    /// apply mid-frame.
    pub fn reset(&mut self) {
        self.events.schedule(self.clock, Event::Reset);
    }

    pub fn power_off(&mut self) {
        self.events.schedule(self.clock, Event::PowerOff);
    }

    pub fn pause(&mut self) {
        self.events.schedule(self.clock, Event::Pause);
    }

    pub fn resume(&mut self) {
        self.events.schedule(self.clock, Event::Resume);
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the machine by one frame's worth of cycles (`CYCLES_PER_FRAME`,
    /// the integer-divided `CPU_HZ / FRAME_RATE`), draining any due lifecycle
    /// events first.
    ///
    /// Returns the illegal opcode if `step()` ever hits one; the reference
    /// port's UI loop treats this as fatal and stops scheduling CPU work, so
    /// this does too — `powered` drops to `false` and the caller must not
    /// call `run_frame` again without a fresh [`Jr100`].
    pub fn run_frame(&mut self) -> Result<(), IllegalOpcode> {
        if !self.powered {
            return Ok(());
        }

        self.drain_due_events();

        if !self.powered || !self.running {
            return Ok(());
        }

        let mut cycles = 0u32;
        while cycles < CYCLES_PER_FRAME {
            match self.cpu.step(&self.bus) {
                Ok(0) => {
                    let remaining = CYCLES_PER_FRAME - cycles;
                    let idle_chunk = remaining.min(MAX_IDLE_CHUNK);
                    self.via.borrow_mut().tick(idle_chunk);
                    cycles += idle_chunk;
                }
                Ok(executed) => {
                    self.via.borrow_mut().tick(executed);
                    cycles += executed;
                }
                Err(illegal) => {
                    self.powered = false;
                    self.clock += cycles as u64;
                    return Err(illegal);
                }
            }
        }
        self.clock += cycles as u64;
        Ok(())
    }

    fn drain_due_events(&mut self) {
        while let Some(event) = self.events.pop_due(self.clock) {
            match event {
                Event::Reset => {
                    self.cpu.reset(&self.bus);
                    self.running = true;
                }
                Event::Pause => self.running = false,
                Event::Resume => self.running = true,
                Event::PowerOff => {
                    self.powered = false;
                    self.running = false;
                }
            }
        }
    }
}

/// Mutable access to the keyboard matrix that also re-synchronizes the
/// VIA's port-B row cache on drop, since the VIA only recomputes its
/// composed port-B value when told a key changed — it has no way to notice
/// a direct write to the shared [`KeyboardMatrix`] on its own.
pub struct KeyboardGuard<'a> {
    keyboard: &'a Rc<RefCell<KeyboardMatrix>>,
    via: &'a Rc<RefCell<Via6522>>,
}

impl KeyboardGuard<'_> {
    pub fn set_key(&mut self, row: usize, bit: u8, pressed: bool) {
        self.keyboard.borrow_mut().set_key(row, bit, pressed);
        self.via.borrow_mut().notify_keyboard_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> Jr100 {
        Jr100::new(RamSize::Standard16K, Box::new(|_, _| {}), Box::new(|_| {}))
    }

    #[test]
    fn reset_vector_drives_initial_pc() {
        let mut jr = machine();
        let mut image = vec![0u8; 0x2000];
        // Restart vector lives at 0xFFFE, offset 0x1FFE into the ROM image.
        image[0x1FFE] = 0x12;
        image[0x1FFF] = 0x34;
        jr.load_rom_image(&image);
        jr.reset();
        jr.run_frame().unwrap();
        assert_eq!(jr.cpu.pc, 0x1234);
    }

    #[test]
    fn power_off_stops_scheduling_cpu_work() {
        let mut jr = machine();
        jr.power_off();
        jr.run_frame().unwrap();
        assert!(!jr.is_powered());
        let cycles_before = jr.cpu.cycle_count;
        jr.run_frame().unwrap();
        assert_eq!(jr.cpu.cycle_count, cycles_before);
    }

    #[test]
    fn pause_then_resume_gates_cpu_execution() {
        let mut jr = machine();
        // NOP at the (zeroed) restart vector's target, so `run_frame` has
        // something legal to keep fetching.
        jr.bus().store8(0x0000, 0x01);
        jr.reset();
        jr.run_frame().unwrap();
        jr.pause();
        jr.run_frame().unwrap();
        let idle_cycles = jr.cpu.cycle_count;
        jr.run_frame().unwrap();
        assert_eq!(jr.cpu.cycle_count, idle_cycles);
        jr.resume();
        jr.run_frame().unwrap();
        assert!(jr.cpu.cycle_count > idle_cycles);
    }

    #[test]
    fn illegal_opcode_powers_the_machine_off() {
        let mut jr = machine();
        // 0x00 has no handler in the MB8861 opcode table; the restart
        // vector is zeroed (unloaded ROM), so reset already lands PC here.
        jr.bus().store8(0x0000, 0x00);
        jr.reset();
        let result = jr.run_frame();
        assert!(result.is_err());
        assert!(!jr.is_powered());
    }

    #[test]
    fn font_cache_reflects_loaded_rom_image() {
        let mut jr = machine();
        let mut image = vec![0u8; 0x2000];
        image[0] = 0xAB;
        jr.load_rom_image(&image);
        assert_eq!(jr.font_cache().glyph(0x00)[0], 0xAB);
    }

    #[test]
    fn gamepad_register_reads_through_bus() {
        let mut jr = machine();
        jr.gamepad_mut().set_button(true);
        assert_eq!(jr.bus().load8(0xCC02), 0xCF);
    }
}
