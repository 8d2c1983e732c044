//! Stack push/pull primitives and the opcodes built directly on them:
//! `PSHA`/`PSHB`/`PULA`/`PULB`, `WAI`, `SWI`, `RTI`.
//!
//! `BSR`/`JSR`/`RTS` also push and pop a return address but live in
//! [`super::branch`] next to the jump logic they pair with; they share the
//! same [`Mb8861::push16`]/[`Mb8861::pop16`] helpers defined here.

use super::opcodes::Mode;
use super::{CcFlag, Mb8861, SWI_VECTOR};
use crate::bus::MemoryBus;

impl Mb8861 {
    pub(crate) fn push8(&mut self, bus: &MemoryBus, value: u8) {
        bus.store8(self.sp, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pop8(&mut self, bus: &MemoryBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.load8(self.sp)
    }

    /// Pushes the low byte first, then the high byte — matching the byte
    /// order `BSR`/`JSR`/interrupt entry all rely on (the low byte ends up
    /// at the higher address, the high byte just below it).
    pub(crate) fn push16(&mut self, bus: &MemoryBus, value: u16) {
        self.push8(bus, value as u8);
        self.push8(bus, (value >> 8) as u8);
    }

    pub(crate) fn pop16(&mut self, bus: &MemoryBus) -> u16 {
        let hi = self.pop8(bus) as u16;
        let lo = self.pop8(bus) as u16;
        (hi << 8) | lo
    }

    /// Full register-file push used by `SWI` and by hardware NMI/IRQ entry
    /// in [`Mb8861::step`]: `PC`, `X`, `A`, `B`, `CC`, in that order.
    pub(crate) fn push_all(&mut self, bus: &MemoryBus) {
        self.push16(bus, self.pc);
        self.push16(bus, self.x);
        self.push8(bus, self.a);
        self.push8(bus, self.b);
        self.push8(bus, self.cc);
    }

    /// Reverses [`Mb8861::push_all`], used by `RTI`.
    pub(crate) fn pull_all(&mut self, bus: &MemoryBus) {
        self.cc = self.pop8(bus);
        self.b = self.pop8(bus);
        self.a = self.pop8(bus);
        self.x = self.pop16(bus);
        self.pc = self.pop16(bus);
    }
}

pub(crate) fn op_psha(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.push8(bus, cpu.a);
    0
}

pub(crate) fn op_pshb(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.push8(bus, cpu.b);
    0
}

pub(crate) fn op_pula(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.a = cpu.pop8(bus);
    0
}

pub(crate) fn op_pulb(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.b = cpu.pop8(bus);
    0
}

/// `WAI` (0x3E): latch the wait state. The register file is *not* pushed
/// here — `Mb8861::step` pushes it once, uniformly, at the moment an
/// interrupt is actually serviced, whether that happens mid-execution or
/// while `wai_latch` is set.
pub(crate) fn op_wai(cpu: &mut Mb8861, _bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.wai_latch = true;
    0
}

/// `SWI` (0x3F): software interrupt. `PC` is advanced one extra byte past
/// the opcode fetch before the register file is pushed — the MB8861
/// datasheet's return address for `SWI` lands one past where a hardware
/// interrupt would, and `RTI` relies on that placement. Always pushes the
/// full register file and vectors through `0xFFFA`, regardless of the `I`
/// mask.
pub(crate) fn op_swi(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.pc = cpu.pc.wrapping_add(1);
    cpu.push_all(bus);
    cpu.set_flag(CcFlag::I, true);
    cpu.pc = bus.load16(SWI_VECTOR);
    0
}

/// `RTI` (0x3B): restore the register file pushed by `SWI` or by hardware
/// interrupt entry, and clear `WAI`'s latch so a stale wait doesn't survive
/// the interrupt that woke the CPU from it.
pub(crate) fn op_rti(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.pull_all(bus);
    cpu.wai_latch = false;
    0
}
