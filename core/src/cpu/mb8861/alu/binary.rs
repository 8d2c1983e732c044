//! Two-operand accumulator ALU ops: `ADD`/`ADC`/`SUB`/`SBC`/`AND`/`ORA`/
//! `EOR`/`CMP`/`BIT`, one handler per accumulator, shared across every
//! addressing mode via [`Mb8861::read8`].

use super::super::opcodes::Mode;
use super::super::Mb8861;
use crate::bus::MemoryBus;

pub(crate) fn op_adda(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.a = cpu.add8(cpu.a, operand, false);
    0
}

pub(crate) fn op_addb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.b = cpu.add8(cpu.b, operand, false);
    0
}

pub(crate) fn op_adca(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    let carry = cpu.flag(super::super::CcFlag::C);
    cpu.a = cpu.add8(cpu.a, operand, carry);
    0
}

pub(crate) fn op_adcb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    let carry = cpu.flag(super::super::CcFlag::C);
    cpu.b = cpu.add8(cpu.b, operand, carry);
    0
}

pub(crate) fn op_suba(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.a = cpu.sub8(cpu.a, operand, false);
    0
}

pub(crate) fn op_subb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.b = cpu.sub8(cpu.b, operand, false);
    0
}

pub(crate) fn op_sbca(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    let borrow = cpu.flag(super::super::CcFlag::C);
    cpu.a = cpu.sub8(cpu.a, operand, borrow);
    0
}

pub(crate) fn op_sbcb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    let borrow = cpu.flag(super::super::CcFlag::C);
    cpu.b = cpu.sub8(cpu.b, operand, borrow);
    0
}

pub(crate) fn op_cmpa(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.sub8(cpu.a, operand, false);
    0
}

pub(crate) fn op_cmpb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.sub8(cpu.b, operand, false);
    0
}

pub(crate) fn op_anda(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.a &= operand;
    cpu.set_flags_logical(cpu.a);
    0
}

pub(crate) fn op_andb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.b &= operand;
    cpu.set_flags_logical(cpu.b);
    0
}

pub(crate) fn op_oraa(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.a |= operand;
    cpu.set_flags_logical(cpu.a);
    0
}

pub(crate) fn op_orab(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.b |= operand;
    cpu.set_flags_logical(cpu.b);
    0
}

pub(crate) fn op_eora(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.a ^= operand;
    cpu.set_flags_logical(cpu.a);
    0
}

pub(crate) fn op_eorb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.b ^= operand;
    cpu.set_flags_logical(cpu.b);
    0
}

pub(crate) fn op_bita(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.set_flags_logical(cpu.a & operand);
    0
}

pub(crate) fn op_bitb(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let operand = cpu.read8(bus, mode);
    cpu.set_flags_logical(cpu.b & operand);
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{AddressableHandle, Ram};
    use crate::cpu::interrupt::InterruptLatches;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fresh_bus() -> MemoryBus {
        let mut bus = MemoryBus::new();
        bus.allocate_space(0x1_0000).unwrap();
        let ram: AddressableHandle = Rc::new(RefCell::new(Ram::new(0x0000, 0x1_0000)));
        bus.register_memory(ram).unwrap();
        bus
    }

    fn cpu() -> Mb8861 {
        Mb8861::new(InterruptLatches::new())
    }

    #[test]
    fn adda_immediate_adds_and_advances_pc() {
        let bus = fresh_bus();
        bus.store8(0x0000, 0x2A);
        let mut cpu = cpu();
        cpu.pc = 0x0000;
        cpu.a = 0x01;
        op_adda(&mut cpu, &bus, Mode::Immediate);
        assert_eq!(cpu.a, 0x2B);
        assert_eq!(cpu.pc, 0x0001);
    }

    #[test]
    fn bita_does_not_modify_accumulator() {
        let bus = fresh_bus();
        bus.store8(0x0000, 0x0F);
        let mut cpu = cpu();
        cpu.pc = 0x0000;
        cpu.a = 0xF0;
        op_bita(&mut cpu, &bus, Mode::Immediate);
        assert_eq!(cpu.a, 0xF0);
        assert!(cpu.flag(super::super::CcFlag::Z));
    }

    #[test]
    fn sbcb_subtracts_carry_too() {
        let bus = fresh_bus();
        bus.store8(0x0000, 0x01);
        let mut cpu = cpu();
        cpu.pc = 0x0000;
        cpu.b = 0x05;
        cpu.set_flag(super::super::CcFlag::C, true);
        op_sbcb(&mut cpu, &bus, Mode::Immediate);
        assert_eq!(cpu.b, 0x03);
    }
}
