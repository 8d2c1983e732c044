//! Relative branches, `BSR`/`JSR`/`JMP`/`RTS`.
//!
//! Every relative branch consumes its displacement byte whether or not the
//! condition holds, including `BRN` (branch never), which the JR-100 ROM
//! never executes but real MB8861 silicon still decodes.

use super::opcodes::Mode;
use super::{CcFlag, Mb8861};
use crate::bus::MemoryBus;

fn branch(cpu: &mut Mb8861, bus: &MemoryBus, condition: bool) -> u32 {
    let target = cpu.branch_target(bus);
    if condition {
        cpu.pc = target;
    }
    0
}

pub(crate) fn op_bra(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, true)
}

/// `BRN` (0x21): branch never. Still consumes the displacement byte.
pub(crate) fn op_brn(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, false)
}

pub(crate) fn op_bhi(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let cond = !cpu.flag(CcFlag::C) && !cpu.flag(CcFlag::Z);
    branch(cpu, bus, cond)
}

pub(crate) fn op_bls(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let cond = cpu.flag(CcFlag::C) || cpu.flag(CcFlag::Z);
    branch(cpu, bus, cond)
}

pub(crate) fn op_bcc(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, !cpu.flag(CcFlag::C))
}

pub(crate) fn op_bcs(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, cpu.flag(CcFlag::C))
}

pub(crate) fn op_bne(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, !cpu.flag(CcFlag::Z))
}

pub(crate) fn op_beq(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, cpu.flag(CcFlag::Z))
}

pub(crate) fn op_bvc(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, !cpu.flag(CcFlag::V))
}

pub(crate) fn op_bvs(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, cpu.flag(CcFlag::V))
}

pub(crate) fn op_bpl(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, !cpu.flag(CcFlag::N))
}

pub(crate) fn op_bmi(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    branch(cpu, bus, cpu.flag(CcFlag::N))
}

pub(crate) fn op_bge(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let cond = cpu.flag(CcFlag::N) == cpu.flag(CcFlag::V);
    branch(cpu, bus, cond)
}

pub(crate) fn op_blt(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let cond = cpu.flag(CcFlag::N) != cpu.flag(CcFlag::V);
    branch(cpu, bus, cond)
}

pub(crate) fn op_bgt(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let cond = !cpu.flag(CcFlag::Z) && cpu.flag(CcFlag::N) == cpu.flag(CcFlag::V);
    branch(cpu, bus, cond)
}

pub(crate) fn op_ble(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let cond = cpu.flag(CcFlag::Z) || cpu.flag(CcFlag::N) != cpu.flag(CcFlag::V);
    branch(cpu, bus, cond)
}

/// `BSR` (0x8D): push the return address, then branch unconditionally.
pub(crate) fn op_bsr(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    let target = cpu.branch_target(bus);
    cpu.push16(bus, cpu.pc);
    cpu.pc = target;
    0
}

/// `JSR`: push the return address, then jump to the operand address
/// (`Indexed` or `Extended`, per the opcode-table entry).
pub(crate) fn op_jsr(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    let target = cpu.operand_addr(bus, mode);
    cpu.push16(bus, cpu.pc);
    cpu.pc = target;
    0
}

/// `JMP`: unconditional jump to the operand address.
pub(crate) fn op_jmp(cpu: &mut Mb8861, bus: &MemoryBus, mode: Mode) -> u32 {
    cpu.pc = cpu.operand_addr(bus, mode);
    0
}

/// `RTS` (0x39): pop the return address pushed by `BSR`/`JSR`.
pub(crate) fn op_rts(cpu: &mut Mb8861, bus: &MemoryBus, _mode: Mode) -> u32 {
    cpu.pc = cpu.pop16(bus);
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
    fn brn_consumes_operand_but_never_branches() {
        let bus = fresh_bus();
        bus.store8(0x0000, 0x7F);
        let mut cpu = cpu();
        cpu.pc = 0x0000;
        op_brn(&mut cpu, &bus, Mode::Relative);
        assert_eq!(cpu.pc, 0x0001);
    }

    #[test]
    fn bra_always_taken() {
        let bus = fresh_bus();
        bus.store8(0x0000, 0x05);
        let mut cpu = cpu();
        cpu.pc = 0x0000;
        op_bra(&mut cpu, &bus, Mode::Relative);
        assert_eq!(cpu.pc, 0x0006);
    }

    #[test]
    fn negative_displacement_branches_backward() {
        let bus = fresh_bus();
        bus.store8(0x0010, 0xFE); // -2
        let mut cpu = cpu();
        cpu.pc = 0x0010;
        op_bra(&mut cpu, &bus, Mode::Relative);
        assert_eq!(cpu.pc, 0x000F);
    }

    #[test]
    fn bsr_pushes_return_address_then_branches() {
        let bus = fresh_bus();
        bus.store8(0x0000, 0x10);
        let mut cpu = cpu();
        cpu.pc = 0x0000;
        cpu.sp = 0x01FF;
        op_bsr(&mut cpu, &bus, Mode::Relative);
        assert_eq!(cpu.pc, 0x0011);
        assert_eq!(cpu.sp, 0x01FD);
        assert_eq!(bus.load16(0x01FE), 0x0001);
    }
}
