//! A keyboard press routed through [`jr100_core::machine::Jr100`] should
//! reach the CPU as a serviced IRQ within the frame it's pressed in —
//! exercising the keyboard matrix, the VIA's CA1 edge detection and IFR/IER
//! coupling, and the CPU's interrupt dispatch together, rather than any one
//! of them in isolation.

use jr100_core::machine::{Jr100, RamSize};

fn rom_with_vectors(irq_vector: u16, restart_vector: u16) -> Vec<u8> {
    let mut rom = vec![0u8; 0x2000];
    let irq_offset = (irq_vector - 0xE000) as usize;
    let restart_offset = (restart_vector - 0xE000) as usize;
    rom[irq_offset] = (irq_vector >> 8) as u8;
    rom[irq_offset + 1] = (irq_vector & 0xFF) as u8;
    rom[restart_offset] = (restart_vector >> 8) as u8;
    rom[restart_offset + 1] = (restart_vector & 0xFF) as u8;
    rom
}

fn machine_parked_in_a_loop() -> Jr100 {
    let mut jr = Jr100::new(RamSize::Standard16K, Box::new(|_, _| {}), Box::new(|_| {}));

    // IRQ vector points at 0x4000 (RAM), restart vector at 0x0000.
    jr.load_rom_image(&rom_with_vectors(0xFFF8, 0x0000));

    // BRA -2: an unconditional branch back to itself, so the CPU has
    // something to run forever without falling off into unmapped RAM.
    jr.bus().store8(0x0000, 0x20);
    jr.bus().store8(0x0001, 0xFE);
    // WAI at the ISR entry point parks the CPU there once it arrives, so
    // the final PC is deterministic regardless of the frame's cycle budget.
    jr.bus().store8(0x4000, 0x3E);

    jr.reset();
    // Let the reset event apply and the loop run for a full frame before
    // anything presses a key — `reset()` itself clears any interrupt latch,
    // so the press must come after it's taken effect.
    jr.run_frame().unwrap();
    assert_eq!(jr.cpu_snapshot().pc, 0x0000);
    jr
}

#[test]
fn key_press_interrupts_a_running_loop() {
    let mut jr = machine_parked_in_a_loop();

    // Row 0, bit 0 is pressed; `keyboard_mut` resyncs the VIA's CA1 edge
    // detection synchronously, so the IRQ is already pending by the time
    // the next `run_frame` starts stepping the CPU.
    jr.keyboard_mut().set_key(0, 0, true);

    jr.run_frame().unwrap();

    let snapshot = jr.cpu_snapshot();
    assert_eq!(snapshot.pc, 0x4001, "CPU should have serviced the IRQ and parked at WAI+1");
    assert!(snapshot.wai_latch, "WAI should have re-latched once the ISR reached it");
}

#[test]
fn releasing_the_key_does_not_trigger_a_second_interrupt() {
    let mut jr = machine_parked_in_a_loop();

    jr.keyboard_mut().set_key(0, 0, true);
    jr.run_frame().unwrap();
    assert_eq!(jr.cpu_snapshot().pc, 0x4001);

    // Releasing drives CA1 back to its idle level on the opposite edge,
    // which this machine's PCR never arms as an interrupt source; the CPU
    // should stay parked exactly where the first IRQ left it.
    jr.keyboard_mut().set_key(0, 0, false);
    jr.run_frame().unwrap();
    assert_eq!(jr.cpu_snapshot().pc, 0x4001);
}
