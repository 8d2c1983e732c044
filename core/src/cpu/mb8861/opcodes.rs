//! The 256-entry opcode dispatch table.

use std::sync::OnceLock;

use super::{Mb8861, alu, branch, load_store, stack};
use crate::bus::MemoryBus;

/// Operand addressing mode, matched against the fetch cursor at the start
/// of every instruction's operand phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Inherent,
    Immediate,
    Immediate16,
    Direct,
    Direct16,
    Extended,
    Extended16,
    Indexed,
    Indexed16,
    Relative,
    /// NIM/OIM/XIM/TMM: an immediate mask followed by an indexed offset.
    Special,
}

/// A handler receives the already-decoded addressing mode and returns any
/// cycles beyond the table's base count (the JR-100 subset never needs
/// this, but the hook matches the step() contract described for ports that
/// do add per-operand cycle penalties).
pub type Handler = fn(&mut Mb8861, &MemoryBus, Mode) -> u32;

#[derive(Clone, Copy)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub mode: Mode,
    pub cycles: u32,
    pub handler: Handler,
}

const fn inst(mnemonic: &'static str, mode: Mode, cycles: u32, handler: Handler) -> Instruction {
    Instruction { mnemonic, mode, cycles, handler }
}

type Table = [Option<Instruction>; 256];

static TABLE: OnceLock<Table> = OnceLock::new();

pub fn opcode_table() -> &'static Table {
    TABLE.get_or_init(build_table)
}

fn build_table() -> Table {
    use Mode::*;

    let mut table: Table = [None; 256];
    let mut set = |opcode: u8, instruction: Instruction| {
        assert!(table[opcode as usize].is_none(), "opcode {opcode:#04x} registered twice");
        table[opcode as usize] = Some(instruction);
    };

    set(0x01, inst("NOP", Inherent, 2, load_store::op_nop));

    // Accumulator loads/stores
    set(0x86, inst("LDAA", Immediate, 2, load_store::op_ldaa));
    set(0x96, inst("LDAA", Direct, 3, load_store::op_ldaa));
    set(0xA6, inst("LDAA", Indexed, 5, load_store::op_ldaa));
    set(0xB6, inst("LDAA", Extended, 4, load_store::op_ldaa));
    set(0xC6, inst("LDAB", Immediate, 2, load_store::op_ldab));
    set(0xD6, inst("LDAB", Direct, 3, load_store::op_ldab));
    set(0xE6, inst("LDAB", Indexed, 5, load_store::op_ldab));
    set(0xF6, inst("LDAB", Extended, 4, load_store::op_ldab));
    set(0x97, inst("STAA", Direct, 4, load_store::op_staa));
    set(0xA7, inst("STAA", Indexed, 6, load_store::op_staa));
    set(0xB7, inst("STAA", Extended, 5, load_store::op_staa));
    set(0xD7, inst("STAB", Direct, 4, load_store::op_stab));
    set(0xE7, inst("STAB", Indexed, 6, load_store::op_stab));
    set(0xF7, inst("STAB", Extended, 5, load_store::op_stab));

    // Register inc/dec/clr/com/neg/shifts/tst
    set(0x4C, inst("INCA", Inherent, 2, alu::op_inca));
    set(0x5C, inst("INCB", Inherent, 2, alu::op_incb));
    set(0x4A, inst("DECA", Inherent, 2, alu::op_deca));
    set(0x5A, inst("DECB", Inherent, 2, alu::op_decb));
    set(0x4F, inst("CLRA", Inherent, 2, alu::op_clra));
    set(0x5F, inst("CLRB", Inherent, 2, alu::op_clrb));
    set(0x43, inst("COMA", Inherent, 2, alu::op_coma));
    set(0x53, inst("COMB", Inherent, 2, alu::op_comb));
    set(0x40, inst("NEGA", Inherent, 2, alu::op_nega));
    set(0x50, inst("NEGB", Inherent, 2, alu::op_negb));
    set(0x44, inst("LSRA", Inherent, 2, alu::op_lsra));
    set(0x54, inst("LSRB", Inherent, 2, alu::op_lsrb));
    set(0x47, inst("ASRA", Inherent, 2, alu::op_asra));
    set(0x57, inst("ASRB", Inherent, 2, alu::op_asrb));
    set(0x48, inst("ASLA", Inherent, 2, alu::op_asla));
    set(0x58, inst("ASLB", Inherent, 2, alu::op_aslb));
    set(0x49, inst("ROLA", Inherent, 2, alu::op_rola));
    set(0x59, inst("ROLB", Inherent, 2, alu::op_rolb));
    set(0x46, inst("RORA", Inherent, 2, alu::op_rora));
    set(0x56, inst("RORB", Inherent, 2, alu::op_rorb));
    set(0x4D, inst("TSTA", Inherent, 2, alu::op_tsta));
    set(0x5D, inst("TSTB", Inherent, 2, alu::op_tstb));

    // Memory clr/com/neg/shifts/inc/dec/tst
    set(0x6F, inst("CLR", Indexed, 7, alu::op_clr_mem));
    set(0x7F, inst("CLR", Extended, 6, alu::op_clr_mem));
    set(0x63, inst("COM", Indexed, 7, alu::op_com_mem));
    set(0x73, inst("COM", Extended, 6, alu::op_com_mem));
    set(0x60, inst("NEG", Indexed, 7, alu::op_neg_mem));
    set(0x70, inst("NEG", Extended, 6, alu::op_neg_mem));
    set(0x64, inst("LSR", Indexed, 7, alu::op_lsr_mem));
    set(0x74, inst("LSR", Extended, 6, alu::op_lsr_mem));
    set(0x67, inst("ASR", Indexed, 7, alu::op_asr_mem));
    set(0x77, inst("ASR", Extended, 6, alu::op_asr_mem));
    set(0x68, inst("ASL", Indexed, 7, alu::op_asl_mem));
    set(0x78, inst("ASL", Extended, 6, alu::op_asl_mem));
    set(0x69, inst("ROL", Indexed, 7, alu::op_rol_mem));
    set(0x79, inst("ROL", Extended, 6, alu::op_rol_mem));
    set(0x66, inst("ROR", Indexed, 7, alu::op_ror_mem));
    set(0x76, inst("ROR", Extended, 6, alu::op_ror_mem));
    set(0x6C, inst("INC", Indexed, 7, alu::op_inc_mem));
    set(0x7C, inst("INC", Extended, 6, alu::op_inc_mem));
    set(0x6A, inst("DEC", Indexed, 7, alu::op_dec_mem));
    set(0x7A, inst("DEC", Extended, 6, alu::op_dec_mem));
    set(0x6D, inst("TST", Indexed, 7, alu::op_tst_mem));
    set(0x7D, inst("TST", Extended, 6, alu::op_tst_mem));

    // Transfers
    set(0x16, inst("TAB", Inherent, 2, load_store::op_tab));
    set(0x17, inst("TBA", Inherent, 2, load_store::op_tba));

    // Binary accumulator ALU ops
    set(0x8B, inst("ADDA", Immediate, 2, alu::op_adda));
    set(0x9B, inst("ADDA", Direct, 3, alu::op_adda));
    set(0xAB, inst("ADDA", Indexed, 5, alu::op_adda));
    set(0xBB, inst("ADDA", Extended, 4, alu::op_adda));
    set(0xCB, inst("ADDB", Immediate, 2, alu::op_addb));
    set(0xDB, inst("ADDB", Direct, 3, alu::op_addb));
    set(0xEB, inst("ADDB", Indexed, 5, alu::op_addb));
    set(0xFB, inst("ADDB", Extended, 4, alu::op_addb));
    set(0x89, inst("ADCA", Immediate, 2, alu::op_adca));
    set(0x99, inst("ADCA", Direct, 3, alu::op_adca));
    set(0xA9, inst("ADCA", Indexed, 5, alu::op_adca));
    set(0xB9, inst("ADCA", Extended, 4, alu::op_adca));
    set(0xC9, inst("ADCB", Immediate, 2, alu::op_adcb));
    set(0xD9, inst("ADCB", Direct, 3, alu::op_adcb));
    set(0xE9, inst("ADCB", Indexed, 5, alu::op_adcb));
    set(0xF9, inst("ADCB", Extended, 4, alu::op_adcb));
    set(0x80, inst("SUBA", Immediate, 2, alu::op_suba));
    set(0x90, inst("SUBA", Direct, 3, alu::op_suba));
    set(0xA0, inst("SUBA", Indexed, 5, alu::op_suba));
    set(0xB0, inst("SUBA", Extended, 4, alu::op_suba));
    set(0xC0, inst("SUBB", Immediate, 2, alu::op_subb));
    set(0xD0, inst("SUBB", Direct, 3, alu::op_subb));
    set(0xE0, inst("SUBB", Indexed, 5, alu::op_subb));
    set(0xF0, inst("SUBB", Extended, 4, alu::op_subb));
    set(0x82, inst("SBCA", Immediate, 2, alu::op_sbca));
    set(0x92, inst("SBCA", Direct, 3, alu::op_sbca));
    set(0xA2, inst("SBCA", Indexed, 5, alu::op_sbca));
    set(0xB2, inst("SBCA", Extended, 4, alu::op_sbca));
    set(0xC2, inst("SBCB", Immediate, 2, alu::op_sbcb));
    set(0xD2, inst("SBCB", Direct, 3, alu::op_sbcb));
    set(0xE2, inst("SBCB", Indexed, 5, alu::op_sbcb));
    set(0xF2, inst("SBCB", Extended, 4, alu::op_sbcb));
    set(0x84, inst("ANDA", Immediate, 2, alu::op_anda));
    set(0x94, inst("ANDA", Direct, 3, alu::op_anda));
    set(0xA4, inst("ANDA", Indexed, 5, alu::op_anda));
    set(0xB4, inst("ANDA", Extended, 4, alu::op_anda));
    set(0xC4, inst("ANDB", Immediate, 2, alu::op_andb));
    set(0xD4, inst("ANDB", Direct, 3, alu::op_andb));
    set(0xE4, inst("ANDB", Indexed, 5, alu::op_andb));
    set(0xF4, inst("ANDB", Extended, 4, alu::op_andb));
    set(0x8A, inst("ORAA", Immediate, 2, alu::op_oraa));
    set(0x9A, inst("ORAA", Direct, 3, alu::op_oraa));
    set(0xAA, inst("ORAA", Indexed, 5, alu::op_oraa));
    set(0xBA, inst("ORAA", Extended, 4, alu::op_oraa));
    set(0xCA, inst("ORAB", Immediate, 2, alu::op_orab));
    set(0xDA, inst("ORAB", Direct, 3, alu::op_orab));
    set(0xEA, inst("ORAB", Indexed, 5, alu::op_orab));
    set(0xFA, inst("ORAB", Extended, 4, alu::op_orab));
    set(0x88, inst("EORA", Immediate, 2, alu::op_eora));
    set(0x98, inst("EORA", Direct, 3, alu::op_eora));
    set(0xA8, inst("EORA", Indexed, 5, alu::op_eora));
    set(0xB8, inst("EORA", Extended, 4, alu::op_eora));
    set(0xC8, inst("EORB", Immediate, 2, alu::op_eorb));
    set(0xD8, inst("EORB", Direct, 3, alu::op_eorb));
    set(0xE8, inst("EORB", Indexed, 5, alu::op_eorb));
    set(0xF8, inst("EORB", Extended, 4, alu::op_eorb));
    set(0x81, inst("CMPA", Immediate, 2, alu::op_cmpa));
    set(0x91, inst("CMPA", Direct, 3, alu::op_cmpa));
    set(0xA1, inst("CMPA", Indexed, 5, alu::op_cmpa));
    set(0xB1, inst("CMPA", Extended, 4, alu::op_cmpa));
    set(0xC1, inst("CMPB", Immediate, 2, alu::op_cmpb));
    set(0xD1, inst("CMPB", Direct, 3, alu::op_cmpb));
    set(0xE1, inst("CMPB", Indexed, 5, alu::op_cmpb));
    set(0xF1, inst("CMPB", Extended, 4, alu::op_cmpb));
    set(0x85, inst("BITA", Immediate, 2, alu::op_bita));
    set(0x95, inst("BITA", Direct, 3, alu::op_bita));
    set(0xA5, inst("BITA", Indexed, 5, alu::op_bita));
    set(0xB5, inst("BITA", Extended, 4, alu::op_bita));
    set(0xC5, inst("BITB", Immediate, 2, alu::op_bitb));
    set(0xD5, inst("BITB", Direct, 3, alu::op_bitb));
    set(0xE5, inst("BITB", Indexed, 5, alu::op_bitb));
    set(0xF5, inst("BITB", Extended, 4, alu::op_bitb));

    // Flag/condition-code control
    set(0x06, inst("TAP", Inherent, 2, alu::op_tap));
    set(0x07, inst("TPA", Inherent, 2, alu::op_tpa));
    set(0x0A, inst("CLV", Inherent, 2, alu::op_clv));
    set(0x0B, inst("SEV", Inherent, 2, alu::op_sev));
    set(0x0C, inst("CLC", Inherent, 2, alu::op_clc));
    set(0x0D, inst("SEC", Inherent, 2, alu::op_sec));
    set(0x0E, inst("CLI", Inherent, 2, alu::op_cli));
    set(0x0F, inst("SEI", Inherent, 2, alu::op_sei));

    // Accumulator-to-accumulator shortcuts
    set(0x10, inst("SBA", Inherent, 2, alu::op_sba));
    set(0x11, inst("CBA", Inherent, 2, alu::op_cba));
    set(0x19, inst("DAA", Inherent, 2, alu::op_daa));
    set(0x1B, inst("ABA", Inherent, 2, alu::op_aba));

    // Special (NIM/OIM/XIM/TMM)
    set(0x71, inst("NIM", Special, 8, alu::op_nim));
    set(0x72, inst("OIM", Special, 8, alu::op_oim));
    set(0x75, inst("XIM", Special, 8, alu::op_xim));
    set(0x7B, inst("TMM", Special, 7, alu::op_tmm));

    // Stack / subroutine / interrupt control
    set(0x36, inst("PSHA", Inherent, 4, stack::op_psha));
    set(0x37, inst("PSHB", Inherent, 4, stack::op_pshb));
    set(0x32, inst("PULA", Inherent, 5, stack::op_pula));
    set(0x33, inst("PULB", Inherent, 5, stack::op_pulb));
    set(0x3E, inst("WAI", Inherent, 9, stack::op_wai));
    set(0x3F, inst("SWI", Inherent, 12, stack::op_swi));
    set(0x39, inst("RTS", Inherent, 5, branch::op_rts));
    set(0x3B, inst("RTI", Inherent, 10, stack::op_rti));

    // 16-bit load/store
    set(0xCE, inst("LDX", Immediate16, 3, load_store::op_ldx));
    set(0xDE, inst("LDX", Direct16, 4, load_store::op_ldx));
    set(0xEE, inst("LDX", Indexed16, 6, load_store::op_ldx));
    set(0xFE, inst("LDX", Extended16, 5, load_store::op_ldx));
    set(0x8E, inst("LDS", Immediate16, 3, load_store::op_lds));
    set(0x9E, inst("LDS", Direct16, 4, load_store::op_lds));
    set(0xAE, inst("LDS", Indexed16, 6, load_store::op_lds));
    set(0xBE, inst("LDS", Extended16, 5, load_store::op_lds));
    set(0xDF, inst("STX", Direct16, 5, load_store::op_stx));
    set(0xEF, inst("STX", Indexed16, 7, load_store::op_stx));
    set(0xFF, inst("STX", Extended16, 6, load_store::op_stx));
    set(0x9F, inst("STS", Direct16, 5, load_store::op_sts));
    set(0xAF, inst("STS", Indexed16, 7, load_store::op_sts));
    set(0xBF, inst("STS", Extended16, 6, load_store::op_sts));

    // 16-bit inc/dec/compare, stack/index transfers
    set(0x08, inst("INX", Inherent, 4, load_store::op_inx));
    set(0x09, inst("DEX", Inherent, 4, load_store::op_dex));
    set(0x31, inst("INS", Inherent, 4, load_store::op_ins));
    set(0x34, inst("DES", Inherent, 4, load_store::op_des));
    set(0x8C, inst("CPX", Immediate16, 3, load_store::op_cpx));
    set(0x9C, inst("CPX", Direct16, 4, load_store::op_cpx));
    set(0xAC, inst("CPX", Indexed16, 6, load_store::op_cpx));
    set(0xBC, inst("CPX", Extended16, 5, load_store::op_cpx));
    set(0x35, inst("TXS", Inherent, 4, load_store::op_txs));
    set(0x30, inst("TSX", Inherent, 4, load_store::op_tsx));

    // Subroutine / jump / non-standard ADX
    set(0x8D, inst("BSR", Relative, 8, branch::op_bsr));
    set(0xAD, inst("JSR", Indexed, 8, branch::op_jsr));
    set(0xBD, inst("JSR", Extended, 9, branch::op_jsr));
    set(0x6E, inst("JMP", Indexed, 4, branch::op_jmp));
    set(0x7E, inst("JMP", Extended, 3, branch::op_jmp));
    set(0xEC, inst("ADX", Immediate, 3, load_store::op_adx_immediate));
    set(0xFC, inst("ADX", Extended16, 7, load_store::op_adx_extended));

    // Branches
    set(0x20, inst("BRA", Relative, 4, branch::op_bra));
    set(0x21, inst("BRN", Relative, 4, branch::op_brn));
    set(0x22, inst("BHI", Relative, 4, branch::op_bhi));
    set(0x23, inst("BLS", Relative, 4, branch::op_bls));
    set(0x24, inst("BCC", Relative, 4, branch::op_bcc));
    set(0x25, inst("BCS", Relative, 4, branch::op_bcs));
    set(0x26, inst("BNE", Relative, 4, branch::op_bne));
    set(0x27, inst("BEQ", Relative, 4, branch::op_beq));
    set(0x28, inst("BVC", Relative, 4, branch::op_bvc));
    set(0x29, inst("BVS", Relative, 4, branch::op_bvs));
    set(0x2A, inst("BPL", Relative, 4, branch::op_bpl));
    set(0x2B, inst("BMI", Relative, 4, branch::op_bmi));
    set(0x2C, inst("BGE", Relative, 4, branch::op_bge));
    set(0x2D, inst("BLT", Relative, 4, branch::op_blt));
    set(0x2E, inst("BGT", Relative, 4, branch::op_bgt));
    set(0x2F, inst("BLE", Relative, 4, branch::op_ble));

    table
}
