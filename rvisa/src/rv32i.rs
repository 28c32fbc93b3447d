//! The RV32IM table. Field layouts follow the standard base encoding:
//! opcode [6:0], rd [11:7], funct3 [14:12], rs1 [19:15], rs2 [24:20],
//! funct7 [31:25], with the immediate slicings of the I/S/B/U/J formats.

use once_cell::sync::Lazy;

use crate::instruction::{BitRange, Field, FieldKind, ImmField, ImmSlice, InstructionDef};
use crate::pseudo::{expand_li, line, ExpandCtx, PseudoDef, PseudoError};
use crate::Isa;

const OPCODE: BitRange = BitRange::new(6, 0);
const RD: BitRange = BitRange::new(11, 7);
const FUNCT3: BitRange = BitRange::new(14, 12);
const RS1: BitRange = BitRange::new(19, 15);
const RS2: BitRange = BitRange::new(24, 20);
const FUNCT7: BitRange = BitRange::new(31, 25);

const OP: u32 = 0b011_0011;
const OP_IMM: u32 = 0b001_0011;
const LOAD: u32 = 0b000_0011;
const STORE: u32 = 0b010_0011;
const BRANCH: u32 = 0b110_0011;
const LUI: u32 = 0b011_0111;
const AUIPC: u32 = 0b001_0111;
const JAL: u32 = 0b110_1111;
const JALR: u32 = 0b110_0111;
const SYSTEM: u32 = 0b111_0011;

const MULDIV: u32 = 0b000_0001;

fn fixed(name: &'static str, bits: BitRange, value: u32) -> Field {
    Field {
        name,
        kind: FieldKind::Fixed { bits, value },
    }
}

fn reg(name: &'static str, bits: BitRange) -> Field {
    Field {
        name,
        kind: FieldKind::Register { bits },
    }
}

fn imm(name: &'static str, field: ImmField) -> Field {
    Field {
        name,
        kind: FieldKind::Immediate(field),
    }
}

fn i_imm() -> ImmField {
    ImmField {
        signed: true,
        width: 12,
        pc_relative: false,
        slices: vec![ImmSlice::new(BitRange::new(31, 20), BitRange::new(11, 0))],
    }
}

fn s_imm() -> ImmField {
    ImmField {
        signed: true,
        width: 12,
        pc_relative: false,
        slices: vec![
            ImmSlice::new(BitRange::new(31, 25), BitRange::new(11, 5)),
            ImmSlice::new(BitRange::new(11, 7), BitRange::new(4, 0)),
        ],
    }
}

fn b_imm() -> ImmField {
    ImmField {
        signed: true,
        width: 13,
        pc_relative: true,
        slices: vec![
            ImmSlice::new(BitRange::new(31, 31), BitRange::new(12, 12)),
            ImmSlice::new(BitRange::new(30, 25), BitRange::new(10, 5)),
            ImmSlice::new(BitRange::new(11, 8), BitRange::new(4, 1)),
            ImmSlice::new(BitRange::new(7, 7), BitRange::new(11, 11)),
        ],
    }
}

fn u_imm() -> ImmField {
    ImmField {
        signed: false,
        width: 20,
        pc_relative: false,
        slices: vec![ImmSlice::new(BitRange::new(31, 12), BitRange::new(19, 0))],
    }
}

fn j_imm() -> ImmField {
    ImmField {
        signed: true,
        width: 21,
        pc_relative: true,
        slices: vec![
            ImmSlice::new(BitRange::new(31, 31), BitRange::new(20, 20)),
            ImmSlice::new(BitRange::new(30, 21), BitRange::new(10, 1)),
            ImmSlice::new(BitRange::new(20, 20), BitRange::new(11, 11)),
            ImmSlice::new(BitRange::new(19, 12), BitRange::new(19, 12)),
        ],
    }
}

fn shamt_imm() -> ImmField {
    ImmField {
        signed: false,
        width: 5,
        pc_relative: false,
        slices: vec![ImmSlice::new(BitRange::new(24, 20), BitRange::new(4, 0))],
    }
}

fn def(name: &'static str, fields: Vec<Field>) -> InstructionDef {
    InstructionDef {
        name,
        size: 4,
        fields,
        mem_operands: false,
    }
}

/// `name rd, rs1, rs2`
fn r_type(name: &'static str, funct3: u32, funct7: u32) -> InstructionDef {
    def(
        name,
        vec![
            fixed("opcode", OPCODE, OP),
            fixed("funct3", FUNCT3, funct3),
            fixed("funct7", FUNCT7, funct7),
            reg("rd", RD),
            reg("rs1", RS1),
            reg("rs2", RS2),
        ],
    )
}

/// `name rd, rs1, imm`
fn i_type(name: &'static str, opcode: u32, funct3: u32) -> InstructionDef {
    def(
        name,
        vec![
            fixed("opcode", OPCODE, opcode),
            fixed("funct3", FUNCT3, funct3),
            reg("rd", RD),
            reg("rs1", RS1),
            imm("imm", i_imm()),
        ],
    )
}

/// `name rd, rs1, shamt`
fn shift(name: &'static str, funct3: u32, funct7: u32) -> InstructionDef {
    def(
        name,
        vec![
            fixed("opcode", OPCODE, OP_IMM),
            fixed("funct3", FUNCT3, funct3),
            fixed("funct7", FUNCT7, funct7),
            reg("rd", RD),
            reg("rs1", RS1),
            imm("shamt", shamt_imm()),
        ],
    )
}

/// `name rd, imm(rs1)` or `name rd, imm, rs1`
fn load(name: &'static str, funct3: u32) -> InstructionDef {
    InstructionDef {
        mem_operands: true,
        ..def(
            name,
            vec![
                fixed("opcode", OPCODE, LOAD),
                fixed("funct3", FUNCT3, funct3),
                reg("rd", RD),
                imm("imm", i_imm()),
                reg("rs1", RS1),
            ],
        )
    }
}

/// `name rs2, imm(rs1)` or `name rs2, imm, rs1`
fn store(name: &'static str, funct3: u32) -> InstructionDef {
    InstructionDef {
        mem_operands: true,
        ..def(
            name,
            vec![
                fixed("opcode", OPCODE, STORE),
                fixed("funct3", FUNCT3, funct3),
                reg("rs2", RS2),
                imm("imm", s_imm()),
                reg("rs1", RS1),
            ],
        )
    }
}

/// `name rs1, rs2, offset`
fn b_type(name: &'static str, funct3: u32) -> InstructionDef {
    def(
        name,
        vec![
            fixed("opcode", OPCODE, BRANCH),
            fixed("funct3", FUNCT3, funct3),
            reg("rs1", RS1),
            reg("rs2", RS2),
            imm("imm", b_imm()),
        ],
    )
}

/// `name rd, imm20`
fn u_type(name: &'static str, opcode: u32) -> InstructionDef {
    def(
        name,
        vec![
            fixed("opcode", OPCODE, opcode),
            reg("rd", RD),
            imm("imm", u_imm()),
        ],
    )
}

/// `ecall` / `ebreak`: every field fixed.
fn system(name: &'static str, funct12: u32) -> InstructionDef {
    def(
        name,
        vec![
            fixed("opcode", OPCODE, SYSTEM),
            fixed("rd", RD, 0),
            fixed("funct3", FUNCT3, 0),
            fixed("rs1", RS1, 0),
            fixed("funct12", BitRange::new(31, 20), funct12),
        ],
    )
}

fn instructions() -> Vec<InstructionDef> {
    let mut table = vec![
        u_type("lui", LUI),
        u_type("auipc", AUIPC),
        def(
            "jal",
            vec![
                fixed("opcode", OPCODE, JAL),
                reg("rd", RD),
                imm("imm", j_imm()),
            ],
        ),
        i_type("jalr", JALR, 0b000),
        b_type("beq", 0b000),
        b_type("bne", 0b001),
        b_type("blt", 0b100),
        b_type("bge", 0b101),
        b_type("bltu", 0b110),
        b_type("bgeu", 0b111),
        load("lb", 0b000),
        load("lh", 0b001),
        load("lw", 0b010),
        load("lbu", 0b100),
        load("lhu", 0b101),
        store("sb", 0b000),
        store("sh", 0b001),
        store("sw", 0b010),
        i_type("addi", OP_IMM, 0b000),
        i_type("slti", OP_IMM, 0b010),
        i_type("sltiu", OP_IMM, 0b011),
        i_type("xori", OP_IMM, 0b100),
        i_type("ori", OP_IMM, 0b110),
        i_type("andi", OP_IMM, 0b111),
        shift("slli", 0b001, 0b000_0000),
        shift("srli", 0b101, 0b000_0000),
        shift("srai", 0b101, 0b010_0000),
        r_type("add", 0b000, 0b000_0000),
        r_type("sub", 0b000, 0b010_0000),
        r_type("sll", 0b001, 0b000_0000),
        r_type("slt", 0b010, 0b000_0000),
        r_type("sltu", 0b011, 0b000_0000),
        r_type("xor", 0b100, 0b000_0000),
        r_type("srl", 0b101, 0b000_0000),
        r_type("sra", 0b101, 0b010_0000),
        r_type("or", 0b110, 0b000_0000),
        r_type("and", 0b111, 0b000_0000),
        system("ecall", 0),
        system("ebreak", 1),
    ];
    table.extend([
        r_type("mul", 0b000, MULDIV),
        r_type("mulh", 0b001, MULDIV),
        r_type("mulhsu", 0b010, MULDIV),
        r_type("mulhu", 0b011, MULDIV),
        r_type("div", 0b100, MULDIV),
        r_type("divu", 0b101, MULDIV),
        r_type("rem", 0b110, MULDIV),
        r_type("remu", 0b111, MULDIV),
    ]);
    table
}

fn pseudo(
    name: &'static str,
    arity: usize,
    expand: impl Fn(&[String], &ExpandCtx) -> Result<Vec<Vec<String>>, PseudoError>
        + Send
        + Sync
        + 'static,
) -> PseudoDef {
    PseudoDef {
        name,
        arity,
        expand: Box::new(expand),
    }
}

fn pseudos() -> Vec<PseudoDef> {
    vec![
        pseudo("nop", 0, |_, _| Ok(vec![line(&["addi", "x0", "x0", "0"])])),
        pseudo("li", 2, expand_li),
        pseudo("mv", 2, |a, _| {
            Ok(vec![line(&["addi", &a[0], &a[1], "0"])])
        }),
        pseudo("not", 2, |a, _| {
            Ok(vec![line(&["xori", &a[0], &a[1], "-1"])])
        }),
        pseudo("neg", 2, |a, _| {
            Ok(vec![line(&["sub", &a[0], "x0", &a[1]])])
        }),
        pseudo("seqz", 2, |a, _| {
            Ok(vec![line(&["sltiu", &a[0], &a[1], "1"])])
        }),
        pseudo("snez", 2, |a, _| {
            Ok(vec![line(&["sltu", &a[0], "x0", &a[1]])])
        }),
        pseudo("sltz", 2, |a, _| {
            Ok(vec![line(&["slt", &a[0], &a[1], "x0"])])
        }),
        pseudo("sgtz", 2, |a, _| {
            Ok(vec![line(&["slt", &a[0], "x0", &a[1]])])
        }),
        pseudo("beqz", 2, |a, _| {
            Ok(vec![line(&["beq", &a[0], "x0", &a[1]])])
        }),
        pseudo("bnez", 2, |a, _| {
            Ok(vec![line(&["bne", &a[0], "x0", &a[1]])])
        }),
        pseudo("blez", 2, |a, _| {
            Ok(vec![line(&["bge", "x0", &a[0], &a[1]])])
        }),
        pseudo("bgez", 2, |a, _| {
            Ok(vec![line(&["bge", &a[0], "x0", &a[1]])])
        }),
        pseudo("bltz", 2, |a, _| {
            Ok(vec![line(&["blt", &a[0], "x0", &a[1]])])
        }),
        pseudo("bgtz", 2, |a, _| {
            Ok(vec![line(&["blt", "x0", &a[0], &a[1]])])
        }),
        pseudo("j", 1, |a, _| Ok(vec![line(&["jal", "x0", &a[0]])])),
        pseudo("jal", 1, |a, _| Ok(vec![line(&["jal", "x1", &a[0]])])),
        pseudo("jr", 1, |a, _| {
            Ok(vec![line(&["jalr", "x0", &a[0], "0"])])
        }),
        pseudo("jalr", 1, |a, _| {
            Ok(vec![line(&["jalr", "x1", &a[0], "0"])])
        }),
        pseudo("ret", 0, |_, _| Ok(vec![line(&["jalr", "x0", "x1", "0"])])),
    ]
}

static RV32IM: Lazy<Isa> = Lazy::new(|| Isa::new("RV32IM", instructions(), pseudos()));

pub fn rv32im() -> &'static Isa {
    &RV32IM
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::FieldKind;

    #[test]
    fn table_has_base_and_muldiv() {
        let isa = rv32im();
        for name in ["lui", "jal", "beq", "lw", "sw", "addi", "add", "ecall", "mul", "remu"] {
            assert!(isa.instruction(name).is_some(), "missing {name}");
        }
        assert!(isa.instruction("fadd.s").is_none());
    }

    #[test]
    fn operand_orders() {
        let isa = rv32im();
        let names = |n: &str| {
            isa.instruction(n)
                .unwrap()
                .operands()
                .map(|f| f.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names("add"), ["rd", "rs1", "rs2"]);
        assert_eq!(names("addi"), ["rd", "rs1", "imm"]);
        assert_eq!(names("lw"), ["rd", "imm", "rs1"]);
        assert_eq!(names("sw"), ["rs2", "imm", "rs1"]);
        assert_eq!(names("beq"), ["rs1", "rs2", "imm"]);
        assert_eq!(names("ecall"), [] as [&str; 0]);
    }

    #[test]
    fn fixed_bits_of_addi() {
        let addi = rv32im().instruction("addi").unwrap();
        assert_eq!(addi.base_word(), 0b001_0011);
        assert_eq!(addi.fixed_mask(), 0x0000_707f);
    }

    #[test]
    fn system_instructions_fix_every_bit() {
        let ecall = rv32im().instruction("ecall").unwrap();
        assert_eq!(ecall.fixed_mask(), u32::MAX);
        assert_eq!(ecall.base_word(), 0b111_0011);
        let ebreak = rv32im().instruction("ebreak").unwrap();
        assert_eq!(ebreak.base_word(), (1 << 20) | 0b111_0011);
    }

    #[test]
    fn branch_immediates_are_pc_relative() {
        let beq = rv32im().instruction("beq").unwrap();
        let imm = beq
            .operands()
            .find_map(|f| match &f.kind {
                FieldKind::Immediate(i) => Some(i),
                _ => None,
            })
            .unwrap();
        assert!(imm.pc_relative);
        assert!(imm.signed);
        assert_eq!(imm.width, 13);
    }

    #[test]
    fn pseudo_lookup_by_arity() {
        let isa = rv32im();
        assert!(isa.pseudo("jal", 1).is_some());
        assert!(isa.pseudo("jal", 2).is_none());
        assert!(isa.instruction("jal").is_some());
        assert!(isa.pseudo("nop", 0).is_some());
        assert_eq!(isa.pseudo_arity("mv"), Some(2));
        assert_eq!(isa.pseudo_arity("frobnicate"), None);
    }
}
