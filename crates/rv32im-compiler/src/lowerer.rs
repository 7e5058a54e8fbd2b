//! The instruction lowering pipeline (§4.2): per-opcode translation to
//! gates, register/PC wire map updates, and the narrow-load/store bit
//! selection the memory tiers don't implement themselves.

use rv32im_circuit::WireId;
use rv32im_kernels::{
    barrel_shift, divide, equal, multiply, not_equal, ripple_carry_add, signed_ge, signed_less_than, subtract,
    unsigned_ge, unsigned_less_than, DivOutput, Emitter, MemoryTier, MulOutput, ShiftKind,
};

use crate::config::CompilerConfig;
use crate::decoder::{self, AluOp, BranchKind, Instruction, LoadKind, MulDivOp, ShiftOp, StoreKind};
use crate::error::CompileError;
use crate::memory_backend::MemoryBackend;
use crate::state::RegisterFile;

/// Where an ECALL/EBREAK landed, for downstream consumers that want to
/// inject oracle inputs at that point (§4.2: "make no register or PC
/// update").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallMarker {
    pub word_index: usize,
    pub is_ebreak: bool,
}

/// Owns the live circuit, register/PC wire map, and (optionally) a memory
/// tier, and lowers one instruction word at a time.
pub struct Lowerer<'c> {
    e: Emitter<'c>,
    regs: RegisterFile,
    memory: Option<MemoryBackend>,
    config: CompilerConfig,
    markers: Vec<SyscallMarker>,
}

impl<'c> Lowerer<'c> {
    pub fn new(e: Emitter<'c>, regs: RegisterFile, memory: Option<MemoryBackend>, config: CompilerConfig) -> Self {
        Self { e, regs, memory, config, markers: Vec::new() }
    }

    pub fn emitter(&self) -> &Emitter<'c> {
        &self.e
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter<'c> {
        &mut self.e
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> Option<&MemoryBackend> {
        self.memory.as_ref()
    }

    pub fn markers(&self) -> &[SyscallMarker] {
        &self.markers
    }

    /// Lowers one instruction word, matching spec.md's
    /// `compile_instruction(instr: u32) -> Result<(), UnsupportedOpcode>`
    /// contract (here augmented with the word's position for error
    /// reporting).
    pub fn compile_instruction(&mut self, word_index: usize, instr: u32) -> Result<(), CompileError> {
        let decoded = decoder::decode(instr).map_err(|err| CompileError::UnsupportedOpcode {
            word_index,
            encoding: instr,
            reason: err.to_string(),
        })?;
        self.lower(word_index, instr, decoded)
    }

    /// Lowers an already-decoded instruction. Used directly by the fusion
    /// peephole once it has decided an instruction did *not* participate in
    /// a fused pattern.
    pub fn lower(&mut self, word_index: usize, encoding: u32, decoded: Instruction) -> Result<(), CompileError> {
        match decoded {
            Instruction::Lui { rd, imm } => {
                self.regs.set_reg(rd, const_word(imm as u32));
                self.advance_pc();
            }
            Instruction::Auipc { rd, imm } => {
                let pc = self.regs.pc();
                let sum = ripple_carry_add(&mut self.e, &pc, &const_word(imm as u32), WireId::FALSE).0;
                self.regs.set_reg(rd, sum);
                self.advance_pc();
            }
            Instruction::Jal { rd, imm } => {
                let pc = self.regs.pc();
                let link = pc_plus4(&mut self.e, &pc);
                self.regs.set_reg(rd, link);
                let target = ripple_carry_add(&mut self.e, &pc, &const_word(imm as u32), WireId::FALSE).0;
                self.regs.set_pc(target);
            }
            Instruction::Jalr { rd, rs1, imm } => {
                let pc = self.regs.pc();
                let link = pc_plus4(&mut self.e, &pc);
                self.regs.set_reg(rd, link);
                let base = self.regs.reg(rs1);
                let sum = ripple_carry_add(&mut self.e, &base, &const_word(imm as u32), WireId::FALSE).0;
                let mut target = sum;
                target[0] = WireId::FALSE;
                self.regs.set_pc(target);
            }
            Instruction::Branch { kind, rs1, rs2, imm } => {
                let a = self.regs.reg(rs1);
                let b = self.regs.reg(rs2);
                let condition = branch_condition(&mut self.e, kind, &a, &b);
                let pc = self.regs.pc();
                let fallthrough = pc_plus4(&mut self.e, &pc);
                let taken = ripple_carry_add(&mut self.e, &pc, &const_word(imm as u32), WireId::FALSE).0;
                let new_pc: [WireId; 32] = std::array::from_fn(|i| self.e.mux(condition, fallthrough[i], taken[i]));
                self.regs.set_pc(new_pc);
            }
            Instruction::OpImm { kind, rd, rs1, imm } => {
                let a = self.regs.reg(rs1);
                let b = const_word(imm as u32);
                let out = alu_op(&mut self.e, kind, &a, &b);
                self.regs.set_reg(rd, out);
                self.advance_pc();
            }
            Instruction::ShiftImm { kind, rd, rs1, shamt } => {
                let a = self.regs.reg(rs1);
                let amount: [WireId; 5] = std::array::from_fn(|b| WireId::constant((shamt >> b) & 1 == 1));
                let out = shift_op(&mut self.e, kind, &a, &amount);
                self.regs.set_reg(rd, out);
                self.advance_pc();
            }
            Instruction::Op { kind, rd, rs1, rs2 } => {
                let a = self.regs.reg(rs1);
                let b = self.regs.reg(rs2);
                let out = alu_op(&mut self.e, kind, &a, &b);
                self.regs.set_reg(rd, out);
                self.advance_pc();
            }
            Instruction::Shift { kind, rd, rs1, rs2 } => {
                let a = self.regs.reg(rs1);
                let b = self.regs.reg(rs2);
                let amount: [WireId; 5] = std::array::from_fn(|i| b[i]);
                let out = shift_op(&mut self.e, kind, &a, &amount);
                self.regs.set_reg(rd, out);
                self.advance_pc();
            }
            Instruction::MulDiv { kind, rd, rs1, rs2 } => {
                let a = self.regs.reg(rs1);
                let b = self.regs.reg(rs2);
                let out = mul_div_op(&mut self.e, kind, &a, &b);
                self.regs.set_reg(rd, out);
                self.advance_pc();
            }
            Instruction::Load { kind, rd, rs1, imm } => {
                let out = self.lower_load(word_index, kind, rs1, imm)?;
                self.regs.set_reg(rd, out);
                self.advance_pc();
            }
            Instruction::Store { kind, rs1, rs2, imm } => {
                self.lower_store(word_index, kind, rs1, rs2, imm)?;
                self.advance_pc();
            }
            Instruction::Ecall => {
                self.markers.push(SyscallMarker { word_index, is_ebreak: false });
                self.advance_pc();
            }
            Instruction::Ebreak => {
                self.markers.push(SyscallMarker { word_index, is_ebreak: true });
                self.advance_pc();
            }
        }
        let _ = encoding;
        Ok(())
    }

    fn advance_pc(&mut self) {
        let pc = self.regs.pc();
        let next = pc_plus4(&mut self.e, &pc);
        self.regs.set_pc(next);
    }

    /// Advances the PC by `4 * count` in one adder call — the batched form
    /// of calling [`Self::advance_pc`] `count` times, used by the Parallel
    /// Driver once a whole batch of non-branching instructions has been
    /// lowered.
    pub(crate) fn advance_pc_by(&mut self, count: u32) {
        let pc = self.regs.pc();
        let next = ripple_carry_add(&mut self.e, &pc, &const_word(count.wrapping_mul(4)), WireId::FALSE).0;
        self.regs.set_pc(next);
    }

    fn lower_load(&mut self, word_index: usize, kind: LoadKind, rs1: u8, imm: i32) -> Result<[WireId; 32], CompileError> {
        let memory = self.memory.as_mut().ok_or_else(|| CompileError::MemoryConstraintExceeded {
            word_index,
            reason: "no memory tier attached; program contains a load instruction".to_string(),
        })?;
        let base = self.regs.reg(rs1);
        let byte_addr = ripple_carry_add(&mut self.e, &base, &const_word(imm as u32), WireId::FALSE).0;
        let word_addr = to_word_address(&byte_addr);
        let word = memory.access(&mut self.e, &word_addr, &[WireId::FALSE; 32], WireId::FALSE);

        let lane: [WireId; 2] = [byte_addr[0], byte_addr[1]];
        let half_sel = byte_addr[1];
        Ok(match kind {
            LoadKind::Word => word,
            LoadKind::Byte => {
                let byte = select_byte(&mut self.e, &word, &lane);
                sign_extend_byte(&byte, true)
            }
            LoadKind::ByteUnsigned => {
                let byte = select_byte(&mut self.e, &word, &lane);
                sign_extend_byte(&byte, false)
            }
            LoadKind::Half => {
                let half = select_half(&mut self.e, &word, half_sel);
                sign_extend_half(&half, true)
            }
            LoadKind::HalfUnsigned => {
                let half = select_half(&mut self.e, &word, half_sel);
                sign_extend_half(&half, false)
            }
        })
    }

    fn lower_store(&mut self, word_index: usize, kind: StoreKind, rs1: u8, rs2: u8, imm: i32) -> Result<(), CompileError> {
        let memory = self.memory.as_mut().ok_or_else(|| CompileError::MemoryConstraintExceeded {
            word_index,
            reason: "no memory tier attached; program contains a store instruction".to_string(),
        })?;
        let base = self.regs.reg(rs1);
        let byte_addr = ripple_carry_add(&mut self.e, &base, &const_word(imm as u32), WireId::FALSE).0;
        let word_addr = to_word_address(&byte_addr);
        let source = self.regs.reg(rs2);

        let write_data = match kind {
            StoreKind::Word => source,
            StoreKind::Byte => {
                let old = memory.access(&mut self.e, &word_addr, &[WireId::FALSE; 32], WireId::FALSE);
                let new_byte: [WireId; 8] = std::array::from_fn(|b| source[b]);
                let lane: [WireId; 2] = [byte_addr[0], byte_addr[1]];
                merge_byte(&mut self.e, &old, &new_byte, &lane)
            }
            StoreKind::Half => {
                let old = memory.access(&mut self.e, &word_addr, &[WireId::FALSE; 32], WireId::FALSE);
                let new_half: [WireId; 16] = std::array::from_fn(|b| source[b]);
                merge_half(&mut self.e, &old, &new_half, byte_addr[1])
            }
        };
        memory.access(&mut self.e, &word_addr, &write_data, WireId::TRUE);
        Ok(())
    }
}

/// Materializes a constant 32-bit value as wires (zero gates — every bit is
/// either the reserved constant-0 or constant-1 input wire).
pub(crate) fn const_word(value: u32) -> [WireId; 32] {
    std::array::from_fn(|b| WireId::constant((value >> b) & 1 == 1))
}

pub(crate) fn pc_plus4(e: &mut Emitter<'_>, pc: &[WireId; 32]) -> [WireId; 32] {
    ripple_carry_add(e, pc, &const_word(4), WireId::FALSE).0
}

/// Byte address to word index: drop the low 2 (byte-within-word) bits, pad
/// the vacated high end with the constant-0 wire.
fn to_word_address(byte_addr: &[WireId; 32]) -> [WireId; 32] {
    std::array::from_fn(|i| if i + 2 < 32 { byte_addr[i + 2] } else { WireId::FALSE })
}

pub(crate) fn alu_op(e: &mut Emitter<'_>, kind: AluOp, a: &[WireId; 32], b: &[WireId; 32]) -> [WireId; 32] {
    match kind {
        AluOp::Add => ripple_carry_add(e, a, b, WireId::FALSE).0,
        AluOp::Sub => subtract(e, a, b).0,
        AluOp::Xor => std::array::from_fn(|i| e.xor(a[i], b[i])),
        AluOp::Or => std::array::from_fn(|i| e.or(a[i], b[i])),
        AluOp::And => std::array::from_fn(|i| e.and(a[i], b[i])),
        AluOp::SetLessThan => zero_extend_bool(signed_less_than(e, a, b)),
        AluOp::SetLessThanUnsigned => zero_extend_bool(unsigned_less_than(e, a, b)),
    }
}

pub(crate) fn shift_op(e: &mut Emitter<'_>, kind: ShiftOp, value: &[WireId; 32], amount: &[WireId]) -> [WireId; 32] {
    let shift_kind = match kind {
        ShiftOp::Left => ShiftKind::Logical,
        ShiftOp::RightLogical => ShiftKind::LogicalRight,
        ShiftOp::RightArithmetic => ShiftKind::Arithmetic,
    };
    barrel_shift(e, value, amount, shift_kind)
}

pub(crate) fn mul_div_op(e: &mut Emitter<'_>, kind: MulDivOp, a: &[WireId; 32], b: &[WireId; 32]) -> [WireId; 32] {
    match kind {
        MulDivOp::Mul => multiply(e, a, b, MulOutput::Low),
        MulDivOp::Mulh => multiply(e, a, b, MulOutput::HighSigned),
        MulDivOp::Mulhsu => multiply(e, a, b, MulOutput::HighSignedUnsigned),
        MulDivOp::Mulhu => multiply(e, a, b, MulOutput::HighUnsigned),
        MulDivOp::Div => divide(e, a, b, true, DivOutput::Quotient),
        MulDivOp::Divu => divide(e, a, b, false, DivOutput::Quotient),
        MulDivOp::Rem => divide(e, a, b, true, DivOutput::Remainder),
        MulDivOp::Remu => divide(e, a, b, false, DivOutput::Remainder),
    }
}

fn branch_condition(e: &mut Emitter<'_>, kind: BranchKind, a: &[WireId; 32], b: &[WireId; 32]) -> WireId {
    match kind {
        BranchKind::Eq => equal(e, a, b),
        BranchKind::Ne => not_equal(e, a, b),
        BranchKind::Lt => signed_less_than(e, a, b),
        BranchKind::Ge => signed_ge(e, a, b),
        BranchKind::Ltu => unsigned_less_than(e, a, b),
        BranchKind::Geu => unsigned_ge(e, a, b),
    }
}

fn zero_extend_bool(bit: WireId) -> [WireId; 32] {
    std::array::from_fn(|i| if i == 0 { bit } else { WireId::FALSE })
}

fn sign_extend_byte(byte: &[WireId; 8], signed: bool) -> [WireId; 32] {
    let top = if signed { byte[7] } else { WireId::FALSE };
    std::array::from_fn(|i| if i < 8 { byte[i] } else { top })
}

fn sign_extend_half(half: &[WireId; 16], signed: bool) -> [WireId; 32] {
    let top = if signed { half[15] } else { WireId::FALSE };
    std::array::from_fn(|i| if i < 16 { half[i] } else { top })
}

fn lane_hit(e: &mut Emitter<'_>, lane: &[WireId; 2], index: usize) -> WireId {
    let mut hit = WireId::TRUE;
    for (b, &bit) in lane.iter().enumerate() {
        let want = WireId::constant((index >> b) & 1 == 1);
        let bit_xor_want = e.xor(bit, want);
        let same = e.not(bit_xor_want);
        hit = e.and(hit, same);
    }
    hit
}

/// Selects one of the word's 4 bytes via a symbolic 2-bit lane.
fn select_byte(e: &mut Emitter<'_>, word: &[WireId; 32], lane: &[WireId; 2]) -> [WireId; 8] {
    std::array::from_fn(|b| {
        let candidates = [word[b], word[8 + b], word[16 + b], word[24 + b]];
        let lo = e.mux(lane[0], candidates[0], candidates[1]);
        let hi = e.mux(lane[0], candidates[2], candidates[3]);
        e.mux(lane[1], lo, hi)
    })
}

/// Selects one of the word's 2 halves via a symbolic half-select bit.
fn select_half(e: &mut Emitter<'_>, word: &[WireId; 32], half_sel: WireId) -> [WireId; 16] {
    std::array::from_fn(|b| e.mux(half_sel, word[b], word[16 + b]))
}

/// Rebuilds a 32-bit word from `old`, replacing the byte at `lane` with
/// `new_byte` and leaving the other three bytes untouched.
fn merge_byte(e: &mut Emitter<'_>, old: &[WireId; 32], new_byte: &[WireId; 8], lane: &[WireId; 2]) -> [WireId; 32] {
    std::array::from_fn(|i| {
        let byte_idx = i / 8;
        let hit = lane_hit(e, lane, byte_idx);
        e.mux(hit, old[i], new_byte[i % 8])
    })
}

/// Rebuilds a 32-bit word from `old`, replacing the half at `half_sel` with
/// `new_half`.
fn merge_half(e: &mut Emitter<'_>, old: &[WireId; 32], new_half: &[WireId; 16], half_sel: WireId) -> [WireId; 32] {
    std::array::from_fn(|i| {
        let half_idx = i / 16;
        let hit = if half_idx == 0 { e.not(half_sel) } else { half_sel };
        e.mux(hit, old[i], new_half[i % 16])
    })
}
