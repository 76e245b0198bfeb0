//! Immediate loads, labels, jumps/branches, and `halt` (§4.3, §4.4).

use crate::context::{ExecutionContext, StepResult};
use crate::error::VmResult;
use crate::opcode::Opcode;

/// `load_immediate` (§4.4): writes a 32-bit immediate to the low 32 bits of
/// `out`, clearing the upper bits — this instruction overwrites the whole
/// register. Emit this first when assembling a 64-bit constant.
pub fn load_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    ctx.env.write_register(op.out, op.immediate() as u64);
    Ok(ctx.advance())
}

/// `load_upper_immediate` (§4.4): ORs a 32-bit immediate into the upper 32
/// bits of `out`, preserving the lower bits. Emit this second, after
/// [`load_immediate`], to assemble a 64-bit constant.
pub fn load_upper_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lower = ctx.env.read_register(op.out) & 0xffff_ffff;
    let upper = (op.immediate() as u64) << 32;
    ctx.env.write_register(op.out, lower | upper);
    Ok(ctx.advance())
}

/// `label` (§4.4): a no-op carrying a 32-bit tag, used as a jump target
/// discoverable by [`find_label`].
pub fn label(ctx: &mut ExecutionContext, _op: Opcode) -> VmResult<StepResult> {
    Ok(ctx.advance())
}

/// `find_label` (§4.4): scans forward from the current `pc` to the program
/// end, then backward from the current `pc` to the program start, stopping
/// at the first [`label`] whose immediate tag matches this opcode's own
/// immediate. Writes the matching opcode's address (program index) to
/// `out`, or 0 if absent (§8 "preferring forward over backward matches").
pub fn find_label(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let tag = op.immediate();
    let is_match = |candidate: &Opcode| {
        matches!(candidate.op, Some(f) if f == label as crate::opcode::InstructionFn) && candidate.immediate() == tag
    };

    let forward = (ctx.pc..ctx.program.len()).find(|&i| is_match(&ctx.program[i]));
    let found = forward.or_else(|| (0..=ctx.pc).rev().find(|&i| is_match(&ctx.program[i])));

    ctx.env.write_register(op.out, found.map(|i| i as u64).unwrap_or(0));
    Ok(ctx.advance())
}

/// `jump_relative` (§4.4): writes `pc + 1` to `out`, then adds the signed
/// value of register `a` to the current `pc`.
pub fn jump_relative(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = ctx.env.read_register(op.a) as i64;
    let target = (ctx.pc as i64 + offset) as usize;
    ctx.env.write_register(op.out, ctx.pc as u64 + 1);
    Ok(ctx.jump(target))
}

/// `jump_relative_immediate` (§4.4): like [`jump_relative`] but the offset
/// is the opcode's packed signed 32-bit immediate.
pub fn jump_relative_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = op.immediate_signed() as i64;
    let target = (ctx.pc as i64 + offset) as usize;
    ctx.env.write_register(op.out, ctx.pc as u64 + 1);
    Ok(ctx.jump(target))
}

/// `jump_to` (§4.4): writes `pc + 1` to `out`, then sets `pc` to the
/// (absolute program-index) value of register `a`.
pub fn jump_to(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let target = ctx.env.read_register(op.a) as usize;
    ctx.env.write_register(op.out, ctx.pc as u64 + 1);
    Ok(ctx.jump(target))
}

/// `branch_relative` (§4.4): like [`jump_relative`] but only taken when
/// register `a` is nonzero; `out` is written to `pc + 1` unconditionally.
/// The branch offset is the signed value of register `b`.
pub fn branch_relative(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    ctx.env.write_register(op.out, ctx.pc as u64 + 1);
    if ctx.env.read_register(op.a) != 0 {
        let offset = ctx.env.read_register(op.b) as i64;
        let target = (ctx.pc as i64 + offset) as usize;
        Ok(ctx.jump(target))
    } else {
        Ok(ctx.advance())
    }
}

/// `branch_relative_immediate` (§4.4): like [`branch_relative`] but the
/// offset is the opcode's packed signed 16-bit branch immediate.
pub fn branch_relative_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    ctx.env.write_register(op.out, ctx.pc as u64 + 1);
    if ctx.env.read_register(op.a) != 0 {
        let offset = op.branch_immediate() as i64;
        let target = (ctx.pc as i64 + offset) as usize;
        Ok(ctx.jump(target))
    } else {
        Ok(ctx.advance())
    }
}

/// `branch_to` (§4.4): like [`jump_to`] but only taken when register `a` is
/// nonzero; the target is the (absolute program-index) value of register `b`.
pub fn branch_to(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    ctx.env.write_register(op.out, ctx.pc as u64 + 1);
    if ctx.env.read_register(op.a) != 0 {
        let target = ctx.env.read_register(op.b) as usize;
        Ok(ctx.jump(target))
    } else {
        Ok(ctx.advance())
    }
}

/// `halt` (§4.3 "Termination"): ends the current context without calling a
/// successor.
pub fn halt(ctx: &mut ExecutionContext, _op: Opcode) -> VmResult<StepResult> {
    Ok(ctx.halt())
}
