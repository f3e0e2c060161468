//! Routine call/return opcodes and unconditional jumps.

use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{do_branch, store_result, OpOutcome};
use crate::state::GameState;

pub fn is_routine_opcode(opcode: u8, operand_count: &OperandCount, version: u8) -> bool {
    if opcode == 0x0F && *operand_count == OperandCount::OP1 {
        return version >= 5; // call_1n; V1-4 uses this slot for `not`
    }
    matches!(
        (opcode, operand_count),
        (0x19 | 0x1A | 0x1C, OperandCount::OP2)
            | (0x08 | 0x0B | 0x0C, OperandCount::OP1)
            | (0x00 | 0x01 | 0x08 | 0x09, OperandCount::OP0)
            | (0x00 | 0x0C | 0x19 | 0x1A | 0x1F, OperandCount::VAR)
    )
}

/// Call a routine. `routine_operand` 0 means "call to the null routine":
/// returns false immediately without pushing a frame.
fn do_call(
    state: &mut GameState,
    inst: &Instruction,
    routine_operand: u16,
    args: &[u16],
    pc_after: u32,
) -> Result<(), String> {
    if routine_operand == 0 {
        if let Some(var) = inst.store_var {
            state.store_variable(var, 0).map_err(|e| e.to_string())?;
        }
        return Ok(());
    }
    let addr = state.memory.unpack_routine(routine_operand);
    state
        .call_routine(addr, args, inst.store_var, pc_after)
        .map_err(|e| e.to_string())
}

pub fn execute_routine_op(
    state: &mut GameState,
    inst: &Instruction,
    pc_after: u32,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x19, OperandCount::OP2) => do_call(state, inst, ops[0], &ops[1..], pc_after)?,
        (0x1A, OperandCount::OP2) => do_call(state, inst, ops[0], &ops[1..], pc_after)?,
        (0x1C, OperandCount::OP2) => {
            // throw value frame_id: unwind call frames down to frame_id.
            let value = ops[0];
            let target_depth = ops[1] as usize;
            while state.frames.len() > target_depth {
                state.return_from_routine(value).map_err(|e| e.to_string())?;
            }
        }
        (0x08, OperandCount::OP1) => do_call(state, inst, ops[0], &[], pc_after)?,
        (0x0B, OperandCount::OP1) => {
            // ret value: the operand is the value itself, already resolved.
            state.return_from_routine(ops[0]).map_err(|e| e.to_string())?;
        }
        (0x0C, OperandCount::OP1) => {
            let offset = ops[0] as i16 as i32;
            state.pc = (pc_after as i64 + offset as i64 - 2) as u32;
        }
        (0x0F, OperandCount::OP1) => do_call(state, inst, ops[0], &[], pc_after)?,
        (0x00, OperandCount::OP0) => {
            let val = state.return_from_routine(1).map_err(|e| e.to_string())?;
            if !val {
                return Ok(OpOutcome::Quit);
            }
        }
        (0x01, OperandCount::OP0) => {
            let val = state.return_from_routine(0).map_err(|e| e.to_string())?;
            if !val {
                return Ok(OpOutcome::Quit);
            }
        }
        (0x08, OperandCount::OP0) => {
            let value = state.pop().map_err(|e| e.to_string())?;
            let val = state.return_from_routine(value).map_err(|e| e.to_string())?;
            if !val {
                return Ok(OpOutcome::Quit);
            }
        }
        (0x09, OperandCount::OP0) => {
            if state.memory.header.version >= 5 {
                // catch: store the current call-frame depth as a marker.
                let depth = state.frames.len() as u16;
                store_result(state, inst, depth).map_err(|e| e.to_string())?;
            } else {
                state.pop().map_err(|e| e.to_string())?;
            }
        }
        (0x00, OperandCount::VAR) => do_call(state, inst, ops[0], &ops[1..], pc_after)?,
        (0x0C, OperandCount::VAR) => do_call(state, inst, ops[0], &ops[1..], pc_after)?,
        (0x19, OperandCount::VAR) => do_call(state, inst, ops[0], &ops[1..], pc_after)?,
        (0x1A, OperandCount::VAR) => do_call(state, inst, ops[0], &ops[1..], pc_after)?,
        (0x1F, OperandCount::VAR) => {
            let cond = (ops[0] as u8) <= state.argument_count();
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        _ => return Err(format!("unhandled routine opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
