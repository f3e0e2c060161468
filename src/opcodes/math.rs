//! Arithmetic, comparison, and bitwise opcodes.

use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{do_branch, signed, store_result, OpOutcome};
use crate::state::GameState;

pub fn is_math_opcode(opcode: u8, ext: Option<u8>, operand_count: &OperandCount, version: u8) -> bool {
    if ext.is_some() {
        return matches!(opcode_ext(ext), 2 | 3);
    }
    if opcode == 0x0F && *operand_count == OperandCount::OP1 {
        return version <= 4; // `not`; V5+ reassigns this slot to call_1n
    }
    matches!(
        (opcode, operand_count),
        (0x01..=0x03, OperandCount::OP2)
            | (0x04 | 0x05, OperandCount::OP2)
            | (0x07, OperandCount::OP2)
            | (0x08 | 0x09, OperandCount::OP2)
            | (0x14..=0x18, OperandCount::OP2)
            | (0x00, OperandCount::OP1)
            | (0x05 | 0x06, OperandCount::OP1)
            | (0x18, OperandCount::VAR)
    )
}

fn opcode_ext(ext: Option<u8>) -> u8 {
    ext.unwrap_or(0xFF)
}

pub fn execute_math_op(
    state: &mut GameState,
    inst: &Instruction,
    pc_after: u32,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x01, OperandCount::OP2) => {
            // je: true if any further operand equals the first
            let cond = ops.len() > 1 && ops[1..].iter().any(|&v| v == ops[0]);
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x02, OperandCount::OP2) => {
            let cond = signed(ops[0]) < signed(ops[1]);
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x03, OperandCount::OP2) => {
            let cond = signed(ops[0]) > signed(ops[1]);
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x04, OperandCount::OP2) => {
            // dec_chk variable_ref value: decrement, branch if now < value
            let var = inst.operands[0] as u8;
            let new_val = signed(state.load_variable(var).map_err(|e| e.to_string())?).wrapping_sub(1);
            state.store_variable(var, new_val as u16).map_err(|e| e.to_string())?;
            let cond = new_val < signed(ops[1]);
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x05, OperandCount::OP2) => {
            let var = inst.operands[0] as u8;
            let new_val = signed(state.load_variable(var).map_err(|e| e.to_string())?).wrapping_add(1);
            state.store_variable(var, new_val as u16).map_err(|e| e.to_string())?;
            let cond = new_val > signed(ops[1]);
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x07, OperandCount::OP2) => {
            let cond = (ops[0] & ops[1]) == ops[1];
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x08, OperandCount::OP2) => {
            store_result(state, inst, ops[0] | ops[1]).map_err(|e| e.to_string())?;
        }
        (0x09, OperandCount::OP2) => {
            store_result(state, inst, ops[0] & ops[1]).map_err(|e| e.to_string())?;
        }
        (0x14, OperandCount::OP2) => {
            store_result(state, inst, (signed(ops[0]).wrapping_add(signed(ops[1]))) as u16)
                .map_err(|e| e.to_string())?;
        }
        (0x15, OperandCount::OP2) => {
            store_result(state, inst, (signed(ops[0]).wrapping_sub(signed(ops[1]))) as u16)
                .map_err(|e| e.to_string())?;
        }
        (0x16, OperandCount::OP2) => {
            store_result(state, inst, (signed(ops[0]).wrapping_mul(signed(ops[1]))) as u16)
                .map_err(|e| e.to_string())?;
        }
        (0x17, OperandCount::OP2) => {
            if ops[1] == 0 {
                return Err("division by zero".to_string());
            }
            store_result(state, inst, (signed(ops[0]).wrapping_div(signed(ops[1]))) as u16)
                .map_err(|e| e.to_string())?;
        }
        (0x18, OperandCount::OP2) => {
            if ops[1] == 0 {
                return Err("modulo by zero".to_string());
            }
            store_result(state, inst, (signed(ops[0]).wrapping_rem(signed(ops[1]))) as u16)
                .map_err(|e| e.to_string())?;
        }
        (0x00, OperandCount::OP1) => {
            let cond = signed(ops[0]) == 0;
            do_branch(state, inst, pc_after, cond).map_err(|e| e.to_string())?;
        }
        (0x05, OperandCount::OP1) => {
            let var = inst.operands[0] as u8;
            let v = signed(state.load_variable(var).map_err(|e| e.to_string())?).wrapping_add(1);
            state.store_variable(var, v as u16).map_err(|e| e.to_string())?;
        }
        (0x06, OperandCount::OP1) => {
            let var = inst.operands[0] as u8;
            let v = signed(state.load_variable(var).map_err(|e| e.to_string())?).wrapping_sub(1);
            state.store_variable(var, v as u16).map_err(|e| e.to_string())?;
        }
        (0x0F, OperandCount::OP1) if state.memory.header.version <= 4 => {
            store_result(state, inst, !ops[0]).map_err(|e| e.to_string())?;
        }
        (0x18, OperandCount::VAR) if state.memory.header.version >= 5 => {
            // `not` moves from 1OP:0x8F to VAR:0x18 in V5+.
            store_result(state, inst, !ops[0]).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(2) => {
            // log_shift: positive = left, negative = right
            let places = signed(ops[1]);
            let value = ops[0];
            let result = if places >= 0 {
                value.wrapping_shl(places as u32)
            } else {
                value.wrapping_shr((-places) as u32)
            };
            store_result(state, inst, result).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(3) => {
            // art_shift: arithmetic (sign-extending) shift
            let places = signed(ops[1]);
            let value = signed(ops[0]);
            let result = if places >= 0 {
                value.wrapping_shl(places as u32)
            } else {
                value.wrapping_shr((-places) as u32)
            };
            store_result(state, inst, result as u16).map_err(|e| e.to_string())?;
        }
        _ => return Err(format!("unhandled math opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
