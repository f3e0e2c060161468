//! Direct memory access, the stack-as-variable opcodes, and table scans.

use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{do_branch, signed, store_result, OpOutcome};
use crate::state::GameState;

pub fn is_memory_opcode(opcode: u8, operand_count: &OperandCount) -> bool {
    matches!(
        (opcode, operand_count),
        (0x0D, OperandCount::OP2)
            | (0x0F | 0x10, OperandCount::OP2)
            | (0x0E, OperandCount::OP1)
            | (0x01 | 0x02 | 0x08 | 0x09, OperandCount::VAR)
            | (0x17 | 0x1D, OperandCount::VAR)
    )
}

pub fn execute_memory_op(
    state: &mut GameState,
    inst: &Instruction,
    pc_after: u32,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x0D, OperandCount::OP2) => {
            // store variable value
            state
                .store_variable(inst.operands[0] as u8, ops[1])
                .map_err(|e| e.to_string())?;
        }
        (0x0F, OperandCount::OP2) => {
            let addr = ops[0] as u32 + ops[1] as u32 * 2;
            let value = state.memory.get_word(addr).map_err(|e| e.to_string())?;
            store_result(state, inst, value).map_err(|e| e.to_string())?;
        }
        (0x10, OperandCount::OP2) => {
            let addr = ops[0] as u32 + ops[1] as u32;
            let value = state.memory.get_byte(addr).map_err(|e| e.to_string())? as u16;
            store_result(state, inst, value).map_err(|e| e.to_string())?;
        }
        (0x0E, OperandCount::OP1) => {
            let value = state.load_variable(inst.operands[0] as u8).map_err(|e| e.to_string())?;
            store_result(state, inst, value).map_err(|e| e.to_string())?;
        }
        (0x01, OperandCount::VAR) => {
            let addr = ops[0] as u32 + ops[1] as u32 * 2;
            state.memory.set_word(addr, ops[2]).map_err(|e| e.to_string())?;
        }
        (0x02, OperandCount::VAR) => {
            let addr = ops[0] as u32 + ops[1] as u32;
            state.memory.set_byte(addr, ops[2] as u8).map_err(|e| e.to_string())?;
        }
        (0x08, OperandCount::VAR) => {
            state.push(ops[0]);
        }
        (0x09, OperandCount::VAR) => {
            let value = state.pop().map_err(|e| e.to_string())?;
            // `pull` takes a variable reference in V1-5; V6 takes a stack
            // reference, which this crate does not separately model.
            state.store_variable(inst.operands[0] as u8, value).map_err(|e| e.to_string())?;
        }
        (0x17, OperandCount::VAR) => {
            // scan_table x table len [form]: linear scan for x, branch if found.
            let x = ops[0];
            let table = ops[1] as u32;
            let len = ops[2];
            let form = ops.get(3).copied().unwrap_or(0x82);
            let entry_size = (form & 0x7F).max(1) as u32;
            let is_word = form & 0x80 != 0;
            let mut found_addr = 0u16;
            for i in 0..len as u32 {
                let addr = table + i * entry_size;
                let value = if is_word {
                    state.memory.get_word(addr).map_err(|e| e.to_string())?
                } else {
                    state.memory.get_byte(addr).map_err(|e| e.to_string())? as u16
                };
                if value == x {
                    found_addr = addr as u16;
                    break;
                }
            }
            store_result(state, inst, found_addr).map_err(|e| e.to_string())?;
            do_branch(state, inst, pc_after, found_addr != 0).map_err(|e| e.to_string())?;
        }
        (0x1D, OperandCount::VAR) => {
            let src = ops[0] as u32;
            let dst = ops[1] as u32;
            let len = signed(ops[2]);
            if dst == 0 {
                // copy_table first second 0: zero-fill `first` for `second` bytes
                for i in 0..ops[2] as u32 {
                    state.memory.set_byte(src + i, 0).map_err(|e| e.to_string())?;
                }
            } else {
                state.memory.copy_block(src, dst, len).map_err(|e| e.to_string())?;
            }
        }
        _ => return Err(format!("unhandled memory opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
