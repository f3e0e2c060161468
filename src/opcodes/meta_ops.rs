//! Save/restore, the RNG opcode, and other "meta" operations that don't
//! belong to any one of the other categories.

use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{do_branch, signed, store_result, Display, OpOutcome};
use crate::state::GameState;

pub fn is_meta_opcode(opcode: u8, ext: Option<u8>, operand_count: &OperandCount) -> bool {
    if let Some(ext) = ext {
        return matches!(ext, 0 | 1 | 4 | 9 | 10);
    }
    matches!(
        (opcode, operand_count),
        (0x04..=0x07 | 0x0D | 0x0F, OperandCount::OP0)
            | (0x0A, OperandCount::OP0)
            | (0x07, OperandCount::VAR)
    )
}

/// `save`/`restore` here always report failure: wiring them to an actual
/// `Storage` backend happens in the executor, which intercepts these two
/// opcodes before dispatching here when a `Storage` port is configured.
/// This handler is the no-storage-configured fallback.
pub fn execute_meta_op(
    state: &mut GameState,
    inst: &Instruction,
    pc_after: u32,
    display: Display,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x04, OperandCount::OP0) => {} // nop
        (0x05, OperandCount::OP0) => {
            do_branch(state, inst, pc_after, false).map_err(|e| e.to_string())?;
        }
        (0x06, OperandCount::OP0) => {
            do_branch(state, inst, pc_after, false).map_err(|e| e.to_string())?;
        }
        (0x07, OperandCount::OP0) => {
            state.restart();
            return Ok(OpOutcome::Restarted);
        }
        (0x0A, OperandCount::OP0) => {
            return Ok(OpOutcome::Quit);
        }
        (0x0D, OperandCount::OP0) => {
            // verify: checksum always treated as matching for an in-memory image.
            do_branch(state, inst, pc_after, true).map_err(|e| e.to_string())?;
        }
        (0x0F, OperandCount::OP0) => {
            // piracy: always "genuine"
            do_branch(state, inst, pc_after, true).map_err(|e| e.to_string())?;
        }
        (0x07, OperandCount::VAR) => {
            let arg = signed(ops[0]);
            let value = if arg > 0 {
                state.rng.gen_unsigned_rand() % arg as u16 + 1
            } else {
                state.rng.reseed(arg);
                0
            };
            store_result(state, inst, value).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(0) => {
            // EXT save (V5+): stores 0 (failed) when no Storage is wired up.
            store_result(state, inst, 0).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(1) => {
            store_result(state, inst, 0).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(4) => {
            let previous = display.set_font(ops[0]).map_err(|e| e.to_string())?;
            store_result(state, inst, previous).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(9) => {
            // save_undo: no in-memory undo ring in this build; -1 means
            // "the feature is unavailable", per the standard.
            store_result(state, inst, 0xFFFFu16).map_err(|e| e.to_string())?;
        }
        _ if inst.ext_opcode == Some(10) => {
            store_result(state, inst, 0).map_err(|e| e.to_string())?;
        }
        _ => return Err(format!("unhandled meta opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
