//! Object-tree, attribute, and property opcodes. The actual object-table
//! layout lives in `crate::object`; these handlers just marshal operands
//! and branch/store results per the instruction.

use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{do_branch, store_result, OpOutcome};
use crate::state::GameState;

pub fn is_object_opcode(opcode: u8, operand_count: &OperandCount) -> bool {
    matches!(
        (opcode, operand_count),
        (0x06, OperandCount::OP2)
            | (0x0A..=0x0C, OperandCount::OP2)
            | (0x0E, OperandCount::OP2)
            | (0x11..=0x13, OperandCount::OP2)
            | (0x01..=0x04, OperandCount::OP1)
            | (0x09, OperandCount::OP1)
            | (0x03, OperandCount::VAR)
    )
}

pub fn execute_object_op(
    state: &mut GameState,
    inst: &Instruction,
    pc_after: u32,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x06, OperandCount::OP2) => {
            // jin obj1 obj2: branch if obj1's parent is obj2
            let parent = state.objects.get_parent(&state.memory, ops[0])?;
            do_branch(state, inst, pc_after, parent == ops[1]).map_err(|e| e.to_string())?;
        }
        (0x0A, OperandCount::OP2) => {
            let set = state
                .objects
                .get_attribute(&state.memory, ops[0], ops[1])
                ?;
            do_branch(state, inst, pc_after, set).map_err(|e| e.to_string())?;
        }
        (0x0B, OperandCount::OP2) => {
            state
                .objects
                .set_attribute(&mut state.memory, ops[0], ops[1], true)
                ?;
        }
        (0x0C, OperandCount::OP2) => {
            state
                .objects
                .set_attribute(&mut state.memory, ops[0], ops[1], false)
                ?;
        }
        (0x0E, OperandCount::OP2) => {
            state
                .objects
                .insert_object(&mut state.memory, ops[0], ops[1])
                ?;
        }
        (0x11, OperandCount::OP2) => {
            let value = state
                .objects
                .get_property(&state.memory, ops[0], ops[1])
                ?;
            store_result(state, inst, value).map_err(|e| e.to_string())?;
        }
        (0x12, OperandCount::OP2) => {
            let addr = state
                .objects
                .get_property_addr(&state.memory, ops[0], ops[1])
                ?;
            store_result(state, inst, addr).map_err(|e| e.to_string())?;
        }
        (0x13, OperandCount::OP2) => {
            let next = state
                .objects
                .get_next_property(&state.memory, ops[0], ops[1])
                ?;
            store_result(state, inst, next).map_err(|e| e.to_string())?;
        }
        (0x01, OperandCount::OP1) => {
            let sibling = state.objects.get_sibling(&state.memory, ops[0])?;
            store_result(state, inst, sibling).map_err(|e| e.to_string())?;
            do_branch(state, inst, pc_after, sibling != 0).map_err(|e| e.to_string())?;
        }
        (0x02, OperandCount::OP1) => {
            let child = state.objects.get_child(&state.memory, ops[0])?;
            store_result(state, inst, child).map_err(|e| e.to_string())?;
            do_branch(state, inst, pc_after, child != 0).map_err(|e| e.to_string())?;
        }
        (0x03, OperandCount::OP1) => {
            let parent = state.objects.get_parent(&state.memory, ops[0])?;
            store_result(state, inst, parent).map_err(|e| e.to_string())?;
        }
        (0x04, OperandCount::OP1) => {
            // get_prop_len takes the property *data* address directly,
            // i.e. the value a previous get_prop_addr returned.
            let len = state
                .objects
                .get_property_len(&state.memory, ops[0])
                ?;
            store_result(state, inst, len).map_err(|e| e.to_string())?;
        }
        (0x09, OperandCount::OP1) => {
            state.objects.remove_object(&mut state.memory, ops[0])?;
        }
        (0x03, OperandCount::VAR) => {
            state
                .objects
                .put_property(&mut state.memory, ops[0], ops[1], ops[2])
                ?;
        }
        _ => return Err(format!("unhandled object opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
