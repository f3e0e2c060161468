//! Screen and input-stream opcodes. `sread`/`aread` and `read_char` are
//! the suspend points: rather than blocking for a keystroke they return
//! `OpOutcome::Suspend` and the executor hands control back to the host.

use crate::input::InputRequest;
use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{Display, OpOutcome};
use crate::state::GameState;

pub fn is_io_opcode(opcode: u8, operand_count: &OperandCount) -> bool {
    matches!(
        (opcode, operand_count),
        (0x1B, OperandCount::OP2)
            | (0x0C, OperandCount::OP0)
            | (0x04
                | 0x0A
                | 0x0B
                | 0x0D
                | 0x0E
                | 0x0F
                | 0x10
                | 0x11
                | 0x12
                | 0x13
                | 0x14
                | 0x15
                | 0x16, OperandCount::VAR)
    )
}

pub fn execute_io_op(
    state: &mut GameState,
    inst: &Instruction,
    display: Display,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x1B, OperandCount::OP2) => {
            display
                .set_color(ops[0], ops[1], 0)
                .map_err(|e| e.to_string())?;
        }
        (0x0C, OperandCount::OP0) => {
            // show_status (V3): left side is the object's short name.
            let obj = state.load_variable(16).unwrap_or(0);
            let location_addr = state
                .objects
                .short_name_addr(&state.memory, obj)
                .unwrap_or(0);
            let location = if location_addr != 0 {
                crate::text::decode_string(&state.memory, location_addr)
                    .map(|(s, _)| s)
                    .unwrap_or_default()
            } else {
                String::new()
            };
            let v1 = state.load_variable(17).unwrap_or(0) as i16;
            let v2 = state.load_variable(18).unwrap_or(0);
            let time_mode = state.memory.header.flags1 & 0x02 != 0;
            display
                .update_status_bar(&location, v1, v2 as i16, time_mode)
                .map_err(|e| e.to_string())?;
        }
        (0x04, OperandCount::VAR) => {
            let text_buf = ops[0] as u32;
            let parse_buf = ops.get(1).copied().unwrap_or(0) as u32;
            let time = ops.get(2).copied().unwrap_or(0);
            let routine = ops.get(3).copied().unwrap_or(0);
            return Ok(OpOutcome::Suspend(InputRequest::Line {
                text_buf,
                parse_buf,
                time,
                routine,
            }));
        }
        (0x16, OperandCount::VAR) => {
            let time = ops.get(1).copied().unwrap_or(0);
            let routine = ops.get(2).copied().unwrap_or(0);
            return Ok(OpOutcome::Suspend(InputRequest::Char { time, routine }));
        }
        (0x0A, OperandCount::VAR) => {
            display.split_window(ops[0]).map_err(|e| e.to_string())?;
        }
        (0x0B, OperandCount::VAR) => {
            display.set_window(ops[0] as u8).map_err(|e| e.to_string())?;
        }
        (0x0D, OperandCount::VAR) => {
            display.erase_window(ops[0] as i16).map_err(|e| e.to_string())?;
        }
        (0x0E, OperandCount::VAR) => {
            display.erase_line().map_err(|e| e.to_string())?;
        }
        (0x0F, OperandCount::VAR) => {
            display.set_cursor(ops[0], ops[1]).map_err(|e| e.to_string())?;
        }
        (0x10, OperandCount::VAR) => {
            let (line, column) = display.get_cursor().map_err(|e| e.to_string())?;
            let array = ops[0] as u32;
            state.memory.set_word(array, line).map_err(|e| e.to_string())?;
            state
                .memory
                .set_word(array + 2, column)
                .map_err(|e| e.to_string())?;
        }
        (0x11, OperandCount::VAR) => {
            display.set_text_style(ops[0]).map_err(|e| e.to_string())?;
        }
        (0x12, OperandCount::VAR) => {
            display.set_buffer_mode(ops[0] != 0).map_err(|e| e.to_string())?;
        }
        (0x13, OperandCount::VAR) => {
            let table = ops.get(1).copied();
            let width = ops.get(2).map(|&w| w as i16).unwrap_or(0);
            display
                .output_stream(ops[0] as i16, table, width)
                .map_err(|e| e.to_string())?;
        }
        (0x14, OperandCount::VAR) => {
            display.input_stream(ops[0]).map_err(|e| e.to_string())?;
        }
        (0x15, OperandCount::VAR) => {
            // sound_effect: best-effort; most terminal hosts have no audio.
        }
        _ => return Err(format!("unhandled io opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
