//! Output opcodes: literal/packed/addressed string printing, numbers, and
//! the tokenizer opcodes (which delegate to `crate::dictionary`).

use crate::dictionary;
use crate::instruction::{Instruction, OperandCount};
use crate::opcodes::{signed, Display, OpOutcome};
use crate::state::GameState;
use crate::text;

pub fn is_text_opcode(opcode: u8, operand_count: &OperandCount) -> bool {
    matches!(
        (opcode, operand_count),
        (0x02 | 0x03 | 0x0B, OperandCount::OP0)
            | (0x07 | 0x0A | 0x0D, OperandCount::OP1)
            | (0x05 | 0x06, OperandCount::VAR)
            | (0x1B | 0x1C | 0x1E, OperandCount::VAR)
    )
}

pub fn execute_text_op(
    state: &mut GameState,
    inst: &Instruction,
    display: Display,
    ops: &[u16],
) -> Result<OpOutcome, String> {
    match (inst.opcode, &inst.operand_count) {
        (0x02, OperandCount::OP0) => {
            if let Some(text) = &inst.text {
                display.print(text).map_err(|e| e.to_string())?;
            }
        }
        (0x03, OperandCount::OP0) => {
            if let Some(text) = &inst.text {
                display.print(text).map_err(|e| e.to_string())?;
            }
            display.print_char('\n').map_err(|e| e.to_string())?;
            state.return_from_routine(1).map_err(|e| e.to_string())?;
        }
        (0x0B, OperandCount::OP0) => {
            display.print_char('\n').map_err(|e| e.to_string())?;
        }
        (0x07, OperandCount::OP1) => {
            let (text, _) = text::decode_string(&state.memory, ops[0] as u32)?;
            display.print(&text).map_err(|e| e.to_string())?;
        }
        (0x0A, OperandCount::OP1) => {
            let addr = state.objects.short_name_addr(&state.memory, ops[0])?;
            let (text, _) = text::decode_string(&state.memory, addr)?;
            display.print(&text).map_err(|e| e.to_string())?;
        }
        (0x0D, OperandCount::OP1) => {
            let text = text::decode_string_at_packed(&state.memory, ops[0])?;
            display.print(&text).map_err(|e| e.to_string())?;
        }
        (0x05, OperandCount::VAR) => {
            let ch = (ops[0] as u8) as char;
            display.print_char(ch).map_err(|e| e.to_string())?;
        }
        (0x06, OperandCount::VAR) => {
            display
                .print(&signed(ops[0]).to_string())
                .map_err(|e| e.to_string())?;
        }
        (0x1B, OperandCount::VAR) => {
            // tokenise text parse [dictionary [flag]]
            let dict_addr = ops.get(2).copied().map(|a| a as u32).unwrap_or(state.memory.header.dictionary as u32);
            let flag = ops.get(3).copied().unwrap_or(0) != 0;
            dictionary::tokenize(&mut state.memory, ops[0] as u32, ops[1] as u32, dict_addr, flag)?;
        }
        (0x1C, OperandCount::VAR) => {
            // encode_text zscii-text length from coded-text: encode a
            // substring of the text buffer into the dictionary word format.
            let zscii_buf = ops[0] as u32;
            let length = ops[1] as u32;
            let from = ops[2] as u32;
            let coded_buf = ops[3] as u32;
            let mut chars = Vec::with_capacity(length as usize);
            for i in 0..length {
                chars.push(
                    state
                        .memory
                        .get_byte(zscii_buf + from + i)
                        .map_err(|e| e.to_string())?,
                );
            }
            let word = String::from_utf8_lossy(&chars).to_string();
            let encoded = text::encode(&word, if state.memory.header.version <= 3 { 6 } else { 9 });
            for (i, w) in encoded.iter().enumerate() {
                state
                    .memory
                    .set_word(coded_buf + i as u32 * 2, *w)
                    .map_err(|e| e.to_string())?;
            }
        }
        (0x1E, OperandCount::VAR) => {
            // print_table table width [height] [skip]: print a grid of ZSCII
            // bytes, one row per line, starting a new line after each row.
            let table = ops[0] as u32;
            let width = ops[1] as u32;
            let height = ops.get(2).copied().unwrap_or(1) as u32;
            let skip = ops.get(3).copied().unwrap_or(0) as u32;
            for row in 0..height {
                if row > 0 {
                    display.print_char('\n').map_err(|e| e.to_string())?;
                }
                let row_addr = table + row * (width + skip);
                for col in 0..width {
                    let ch = state
                        .memory
                        .get_byte(row_addr + col)
                        .map_err(|e| e.to_string())? as char;
                    display.print_char(ch).map_err(|e| e.to_string())?;
                }
            }
        }
        _ => return Err(format!("unhandled text opcode {:#04x}", inst.opcode)),
    }
    Ok(OpOutcome::Normal)
}
