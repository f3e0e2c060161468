//! The fetch-decode-resolve-dispatch loop. This replaces the old engine's
//! direct-to-terminal run loop: rather than blocking on a keystroke,
//! `step` returns as soon as an opcode needs one, and the host resumes
//! execution later by calling `deliver_input`.

use crate::dictionary;
use crate::display_trait::ZMachineDisplay;
use crate::error::ExecutionError;
use crate::input::{InputRequest, InputResponse};
use crate::instruction::{Instruction, OperandCount, OperandType};
use crate::opcodes::{
    do_branch, io_ops, math, memory_ops, meta_ops, object_ops, routine_ops, store_result,
    text_ops, OpOutcome,
};
use crate::state::GameState;
use crate::storage::{self, Storage};

/// What happened after a `step`, for the host to act on.
pub enum StepResult {
    /// The instruction ran to completion; call `step` again.
    Continue,
    /// The game needs a line or a keystroke; call `deliver_input` once the
    /// host has it, then resume stepping.
    Suspend(InputRequest),
    Quit,
    Restarted,
    Error(ExecutionError),
}

struct PendingRead {
    request: InputRequest,
    store_var: Option<u8>,
}

/// Owns the `GameState` and drives it one instruction at a time. A
/// `Storage` backend is optional; without one, `save`/`restore` opcodes
/// fall through to `meta_ops`'s always-fails stubs.
pub struct Executor {
    pub state: GameState,
    storage: Option<Box<dyn Storage>>,
    pending: Option<PendingRead>,
}

impl Executor {
    pub fn new(state: GameState) -> Self {
        Executor {
            state,
            storage: None,
            pending: None,
        }
    }

    pub fn with_storage(state: GameState, storage: Box<dyn Storage>) -> Self {
        Executor {
            state,
            storage: Some(storage),
            pending: None,
        }
    }

    pub fn set_storage(&mut self, storage: Box<dyn Storage>) {
        self.storage = Some(storage);
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.pending.is_some()
    }

    /// Decode and run a single instruction.
    pub fn step(&mut self, display: &mut dyn ZMachineDisplay) -> StepResult {
        if self.pending.is_some() {
            let pc = self.state.pc;
            log::error!("fatal error at {pc:#06x}: step called while an input request is outstanding");
            return StepResult::Error(ExecutionError::new(
                pc,
                "step called while an input request is outstanding",
            ));
        }

        let version = self.state.memory.header.version;
        let inst = match Instruction::decode(&self.state.memory, self.state.pc, version) {
            Ok(inst) => inst,
            Err(e) => {
                let pc = self.state.pc;
                log::error!("fatal decode error at {pc:#06x}: {e}");
                return StepResult::Error(ExecutionError::new(pc, e));
            }
        };
        let pc_after = self.state.pc + inst.size as u32;

        let ops = match self.resolve_operands(&inst) {
            Ok(ops) => ops,
            Err(e) => {
                log::error!(
                    "fatal error at {:#06x} ({}): {}",
                    self.state.pc,
                    inst.format_with_version(version),
                    e.message
                );
                return StepResult::Error(e);
            }
        };

        self.state.pc = pc_after;

        if self.dispatch_storage_opcode(&inst, pc_after) {
            return StepResult::Continue;
        }

        match self.dispatch(&inst, pc_after, display, &ops) {
            Ok(OpOutcome::Normal) => StepResult::Continue,
            Ok(OpOutcome::Quit) => StepResult::Quit,
            Ok(OpOutcome::Restarted) => StepResult::Restarted,
            Ok(OpOutcome::Suspend(request)) => {
                self.pending = Some(PendingRead {
                    request: request.clone(),
                    store_var: inst.store_var,
                });
                StepResult::Suspend(request)
            }
            Err(message) => {
                log::error!(
                    "fatal error at {:#06x} ({}), operands {:?}: {}",
                    self.state.pc,
                    inst.format_with_version(version),
                    ops,
                    message
                );
                StepResult::Error(ExecutionError::new(self.state.pc, message))
            }
        }
    }

    /// Hand back what the host collected for an outstanding `Suspend`,
    /// writing it into the text/parse buffers (for a line) or the store
    /// variable (for a keystroke) exactly as the opcode that suspended
    /// expects, then clear the pending request so `step` can resume.
    pub fn deliver_input(&mut self, response: InputResponse) -> Result<(), String> {
        let pending = self
            .pending
            .take()
            .ok_or("no input request is outstanding")?;
        match (pending.request, response) {
            (
                InputRequest::Line {
                    text_buf, parse_buf, ..
                },
                InputResponse::Line(line),
            ) => self.write_line_input(text_buf, parse_buf, &line, pending.store_var),
            (
                InputRequest::Line {
                    text_buf, parse_buf, ..
                },
                InputResponse::TimedOut,
            ) => self.write_line_input(text_buf, parse_buf, "", pending.store_var),
            (InputRequest::Char { .. }, InputResponse::Char(ch)) => {
                if let Some(var) = pending.store_var {
                    self.state
                        .store_variable(var, ch as u16)
                        .map_err(|e| e.to_string())?;
                }
                Ok(())
            }
            (InputRequest::Char { .. }, InputResponse::TimedOut) => {
                if let Some(var) = pending.store_var {
                    self.state.store_variable(var, 0).map_err(|e| e.to_string())?;
                }
                Ok(())
            }
            _ => Err("input response doesn't match the outstanding request".to_string()),
        }
    }

    fn write_line_input(
        &mut self,
        text_buf: u32,
        parse_buf: u32,
        line: &str,
        store_var: Option<u8>,
    ) -> Result<(), String> {
        let version = self.state.memory.header.version;
        let max_len = self
            .state
            .memory
            .get_byte(text_buf)
            .map_err(|e| e.to_string())? as usize;
        let max_len = if version <= 4 { max_len.saturating_sub(1) } else { max_len };
        let bytes: Vec<u8> = line
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .take(max_len)
            .map(|c| c as u8)
            .collect();

        let text_offset = if version <= 4 { 1u32 } else { 2u32 };
        for (i, &b) in bytes.iter().enumerate() {
            self.state
                .memory
                .set_byte(text_buf + text_offset + i as u32, b)
                .map_err(|e| e.to_string())?;
        }
        if version <= 4 {
            self.state
                .memory
                .set_byte(text_buf + text_offset + bytes.len() as u32, 0)
                .map_err(|e| e.to_string())?;
        } else {
            self.state
                .memory
                .set_byte(text_buf + 1, bytes.len() as u8)
                .map_err(|e| e.to_string())?;
        }

        if parse_buf != 0 {
            let dict_addr = self.state.memory.header.dictionary as u32;
            dictionary::tokenize(&mut self.state.memory, text_buf, parse_buf, dict_addr, false)?;
        }

        if version >= 5 {
            if let Some(var) = store_var {
                // Terminating character: newline, since the host delivered a
                // complete line rather than a specific terminator keypress.
                self.state.store_variable(var, 13).map_err(|e| e.to_string())?;
            }
        }
        Ok(())
    }

    fn resolve_operands(&mut self, inst: &Instruction) -> Result<Vec<u16>, ExecutionError> {
        let mut ops = Vec::with_capacity(inst.operands.len());
        for (&raw, op_type) in inst.operands.iter().zip(inst.operand_types.iter()) {
            let value = match op_type {
                OperandType::Variable => self.state.load_variable(raw as u8)?,
                _ => raw,
            };
            ops.push(value);
        }
        Ok(ops)
    }

    fn dispatch(
        &mut self,
        inst: &Instruction,
        pc_after: u32,
        display: &mut dyn ZMachineDisplay,
        ops: &[u16],
    ) -> Result<OpOutcome, String> {
        let version = self.state.memory.header.version;
        let ext = inst.ext_opcode;

        if routine_ops::is_routine_opcode(inst.opcode, &inst.operand_count, version) {
            routine_ops::execute_routine_op(&mut self.state, inst, pc_after, ops)
        } else if math::is_math_opcode(inst.opcode, ext, &inst.operand_count, version) {
            math::execute_math_op(&mut self.state, inst, pc_after, ops)
        } else if object_ops::is_object_opcode(inst.opcode, &inst.operand_count) {
            object_ops::execute_object_op(&mut self.state, inst, pc_after, ops)
        } else if memory_ops::is_memory_opcode(inst.opcode, &inst.operand_count) {
            memory_ops::execute_memory_op(&mut self.state, inst, pc_after, ops)
        } else if text_ops::is_text_opcode(inst.opcode, &inst.operand_count) {
            text_ops::execute_text_op(&mut self.state, inst, display, ops)
        } else if io_ops::is_io_opcode(inst.opcode, &inst.operand_count) {
            io_ops::execute_io_op(&mut self.state, inst, display, ops)
        } else if meta_ops::is_meta_opcode(inst.opcode, ext, &inst.operand_count) {
            meta_ops::execute_meta_op(&mut self.state, inst, pc_after, display, ops)
        } else {
            Err(format!(
                "no handler for opcode {:#04x} ({:?}){}",
                inst.opcode,
                inst.operand_count,
                ext.map(|e| format!(" ext {e:#04x}")).unwrap_or_default()
            ))
        }
    }

    /// Intercepts `save`/`restore` (0OP 0x05/0x06, and EXT 0/1) before the
    /// `meta_ops` fallback, wiring them to `self.storage` when one is
    /// configured. Returns `true` if it handled the instruction.
    fn dispatch_storage_opcode(&mut self, inst: &Instruction, pc_after: u32) -> bool {
        let is_v1_save = inst.ext_opcode.is_none()
            && inst.opcode == 0x05
            && inst.operand_count == OperandCount::OP0;
        let is_v1_restore = inst.ext_opcode.is_none()
            && inst.opcode == 0x06
            && inst.operand_count == OperandCount::OP0;
        let is_ext_save = inst.ext_opcode == Some(0);
        let is_ext_restore = inst.ext_opcode == Some(1);

        if !(is_v1_save || is_v1_restore || is_ext_save || is_ext_restore) {
            return false;
        }
        let Some(backend) = self.storage.as_mut() else {
            return false;
        };

        if is_v1_save || is_ext_save {
            let snap = storage::snapshot(&self.state);
            let ok = backend.save(snap);
            if is_v1_save {
                let _ = do_branch(&mut self.state, inst, pc_after, ok);
            } else {
                let _ = store_result(&mut self.state, inst, if ok { 1 } else { 0 });
            }
            return true;
        }

        let restored = backend
            .restore()
            .and_then(|snap| storage::apply_snapshot(&mut self.state, &snap).ok());

        match restored {
            Some(()) if is_ext_restore => {
                let _ = store_result(&mut self.state, inst, 2);
            }
            Some(()) => {
                let _ = do_branch(&mut self.state, inst, pc_after, true);
            }
            None if is_ext_restore => {
                let _ = store_result(&mut self.state, inst, 0);
            }
            None => {
                let _ = do_branch(&mut self.state, inst, pc_after, false);
            }
        }
        true
    }
}
