//! Quetzal chunk definitions, adapted onto `GameState`/`CallFrame`.

use crate::state::{CallFrame, GameState};

/// IFhd chunk - Interface Header. Identifies which story file a save
/// belongs to.
pub struct IFhdChunk {
    pub release: u16,
    pub serial: [u8; 6],
    pub checksum: u16,
    pub initial_pc: u16,
}

impl IFhdChunk {
    pub fn from_state(state: &GameState) -> Self {
        let header = &state.memory.header;
        let mut serial = [0u8; 6];
        for (slot, b) in serial.iter_mut().zip(header.serial.as_bytes()) {
            *slot = *b;
        }
        IFhdChunk {
            release: header.release,
            serial,
            checksum: header.checksum_file,
            initial_pc: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(13);
        bytes.extend_from_slice(&self.release.to_be_bytes());
        bytes.extend_from_slice(&self.serial);
        bytes.extend_from_slice(&self.checksum.to_be_bytes());
        let pc_bytes = (self.initial_pc as u32).to_be_bytes();
        bytes.push(pc_bytes[1]);
        bytes.push(pc_bytes[2]);
        bytes.push(pc_bytes[3]);
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        if data.len() < 13 {
            return Err("IFhd chunk too small".to_string());
        }
        let release = u16::from_be_bytes([data[0], data[1]]);
        let mut serial = [0u8; 6];
        serial.copy_from_slice(&data[2..8]);
        let checksum = u16::from_be_bytes([data[8], data[9]]);
        let initial_pc = ((data[10] as u16) << 8) | (data[11] as u16);
        Ok(IFhdChunk {
            release,
            serial,
            checksum,
            initial_pc,
        })
    }
}

/// UMem chunk - uncompressed dynamic memory, used as a fallback when the
/// caller doesn't want XOR-RLE compression.
pub struct UMemChunk {
    pub memory: Vec<u8>,
}

impl UMemChunk {
    pub fn from_state(state: &GameState) -> Self {
        let dynamic_size = state.memory.header.base_static_mem as usize;
        UMemChunk {
            memory: state.memory.as_slice()[..dynamic_size].to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.memory.clone()
    }
}

/// Stks chunk - the call-frame stack and the per-frame slice of the value
/// stack, serialized frame by frame.
pub struct StksChunk {
    pub data: Vec<u8>,
}

impl StksChunk {
    pub fn from_state(state: &GameState) -> Self {
        let mut data = Vec::new();
        for (idx, frame) in state.frames.iter().enumerate() {
            let pc_bytes = frame.return_pc.to_be_bytes();
            data.push(pc_bytes[1]);
            data.push(pc_bytes[2]);
            data.push(pc_bytes[3]);

            let mut flags = frame.num_locals & 0x0F;
            if frame.result_store.is_some() {
                flags |= 0x10;
            }
            flags |= (frame.arg_count.min(3) & 0x03) << 5;
            data.push(flags);

            if let Some(var) = frame.result_store {
                data.push(var);
            }

            let next_base = state
                .frames
                .get(idx + 1)
                .map(|f| f.previous_sp)
                .unwrap_or(state.stack.len());
            let stack_size = next_base.saturating_sub(frame.previous_sp);
            data.extend_from_slice(&(stack_size as u16).to_be_bytes());

            for i in 0..frame.num_locals as usize {
                data.extend_from_slice(&frame.locals[i].to_be_bytes());
            }
            for i in frame.previous_sp..next_base {
                data.extend_from_slice(&state.stack[i].to_be_bytes());
            }
        }
        StksChunk { data }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn restore_to_state(&self, state: &mut GameState) -> Result<(), String> {
        state.frames.clear();
        state.stack.clear();

        let data = &self.data;
        let mut offset = 0;
        while offset < data.len() {
            if offset + 4 > data.len() {
                return Err("incomplete stack frame".to_string());
            }
            let return_pc = ((data[offset] as u32) << 16)
                | ((data[offset + 1] as u32) << 8)
                | (data[offset + 2] as u32);
            offset += 3;

            let flags = data[offset];
            offset += 1;
            let num_locals = flags & 0x0F;
            let has_result_var = flags & 0x10 != 0;
            let arg_count = (flags >> 5) & 0x03;

            let result_store = if has_result_var {
                if offset >= data.len() {
                    return Err("missing result variable".to_string());
                }
                let var = data[offset];
                offset += 1;
                Some(var)
            } else {
                None
            };

            if offset + 2 > data.len() {
                return Err("missing stack count".to_string());
            }
            let stack_count = u16::from_be_bytes([data[offset], data[offset + 1]]) as usize;
            offset += 2;

            let mut locals = [0u16; 15];
            if offset + num_locals as usize * 2 > data.len() {
                return Err("missing local variables".to_string());
            }
            for local in locals.iter_mut().take(num_locals as usize) {
                *local = u16::from_be_bytes([data[offset], data[offset + 1]]);
                offset += 2;
            }

            let previous_sp = state.stack.len();
            if offset + stack_count * 2 > data.len() {
                return Err("missing stack values".to_string());
            }
            for _ in 0..stack_count {
                state
                    .stack
                    .push(u16::from_be_bytes([data[offset], data[offset + 1]]));
                offset += 2;
            }

            state.frames.push(CallFrame {
                return_pc,
                previous_sp,
                locals,
                num_locals,
                result_store,
                arg_count,
            });
        }
        Ok(())
    }
}

/// IntD chunk - optional interpreter-identifying metadata.
pub struct IntDChunk {
    pub interpreter_id: [u8; 4],
    pub data: Vec<u8>,
}

impl Default for IntDChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl IntDChunk {
    pub fn new() -> Self {
        IntDChunk {
            interpreter_id: *b"ZMCR",
            data: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.interpreter_id);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}
