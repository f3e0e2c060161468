//! The `Storage` port: save/restore as an opaque snapshot of bytes, with a
//! Quetzal-format codec built on `crate::quetzal`.

use crate::quetzal::chunks::{IFhdChunk, IntDChunk, StksChunk};
use crate::quetzal::compressed_memory::{compress_memory, decompress_memory};
use crate::quetzal::iff::IffFile;
use crate::state::GameState;

/// An opaque, serialized game snapshot. Hosts persist this however they
/// like (file, database row, browser storage); the interpreter never
/// inspects it beyond building and consuming it.
#[derive(Clone)]
pub struct Snapshot(pub Vec<u8>);

/// Host-provided save/restore persistence. `save`/`restore` opcodes call
/// through to this when a backend is configured; with none configured
/// they report failure, matching the standard's "feature unavailable"
/// convention.
pub trait Storage {
    fn save(&mut self, snapshot: Snapshot) -> bool;
    fn restore(&mut self) -> Option<Snapshot>;
}

/// Build a Quetzal-format snapshot of `state`.
pub fn snapshot(state: &GameState) -> Snapshot {
    let mut iff = IffFile::new();

    iff.add_chunk(*b"IFhd", IFhdChunk::from_state(state).to_bytes());

    let dynamic_size = state.memory.header.base_static_mem as usize;
    let current = &state.memory.as_slice()[..dynamic_size];
    let compressed = compress_memory(current, state.original_dynamic());
    iff.add_chunk(*b"CMem", compressed);

    iff.add_chunk(*b"Stks", StksChunk::from_state(state).to_bytes());
    iff.add_chunk(*b"IntD", IntDChunk::new().to_bytes());

    Snapshot(iff.to_bytes())
}

/// Apply a previously-built `Snapshot` to `state`, restoring dynamic
/// memory and the call-frame/value stack. The PC is left untouched: per
/// the standard, execution resumes wherever the `restore` opcode's own
/// store/branch logic sends it, not wherever the save was taken.
pub fn apply_snapshot(state: &mut GameState, snapshot: &Snapshot) -> Result<(), String> {
    let iff = IffFile::from_bytes(&snapshot.0)?;
    if &iff.form_type != b"IFZS" {
        return Err("not a Quetzal (IFZS) save".to_string());
    }

    let ifhd_chunk = iff.find_chunk(b"IFhd").ok_or("save is missing the IFhd chunk")?;
    let ifhd = IFhdChunk::from_bytes(&ifhd_chunk.data)?;
    let serial: String = ifhd.serial.iter().map(|b| *b as char).collect();
    if ifhd.release != state.memory.header.release || serial != state.memory.header.serial {
        return Err("save file doesn't match the running story".to_string());
    }

    let dynamic_size = state.memory.header.base_static_mem as usize;
    let restored = if let Some(cmem) = iff.find_chunk(b"CMem") {
        decompress_memory(&cmem.data, state.original_dynamic())?
    } else if let Some(umem) = iff.find_chunk(b"UMem") {
        umem.data.clone()
    } else {
        return Err("save is missing both CMem and UMem chunks".to_string());
    };
    if restored.len() != dynamic_size {
        return Err("restored memory size doesn't match dynamic memory size".to_string());
    }
    for (addr, byte) in restored.iter().enumerate() {
        state.memory.force_set_byte(addr as u32, *byte);
    }

    let stks_chunk = iff.find_chunk(b"Stks").ok_or("save is missing the Stks chunk")?;
    StksChunk {
        data: stks_chunk.data.clone(),
    }
    .restore_to_state(state)?;

    Ok(())
}

/// A `Storage` backend that keeps a single save in memory - a quick start
/// for a host that hasn't wired up real persistence yet.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Option<Snapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&mut self, snapshot: Snapshot) -> bool {
        self.slot = Some(snapshot);
        true
    }

    fn restore(&mut self) -> Option<Snapshot> {
        self.slot.clone()
    }
}

/// A `Storage` backend that persists a single save to a file on disk.
pub struct FileStorage {
    path: std::path::PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }
}

impl Storage for FileStorage {
    fn save(&mut self, snapshot: Snapshot) -> bool {
        std::fs::write(&self.path, snapshot.0).is_ok()
    }

    fn restore(&mut self) -> Option<Snapshot> {
        std::fs::read(&self.path).ok().map(Snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn minimal_memory() -> Memory {
        let mut bytes = vec![0u8; 512];
        bytes[0] = 3;
        bytes[0x0E] = 0x01;
        bytes[0x0F] = 0x00; // static base 0x100
        bytes[0x06] = 0x00;
        bytes[0x07] = 0x40; // initial pc
        bytes[0x0C] = 0x00;
        bytes[0x0D] = 0x80; // globals at 0x80
        bytes[0x02] = 0x00;
        bytes[0x03] = 0x01; // release 1
        for (i, ch) in "123456".chars().enumerate() {
            bytes[0x12 + i] = ch as u8;
        }
        Memory::load(bytes).unwrap()
    }

    #[test]
    fn snapshot_round_trips_globals_and_stack() {
        let mut memory = minimal_memory();
        memory.force_set_byte(0x60, 2); // routine at 0x60: 2 locals
        let mut state = GameState::new(memory);
        state.store_variable(16, 0xBEEF).unwrap();
        state.push(7);
        state.call_routine(0x60, &[1, 2], Some(5), 0x50).unwrap();
        state.store_variable(16, 0xCAFE).unwrap();

        let snap = snapshot(&state);

        let mut fresh = GameState::new(minimal_memory());
        apply_snapshot(&mut fresh, &snap).unwrap();

        assert_eq!(fresh.load_variable(16).unwrap(), 0xCAFE);
        assert_eq!(fresh.frames.len(), state.frames.len());
        assert_eq!(fresh.frames.last().unwrap().locals[0], 1);
        assert_eq!(fresh.frames.last().unwrap().locals[1], 2);
    }

    #[test]
    fn apply_snapshot_rejects_mismatched_story() {
        let state = GameState::new(minimal_memory());
        let snap = snapshot(&state);

        let mut bytes = vec![0u8; 512];
        bytes[0] = 3;
        bytes[0x0E] = 0x01;
        bytes[0x0F] = 0x00;
        bytes[0x06] = 0x00;
        bytes[0x07] = 0x40;
        bytes[0x0C] = 0x00;
        bytes[0x0D] = 0x80;
        bytes[0x02] = 0x00;
        bytes[0x03] = 0x02; // different release
        let mut other = GameState::new(Memory::load(bytes).unwrap());

        assert!(apply_snapshot(&mut other, &snap).is_err());
    }

    #[test]
    fn memory_storage_round_trips() {
        let mut storage = MemoryStorage::new();
        assert!(storage.restore().is_none());
        let snap = Snapshot(vec![1, 2, 3]);
        assert!(storage.save(snap));
        assert_eq!(storage.restore().unwrap().0, vec![1, 2, 3]);
    }
}
