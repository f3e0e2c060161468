//! Quetzal save file format implementation
//!
//! Quetzal is the standard save game format for Z-Machine interpreters.
//! It uses the IFF (Interchange File Format) chunk structure. The chunk
//! codecs here are pure byte/`GameState` functions; the `Storage` port
//! that wires them to save/restore opcodes lives in `crate::storage`.

pub mod chunks;
pub mod compressed_memory;
pub mod iff;
