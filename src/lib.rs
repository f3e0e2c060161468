//! A Z-machine interpreter core (Versions 1-8): memory/object/dictionary
//! model, Z-string codec, a suspendable fetch-decode-execute `Executor`,
//! and an `Interpreter` façade a host drives through `Screen`/
//! `InputProcessor`/`Storage` ports rather than direct terminal I/O.

pub mod config;
pub mod dictionary;
pub mod display_headless;
pub mod display_terminal;
pub mod display_trait;
pub mod error;
pub mod executor;
pub mod header;
pub mod input;
pub mod input_terminal;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod object;
pub mod opcode_tables;
pub mod opcodes;
pub mod quetzal;
pub mod state;
pub mod storage;
pub mod text;
pub mod zrand;
