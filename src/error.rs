//! Structured error types for the interpreter core.
//!
//! Internal helpers still return `Result<T, String>` in the places the
//! original Z-machine engine this crate grew out of did (memory accessors,
//! object-table plumbing); at the boundaries the host actually sees
//! (`Interpreter::start`/`resume`, `Memory::load`) errors are one of the
//! variants below so a host can match on failure category instead of
//! pattern-matching strings.

use std::fmt;

/// Fatal, pre-execution failure while loading a story image.
#[derive(Debug, Clone)]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load error: {}", self.message)
    }
}

impl std::error::Error for LoadError {}

/// Fatal failure reading or writing memory.
#[derive(Debug, Clone)]
pub struct MemoryError {
    pub message: String,
    pub addr: u32,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory error at {:#06x}: {}", self.addr, self.message)
    }
}

impl std::error::Error for MemoryError {}

/// Fatal failure decoding an instruction.
#[derive(Debug, Clone)]
pub struct DecodeError {
    pub message: String,
    pub pc: u32,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode error at {:#06x}: {}", self.pc, self.message)
    }
}

impl std::error::Error for DecodeError {}

/// Fatal failure executing a decoded instruction.
#[derive(Debug, Clone)]
pub struct ExecutionError {
    pub message: String,
    pub pc: u32,
    pub opcode: Option<String>,
}

impl ExecutionError {
    pub fn new(pc: u32, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pc,
            opcode: None,
        }
    }

    pub fn with_opcode(mut self, opcode: impl Into<String>) -> Self {
        self.opcode = Some(opcode.into());
        self
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.opcode {
            Some(op) => write!(
                f,
                "execution error at {:#06x} ({}): {}",
                self.pc, op, self.message
            ),
            None => write!(f, "execution error at {:#06x}: {}", self.pc, self.message),
        }
    }
}

impl std::error::Error for ExecutionError {}

/// The top-level error type the Interpreter façade returns to the host.
/// Once returned, the façade refuses further execution on the same
/// instance (§7 propagation policy).
#[derive(Debug, Clone)]
pub enum ZError {
    Load(LoadError),
    Memory(MemoryError),
    Decode(DecodeError),
    Execution(ExecutionError),
}

impl fmt::Display for ZError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZError::Load(e) => write!(f, "{e}"),
            ZError::Memory(e) => write!(f, "{e}"),
            ZError::Decode(e) => write!(f, "{e}"),
            ZError::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ZError {}

impl From<LoadError> for ZError {
    fn from(e: LoadError) -> Self {
        ZError::Load(e)
    }
}

impl From<MemoryError> for ZError {
    fn from(e: MemoryError) -> Self {
        ZError::Memory(e)
    }
}

impl From<DecodeError> for ZError {
    fn from(e: DecodeError) -> Self {
        ZError::Decode(e)
    }
}

impl From<ExecutionError> for ZError {
    fn from(e: ExecutionError) -> Self {
        ZError::Execution(e)
    }
}
