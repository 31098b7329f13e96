use thiserror::Error;

use crate::constants::MAX_PROGRAM_SIZE;

/// Everything that can go wrong while loading or executing a program.
///
/// Execution errors never stop the machine: the faulting instruction is skipped
/// and the error is handed back to whoever is driving the cycles.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("stack overflow: CALL at {pc:#06X} with a full call stack")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: RET at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("unknown instruction {opcode:#06X}")]
    UnknownInstruction { opcode: u16 },

    #[error("memory access out of range at address {address:#06X}")]
    AddressOutOfRange { address: usize },

    #[error("program is {size} bytes, at most {} fit in program memory", MAX_PROGRAM_SIZE)]
    ProgramTooLarge { size: usize },

    #[error("unable to read program")]
    Io(#[from] std::io::Error),
}
