pub use chip8::{Chip8, Intent, Step};
pub use config::{Config, Quirks};
pub use error::Chip8Error;
pub use instruction::{Executed, Instruction};
pub use snapshot::Snapshot;
pub use state::{ControlState, FrameBuffer, State};

mod chip8;
mod config;
pub mod constants;
mod error;
mod instruction;
mod opcode;
mod operations;
mod snapshot;
pub mod state;
