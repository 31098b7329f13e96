use std::io::Read;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::Chip8Error;
use crate::instruction::{Executed, Instruction};
use crate::snapshot::Snapshot;
use crate::state::{ControlState, FrameBuffer, State};

/// The outcome of a single `step`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Executed(Instruction),
    /// `LD Vx, K` is waiting; the same instruction runs again next step
    AwaitingKey,
    /// The machine is paused or halted, nothing was fetched
    Stopped,
}

/// Requests from whoever owns the keyboard to change what the machine is doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Pause,
    Resume,
    TogglePause,
    Halt,
    /// One-shot; the machine comes back running from 0x200 with its program intact
    Reset,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the `config` it was built with
///  - a seedable `rng` for `RND`
///
/// Supplies interfaces for:
/// - loading programs
/// - pressing and releasing keys
/// - advancing the CPU one instruction or one frame at a time
/// - advancing its timers
/// - pausing, halting and resetting
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8 {
    state: State,
    config: Config,
    rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Chip8 {
            state: State::new(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Copies `program` into memory at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.state.load_program(program)?;
        info!(bytes = program.len(), "loaded program");
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<(), Chip8Error> {
        let mut program = Vec::new();
        reader.read_to_end(&mut program)?;
        self.load_program(&program)
    }

    /// Returns the FrameBuffer if the display should be redrawn.
    /// The redraw signal is cleared, so each change is handed out once.
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        if let Some(down) = self.state.keypad.get_mut(key as usize) {
            *down = true;
        }
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        if let Some(down) = self.state.keypad.get_mut(key as usize) {
            *down = false;
        }
    }

    /// Replaces the whole keypad latch, e.g. once per host frame
    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.state.keypad = keys;
    }

    /// Whether a beep should be playing
    pub fn sound_active(&self) -> bool {
        self.state.sound_active()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(&self.state)
    }

    pub fn control(&self) -> ControlState {
        self.state.control
    }

    pub fn apply(&mut self, intent: Intent) {
        use ControlState::*;

        if intent == Intent::Reset {
            self.reset();
            return;
        }
        let control = match (self.state.control, intent) {
            (Halted, _) => Halted,
            (_, Intent::Halt) => Halted,
            (Running, Intent::Pause) | (Running, Intent::TogglePause) => Paused,
            (Paused, Intent::Resume) | (Paused, Intent::TogglePause) => Running,
            (current, _) => current,
        };
        if control != self.state.control {
            debug!(from = ?self.state.control, to = ?control, "control state changed");
            self.state.control = control;
        }
    }

    /// Back to power-on with the loaded program still in memory
    pub fn reset(&mut self) {
        self.state.reset();
        info!("machine reset");
    }

    /// Runs a single fetch-decode-execute cycle.
    ///
    /// A failing instruction is skipped: the program counter moves past it
    /// and the error is returned, so the machine can always make progress.
    /// That includes fetch faults: a PC at 0xFFF or beyond keeps faulting,
    /// 2 bytes at a time, until it wraps around to 0x0000 and fetches from
    /// the font area.
    pub fn step(&mut self) -> Result<Step, Chip8Error> {
        if !self.state.is_running() {
            return Ok(Step::Stopped);
        }
        let pc = self.state.pc;
        self.fetch_and_execute().map_err(|e| {
            self.state.pc = pc.wrapping_add(0x2);
            e
        })
    }

    fn fetch_and_execute(&mut self) -> Result<Step, Chip8Error> {
        let op = self.state.fetch()?;
        self.state.opcode = op;
        let instruction = Instruction::decode(op)?;

        match instruction.execute(&self.state, &self.config.quirks, &mut self.rng)? {
            Executed::Next(state) => {
                trace!(at = self.state.pc, "{}", executed_line(op, &instruction, &state));
                self.state = state;
                Ok(Step::Executed(instruction))
            }
            Executed::AwaitingKey => Ok(Step::AwaitingKey),
        }
    }

    /// Decrements the delay and sound timers, stopping at 0.
    /// Should be called at 60Hz regardless of how many instructions ran.
    pub fn tick_timers(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    /// Runs up to `instructions_per_tick` instructions, then ticks the timers once.
    ///
    /// The batch ends early while waiting on a key, since the keypad only
    /// changes between frames. Timers stay frozen while the machine isn't running.
    /// Returns the number of instructions attempted.
    pub fn run_frame(&mut self) -> usize {
        let mut attempted = 0;
        for _ in 0..self.config.instructions_per_tick {
            match self.step() {
                Ok(Step::Executed(_)) => attempted += 1,
                Ok(Step::AwaitingKey) => {
                    debug!(pc = self.state.pc, "waiting for a key");
                    break;
                }
                Ok(Step::Stopped) => break,
                Err(e) => {
                    attempted += 1;
                    warn!(opcode = self.state.opcode, "skipped instruction: {}", e);
                }
            }
        }
        if self.state.is_running() {
            self.tick_timers();
        }
        attempted
    }
}

/// One trace line per executed instruction, showing the state it produced
fn executed_line(op: u16, instruction: &Instruction, after: &State) -> String {
    format!(
        "{:04X} {:<16} -> pc{:04X} i{:04X} v{:02X?}",
        op,
        instruction.to_string(),
        after.pc,
        after.i,
        after.v
    )
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
