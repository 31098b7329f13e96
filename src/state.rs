use std::ops::Range;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, MAX_PROGRAM_SIZE, MEMORY_SIZE, NUM_KEYS, PROGRAM_START,
    SPRITE_SHEET, SPRITE_SHEET_START, STACK_SIZE,
};
use crate::error::Chip8Error;
use crate::opcode;

/// The FrameBuffer is indexed as [y][x]; every cell is 0 or 1
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// Whether the machine should be fetching instructions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlState {
    Running,
    Paused,
    /// Terminal; only a reset brings the machine back
    Halted,
}

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry/borrow/collision flag
/// - (i) a 16-bit memory address register, kept within 0x000..=0xFFF
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the number of return addresses on the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented at 60Hz down to 0
///
/// ## Memory
/// - 16 entry stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet
///     - 0x200.. holds the program
/// - 32x64 frame buffer
///
/// ## Input
/// - the latched state of keys 0..F, written by whoever owns the keyboard
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub keypad: [bool; NUM_KEYS],
    /// The opcode most recently fetched
    pub opcode: u16,
    /// Set by CLS and DRW; cleared once the frame has been handed out
    pub draw_flag: bool,
    pub control: ControlState,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font_start = SPRITE_SHEET_START as usize;
        memory[font_start..font_start + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            keypad: [false; NUM_KEYS],
            opcode: 0,
            draw_flag: false,
            control: ControlState::Running,
        }
    }

    /// Copies a program into memory at 0x200.
    /// Nothing is written if the program doesn't fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Returns to the power-on state while keeping memory (font and program) intact.
    /// The timers carry on untouched; only FX15/FX18 and the 60Hz tick change them.
    pub fn reset(&mut self) {
        *self = State {
            memory: self.memory,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            ..State::new()
        };
    }

    /// Reads the opcode at the program counter.
    pub fn fetch(&self) -> Result<u16, Chip8Error> {
        let at = self.span(self.pc, 2)?;
        Ok(opcode::from_bytes(
            self.memory[at.start],
            self.memory[at.start + 1],
        ))
    }

    /// The memory range `address..address + len`, provided it lies entirely in memory.
    pub fn span(&self, address: u16, len: usize) -> Result<Range<usize>, Chip8Error> {
        let start = address as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(Chip8Error::AddressOutOfRange {
                address: MEMORY_SIZE.max(start),
            });
        }
        Ok(start..end)
    }

    pub fn is_running(&self) -> bool {
        self.control == ControlState::Running
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// The lowest numbered key currently held down
    pub fn first_pressed_key(&self) -> Option<u8> {
        self.keypad.iter().position(|&down| down).map(|key| key as u8)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_font_and_starts_at_program() {
        let state = State::new();
        assert_eq!(state.memory[0x000..0x050], SPRITE_SHEET[..]);
        assert!(state.memory[0x050..].iter().all(|&b| b == 0));
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert_eq!(state.control, ControlState::Running);
    }

    #[test]
    fn test_load_program() {
        let mut state = State::new();
        state.load_program(&[0x00, 0xE0, 0x12, 0x00]).unwrap();
        assert_eq!(state.memory[0x200..0x204], [0x00, 0xE0, 0x12, 0x00]);
        assert_eq!(state.memory[0x204], 0);
    }

    #[test]
    fn test_load_program_fills_program_memory() {
        let mut state = State::new();
        let program = vec![0xAB; MAX_PROGRAM_SIZE];
        state.load_program(&program).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAB);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut state = State::new();
        let program = vec![0xAB; MAX_PROGRAM_SIZE + 1];
        match state.load_program(&program) {
            Err(Chip8Error::ProgramTooLarge { size }) => assert_eq!(size, 3585),
            other => panic!("expected ProgramTooLarge, got {:?}", other),
        }
        assert_eq!(state.memory[0x200], 0);
    }

    #[test]
    fn test_reset_keeps_memory_and_timers() {
        let mut state = State::new();
        state.load_program(&[0x60, 0x01]).unwrap();
        state.v[0x3] = 0x33;
        state.i = 0x123;
        state.pc = 0x456;
        state.sp = 2;
        state.stack[0] = 0x200;
        state.delay_timer = 9;
        state.sound_timer = 4;
        state.keypad[0x4] = true;
        state.frame_buffer[3][3] = 1;
        state.draw_flag = true;
        state.control = ControlState::Halted;
        state.reset();

        let mut expected = State::new();
        expected.load_program(&[0x60, 0x01]).unwrap();
        expected.delay_timer = 9;
        expected.sound_timer = 4;
        assert_eq!(state, expected);
    }

    #[test]
    fn test_fetch_is_big_endian() {
        let mut state = State::new();
        state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(state.fetch().unwrap(), 0xAABB);
    }

    #[test]
    fn test_fetch_last_word() {
        let mut state = State::new();
        state.pc = 0xFFE;
        state.memory[0xFFE..].copy_from_slice(&[0x12, 0x34]);
        assert_eq!(state.fetch().unwrap(), 0x1234);
    }

    #[test]
    fn test_fetch_out_of_range() {
        let mut state = State::new();
        state.pc = 0xFFF;
        assert!(matches!(
            state.fetch(),
            Err(Chip8Error::AddressOutOfRange { .. })
        ));
    }

    #[test]
    fn test_first_pressed_key_scans_in_order() {
        let mut state = State::new();
        assert_eq!(state.first_pressed_key(), None);
        state.keypad[0xC] = true;
        state.keypad[0x5] = true;
        assert_eq!(state.first_pressed_key(), Some(0x5));
    }
}
