pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

pub const MEMORY_SIZE: usize = 4096;
pub const STACK_SIZE: usize = 16;
pub const NUM_KEYS: usize = 16;

/// ROMs are loaded into memory starting here
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// The font glyphs live at the very start of the interpreter area
pub const SPRITE_SHEET_START: u16 = 0x000;
pub const SPRITE_BYTES: u16 = 5;

/// Timers decay at 60Hz; everything else is measured against that
pub const TIMER_HZ: u64 = 60;
pub const FRAME_NANOS: u64 = 1_000_000_000 / TIMER_HZ;

/// About 500Hz worth of instructions between two timer ticks
pub const DEFAULT_INSTRUCTIONS_PER_TICK: usize = 8;

/// # Sprite sheet
/// Hexadecimal digits 0..F, each glyph 4 pixels wide and 5 rows tall.
/// Only the high nibble of each byte is used.
/// ```text
/// 0xF0  ****
/// 0x90  *  *
/// 0x90  *  *
/// 0x90  *  *
/// 0xF0  ****
/// ```
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
