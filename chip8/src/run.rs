use std::fs::File;
use std::io::{self, BufReader, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use chip8_vm::constants::FRAME_NANOS;
use chip8_vm::{Chip8, Chip8Error, ControlState, FrameBuffer, Intent};

use crate::keymap::held_keys;
use crate::Options;

/// Draws a frame as text, one line per row
fn render(frame: &FrameBuffer) -> String {
    let mut text = String::with_capacity(frame.len() * (frame[0].len() + 1));
    for row in frame.iter() {
        text.extend(row.iter().map(|&px| if px == 1 { '#' } else { '.' }));
        text.push('\n');
    }
    text
}

/// The host's side of the machine: frame counting, the frame limit and the beeper.
struct Session {
    chip8: Chip8,
    frames: u64,
    limit: Option<u64>,
    beeping: bool,
}

impl Session {
    fn new(chip8: Chip8, limit: Option<u64>) -> Self {
        Session {
            chip8,
            frames: 0,
            limit,
            beeping: false,
        }
    }

    /// Runs one 60Hz frame. Returns the frame buffer if the display changed.
    fn advance(&mut self) -> Option<FrameBuffer> {
        let executed = self.chip8.run_frame();
        self.frames += 1;
        debug!(frame = self.frames, executed, "\n{}", self.chip8.snapshot());

        let beeping = self.chip8.sound_active();
        if beeping != self.beeping {
            info!(frame = self.frames, "beep {}", if beeping { "on" } else { "off" });
            self.beeping = beeping;
        }

        if self.limit.map_or(false, |limit| self.frames >= limit) {
            self.chip8.apply(Intent::Halt);
        }

        self.chip8.take_frame()
    }

    fn halted(&self) -> bool {
        self.chip8.control() == ControlState::Halted
    }
}

pub fn run(options: Options) -> Result<(), Chip8Error> {
    let mut chip8 = Chip8::with_config(options.config());

    // Load ROM
    let file = File::open(&options.rom)?;
    let mut reader = BufReader::new(file);
    chip8.load_rom(&mut reader)?;
    info!(rom = %options.rom.display(), "successfully loaded ROM");

    chip8.set_keys(held_keys(&options.keys));
    let mut session = Session::new(chip8, options.frames);

    // Set initial timing
    let frame_time = Duration::from_nanos(FRAME_NANOS);
    let mut last_frame = Instant::now();

    let stdout = io::stdout();
    loop {
        // If the display changed, render the current frame
        if let Some(frame) = session.advance() {
            let mut out = stdout.lock();
            writeln!(out, "{}", render(&frame))?;
        }

        if session.halted() {
            info!(frames = session.frames, "machine halted");
            break;
        }

        // Handle timing
        let elapsed = last_frame.elapsed();
        if frame_time > elapsed {
            std::thread::sleep(frame_time - elapsed);
        }
        last_frame = Instant::now();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8_vm::Config;

    fn session(program: &[u8], limit: Option<u64>) -> Session {
        let mut chip8 = Chip8::with_config(Config::default().with_rng_seed(0));
        chip8.load_program(program).unwrap();
        Session::new(chip8, limit)
    }

    #[test]
    fn test_render_frame() {
        let mut frame: FrameBuffer = [[0; 64]; 32];
        frame[0][0] = 1;
        frame[31][63] = 1;
        let text = render(&frame);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 32);
        assert!(lines[0].starts_with("#."));
        assert!(lines[31].ends_with(".#"));
        assert_eq!(text.matches('#').count(), 2);
    }

    #[test]
    fn test_frame_limit_halts_machine() {
        // JP 0x200
        let mut session = session(&[0x12, 0x00], Some(3));
        session.advance();
        session.advance();
        assert!(!session.halted());
        session.advance();
        assert!(session.halted());
        assert_eq!(session.frames, 3);
    }

    #[test]
    fn test_runs_until_halted_without_limit() {
        let mut session = session(&[0x12, 0x00], None);
        for _ in 0..10 {
            session.advance();
        }
        assert!(!session.halted());
    }

    #[test]
    fn test_tracks_beeper_each_frame() {
        // LD V0, 2; LD ST, V0; JP 0x204
        let mut session = session(&[0x60, 0x02, 0xF0, 0x18, 0x12, 0x04], None);
        session.advance();
        // ST was 2 and ticked once
        assert!(session.beeping);
        session.advance();
        assert!(!session.beeping);
    }

    #[test]
    fn test_advance_hands_out_changed_frames_once() {
        // CLS; JP 0x202
        let mut session = session(&[0x00, 0xE0, 0x12, 0x02], None);
        assert!(session.advance().is_some());
        assert!(session.advance().is_none());
    }
}
