use std::fmt;

use crate::constants::{NUM_KEYS, STACK_SIZE};
use crate::state::{ControlState, State};

/// A read-only copy of everything an inspector might want to show.
/// Taking one never affects the machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub opcode: u16,
    pub pc: u16,
    pub sp: u8,
    pub i: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub v: [u8; 16],
    pub stack: [u16; STACK_SIZE],
    pub keypad: [bool; NUM_KEYS],
    pub control: ControlState,
}

impl From<&State> for Snapshot {
    fn from(state: &State) -> Self {
        Snapshot {
            opcode: state.opcode,
            pc: state.pc,
            sp: state.sp,
            i: state.i,
            delay_timer: state.delay_timer,
            sound_timer: state.sound_timer,
            v: state.v,
            stack: state.stack,
            keypad: state.keypad,
            control: state.control,
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "OP {:04X}  PC {:04X}  SP {:02}  I {:04X}  DT {:3}  ST {:3}  {:?}",
            self.opcode, self.pc, self.sp, self.i, self.delay_timer, self.sound_timer, self.control
        )?;

        // registers, four to a row
        for (n, regs) in self.v.chunks(4).enumerate() {
            for (offset, value) in regs.iter().enumerate() {
                write!(f, "V{:X} {:02X}  ", n * 4 + offset, value)?;
            }
            writeln!(f)?;
        }

        // top of the stack first
        for depth in (0..STACK_SIZE).rev() {
            let marker = if depth == self.sp as usize { " <- SP" } else { "" };
            writeln!(f, "{:02}: {:04X}{}", depth, self.stack[depth], marker)?;
        }

        let held: Vec<String> = self
            .keypad
            .iter()
            .enumerate()
            .filter(|(_, down)| **down)
            .map(|(key, _)| format!("{:X}", key))
            .collect();
        write!(f, "keys [{}]", held.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_copies_state() {
        let mut state = State::new();
        state.v[0x3] = 0x33;
        state.sp = 1;
        state.stack[0] = 0x222;
        state.keypad[0xA] = true;
        state.opcode = 0x2222;
        let snapshot = Snapshot::from(&state);
        assert_eq!(snapshot.v[0x3], 0x33);
        assert_eq!(snapshot.stack[0], 0x222);
        assert_eq!(snapshot.sp, 1);
        assert!(snapshot.keypad[0xA]);
        assert_eq!(snapshot.opcode, 0x2222);
        assert_eq!(snapshot.control, ControlState::Running);
    }

    #[test]
    fn test_snapshot_display() {
        let mut state = State::new();
        state.v[0xB] = 0xBE;
        state.keypad[0x1] = true;
        state.keypad[0xF] = true;
        let text = Snapshot::from(&state).to_string();
        assert!(text.starts_with("OP 0000  PC 0200"));
        assert!(text.contains("VB BE"));
        assert!(text.contains("00: 0000 <- SP"));
        assert!(text.ends_with("keys [1 F]"));
    }
}
