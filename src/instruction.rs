use std::fmt;

use rand::Rng;

use crate::config::Quirks;
use crate::error::Chip8Error;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// A decoded opcode. `x` and `y` are register indices, `kk` an immediate
/// byte, `addr` a 12-bit address and `n` the sprite height.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Cls,
    Ret,
    Sys { addr: u16 },
    Jump { addr: u16 },
    Call { addr: u16 },
    SkipEqByte { x: u8, kk: u8 },
    SkipNeByte { x: u8, kk: u8 },
    SkipEqReg { x: u8, y: u8 },
    LoadByte { x: u8, kk: u8 },
    AddByte { x: u8, kk: u8 },
    LoadReg { x: u8, y: u8 },
    Or { x: u8, y: u8 },
    And { x: u8, y: u8 },
    Xor { x: u8, y: u8 },
    AddReg { x: u8, y: u8 },
    Sub { x: u8, y: u8 },
    Shr { x: u8, y: u8 },
    SubN { x: u8, y: u8 },
    Shl { x: u8, y: u8 },
    SkipNeReg { x: u8, y: u8 },
    LoadI { addr: u16 },
    JumpV0 { addr: u16 },
    Rand { x: u8, kk: u8 },
    Draw { x: u8, y: u8, n: u8 },
    SkipKey { x: u8 },
    SkipNoKey { x: u8 },
    LoadDelay { x: u8 },
    WaitKey { x: u8 },
    SetDelay { x: u8 },
    SetSound { x: u8 },
    AddI { x: u8 },
    LoadFont { x: u8 },
    Bcd { x: u8 },
    Store { x: u8 },
    Read { x: u8 },
}

/// What executing a single instruction amounted to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Executed {
    /// The instruction ran and produced this state
    Next(State),
    /// `LD Vx, K` with no key held; nothing changed
    AwaitingKey,
}

impl Instruction {
    /// Selects the correct Instruction for a given Opcode
    pub fn decode(op: u16) -> Result<Instruction, Chip8Error> {
        use Instruction::*;

        let (group, x, y, n) = op.nibbles();
        let (kk, addr) = (op.kk(), op.nnn());
        let instruction = match (group, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => Cls,
            (0x0, 0x0, 0xE, 0xE) => Ret,
            (0x0, ..) => Sys { addr },
            (0x1, ..) => Jump { addr },
            (0x2, ..) => Call { addr },
            (0x3, ..) => SkipEqByte { x, kk },
            (0x4, ..) => SkipNeByte { x, kk },
            (0x5, ..) => SkipEqReg { x, y },
            (0x6, ..) => LoadByte { x, kk },
            (0x7, ..) => AddByte { x, kk },
            (0x8, .., 0x0) => LoadReg { x, y },
            (0x8, .., 0x1) => Or { x, y },
            (0x8, .., 0x2) => And { x, y },
            (0x8, .., 0x3) => Xor { x, y },
            (0x8, .., 0x4) => AddReg { x, y },
            (0x8, .., 0x5) => Sub { x, y },
            (0x8, .., 0x6) => Shr { x, y },
            (0x8, .., 0x7) => SubN { x, y },
            (0x8, .., 0xE) => Shl { x, y },
            (0x9, ..) => SkipNeReg { x, y },
            (0xA, ..) => LoadI { addr },
            (0xB, ..) => JumpV0 { addr },
            (0xC, ..) => Rand { x, kk },
            (0xD, ..) => Draw { x, y, n },
            (0xE, .., 0x9, 0xE) => SkipKey { x },
            (0xE, .., 0xA, 0x1) => SkipNoKey { x },
            (0xF, .., 0x0, 0x7) => LoadDelay { x },
            (0xF, .., 0x0, 0xA) => WaitKey { x },
            (0xF, .., 0x1, 0x5) => SetDelay { x },
            (0xF, .., 0x1, 0x8) => SetSound { x },
            (0xF, .., 0x1, 0xE) => AddI { x },
            (0xF, .., 0x2, 0x9) => LoadFont { x },
            (0xF, .., 0x3, 0x3) => Bcd { x },
            (0xF, .., 0x5, 0x5) => Store { x },
            (0xF, .., 0x6, 0x5) => Read { x },
            _ => return Err(Chip8Error::UnknownInstruction { opcode: op }),
        };
        Ok(instruction)
    }

    /// Runs the instruction against `state`.
    /// `rng` is only drawn from by `RND`.
    pub fn execute<R: Rng>(
        &self,
        state: &State,
        quirks: &Quirks,
        rng: &mut R,
    ) -> Result<Executed, Chip8Error> {
        use Instruction::*;

        let next = match *self {
            Cls => clr(state),
            Ret => rts(state)?,
            Sys { addr } | Jump { addr } => jump(state, addr),
            Call { addr } => call(state, addr)?,
            SkipEqByte { x, kk } => ske(state, x, kk),
            SkipNeByte { x, kk } => skne(state, x, kk),
            SkipEqReg { x, y } => skre(state, x, y),
            LoadByte { x, kk } => load(state, x, kk),
            AddByte { x, kk } => add(state, x, kk),
            LoadReg { x, y } => mv(state, x, y),
            Or { x, y } => or(state, x, y, quirks),
            And { x, y } => and(state, x, y, quirks),
            Xor { x, y } => xor(state, x, y, quirks),
            AddReg { x, y } => add_reg(state, x, y),
            Sub { x, y } => sub(state, x, y),
            Shr { x, y } => shr(state, x, y, quirks),
            SubN { x, y } => subn(state, x, y),
            Shl { x, y } => shl(state, x, y, quirks),
            SkipNeReg { x, y } => skrne(state, x, y),
            LoadI { addr } => loadi(state, addr),
            JumpV0 { addr } => jumpi(state, addr),
            Rand { x, kk } => rand(state, x, kk, rng.gen()),
            Draw { x, y, n } => draw(state, x, y, n)?,
            SkipKey { x } => skpr(state, x),
            SkipNoKey { x } => skup(state, x),
            LoadDelay { x } => get_delay(state, x),
            WaitKey { x } => match await_key(state, x) {
                Some(next) => next,
                None => return Ok(Executed::AwaitingKey),
            },
            SetDelay { x } => set_delay(state, x),
            SetSound { x } => set_sound(state, x),
            AddI { x } => addi(state, x),
            LoadFont { x } => font(state, x),
            Bcd { x } => bcd(state, x)?,
            Store { x } => stor(state, x, quirks)?,
            Read { x } => read(state, x, quirks)?,
        };
        Ok(Executed::Next(next))
    }
}

/// Assembler-style mnemonics, e.g. `ADD V1, V2` or `DRW V0, V1, 5`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Sys { addr } => write!(f, "SYS {:#05X}", addr),
            Jump { addr } => write!(f, "JP {:#05X}", addr),
            Call { addr } => write!(f, "CALL {:#05X}", addr),
            SkipEqByte { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            SkipNeByte { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadByte { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            AddByte { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            LoadReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubN { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadI { addr } => write!(f, "LD I, {:#05X}", addr),
            JumpV0 { addr } => write!(f, "JP V0, {:#05X}", addr),
            Rand { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKey { x } => write!(f, "SKP V{:X}", x),
            SkipNoKey { x } => write!(f, "SKNP V{:X}", x),
            LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddI { x } => write!(f, "ADD I, V{:X}", x),
            LoadFont { x } => write!(f, "LD F, V{:X}", x),
            Bcd { x } => write!(f, "LD B, V{:X}", x),
            Store { x } => write!(f, "LD [I], V{:X}", x),
            Read { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
