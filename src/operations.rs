use crate::config::Quirks;
use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, MEMORY_SIZE, SPRITE_BYTES, SPRITE_SHEET_START, STACK_SIZE,
};
use crate::error::Chip8Error;
use crate::state::State;

/// The address of the instruction after the current one
fn next(state: &State) -> u16 {
    state.pc.wrapping_add(0x2)
}

/// pc += 2, and again if `condition`
fn skip_if(state: &State, condition: bool) -> State {
    let pc = if condition {
        state.pc.wrapping_add(0x4)
    } else {
        next(state)
    };
    State { pc, ..*state }
}

/// Keeps I inside the 12-bit address space
fn wrap_address(address: u16) -> u16 {
    address & (MEMORY_SIZE as u16 - 1)
}

/// clear
pub fn clr(state: &State) -> State {
    State {
        pc: next(state),
        frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop() + 2
/// The stack holds the address of the CALL itself, so step over it
pub fn rts(state: &State) -> Result<State, Chip8Error> {
    if state.sp == 0 {
        return Err(Chip8Error::StackUnderflow { pc: state.pc });
    }
    let sp = state.sp - 0x1;
    Ok(State {
        pc: state.stack[sp as usize].wrapping_add(0x2),
        sp,
        ..*state
    })
}

/// PC = addr
/// Also covers the legacy `SYS addr`
pub fn jump(state: &State, addr: u16) -> State {
    State { pc: addr, ..*state }
}

/// STACK.push(PC); PC = addr
pub fn call(state: &State, addr: u16) -> Result<State, Chip8Error> {
    if state.sp as usize + 1 >= STACK_SIZE {
        return Err(Chip8Error::StackOverflow { pc: state.pc });
    }
    let mut stack = state.stack;
    stack[state.sp as usize] = state.pc;
    Ok(State {
        pc: addr,
        sp: state.sp + 0x1,
        stack,
        ..*state
    })
}

/// if Vx == kk then pc += 2
pub fn ske(state: &State, x: u8, kk: u8) -> State {
    skip_if(state, state.v[x as usize] == kk)
}

/// if Vx != kk then pc += 2
pub fn skne(state: &State, x: u8, kk: u8) -> State {
    skip_if(state, state.v[x as usize] != kk)
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[x as usize] == state.v[y as usize])
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[x as usize] != state.v[y as usize])
}

/// Vx = kk
pub fn load(state: &State, x: u8, kk: u8) -> State {
    let mut v = state.v;
    v[x as usize] = kk;
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// Vx += kk
/// Overflow wraps and VF is left alone
pub fn add(state: &State, x: u8, kk: u8) -> State {
    let mut v = state.v;
    v[x as usize] = v[x as usize].wrapping_add(kk);
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// Vx = Vy
pub fn mv(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] = v[y as usize];
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// Shared tail of OR, AND and XOR
fn logic(state: &State, x: u8, y: u8, quirks: &Quirks, f: fn(u8, u8) -> u8) -> State {
    let mut v = state.v;
    v[x as usize] = f(v[x as usize], v[y as usize]);
    if quirks.logic_resets_vf {
        v[0xF] = 0x0;
    }
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// Vx |= Vy
pub fn or(state: &State, x: u8, y: u8, quirks: &Quirks) -> State {
    logic(state, x, y, quirks, |a, b| a | b)
}

/// Vx &= Vy
pub fn and(state: &State, x: u8, y: u8, quirks: &Quirks) -> State {
    logic(state, x, y, quirks, |a, b| a & b)
}

/// Vx ^= Vy
pub fn xor(state: &State, x: u8, y: u8, quirks: &Quirks) -> State {
    logic(state, x, y, quirks, |a, b| a ^ b)
}

/// Writes `result` into Vx and then `flag` into VF.
/// VF is written last so that it survives when x is F.
fn with_flag(state: &State, x: u8, result: u8, flag: bool) -> State {
    let mut v = state.v;
    v[x as usize] = result;
    v[0xF] = flag as u8;
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// Vx += Vy; VF = carry
pub fn add_reg(state: &State, x: u8, y: u8) -> State {
    let (res, carry) = state.v[x as usize].overflowing_add(state.v[y as usize]);
    with_flag(state, x, res, carry)
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(state: &State, x: u8, y: u8) -> State {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    with_flag(state, x, vx.wrapping_sub(vy), vx > vy)
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub fn subn(state: &State, x: u8, y: u8) -> State {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    with_flag(state, x, vy.wrapping_sub(vx), vy > vx)
}

/// The register a shift reads from
fn shift_source(state: &State, x: u8, y: u8, quirks: &Quirks) -> u8 {
    if quirks.shift_uses_vy {
        state.v[y as usize]
    } else {
        state.v[x as usize]
    }
}

/// Vx = src >> 1; VF = the bit shifted out
pub fn shr(state: &State, x: u8, y: u8, quirks: &Quirks) -> State {
    let src = shift_source(state, x, y, quirks);
    with_flag(state, x, src >> 1, src & 0x1 == 0x1)
}

/// Vx = src << 1; VF = the bit shifted out
pub fn shl(state: &State, x: u8, y: u8, quirks: &Quirks) -> State {
    let src = shift_source(state, x, y, quirks);
    with_flag(state, x, src << 1, src & 0x80 == 0x80)
}

/// I = addr
pub fn loadi(state: &State, addr: u16) -> State {
    State {
        pc: next(state),
        i: addr,
        ..*state
    }
}

/// PC = V0 + addr
/// Anything past the end of memory is caught by the next fetch
pub fn jumpi(state: &State, addr: u16) -> State {
    State {
        pc: addr.wrapping_add(u16::from(state.v[0x0])),
        ..*state
    }
}

/// Vx = random & kk
pub fn rand(state: &State, x: u8, kk: u8, random: u8) -> State {
    let mut v = state.v;
    v[x as usize] = random & kk;
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite at memory I..I+n onto the FrameBuffer at (Vx, Vy).
/// Every pixel wraps around the edges on its own.
/// VF = 1 if any lit pixel was switched off, 0 otherwise.
pub fn draw(state: &State, x: u8, y: u8, n: u8) -> Result<State, Chip8Error> {
    let sprite = state.span(state.i, n as usize)?;
    let origin_x = state.v[x as usize] as usize;
    let origin_y = state.v[y as usize] as usize;

    let mut frame_buffer = state.frame_buffer;
    let mut collision = 0x0;
    for (row, byte) in state.memory[sprite].iter().enumerate() {
        let py = (origin_y + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            if byte & (0x80 >> bit) == 0 {
                continue;
            }
            let px = (origin_x + bit) % DISPLAY_WIDTH;
            collision |= frame_buffer[py][px];
            frame_buffer[py][px] ^= 0x1;
        }
    }

    let mut v = state.v;
    v[0xF] = collision;
    Ok(State {
        pc: next(state),
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    })
}

/// Whether the key named by Vx is held; keys past F don't exist and are never held
fn key_held(state: &State, x: u8) -> bool {
    state
        .keypad
        .get(state.v[x as usize] as usize)
        .copied()
        .unwrap_or(false)
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &State, x: u8) -> State {
    skip_if(state, key_held(state, x))
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &State, x: u8) -> State {
    skip_if(state, !key_held(state, x))
}

/// Vx = DT
pub fn get_delay(state: &State, x: u8) -> State {
    let mut v = state.v;
    v[x as usize] = state.delay_timer;
    State {
        pc: next(state),
        v,
        ..*state
    }
}

/// Vx = first held key
/// `None` while nothing is held: the state is untouched and the same
/// instruction gets fetched again next cycle.
pub fn await_key(state: &State, x: u8) -> Option<State> {
    state.first_pressed_key().map(|key| {
        let mut v = state.v;
        v[x as usize] = key;
        State {
            pc: next(state),
            v,
            ..*state
        }
    })
}

/// DT = Vx
pub fn set_delay(state: &State, x: u8) -> State {
    State {
        pc: next(state),
        delay_timer: state.v[x as usize],
        ..*state
    }
}

/// ST = Vx
pub fn set_sound(state: &State, x: u8) -> State {
    State {
        pc: next(state),
        sound_timer: state.v[x as usize],
        ..*state
    }
}

/// I += Vx
pub fn addi(state: &State, x: u8) -> State {
    State {
        pc: next(state),
        i: wrap_address(state.i.wrapping_add(u16::from(state.v[x as usize]))),
        ..*state
    }
}

/// I = address of the glyph for the low nibble of Vx
pub fn font(state: &State, x: u8) -> State {
    let digit = u16::from(state.v[x as usize] & 0xF);
    State {
        pc: next(state),
        i: SPRITE_SHEET_START + digit * SPRITE_BYTES,
        ..*state
    }
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(state: &State, x: u8) -> Result<State, Chip8Error> {
    let at = state.span(state.i, 3)?;
    let value = state.v[x as usize];
    let mut memory = state.memory;
    memory[at].copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
    Ok(State {
        pc: next(state),
        memory,
        ..*state
    })
}

/// Where I ends up after transferring V0..=Vx
fn i_after_transfer(state: &State, x: u8, quirks: &Quirks) -> u16 {
    if quirks.load_store_increments_i {
        wrap_address(state.i + u16::from(x) + 1)
    } else {
        state.i
    }
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(state: &State, x: u8, quirks: &Quirks) -> Result<State, Chip8Error> {
    let at = state.span(state.i, x as usize + 1)?;
    let mut memory = state.memory;
    memory[at].copy_from_slice(&state.v[..=x as usize]);
    Ok(State {
        pc: next(state),
        i: i_after_transfer(state, x, quirks),
        memory,
        ..*state
    })
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(state: &State, x: u8, quirks: &Quirks) -> Result<State, Chip8Error> {
    let at = state.span(state.i, x as usize + 1)?;
    let mut v = state.v;
    v[..=x as usize].copy_from_slice(&state.memory[at]);
    Ok(State {
        pc: next(state),
        i: i_after_transfer(state, x, quirks),
        v,
        ..*state
    })
}
