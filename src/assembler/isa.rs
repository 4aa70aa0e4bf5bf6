//! The CHIP-8 instruction table and the bit-packing helpers that lay
//! operands into an opcode.
//!
//! Every opcode is 16 bits. The table gives the fixed bits for each
//! (mnemonic, operand kinds) form; the helpers OR the operand fields in:
//!
//! ```text
//! 0x8124  =  8  x  y  4     vx: bits 8-11, vy: bits 4-7
//! 0x6005  =  6  x  k  k     kk: bits 0-7
//! 0x1202  =  1  n  n  n     nnn: bits 0-11
//! 0xD013  =  D  x  y  n     n: bits 0-3
//! ```
use super::ast::ArgType::{self, *};
use super::ast::{Argument, Value};
use super::error::{Error, Result};
use super::lexer::Location;

/// (mnemonic, operand kinds, base opcode)
pub static INSTRUCTION_SET: [(&str, &[ArgType], u16); 36] = [
    ("cls",  &[],                          0x00E0),
    ("ret",  &[],                          0x00EE),
    ("jp",   &[Address],                   0x1000),
    ("call", &[Address],                   0x2000),
    ("se",   &[Register, Byte],            0x3000),
    ("sne",  &[Register, Byte],            0x4000),
    ("se",   &[Register, Register],        0x5000),
    ("ld",   &[Register, Byte],            0x6000),
    ("add",  &[Register, Byte],            0x7000),
    ("ld",   &[Register, Register],        0x8000),
    ("or",   &[Register, Register],        0x8001),
    ("and",  &[Register, Register],        0x8002),
    ("xor",  &[Register, Register],        0x8003),
    ("add",  &[Register, Register],        0x8004),
    ("sub",  &[Register, Register],        0x8005),
    ("shr",  &[Register, Register],        0x8006),
    ("subn", &[Register, Register],        0x8007),
    ("shl",  &[Register, Register],        0x800E),
    ("shr",  &[Register],                  0x8006),
    ("shl",  &[Register],                  0x800E),
    ("sne",  &[Register, Register],        0x9000),
    ("ld",   &[Index, Address],            0xA000),
    ("jp",   &[Register, Address],         0xB000),
    ("rnd",  &[Register, Byte],            0xC000),
    ("drw",  &[Register, Register, Nibble], 0xD000),
    ("skp",  &[Register],                  0xE09E),
    ("sknp", &[Register],                  0xE0A1),
    ("ld",   &[Register, DelayTimer],      0xF007),
    ("ld",   &[Register, Key],             0xF00A),
    ("ld",   &[DelayTimer, Register],      0xF015),
    ("ld",   &[SoundTimer, Register],      0xF018),
    ("add",  &[Index, Register],           0xF01E),
    ("ld",   &[Flags, Register],           0xF029),
    ("ld",   &[Bcd, Register],             0xF033),
    ("ld",   &[IndexAddress, Register],    0xF055),
    ("ld",   &[Register, IndexAddress],    0xF065),
];

/// Base opcode for a form, if the form exists.
pub fn lookup(mnemonic: &str, kinds: &[ArgType]) -> Option<u16> {
    INSTRUCTION_SET.iter()
        .find(|(m, k, _)| *m == mnemonic && *k == kinds)
        .map(|&(_, _, opcode)| opcode)
}

/// Address into bits 0-11.
pub fn nnn(opcode: u16, addr: u32) -> u16 {
    opcode | (addr & 0x0FFF) as u16
}

/// Nibble into bits 0-3.
pub fn n(opcode: u16, nib: u32) -> u16 {
    opcode | (nib & 0x000F) as u16
}

/// Register into bits 8-11.
pub fn vx(opcode: u16, r: u32) -> u16 {
    opcode | (((r & 0x000F) as u16) << 8)
}

/// Register into bits 4-7.
pub fn vy(opcode: u16, r: u32) -> u16 {
    opcode | (((r & 0x000F) as u16) << 4)
}

/// Byte into bits 0-7.
pub fn kk(opcode: u16, v: u32) -> u16 {
    opcode | (v & 0x00FF) as u16
}

pub fn vx_vy(opcode: u16, x: u32, y: u32) -> u16 {
    vy(vx(opcode, x), y)
}

pub fn vx_kk(opcode: u16, x: u32, v: u32) -> u16 {
    kk(vx(opcode, x), v)
}

pub fn vx_vy_n(opcode: u16, x: u32, y: u32, nib: u32) -> u16 {
    n(vx_vy(opcode, x, y), nib)
}

/// Width in bits of the field an operand kind is packed into.
fn field_width(kind: ArgType) -> Option<u32> {
    match kind {
        Register | Nibble => Some(4),
        Byte              => Some(8),
        Address           => Some(12),
        _                 => None,
    }
}

/// The resolved value of an operand. Kinds without a literal read as 0.
pub fn operand(arg: &Argument) -> Result<u32> {
    let value = match &arg.value {
        Value::Number(n) => *n,
        Value::Null => 0,
        Value::Identifier(name) => {
            return Err(Error::semantic(arg.location.clone(), format!("unresolved identifier `{}`", name)));
        }
    };

    if let Some(bits) = field_width(arg.kind) {
        if value >> bits != 0 {
            warn!("{}: value {} does not fit in {} bits and will be truncated", arg.location, value, bits);
        }
    }
    Ok(value)
}

/// Encode one instruction statement.
pub fn encode(mnemonic: &str, args: &[Argument], location: &Location) -> Result<u16> {
    let kinds: Vec<ArgType> = args.iter().map(|a| a.kind).collect();
    let base = match lookup(mnemonic, &kinds) {
        Some(opcode) => opcode,
        None => {
            return Err(Error::semantic(
                location.clone(),
                format!("unknown instruction `{}` or wrong arguments {:?}", mnemonic, kinds),
            ));
        }
    };

    let v = |idx: usize| operand(&args[idx]);

    let opcode = match kinds.as_slice() {
        []                           => base,
        [Register, Register]         => vx_vy(base, v(0)?, v(1)?),
        [Register, Byte]             => vx_kk(base, v(0)?, v(1)?),
        [Register, Register, Nibble] => vx_vy_n(base, v(0)?, v(1)?, v(2)?),
        [Address]                    => nnn(base, v(0)?),
        // Bnnn jumps relative to V0; the register is fixed by the opcode.
        [Register, Address]          => nnn(base, v(1)?),
        [Register, ..]               => vx(base, v(0)?),
        [_, Register]                => vx(base, v(1)?),
        [_, Address]                 => nnn(base, v(1)?),
        _                            => base,
    };

    Ok(opcode)
}
