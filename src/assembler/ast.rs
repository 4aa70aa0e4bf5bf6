//! This AST describes a parsed CHIP-8 assembly file.
//!
//! A program is a flat list of statements: labels, instructions and
//! directives. Comments are prefixed with semicolons (;) and run to the
//! end of the line.
//!
//! Operands are written by role rather than by value:
//!
//! ```nasm
//! ld  @0, 5          ; @n      register Vn
//! jp  [start]        ; [addr]  12-bit address
//! call &draw         ; &addr   same as [addr]
//! drw @0, @1, !5     ; !n      4-bit nibble
//! ld  [I], @3        ; [I]     memory at I
//! ld  @2, DT         ; I F B DT ST K are bare special registers
//! add @1, 10         ; anything else is a byte
//! ```
//!
//! Example source file:
//!
//! ```nasm
//! .org #200
//! start:
//!     cls
//!     ld I, [sprite]
//!     ld @0, 10
//!     ld @1, #0A
//!     drw @0, @1, !5
//! loop:
//!     jp [loop]
//! sprite:
//!     .db #F0, #90, #F0, #90, #F0
//! ```

use std::fmt;

use super::lexer::Location;

/// An operand payload, resolved or not.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Value {
    /// A label name waiting for the symbol table.
    Identifier(String),
    Number(u32),
    /// Operands such as `DT` that carry no literal.
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Identifier(name) => write!(f, "{}", name),
            Value::Number(n)        => write!(f, "{}", n),
            Value::Null             => Ok(()),
        }
    }
}

/// The role an operand plays, independent of its value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArgType {
    Index,
    DelayTimer,
    SoundTimer,
    Bcd,
    Key,
    Flags,
    Register,
    Address,
    Byte,
    Nibble,
    IndexAddress,
}

impl ArgType {
    /// The special register named by a bare keyword token.
    pub fn from_keyword(keyword: &str) -> Option<ArgType> {
        match keyword {
            "K"  => Some(ArgType::Key),
            "DT" => Some(ArgType::DelayTimer),
            "ST" => Some(ArgType::SoundTimer),
            "I"  => Some(ArgType::Index),
            "B"  => Some(ArgType::Bcd),
            "F"  => Some(ArgType::Flags),
            _    => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Argument {
    pub kind: ArgType,
    pub value: Value,
    /// Where the operand starts in the source.
    pub location: Location,
}

impl Argument {
    pub fn new(kind: ArgType, value: Value, location: Location) -> Self {
        Argument { kind, value, location }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ArgType::Index        => write!(f, "I"),
            ArgType::DelayTimer   => write!(f, "DT"),
            ArgType::SoundTimer   => write!(f, "ST"),
            ArgType::Bcd          => write!(f, "B"),
            ArgType::Key          => write!(f, "K"),
            ArgType::Flags        => write!(f, "F"),
            ArgType::IndexAddress => write!(f, "[I]"),
            ArgType::Register     => write!(f, "@{}", self.value),
            ArgType::Address      => match self.value {
                Value::Number(n) => write!(f, "[#{:03X}]", n),
                ref v            => write!(f, "[{}]", v),
            },
            ArgType::Nibble       => write!(f, "!{}", self.value),
            ArgType::Byte         => write!(f, "{}", self.value),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    /// Names the current address. Emits nothing.
    Label { name: String, location: Location },
    /// Always two bytes.
    Instruction { mnemonic: String, args: Vec<Argument>, location: Location },
    /// `.org` or `.db`; anything else is rejected when addresses are assigned.
    Directive { name: String, args: Vec<Argument>, location: Location },
}

impl Statement {
    pub fn location(&self) -> &Location {
        match self {
            Statement::Label { location, .. }
            | Statement::Instruction { location, .. }
            | Statement::Directive { location, .. } => location,
        }
    }

    pub fn args(&self) -> &[Argument] {
        match self {
            Statement::Label { .. } => &[],
            Statement::Instruction { args, .. } | Statement::Directive { args, .. } => args,
        }
    }
}

fn write_args(f: &mut fmt::Formatter, args: &[Argument]) -> fmt::Result {
    for (idx, arg) in args.iter().enumerate() {
        let sep = if idx == 0 { " " } else { ", " };
        write!(f, "{}{}", sep, arg)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Label { name, .. } => write!(f, "{}:", name),
            Statement::Instruction { mnemonic, args, .. } => {
                write!(f, "{}", mnemonic)?;
                write_args(f, args)
            }
            Statement::Directive { name, args, .. } => {
                write!(f, ".{}", name)?;
                write_args(f, args)
            }
        }
    }
}
