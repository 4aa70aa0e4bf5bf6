//! A two-pass assembler for the CHIP-8 instruction set.
//!
//! ```
//! let bytes = chip8asm::assembler::assemble("demo", "loop:\n  jp [loop]").unwrap();
//! assert_eq!(bytes, vec![0x10, 0x00]);
//! ```

#[macro_use] extern crate log;

pub mod assembler;
