//! The Assembler module is in charge of taking CHIP-8
//! assembly source and producing the program's bytes.
//!
//! It does this by implementing a simple tokenizer, a
//! one-token-lookahead recursive descent parser and three
//! passes over the resulting AST: address assignment,
//! label resolution and code generation.
//!
//! Every stage runs to completion before the next starts and
//! the first error anywhere ends the assembly with no output.

pub mod ast;
pub mod env;
pub mod error;
pub mod isa;
pub mod lexer;
pub mod parser;
pub mod pass;

pub use self::error::{Error, ErrorKind, Result};
pub use self::lexer::Location;

use self::ast::Statement;
use self::env::Environment;

/// One statement of an assembled program.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Listing {
    /// Address the statement starts at.
    pub address: u32,
    /// The statement with every label reference resolved.
    pub statement: Statement,
    pub bytes: Vec<u8>,
}

/// The result of a successful assembly.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Assembly {
    pub listing: Vec<Listing>,
    /// Labels ordered by address.
    pub symbols: Vec<(String, u32)>,
}

impl Assembly {
    /// The program image: every statement's bytes in source order.
    /// Gaps opened by `.org` are not padded.
    pub fn bytes(&self) -> Vec<u8> {
        self.listing.iter().flat_map(|l| l.bytes.iter().copied()).collect()
    }
}

/// Assemble `text` starting at address 0. `source_name` is only used
/// in diagnostics.
pub fn assemble(source_name: &str, text: &str) -> Result<Vec<u8>> {
    assemble_at(source_name, text, 0)
}

/// Assemble `text` with the address cursor starting at `origin`.
pub fn assemble_at(source_name: &str, text: &str, origin: u32) -> Result<Vec<u8>> {
    assemble_listing(source_name, text, origin).map(|a| a.bytes())
}

/// Assemble `text`, keeping the per-statement breakdown and the symbol table.
pub fn assemble_listing(source_name: &str, text: &str, origin: u32) -> Result<Assembly> {
    let tokens = lexer::tokenize(source_name, text)?;

    let mut ast = parser::Parser::new(tokens).run()?;
    debug!("{}: {} statement(s)", source_name, ast.len());

    let mut env = Environment::with_origin(origin);
    let addresses = pass::calculate(&ast, &mut env)?;
    let symbols = env.symbols();
    debug!("{}: {} label(s), final address {:#05X}", source_name, symbols.len(), env.address());

    pass::preprocess(&mut ast, &env)?;
    let code = pass::generate(&ast)?;

    let listing: Vec<Listing> = ast.into_iter()
        .zip(addresses)
        .zip(code)
        .map(|((statement, address), bytes)| Listing { address, statement, bytes })
        .collect();

    let assembly = Assembly { listing, symbols };
    debug!("{}: {} byte(s) generated", source_name, assembly.listing.iter().map(|l| l.bytes.len()).sum::<usize>());
    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm(text: &str) -> Vec<u8> {
        match assemble("test", text) {
            Ok(bytes) => bytes,
            Err(e) => panic!("`{}` failed: {}", text, e),
        }
    }

    fn word(text: &str) -> u16 {
        let bytes = asm(text);
        assert_eq!(bytes.len(), 2, "`{}`", text);
        u16::from_be_bytes([bytes[0], bytes[1]])
    }

    #[test]
    fn test_documented_encodings() {
        assert_eq!(asm("cls"), vec![0x00, 0xE0]);
        // The 1nnn template puts address 2 at 10 02.
        assert_eq!(asm("jp [2]"), vec![0x10, 0x02]);
        assert_eq!(asm("jp &2"), vec![0x10, 0x02]);
        assert_eq!(asm("ld @0, 5"), vec![0x60, 0x05]);
        assert_eq!(asm("add @1, @2"), vec![0x81, 0x24]);
        assert_eq!(asm("drw @0, @1, !3"), vec![0xD0, 0x13]);
    }

    #[test]
    fn test_every_form() {
        let forms: [(&str, u16); 36] = [
            ("cls",               0x00E0),
            ("ret",               0x00EE),
            ("jp [#2A8]",         0x12A8),
            ("call [#2A8]",       0x22A8),
            ("se @3, #42",        0x3342),
            ("sne @3, #42",       0x4342),
            ("se @3, @4",         0x5340),
            ("ld @3, #42",        0x6342),
            ("add @3, #42",       0x7342),
            ("ld @3, @4",         0x8340),
            ("or @3, @4",         0x8341),
            ("and @3, @4",        0x8342),
            ("xor @3, @4",        0x8343),
            ("add @3, @4",        0x8344),
            ("sub @3, @4",        0x8345),
            ("shr @3, @4",        0x8346),
            ("subn @3, @4",       0x8347),
            ("shl @3, @4",        0x834E),
            ("shr @3",            0x8306),
            ("shl @3",            0x830E),
            ("sne @3, @4",        0x9340),
            ("ld I, [#2A8]",      0xA2A8),
            ("jp @0, [#2A8]",     0xB2A8),
            ("rnd @3, #42",       0xC342),
            ("drw @3, @4, !15",   0xD34F),
            ("skp @3",            0xE39E),
            ("sknp @3",           0xE3A1),
            ("ld @3, DT",         0xF307),
            ("ld @3, K",          0xF30A),
            ("ld DT, @3",         0xF315),
            ("ld ST, @3",         0xF318),
            ("add I, @3",         0xF31E),
            ("ld F, @3",          0xF329),
            ("ld B, @3",          0xF333),
            ("ld [I], @3",        0xF355),
            ("ld @3, [I]",        0xF365),
        ];

        for (text, opcode) in forms.iter() {
            assert_eq!(word(text), *opcode, "`{}`", text);
        }
    }

    #[test]
    fn test_db() {
        let assembly = assemble_listing("test", "cls\n.db 1,2,3\nafter:", 0).unwrap();
        assert_eq!(assembly.bytes(), vec![0x00, 0xE0, 0x01, 0x02, 0x03]);
        assert_eq!(assembly.listing[1].address, 2);
        assert_eq!(assembly.listing[1].bytes, vec![1, 2, 3]);
        assert_eq!(assembly.symbols, vec![("after".to_owned(), 5)]);
    }

    #[test]
    fn test_org() {
        let text = "cls\ncls\ncls\n.org #300\nhere:\njp [here]";
        let assembly = assemble_listing("test", text, 0).unwrap();
        assert_eq!(assembly.symbols, vec![("here".to_owned(), 0x300)]);
        // Gaps are not padded.
        assert_eq!(assembly.bytes(), vec![0x00, 0xE0, 0x00, 0xE0, 0x00, 0xE0, 0x13, 0x00]);

        assert_eq!(asm(".org [#300]\nhere:\njp [here]"), vec![0x13, 0x00]);
        assert_eq!(asm(".org #300\nhere:\njp &here"), vec![0x13, 0x00]);
    }

    #[test]
    fn test_byte_count_matches_address_advance() {
        let text = "start:\n  ld @0, 1\n  ld @1, 2\n.db 1, 2, 3\n  add @0, @1\nend:\n  jp [end]";
        let assembly = assemble_listing("test", text, 0x200).unwrap();
        let end = assembly.listing.last().map(|l| l.address + l.bytes.len() as u32).unwrap();
        assert_eq!(assembly.bytes().len() as u32, end - 0x200);
        assert!(assembly.listing.iter()
            .filter(|l| matches!(l.statement, Statement::Instruction { .. }))
            .all(|l| l.bytes.len() == 2));
    }

    #[test]
    fn test_forward_and_backward_references() {
        let forward = asm("jp [target]\ncls\ntarget:\nret\njp [target]");
        assert_eq!(&forward[0..2], &[0x10, 0x04]);
        assert_eq!(&forward[6..8], &[0x10, 0x04]);
    }

    #[test]
    fn test_origin() {
        assert_eq!(assemble_at("test", "loop:\njp [loop]", 0x200), Ok(vec![0x12, 0x00]));
        assert_eq!(assemble_at("test", "cls\nloop:\njp [loop]", 0x200), Ok(vec![0x00, 0xE0, 0x12, 0x02]));
    }

    #[test]
    fn test_deterministic() {
        let text = "start:\n  ld I, [sprite]\n  drw @0, @1, !5\n  jp [start]\nsprite:\n.db #F0, #90, #F0";
        assert_eq!(assemble("a", text), assemble("a", text));
        assert_eq!(asm(text).len(), 9);
    }

    #[test]
    fn test_errors_stop_assembly() {
        let err = assemble("game.asm", "cls\n  jp [missing]").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.location.source, "game.asm");
        assert_eq!((err.location.line, err.location.column), (2, 6));

        let err = assemble("test", "ld @0, 12a").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.location.column, 8);

        let err = assemble("test", "ld @0 5").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);

        let err = assemble("test", "cls\nret\nld @0").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.location.line, 3);

        let err = assemble("test", ".org [later]\nlater:").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
    }

    #[test]
    fn test_truncation() {
        // Values wider than their field are masked.
        assert_eq!(word("ld @18, #1FF"), 0x62FF);
        assert_eq!(word("jp [#1234]"), 0x1234);
        assert_eq!(word("jp [#F234]"), 0x1234);
    }

    #[test]
    fn test_sample_program() {
        let text = "
        ; draw a digit and wait
        .org [#200]
        start:
            cls
            ld @0, 10      ; x
            ld @1, #0A     ; y
            ld @2, 7
            ld F, @2
            drw @0, @1, !5
        wait:
            ld @3, K
            sknp @3
            jp [wait]
            jp [start]
        ";
        let assembly = assemble_listing("sample", text, 0).unwrap();
        assert_eq!(assembly.symbols, vec![("start".to_owned(), 0x200), ("wait".to_owned(), 0x20C)]);
        assert_eq!(assembly.bytes(), vec![
            0x00, 0xE0,
            0x60, 0x0A,
            0x61, 0x0A,
            0x62, 0x07,
            0xF2, 0x29,
            0xD0, 0x15,
            0xF3, 0x0A,
            0xE3, 0xA1,
            0x12, 0x0C,
            0x12, 0x00,
        ]);
    }
}
