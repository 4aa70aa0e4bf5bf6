//! This lexer tokenizes CHIP-8 assembly.
//!
//! The whole source is turned into tokens up front; the parser never
//! asks the lexer for more input. Comments are dropped here and the
//! stream always ends with a single `Eof` token.
use std::collections::VecDeque;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use super::error::{Error, ErrorKind, Result};

/// Instruction names. Matching is case-sensitive.
pub const MNEMONICS: [&str; 19] = [
    "cls", "ret", "jp", "call",
    "se", "sne", "ld", "add",
    "or", "and", "xor", "sub",
    "shr", "subn", "shl", "rnd",
    "drw", "skp", "sknp",
];

/// Names of the special registers that appear as bare words.
pub const KEYWORDS: [&str; 6] = ["I", "F", "B", "DT", "ST", "K"];

/// Single-character symbols. Only `. , : @ & [ ] !` are meaningful to the parser.
pub const SYMBOLS: [char; 12] = ['.', ',', ':', '@', '&', '[', ']', '(', ')', '{', '}', '!'];

/// A position in a named source text.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Location {
    pub source: String,
    /// Byte offset from the start of the source.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(source: &str) -> Self {
        Location { source: source.to_owned(), offset: 0, line: 1, column: 1 }
    }

    /// Advance past `c`.
    fn step(&mut self, c: char) {
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Identifier,
    Mnemonic,
    Keyword,
    Number(u32),
    Symbol,
    Comment,
    Eof,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw source text of the token.
    pub value: String,
    pub location: Location,
}

impl Token {
    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.value.starts_with(symbol)
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == keyword
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(f, "identifier `{}`", self.value),
            TokenKind::Mnemonic   => write!(f, "mnemonic `{}`", self.value),
            TokenKind::Keyword    => write!(f, "register `{}`", self.value),
            TokenKind::Number(_)  => write!(f, "number `{}`", self.value),
            TokenKind::Symbol     => write!(f, "`{}`", self.value),
            TokenKind::Comment    => write!(f, "comment"),
            TokenKind::Eof        => write!(f, "end of input"),
        }
    }
}

/// Splits `text` into tokens. `source` names the text in diagnostics.
/// The first malformed token aborts tokenizing.
pub fn tokenize(source: &str, text: &str) -> Result<VecDeque<Token>> {
    let mut lexer = Lexer::new(source, text);
    let mut tokens: VecDeque<Token> = VecDeque::with_capacity(text.len() / 4 + 1);

    loop {
        let token = lexer.next_token()?;
        match token.kind {
            TokenKind::Comment => continue,
            TokenKind::Eof => {
                tokens.push_back(token);
                break;
            }
            _ => tokens.push_back(token),
        }
    }

    debug!("{}: {} token(s)", source, tokens.len());
    Ok(tokens)
}

struct Lexer<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    location: Location,
}

impl<'a> Lexer<'a> {
    fn new(source: &str, text: &'a str) -> Self {
        Lexer { text, chars: text.char_indices().peekable(), location: Location::new(source) }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.location.step(c);
        Some(c)
    }

    fn bump_while<F: Fn(char) -> bool>(&mut self, pred: F) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.bump_while(char::is_whitespace);

        let start = self.location.clone();
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token { kind: TokenKind::Eof, value: String::new(), location: start }),
        };

        if c.is_alphabetic() {
            Ok(self.word(start))
        } else if c.is_ascii_digit() {
            self.decimal(start)
        } else if c == '#' {
            self.hexadecimal(start)
        } else if c == ';' {
            Ok(self.comment(start))
        } else if SYMBOLS.contains(&c) {
            self.bump();
            Ok(Token { kind: TokenKind::Symbol, value: c.to_string(), location: start })
        } else {
            Err(Error::new(ErrorKind::Lexical, start, format!("unrecognized symbol `{}`", c)))
        }
    }

    fn word(&mut self, start: Location) -> Token {
        self.bump_while(char::is_alphanumeric);
        let text = self.text;
        let value = &text[start.offset..self.location.offset];

        let kind = if MNEMONICS.contains(&value) {
            TokenKind::Mnemonic
        } else if KEYWORDS.contains(&value) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };

        Token { kind, value: value.to_owned(), location: start }
    }

    fn decimal(&mut self, start: Location) -> Result<Token> {
        self.bump_while(|c| c.is_ascii_digit());
        let text = self.text;
        let value = &text[start.offset..self.location.offset];
        self.reject_trailing_letter(&start, "decimal")?;

        match value.parse::<u32>() {
            Ok(n) => Ok(Token { kind: TokenKind::Number(n), value: value.to_owned(), location: start }),
            Err(_) => Err(Error::new(ErrorKind::Lexical, start, format!("number `{}` out of range", value))),
        }
    }

    fn hexadecimal(&mut self, start: Location) -> Result<Token> {
        self.bump(); // '#'
        let digits_from = self.location.offset;
        self.bump_while(|c| c.is_ascii_hexdigit());
        let text = self.text;
        let digits = &text[digits_from..self.location.offset];
        self.reject_trailing_letter(&start, "hexadecimal")?;

        if digits.is_empty() {
            return Err(Error::new(ErrorKind::Lexical, start, "hexadecimal digits expected after `#`"));
        }

        match u32::from_str_radix(digits, 16) {
            Ok(n) => Ok(Token {
                kind: TokenKind::Number(n),
                value: text[start.offset..self.location.offset].to_owned(),
                location: start,
            }),
            Err(_) => Err(Error::new(ErrorKind::Lexical, start, format!("number `#{}` out of range", digits))),
        }
    }

    /// A number running straight into a letter (`12a`) is ambiguous.
    fn reject_trailing_letter(&mut self, start: &Location, radix: &str) -> Result<()> {
        match self.peek() {
            Some(c) if c.is_alphabetic() => Err(Error::new(
                ErrorKind::Lexical,
                start.clone(),
                format!("malformed {} literal: unexpected `{}`", radix, c),
            )),
            _ => Ok(()),
        }
    }

    fn comment(&mut self, start: Location) -> Token {
        self.bump_while(|c| c != '\n');
        let text = self.text;
        let value = &text[start.offset..self.location.offset];
        Token { kind: TokenKind::Comment, value: value.to_owned(), location: start }
    }
}
