//! The single error type shared by every assembler stage.
use std::fmt;

use thiserror::Error;

use super::lexer::Location;

pub type Result<T> = std::result::Result<T, Error>;

/// Which stage rejected the input.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Malformed literal or a character outside the language.
    Lexical,
    /// A token appeared where the grammar required something else.
    Syntax,
    /// Well-formed input that cannot be assembled: unknown directive,
    /// unknown identifier or an instruction form missing from the table.
    Semantic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Lexical  => write!(f, "lexical"),
            ErrorKind::Syntax   => write!(f, "syntax"),
            ErrorKind::Semantic => write!(f, "semantic"),
        }
    }
}

/// The first error found in a source. Assembly stops there.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("{location}: {kind} error: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub location: Location,
    pub message: String,
}

impl Error {
    pub fn new<S: Into<String>>(kind: ErrorKind, location: Location, message: S) -> Self {
        Error { kind, location, message: message.into() }
    }

    pub fn syntax<S: Into<String>>(location: Location, message: S) -> Self {
        Error::new(ErrorKind::Syntax, location, message)
    }

    pub fn semantic<S: Into<String>>(location: Location, message: S) -> Self {
        Error::new(ErrorKind::Semantic, location, message)
    }
}
