//! The Parser module takes a token stream from the lexer and converts it
//! into a list of statements.
//!
//! It is a recursive descent parser over this grammar:
//!
//! ```text
//! program     := statement* EOF
//! statement   := label | instruction | directive
//! label       := IDENTIFIER ':'
//! instruction := MNEMONIC (argument (',' argument)*)?
//! directive   := '.' IDENTIFIER (argument (',' argument)*)?
//! argument    := '[' ('I' | value) ']' | '&' value | '@' value | '!' value | KEYWORD | value
//! value       := IDENTIFIER | NUMBER
//! ```
//!
//! The first syntax error ends the parse.
use std::collections::VecDeque;

use super::ast::*;
use super::error::{Error, Result};
use super::lexer::{Location, Token, TokenKind};

pub struct Parser {
    tokens: VecDeque<Token>,
}

impl Parser {
    pub fn new(mut tokens: VecDeque<Token>) -> Self {
        // The stream must end in exactly one Eof for `peek` to always succeed.
        let terminated = tokens.back().map_or(false, |t| t.kind == TokenKind::Eof);
        if !terminated {
            let location = tokens.back()
                .map(|t| t.location.clone())
                .unwrap_or_else(|| Location::new(""));
            tokens.push_back(Token { kind: TokenKind::Eof, value: String::new(), location });
        }
        Parser { tokens }
    }

    /// Run the parser, consuming itself and returning the statements in
    /// source order.
    pub fn run(mut self) -> Result<Vec<Statement>> {
        let mut ast: Vec<Statement> = Vec::with_capacity(self.tokens.len() / 2);

        while self.peek().kind != TokenKind::Eof {
            let statement = self.statement()?;
            trace!("parsed `{}`", statement);
            ast.push(statement);
        }

        Ok(ast)
    }

    fn statement(&mut self) -> Result<Statement> {
        let at_dot = self.peek().is_symbol('.');
        match self.peek().kind {
            TokenKind::Identifier => self.label(),
            TokenKind::Mnemonic => self.instruction(),
            TokenKind::Symbol if at_dot => self.directive(),
            _ => Err(self.expected("label, instruction or directive")),
        }
    }

    fn label(&mut self) -> Result<Statement> {
        let tok = self.consume();
        self.expect_symbol(':')?;
        Ok(Statement::Label { name: tok.value, location: tok.location })
    }

    fn instruction(&mut self) -> Result<Statement> {
        let tok = self.consume();
        let args = self.arguments()?;
        Ok(Statement::Instruction { mnemonic: tok.value, args, location: tok.location })
    }

    fn directive(&mut self) -> Result<Statement> {
        let dot = self.consume();
        if self.peek().kind != TokenKind::Identifier {
            return Err(self.expected("directive name"));
        }
        let name = self.consume().value;
        let args = self.arguments()?;
        Ok(Statement::Directive { name, args, location: dot.location })
    }

    /// An optional comma separated argument list.
    fn arguments(&mut self) -> Result<Vec<Argument>> {
        let mut args = Vec::new();
        if !self.at_argument() {
            return Ok(args);
        }

        args.push(self.argument()?);
        while self.eat_symbol(',') {
            args.push(self.argument()?);
        }
        Ok(args)
    }

    /// Whether the next token begins an argument rather than the next
    /// statement. An identifier followed by `:` is the next label.
    fn at_argument(&self) -> bool {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Number(_) | TokenKind::Keyword => true,
            TokenKind::Symbol => tok.is_symbol('[') || tok.is_symbol('&') || tok.is_symbol('@') || tok.is_symbol('!'),
            TokenKind::Identifier => !self.tokens.get(1).map_or(false, |t| t.is_symbol(':')),
            _ => false,
        }
    }

    fn argument(&mut self) -> Result<Argument> {
        let location = self.peek().location.clone();

        if self.eat_symbol('[') {
            let arg = if self.peek().is_keyword("I") {
                self.consume();
                Argument::new(ArgType::IndexAddress, Value::Null, location)
            } else {
                Argument::new(ArgType::Address, self.value()?, location)
            };
            self.expect_symbol(']')?;
            return Ok(arg);
        }

        // `&addr` is shorthand for `[addr]`.
        if self.eat_symbol('&') {
            return Ok(Argument::new(ArgType::Address, self.value()?, location));
        }

        if self.eat_symbol('@') {
            return Ok(Argument::new(ArgType::Register, self.value()?, location));
        }

        if self.eat_symbol('!') {
            return Ok(Argument::new(ArgType::Nibble, self.value()?, location));
        }

        if self.peek().kind == TokenKind::Keyword {
            let tok = self.consume();
            return match ArgType::from_keyword(&tok.value) {
                Some(kind) => Ok(Argument::new(kind, Value::Null, location)),
                None => Err(Error::syntax(location, "argument expected here")),
            };
        }

        Ok(Argument::new(ArgType::Byte, self.value()?, location))
    }

    fn value(&mut self) -> Result<Value> {
        match self.peek().kind {
            TokenKind::Identifier => Ok(Value::Identifier(self.consume().value)),
            TokenKind::Number(n) => {
                self.consume();
                Ok(Value::Number(n))
            }
            _ => Err(self.expected("identifier or number")),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<Token> {
        if self.peek().is_symbol(symbol) {
            Ok(self.consume())
        } else {
            Err(self.expected(&format!("`{}`", symbol)))
        }
    }

    fn eat_symbol(&mut self, symbol: char) -> bool {
        if self.peek().is_symbol(symbol) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn expected(&self, what: &str) -> Error {
        let tok = self.peek();
        Error::syntax(tok.location.clone(), format!("{} expected here, found {}", what, tok))
    }

    #[inline]
    fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof, which is never popped.
        &self.tokens[0]
    }

    /// Pops a token off the input stream and returns it.
    /// At the end of input the Eof token is returned and kept.
    fn consume(&mut self) -> Token {
        if self.tokens.len() > 1 {
            if let Some(tok) = self.tokens.pop_front() {
                return tok;
            }
        }
        self.tokens[0].clone()
    }
}
