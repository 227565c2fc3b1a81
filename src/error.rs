//! Errors raised during compilation. Every error aborts the compile.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;

use itertools::Itertools;

use crate::grammar::NonTerminal;
use crate::parsing::Position;
use crate::token::Terminal;

/// The reason of a [CompileError].
#[derive(Debug)]
pub enum ErrorKind {
    /// No transition exists for the character and the lexer is not in an accepting state.
    UnexpectedCharacter(char),
    /// The input ended inside a `{ ... }` comment.
    UnterminatedComment,
    /// The input ended inside a string constant.
    UnterminatedString,
    /// A number constant does not fit into 32 bits.
    NumberOutOfRange(String),
    /// The input ended in the middle of a lexeme, e.g. after a lone `:`.
    UnexpectedEndOfInput,
    /// The terminal on top of the control stack does not match the lookahead.
    UnexpectedToken {
        expected: Terminal,
        found: Terminal,
        text: String,
    },
    /// The parse table has no entry for the nonterminal and the lookahead.
    NoProduction {
        nonterminal: NonTerminal,
        found: Terminal,
        text: String,
        expected: Vec<Terminal>,
    },
    UndefinedVariable {
        name: String,
        suggestion: Option<String>,
    },
    Redeclaration {
        name: String,
        previous: Position,
    },
    /// Every register of the bank is occupied.
    RegisterExhausted {
        available: usize,
    },
    Io(io::Error),
    /// The operand, operator or label stack was used out of order.
    Internal(&'static str),
}

/// Error type of the compiler containing the reason and the source location.
#[derive(Debug)]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Location in the source code, if one is known.
    pub position: Option<Position>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, position: Position) -> CompileError {
        CompileError {
            kind,
            position: Some(position),
        }
    }

    pub(crate) fn io(err: io::Error, position: Position) -> CompileError {
        CompileError::new(ErrorKind::Io(err), position)
    }

    pub(crate) fn internal(reason: &'static str) -> CompileError {
        CompileError {
            kind: ErrorKind::Internal(reason),
            position: None,
        }
    }

    pub fn is_lexical(&self) -> bool {
        match self.kind {
            ErrorKind::UnexpectedCharacter(_)
            | ErrorKind::UnterminatedComment
            | ErrorKind::UnterminatedString
            | ErrorKind::NumberOutOfRange(_)
            | ErrorKind::UnexpectedEndOfInput => true,
            _ => false,
        }
    }

    pub fn is_syntax(&self) -> bool {
        match self.kind {
            ErrorKind::UnexpectedToken { .. } | ErrorKind::NoProduction { .. } => true,
            _ => false,
        }
    }

    /// Short human readable name of the error class.
    pub fn category(&self) -> &'static str {
        match self.kind {
            _ if self.is_lexical() => "lexical error",
            _ if self.is_syntax() => "syntax error",
            ErrorKind::UndefinedVariable { .. } => "undefined variable",
            ErrorKind::Redeclaration { .. } => "duplicate declaration",
            ErrorKind::RegisterExhausted { .. } => "register exhaustion",
            ErrorKind::Io(_) => "io error",
            _ => "internal error",
        }
    }
}

/// Formats a list of alternatives as `a`, `a or b` or `a, b, or c`.
fn alternatives<T: Display>(items: &[T]) -> String {
    match items {
        [] => "nothing".to_string(),
        [one] => one.to_string(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.iter().join(", "), last),
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::UnexpectedCharacter(ch) => write!(f, "unexpected character {:?}", ch),
            ErrorKind::UnterminatedComment => write!(f, "comment is never closed"),
            ErrorKind::UnterminatedString => write!(f, "string constant is never closed"),
            ErrorKind::NumberOutOfRange(text) => {
                write!(f, "number {} does not fit into 32 bits", text)
            }
            ErrorKind::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
            ErrorKind::UnexpectedToken {
                expected,
                found: Terminal::EndOfInput,
                ..
            } => write!(f, "expected {}, found end of input", expected),
            ErrorKind::UnexpectedToken { expected, text, .. } => {
                write!(f, "expected {}, found '{}'", expected, text)
            }
            ErrorKind::NoProduction {
                nonterminal,
                found,
                text,
                expected,
            } => {
                let found = match found {
                    Terminal::EndOfInput => "end of input".to_string(),
                    _ => format!("'{}'", text),
                };

                write!(
                    f,
                    "expected {}, found {} while parsing {}",
                    alternatives(expected),
                    found,
                    nonterminal
                )
            }
            ErrorKind::UndefinedVariable {
                name,
                suggestion: Some(suggestion),
            } => write!(
                f,
                "variable {} is not defined, did you mean {}?",
                name, suggestion
            ),
            ErrorKind::UndefinedVariable { name, .. } => {
                write!(f, "variable {} is not defined", name)
            }
            ErrorKind::Redeclaration { name, previous } => write!(
                f,
                "variable {} is already defined at line {} col {}",
                name, previous.line, previous.column
            ),
            ErrorKind::RegisterExhausted { available } => {
                write!(f, "no free registers, all {} are in use", available)
            }
            ErrorKind::Io(err) => write!(f, "{}", err),
            ErrorKind::Internal(reason) => write!(f, "{}", reason),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "{} at line {} col {}: {}",
                self.category(),
                pos.line,
                pos.column,
                self.kind
            ),
            None => write!(f, "{}: {}", self.category(), self.kind),
        }
    }
}

impl StdError for CompileError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.kind {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}
