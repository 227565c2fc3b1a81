//! Table driven lexical analyzer.
//!
//! The lexer is a deterministic finite automaton. Transitions are looked up
//! from a static table keyed by the current state and the class of the
//! current character. Comments and string constants are scanned by a small
//! sub-automaton, since their bodies accept any character.

use std::collections::HashMap;
use std::io::{self, BufRead};

use lazy_static::lazy_static;
use slog::{o, trace, Discard, Logger};

use crate::error::{CompileError, ErrorKind};
use crate::parsing::Position;
use crate::symbol_table::SymbolTable;
use crate::token::{reserved_word, Lexeme, Terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum State {
    Start,
    Whitespace,
    Symbol,
    Number,
    Colon,
    AssignmentOp,
    AdditiveOp,
    MultiplicativeOp,
    LeftParen,
    RightParen,
    StatementSep,
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanEqualTo,
    GreaterThan,
    GreaterThanEqualTo,
    InComment,
    Comment,
    InString,
    InStringEscape,
    StringConst,
}

impl State {
    fn is_accepting(self) -> bool {
        match self {
            State::Start
            | State::Colon
            | State::InComment
            | State::InString
            | State::InStringEscape => false,
            _ => true,
        }
    }

    /// Terminal produced by a lexeme accepted in this state.
    /// `None` for lexemes which are discarded.
    fn terminal(self) -> Option<Terminal> {
        let terminal = match self {
            State::Symbol => Terminal::Identifier,
            State::Number => Terminal::Number,
            State::StringConst => Terminal::StringConst,
            State::AssignmentOp => Terminal::AssignmentOp,
            State::AdditiveOp => Terminal::AdditiveOp,
            State::MultiplicativeOp => Terminal::MultiplicativeOp,
            State::EqualTo
            | State::NotEqualTo
            | State::LessThan
            | State::LessThanEqualTo
            | State::GreaterThan
            | State::GreaterThanEqualTo => Terminal::RelationalOp,
            State::LeftParen => Terminal::LeftParen,
            State::RightParen => Terminal::RightParen,
            State::StatementSep => Terminal::StatementSep,
            _ => return None,
        };

        Some(terminal)
    }
}

/// Normalized character used as the transition table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CharClass {
    Letter,
    Digit,
    Other(char),
}

impl CharClass {
    fn of(ch: char) -> CharClass {
        if ch.is_ascii_digit() {
            CharClass::Digit
        } else if ch.is_alphabetic() {
            CharClass::Letter
        } else {
            CharClass::Other(ch)
        }
    }
}

lazy_static! {
    static ref TRANSITIONS: HashMap<(State, CharClass), State> = {
        use self::CharClass::*;
        use self::State::*;

        let mut table = HashMap::new();

        for &ch in &[' ', '\t', '\r', '\n'] {
            table.insert((Start, Other(ch)), Whitespace);
            table.insert((Whitespace, Other(ch)), Whitespace);
        }

        table.insert((Start, Letter), Symbol);
        table.insert((Symbol, Letter), Symbol);
        table.insert((Symbol, Digit), Symbol);
        table.insert((Symbol, Other('_')), Symbol);

        table.insert((Start, Digit), Number);
        table.insert((Number, Digit), Number);

        table.insert((Start, Other('+')), AdditiveOp);
        table.insert((Start, Other('-')), AdditiveOp);
        table.insert((Start, Other('*')), MultiplicativeOp);
        table.insert((Start, Other('/')), MultiplicativeOp);
        table.insert((Start, Other('(')), LeftParen);
        table.insert((Start, Other(')')), RightParen);
        table.insert((Start, Other(';')), StatementSep);

        table.insert((Start, Other('=')), EqualTo);
        table.insert((Start, Other('>')), GreaterThan);
        table.insert((GreaterThan, Other('=')), GreaterThanEqualTo);
        table.insert((Start, Other('<')), LessThan);
        table.insert((LessThan, Other('>')), NotEqualTo);
        table.insert((LessThan, Other('=')), LessThanEqualTo);

        table.insert((Start, Other(':')), Colon);
        table.insert((Colon, Other('=')), AssignmentOp);

        table.insert((Start, Other('{')), InComment);
        table.insert((Start, Other('"')), InString);

        table
    };
}

/// Decodes characters from a buffered reader one line at a time.
struct ReaderChars<R> {
    reader: R,
    line: Vec<char>,
    index: usize,
}

impl<R: BufRead> Iterator for ReaderChars<R> {
    type Item = io::Result<char>;

    fn next(&mut self) -> Option<io::Result<char>> {
        loop {
            if let Some(ch) = self.line.get(self.index) {
                self.index += 1;
                return Some(Ok(*ch));
            }

            let mut buffer = String::new();

            match self.reader.read_line(&mut buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line = buffer.chars().collect();
                    self.index = 0;
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Pull based lexer producing one [Lexeme] per call to [Lexer::next_lexeme].
///
/// Identifiers are registered in the lexer's [SymbolTable] the first time they are seen.
pub struct Lexer<'a> {
    chars: Box<dyn Iterator<Item = io::Result<char>> + 'a>,
    current: Option<char>,
    primed: bool,
    position: Position,
    state: State,
    finished: bool,
    symbols: SymbolTable,
    logger: Logger,
}

impl<'a> Lexer<'a> {
    fn from_chars<I, L>(chars: I, logger: L) -> Lexer<'a>
    where
        I: Iterator<Item = io::Result<char>> + 'a,
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "lexing"));

        Lexer {
            chars: Box::new(chars),
            current: None,
            primed: false,
            position: Position::default(),
            state: State::Start,
            finished: false,
            symbols: SymbolTable::new(),
            logger,
        }
    }

    /// Creates a lexer over an in-memory source.
    pub fn new<L: Into<Option<Logger>>>(source: &'a str, logger: L) -> Lexer<'a> {
        Lexer::from_chars(source.chars().map(Ok), logger)
    }

    /// Creates a lexer reading from `reader`. Read failures and invalid UTF-8
    /// are reported as I/O errors at the position reached.
    pub fn from_reader<R, L>(reader: R, logger: L) -> Lexer<'a>
    where
        R: BufRead + 'a,
        L: Into<Option<Logger>>,
    {
        let chars = ReaderChars {
            reader,
            line: Vec::new(),
            index: 0,
        };

        Lexer::from_chars(chars, logger)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    fn read(&mut self) -> Result<Option<char>, CompileError> {
        let position = self.position;

        self.chars
            .next()
            .transpose()
            .map_err(|err| CompileError::io(err, position))
    }

    /// Consumes the current character.
    fn bump(&mut self) -> Result<(), CompileError> {
        if let Some(ch) = self.current {
            self.position.advance(ch);
        }

        self.current = self.read()?;

        Ok(())
    }

    /// Returns the next token of the input.
    ///
    /// Whitespace and comments are skipped. At the end of the input a lexeme
    /// of kind [Terminal::EndOfInput] is returned.
    pub fn next_lexeme(&mut self) -> Result<Lexeme, CompileError> {
        if !self.primed {
            self.primed = true;
            self.current = self.read()?;
        }

        let mut text = String::new();
        let mut start = self.position;

        loop {
            match self.state {
                State::InComment | State::InString | State::InStringEscape => {
                    let ch = match self.current {
                        Some(ch) => ch,
                        None => {
                            let kind = match self.state {
                                State::InComment => ErrorKind::UnterminatedComment,
                                _ => ErrorKind::UnterminatedString,
                            };

                            return Err(CompileError::new(kind, start));
                        }
                    };

                    self.state = match (self.state, ch) {
                        (State::InComment, '}') => State::Comment,
                        (State::InComment, _) => State::InComment,
                        (State::InString, '\\') => State::InStringEscape,
                        (State::InString, '"') => State::StringConst,
                        _ => State::InString,
                    };

                    text.push(ch);
                    self.bump()?;
                }
                state => {
                    let next = self
                        .current
                        .and_then(|ch| TRANSITIONS.get(&(state, CharClass::of(ch))))
                        .copied();

                    match (next, self.current) {
                        (Some(next), Some(ch)) => {
                            if state == State::Start {
                                start = self.position;
                            }

                            self.state = next;
                            text.push(ch);
                            self.bump()?;
                        }
                        _ if state.is_accepting() => {
                            self.state = State::Start;

                            if let Some(lexeme) = self.accept(&text, state, start)? {
                                return Ok(lexeme);
                            }

                            text.clear();
                        }
                        (_, None) if state == State::Start => {
                            trace!(self.logger, "end of input"; "position" => %self.position);
                            return Ok(Lexeme::new("", Terminal::EndOfInput, self.position));
                        }
                        (_, None) => {
                            return Err(CompileError::new(
                                ErrorKind::UnexpectedEndOfInput,
                                self.position,
                            ));
                        }
                        (_, Some(ch)) => {
                            return Err(CompileError::new(
                                ErrorKind::UnexpectedCharacter(ch),
                                self.position,
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Closes the lexeme `text` which ended in the accepting `state`.
    fn accept(
        &mut self,
        text: &str,
        state: State,
        position: Position,
    ) -> Result<Option<Lexeme>, CompileError> {
        let kind = match reserved_word(text).or_else(|| state.terminal()) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        // immediates are loaded as 32 bit words
        if kind == Terminal::Number && text.parse::<u32>().is_err() {
            return Err(CompileError::new(
                ErrorKind::NumberOutOfRange(text.to_string()),
                position,
            ));
        }

        let lexeme = Lexeme::new(text, kind, position);

        if kind == Terminal::Identifier {
            self.symbols.reference(&lexeme);
        }

        trace!(self.logger, "accept lexeme"; "kind" => ?kind, "text" => text, "position" => %position);

        Ok(Some(lexeme))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Lexeme, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_lexeme();

        match result {
            Ok(Lexeme {
                kind: Terminal::EndOfInput,
                ..
            })
            | Err(_) => self.finished = true,
            _ => (),
        }

        Some(result)
    }
}
