//! Predictive parsing engine driving the translation.
//!
//! The engine keeps a control stack of [GrammarSymbol]s. Terminals on top of
//! the stack are matched against the lookahead, nonterminals are replaced by
//! the production selected from the parse table and actions generate code.
//! There is no syntax tree: code is emitted while the input is parsed.

use slog::{debug, o, trace, Discard, Logger};

use crate::compiler::CompileTarget;
use crate::emit::Emitter;
use crate::error::{CompileError, ErrorKind};
use crate::grammar::{Action, GrammarSymbol, NonTerminal, Production, START};
use crate::lexer::Lexer;
use crate::parse_table::PARSE_TABLE;
use crate::parsing::Position;
use crate::regalloc::{Register, RegisterAllocator};
use crate::symbol_table::{Symbol, SymbolId};
use crate::token::{Lexeme, Operator, Terminal};

/// A value waiting on the operand stack, with the position it appeared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub symbol: SymbolId,
    pub position: Position,
}

/// The parsing session. Owns every piece of mutable compilation state.
pub struct Parser<'a, T: CompileTarget> {
    lexer: Lexer<'a>,
    lookahead: Lexeme,
    stack: Vec<GrammarSymbol>,
    operands: Vec<Operand>,
    operators: Vec<Operator>,
    registers: RegisterAllocator,
    emitter: Emitter<T>,
    logger: Logger,
}

impl GrammarSymbol {
    /// Performs the parser move for this symbol, which has been popped from the control stack.
    pub(crate) fn step<T: CompileTarget>(self, parser: &mut Parser<T>) -> Result<(), CompileError> {
        match self {
            GrammarSymbol::Terminal(terminal) => parser.match_terminal(terminal),
            GrammarSymbol::NonTerminal(nonterminal) => parser.expand(nonterminal),
            GrammarSymbol::Action(action) => action.execute(parser),
        }
    }
}

impl<'a, T: CompileTarget> Parser<'a, T> {
    /// Creates a parser reading tokens from `lexer` and emitting into `target`.
    /// Reads the first token.
    pub fn new<L>(mut lexer: Lexer<'a>, target: T, logger: L) -> Result<Self, CompileError>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "parsing"));

        let lookahead = lexer.next_lexeme()?;

        Ok(Parser {
            lexer,
            lookahead,
            stack: Vec::new(),
            operands: Vec::new(),
            operators: Vec::new(),
            registers: RegisterAllocator::new(),
            emitter: Emitter::new(target),
            logger,
        })
    }

    /// Parses the whole input and returns the compiled target.
    pub fn parse(mut self) -> Result<T, CompileError> {
        self.stack = vec![
            GrammarSymbol::Action(Action::Epilogue),
            GrammarSymbol::Terminal(Terminal::EndOfInput),
            GrammarSymbol::NonTerminal(START),
            GrammarSymbol::Action(Action::Prologue),
        ];

        while let Some(symbol) = self.stack.pop() {
            symbol.step(&mut self)?;
        }

        debug!(self.logger, "compilation finished";
            "variables" => self.lexer.symbols().declared_count(),
            "symbols" => self.lexer.symbols().len(),
            "labels" => self.emitter.label_count(),
            "strings" => self.emitter.strings().len());

        Ok(self.emitter.finish())
    }

    fn match_terminal(&mut self, expected: Terminal) -> Result<(), CompileError> {
        if self.lookahead.kind != expected {
            return Err(CompileError::new(
                ErrorKind::UnexpectedToken {
                    expected,
                    found: self.lookahead.kind,
                    text: self.lookahead.text.clone(),
                },
                self.lookahead.position,
            ));
        }

        let position = self.lookahead.position;
        self.emitter.set_position(position);

        trace!(self.logger, "match"; "terminal" => %expected, "text" => &self.lookahead.text);

        match expected {
            Terminal::Identifier => {
                let symbol = self.lexer.symbols_mut().reference(&self.lookahead);
                self.operands.push(Operand { symbol, position });
            }
            Terminal::Number => {
                let symbol = self.lexer.symbols_mut().literal(self.lookahead.clone());
                self.operands.push(Operand { symbol, position });
            }
            Terminal::StringConst => {
                self.emitter.intern_string(&self.lookahead.text);
                let symbol = self.lexer.symbols_mut().literal(self.lookahead.clone());
                self.operands.push(Operand { symbol, position });
            }
            Terminal::AdditiveOp
            | Terminal::MultiplicativeOp
            | Terminal::RelationalOp
            | Terminal::AssignmentOp => {
                let op = Operator::from_text(&self.lookahead.text)
                    .ok_or_else(|| CompileError::internal("operator token with unknown text"))?;
                self.operators.push(op);
            }
            _ => (),
        }

        self.advance_lookahead()
    }

    fn expand(&mut self, nonterminal: NonTerminal) -> Result<(), CompileError> {
        match PARSE_TABLE.get(nonterminal, self.lookahead.kind) {
            Some(production) => {
                self.push_production(production);
                Ok(())
            }
            None => Err(CompileError::new(
                ErrorKind::NoProduction {
                    nonterminal,
                    found: self.lookahead.kind,
                    text: self.lookahead.text.clone(),
                    expected: PARSE_TABLE.expected(nonterminal),
                },
                self.lookahead.position,
            )),
        }
    }

    /// Pushes the right hand side of `production` so that its first symbol is on top.
    pub(crate) fn push_production(&mut self, production: &Production) {
        trace!(self.logger, "expand"; "production" => %production);
        self.stack.extend(production.rhs.iter().rev().copied());
    }

    /// Reads the next token. The end of input token is never replaced.
    pub(crate) fn advance_lookahead(&mut self) -> Result<(), CompileError> {
        if self.lookahead.kind != Terminal::EndOfInput {
            self.lookahead = self.lexer.next_lexeme()?;
        }

        Ok(())
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Position of the most recently consumed token.
    pub(crate) fn position(&self) -> Position {
        self.emitter.position().unwrap_or(self.lookahead.position)
    }

    pub(crate) fn push_operand(&mut self, operand: Operand) {
        self.operands.push(operand);
    }

    pub(crate) fn pop_operand(&mut self) -> Result<Operand, CompileError> {
        self.operands
            .pop()
            .ok_or_else(|| CompileError::internal("operand stack is empty"))
    }

    pub(crate) fn pop_operator(&mut self) -> Result<Operator, CompileError> {
        self.operators
            .pop()
            .ok_or_else(|| CompileError::internal("operator stack is empty"))
    }

    /// Creates an operand for an intermediate value.
    pub(crate) fn temporary(&mut self) -> Operand {
        let symbol = self.lexer.symbols_mut().anonymous();

        Operand {
            symbol,
            position: self.position(),
        }
    }

    pub(crate) fn symbol(&self, id: SymbolId) -> &Symbol {
        self.lexer.symbols().get_symbol(id)
    }

    /// Assigns a stack slot to the variable.
    pub(crate) fn declare(&mut self, operand: &Operand) -> Result<usize, CompileError> {
        let symbols = self.lexer.symbols_mut();

        symbols
            .declare(operand.symbol, operand.position)
            .map_err(|previous| {
                let name = symbols
                    .get_symbol(operand.symbol)
                    .name()
                    .unwrap_or_default()
                    .to_string();

                CompileError::new(ErrorKind::Redeclaration { name, previous }, operand.position)
            })
    }

    pub(crate) fn undefined(&self, operand: &Operand) -> CompileError {
        self.lexer.symbols().undefined(operand.symbol, operand.position)
    }

    pub(crate) fn acquire_register(&mut self, operand: &Operand) -> Result<Register, CompileError> {
        self.registers.acquire(
            operand.symbol,
            operand.position,
            self.lexer.symbols_mut(),
            &mut self.emitter,
            &self.logger,
        )
    }

    /// Frees the register of a consumed value. Literals and temporaries are discarded.
    pub(crate) fn release_register(&mut self, id: SymbolId) {
        trace!(self.logger, "release register"; "symbol" => ?id);

        let symbols = self.lexer.symbols_mut();
        self.registers.release(id, symbols);
        symbols.discard(id);
    }

    pub(crate) fn release_all_registers(&mut self) {
        trace!(self.logger, "release all registers"; "occupied" => self.registers.occupied());
        self.registers.release_all(self.lexer.symbols_mut());
    }

    pub(crate) fn emit<D: std::fmt::Display>(&mut self, instruction: D) {
        self.emitter.instruction(instruction);
    }

    pub(crate) fn emit_label<D: std::fmt::Display>(&mut self, label: D) {
        self.emitter.label(label);
    }

    pub(crate) fn emit_data<D: std::fmt::Display>(&mut self, line: D) {
        self.emitter.data(line);
    }

    pub(crate) fn push_label(&mut self) -> usize {
        self.emitter.push_label()
    }

    pub(crate) fn pop_label(&mut self) -> Result<usize, CompileError> {
        self.emitter
            .pop_label()
            .ok_or_else(|| CompileError::internal("label stack is empty"))
    }

    pub(crate) fn current_label(&self) -> Result<usize, CompileError> {
        self.emitter
            .current_label()
            .ok_or_else(|| CompileError::internal("label stack is empty"))
    }

    /// Whether the operand, operator and label stacks are all empty.
    pub(crate) fn is_drained(&self) -> bool {
        self.operands.is_empty() && self.operators.is_empty() && self.emitter.label_depth() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Assembly;

    fn run(source: &str) -> Parser<Assembly> {
        let mut parser = Parser::new(Lexer::new(source, None), Assembly::create(), None).unwrap();
        parser.stack = vec![
            GrammarSymbol::Terminal(Terminal::EndOfInput),
            GrammarSymbol::NonTerminal(START),
        ];

        while let Some(symbol) = parser.stack.pop() {
            symbol.step(&mut parser).unwrap();
        }

        parser
    }

    #[test]
    fn test_consumed_values_are_discarded() {
        let short = run("variable x; x := (1 + 2) * -3");

        let mut source = String::from("variable x; variable y");
        for i in 0..50 {
            source.push_str(&format!("; x := (x + {}) * -y; print x", i));
        }

        let long = run(&source);

        assert!(long.is_drained());
        assert_eq!(short.lexer.symbols().len(), 1);
        assert_eq!(long.lexer.symbols().len(), 2);
        assert_eq!(long.registers.occupied(), 0);
    }
}
