//! Named variables, literals and intermediate values of the program being compiled.

use std::collections::HashMap;

use edit_distance::edit_distance;

use crate::error::{CompileError, ErrorKind};
use crate::parsing::Position;
use crate::regalloc::Register;
use crate::token::{Lexeme, Terminal};

/// Index of a [Symbol] in its [SymbolTable].
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SymbolId(usize);

/// A named variable, a literal or an anonymous temporary.
#[derive(Debug, Clone, Default)]
pub struct Symbol {
    lexeme: Option<Lexeme>,
    slot: Option<usize>,
    register: Option<Register>,
    declared_at: Option<Position>,
}

impl Symbol {
    /// The lexeme this symbol was created from. `None` for temporaries.
    pub fn lexeme(&self) -> Option<&Lexeme> {
        self.lexeme.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.lexeme.as_ref().map(|lexeme| lexeme.text.as_str())
    }

    /// Index of the stack slot of a declared variable. Slots are numbered from 1.
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// The register currently holding the value of this symbol.
    pub fn register(&self) -> Option<Register> {
        self.register
    }
}

/// Arena of every [Symbol] created during one compile.
///
/// Identifiers are registered by name, so every use of the same name resolves
/// to the same symbol. Literals and temporaries are never looked up by name,
/// and their entries are recycled once the value has been consumed.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    names: HashMap<String, SymbolId>,
    free: Vec<SymbolId>,
    declared: usize,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        if let Some(id) = self.free.pop() {
            self.symbols[id.0] = symbol;
            return id;
        }

        self.symbols.push(symbol);
        SymbolId(self.symbols.len() - 1)
    }

    /// Returns the symbol of the identifier, creating it on first sight.
    pub fn reference(&mut self, lexeme: &Lexeme) -> SymbolId {
        if let Some(id) = self.names.get(&lexeme.text) {
            return *id;
        }

        let id = self.push(Symbol {
            lexeme: Some(lexeme.clone()),
            ..Symbol::default()
        });

        self.names.insert(lexeme.text.clone(), id);

        id
    }

    /// Creates a symbol for a number or a string constant.
    pub fn literal(&mut self, lexeme: Lexeme) -> SymbolId {
        self.push(Symbol {
            lexeme: Some(lexeme),
            ..Symbol::default()
        })
    }

    /// Creates a symbol for an intermediate value.
    pub fn anonymous(&mut self) -> SymbolId {
        self.push(Symbol::default())
    }

    /// Frees the entry of a consumed literal or temporary so a later one can reuse it.
    /// Identifiers live for the whole compile and are left untouched.
    pub(crate) fn discard(&mut self, id: SymbolId) {
        let symbol = &mut self.symbols[id.0];

        match symbol.lexeme {
            Some(ref lexeme) if lexeme.kind == Terminal::Identifier => (),
            _ => {
                *symbol = Symbol::default();
                self.free.push(id);
            }
        }
    }

    /// Number of symbols currently alive.
    pub fn len(&self) -> usize {
        self.symbols.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assigns the next stack slot to the symbol.
    ///
    /// Returns the previous declaration site if the symbol was already declared.
    pub fn declare(&mut self, id: SymbolId, position: Position) -> Result<usize, Position> {
        let symbol = &mut self.symbols[id.0];

        if let Some(previous) = symbol.declared_at {
            return Err(previous);
        }

        self.declared += 1;
        symbol.slot = Some(self.declared);
        symbol.declared_at = Some(position);

        Ok(self.declared)
    }

    /// Number of declared variables.
    pub fn declared_count(&self) -> usize {
        self.declared
    }

    pub fn get_symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    pub fn get_symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.lookup(name).map(|id| self.get_symbol(id))
    }

    pub(crate) fn set_register(&mut self, id: SymbolId, register: Option<Register>) {
        self.symbols[id.0].register = register;
    }

    /// Finds the declared variable whose name is closest to `name`.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        self.symbols
            .iter()
            .filter(|symbol| symbol.slot.is_some())
            .filter_map(Symbol::name)
            .map(|candidate| (edit_distance(name, candidate), candidate))
            .filter(|(distance, _)| *distance <= 2 && *distance < name.chars().count())
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate)
    }

    /// Creates the error reported when the undeclared symbol `id` is used at `position`.
    pub(crate) fn undefined(&self, id: SymbolId, position: Position) -> CompileError {
        let name = self.get_symbol(id).name().unwrap_or("<temporary>").to_string();
        let suggestion = self.suggest(&name).map(str::to_string);

        CompileError::new(ErrorKind::UndefinedVariable { name, suggestion }, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str, column: usize) -> Lexeme {
        Lexeme::new(text, Terminal::Identifier, Position::new(1, column))
    }

    #[test]
    fn test_reference_is_idempotent() {
        let mut table = SymbolTable::new();

        let a = table.reference(&ident("a", 1));
        let b = table.reference(&ident("b", 3));
        let again = table.reference(&ident("a", 5));

        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(table.get_symbol(a).lexeme().unwrap().position.column, 1);
        assert_eq!(table.lookup("b"), Some(b));
    }

    #[test]
    fn test_literals_are_distinct() {
        let mut table = SymbolTable::new();

        let one = table.literal(Lexeme::new("1", Terminal::Number, Position::new(1, 1)));
        let other = table.literal(Lexeme::new("1", Terminal::Number, Position::new(1, 5)));
        let tmp = table.anonymous();

        assert_ne!(one, other);
        assert!(table.get_symbol(tmp).lexeme().is_none());
        assert!(table.lookup("1").is_none());
    }

    #[test]
    fn test_discard_recycles_values() {
        let mut table = SymbolTable::new();

        let x = table.reference(&ident("x", 1));
        let one = table.literal(Lexeme::new("1", Terminal::Number, Position::new(1, 6)));
        let tmp = table.anonymous();
        assert_eq!(table.len(), 3);

        table.discard(one);
        table.discard(tmp);
        table.discard(x);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("x"), Some(x));

        for _ in 0..100 {
            let a = table.anonymous();
            let b = table.literal(Lexeme::new("2", Terminal::Number, Position::new(2, 1)));
            assert_ne!(a, b);
            assert_eq!(table.get_symbol(a).lexeme(), None);

            table.discard(a);
            table.discard(b);
        }

        assert_eq!(table.len(), 1);
        assert_eq!(table.symbols.len(), 3);
    }

    #[test]
    fn test_declare() {
        let mut table = SymbolTable::new();

        let x = table.reference(&ident("x", 10));
        let y = table.reference(&ident("y", 20));

        assert_eq!(table.declare(x, Position::new(1, 10)), Ok(1));
        assert_eq!(table.declare(y, Position::new(2, 10)), Ok(2));
        assert_eq!(
            table.declare(x, Position::new(3, 10)),
            Err(Position::new(1, 10))
        );
        assert_eq!(table.get_symbol(y).slot(), Some(2));
        assert_eq!(table.declared_count(), 2);
    }

    #[test]
    fn test_suggest() {
        let mut table = SymbolTable::new();

        for (i, name) in ["p0", "p1", "result"].iter().enumerate() {
            let id = table.reference(&ident(name, i + 1));
            table.declare(id, Position::new(i + 1, 1)).unwrap();
        }

        table.reference(&ident("po", 1));

        assert_eq!(table.suggest("po"), Some("p0"));
        assert_eq!(table.suggest("reslt"), Some("result"));
        assert_eq!(table.suggest("zzzzzz"), None);
    }
}
