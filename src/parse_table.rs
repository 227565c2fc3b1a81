//! Predictive parse table generated from the grammar.
//!
//! The table maps a nonterminal and a lookahead terminal to the production
//! the parser expands. It is derived from FIRST and FOLLOW sets of
//! [PRODUCTIONS](crate::grammar::PRODUCTIONS) when first used.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use lazy_static::lazy_static;

use crate::grammar::{GrammarSymbol, NonTerminal, Production, PRODUCTIONS, START};
use crate::token::Terminal;

lazy_static! {
    /// The parse table of the HansenLite grammar.
    pub static ref PARSE_TABLE: ParseTable =
        ParseTable::build(PRODUCTIONS, START).expect("the grammar is not LL(1)");
}

/// Two productions claim the same table cell.
#[derive(Debug, Clone)]
pub struct TableConflict {
    pub nonterminal: NonTerminal,
    pub terminal: Terminal,
    pub first: &'static Production,
    pub second: &'static Production,
}

impl fmt::Display for TableConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "conflict at ({}, {}) between `{}` and `{}`",
            self.nonterminal, self.terminal, self.first, self.second
        )
    }
}

impl std::error::Error for TableConflict {}

/// FIRST and FOLLOW sets of every nonterminal, and the set of nullable nonterminals.
#[derive(Debug, Default)]
pub struct GrammarSets {
    pub nullable: HashSet<NonTerminal>,
    pub first: HashMap<NonTerminal, BTreeSet<Terminal>>,
    pub follow: HashMap<NonTerminal, BTreeSet<Terminal>>,
}

impl GrammarSets {
    /// Computes the sets with the usual fixed point iteration.
    pub fn compute(productions: &[Production], start: NonTerminal) -> GrammarSets {
        let mut sets = GrammarSets::default();

        sets.follow
            .entry(start)
            .or_default()
            .insert(Terminal::EndOfInput);

        let mut changed = true;

        while changed {
            changed = false;

            for production in productions {
                let (first, nullable) = sets.first_of(production.derivation());

                if nullable && sets.nullable.insert(production.lhs) {
                    changed = true;
                }

                let entry = sets.first.entry(production.lhs).or_default();
                let before = entry.len();
                entry.extend(first);
                changed |= entry.len() != before;
            }
        }

        changed = true;

        while changed {
            changed = false;

            for production in productions {
                let symbols = production.derivation().collect::<Vec<_>>();

                for (i, symbol) in symbols.iter().enumerate() {
                    let nonterminal = match symbol {
                        GrammarSymbol::NonTerminal(nonterminal) => *nonterminal,
                        _ => continue,
                    };

                    let (mut follow, rest_nullable) = sets.first_of(symbols[i + 1..].iter().copied());

                    if rest_nullable {
                        follow.extend(sets.follow_of(production.lhs));
                    }

                    let entry = sets.follow.entry(nonterminal).or_default();
                    let before = entry.len();
                    entry.extend(follow);
                    changed |= entry.len() != before;
                }
            }
        }

        sets
    }

    /// FIRST set of a sequence of grammar symbols and whether the sequence is nullable.
    pub fn first_of<I>(&self, symbols: I) -> (BTreeSet<Terminal>, bool)
    where
        I: IntoIterator<Item = GrammarSymbol>,
    {
        let mut first = BTreeSet::new();

        for symbol in symbols {
            match symbol {
                GrammarSymbol::Terminal(terminal) => {
                    first.insert(terminal);
                    return (first, false);
                }
                GrammarSymbol::NonTerminal(nonterminal) => {
                    if let Some(set) = self.first.get(&nonterminal) {
                        first.extend(set.iter().copied());
                    }

                    if !self.nullable.contains(&nonterminal) {
                        return (first, false);
                    }
                }
                GrammarSymbol::Action(_) => (),
            }
        }

        (first, true)
    }

    pub fn follow_of(&self, nonterminal: NonTerminal) -> BTreeSet<Terminal> {
        self.follow.get(&nonterminal).cloned().unwrap_or_default()
    }
}

/// Mapping from `(nonterminal, lookahead)` into productions.
/// A missing entry means the lookahead is a syntax error.
#[derive(Debug)]
pub struct ParseTable {
    entries: HashMap<(NonTerminal, Terminal), &'static Production>,
}

impl ParseTable {
    /// Builds the table from `productions`.
    ///
    /// Every terminal in FIRST of an alternative selects that alternative.
    /// Every terminal in FOLLOW of the left hand side selects a nullable
    /// alternative, unless it is already taken by a FIRST entry. The latter
    /// rule attaches a dangling `else` to the nearest `if`.
    pub fn build(
        productions: &'static [Production],
        start: NonTerminal,
    ) -> Result<ParseTable, TableConflict> {
        let sets = GrammarSets::compute(productions, start);
        let mut entries = HashMap::new();

        for production in productions {
            let (first, _) = sets.first_of(production.derivation());

            for terminal in first {
                if let Some(previous) = entries.insert((production.lhs, terminal), production) {
                    return Err(TableConflict {
                        nonterminal: production.lhs,
                        terminal,
                        first: previous,
                        second: production,
                    });
                }
            }
        }

        let mut follow_entries = HashMap::new();

        for production in productions {
            let (_, nullable) = sets.first_of(production.derivation());

            if !nullable {
                continue;
            }

            for terminal in sets.follow_of(production.lhs) {
                if entries.contains_key(&(production.lhs, terminal)) {
                    continue;
                }

                if let Some(previous) = follow_entries.insert((production.lhs, terminal), production) {
                    return Err(TableConflict {
                        nonterminal: production.lhs,
                        terminal,
                        first: previous,
                        second: production,
                    });
                }
            }
        }

        entries.extend(follow_entries);

        Ok(ParseTable { entries })
    }

    pub fn get(&self, nonterminal: NonTerminal, lookahead: Terminal) -> Option<&'static Production> {
        self.entries.get(&(nonterminal, lookahead)).copied()
    }

    /// The lookahead terminals accepted when expanding `nonterminal`, in a stable order.
    pub fn expected(&self, nonterminal: NonTerminal) -> Vec<Terminal> {
        Terminal::ALL
            .iter()
            .copied()
            .filter(|terminal| self.entries.contains_key(&(nonterminal, *terminal)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
