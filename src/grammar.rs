//! Grammar of the HansenLite language.
//!
//! Productions mix terminals, nonterminals and semantic actions. Actions are
//! zero-width: they never consume input and only trigger code generation when
//! the parser reaches them.

use std::fmt;

use itertools::Itertools;

use crate::token::Terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerminal {
    Program,
    Statement,
    ElseClause,
    StatementList,
    SeparatedList,
    PrintExpression,
    BooleanExpression,
    Expression,
    Addition,
    Term,
    Multiplication,
    Factor,
    SignedTerm,
}

impl NonTerminal {
    pub const ALL: [NonTerminal; 13] = [
        NonTerminal::Program,
        NonTerminal::Statement,
        NonTerminal::ElseClause,
        NonTerminal::StatementList,
        NonTerminal::SeparatedList,
        NonTerminal::PrintExpression,
        NonTerminal::BooleanExpression,
        NonTerminal::Expression,
        NonTerminal::Addition,
        NonTerminal::Term,
        NonTerminal::Multiplication,
        NonTerminal::Factor,
        NonTerminal::SignedTerm,
    ];
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NonTerminal::Program => "program",
            NonTerminal::Statement => "statement",
            NonTerminal::ElseClause => "else clause",
            NonTerminal::StatementList => "statement list",
            NonTerminal::SeparatedList => "separated list",
            NonTerminal::PrintExpression => "print expression",
            NonTerminal::BooleanExpression => "boolean expression",
            NonTerminal::Expression => "expression",
            NonTerminal::Addition => "addition",
            NonTerminal::Term => "term",
            NonTerminal::Multiplication => "multiplication",
            NonTerminal::Factor => "factor",
            NonTerminal::SignedTerm => "signed term",
        };

        write!(f, "{}", name)
    }
}

/// Code generation hooks placed into productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Prologue,
    Epilogue,
    Declare,
    Store,
    Compute,
    Sign,
    PrintIfmt,
    PrintSfmt,
    PrintPrintf,
    GenLabels,
    PopLabels,
    BeginLabel,
    EndLabel,
    GotoBegin,
    GotoEnd,
    ClearRegs,
    PushOp,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Action::Prologue => "PROLOGUE",
            Action::Epilogue => "EPILOGUE",
            Action::Declare => "DECLARE",
            Action::Store => "STORE",
            Action::Compute => "COMPUTE",
            Action::Sign => "SIGN",
            Action::PrintIfmt => "PRINT_IFMT",
            Action::PrintSfmt => "PRINT_SFMT",
            Action::PrintPrintf => "PRINT_PRINTF",
            Action::GenLabels => "GEN_LABELS",
            Action::PopLabels => "POP_LABELS",
            Action::BeginLabel => "BEGIN_LABEL",
            Action::EndLabel => "END_LABEL",
            Action::GotoBegin => "GOTO_BEGIN",
            Action::GotoEnd => "GOTO_END",
            Action::ClearRegs => "CLEAR_REGS",
            Action::PushOp => "PUSH_OP",
        };

        write!(f, "{}", name)
    }
}

/// An element of a production and of the parser's control stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarSymbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
    Action(Action),
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(t) => write!(f, "{}", t),
            GrammarSymbol::NonTerminal(n) => write!(f, "<{}>", n),
            GrammarSymbol::Action(a) => write!(f, "{}", a),
        }
    }
}

/// A grammar rule `lhs -> rhs`. An empty `rhs` is an epsilon production.
#[derive(Debug, PartialEq, Eq)]
pub struct Production {
    pub lhs: NonTerminal,
    pub rhs: &'static [GrammarSymbol],
}

impl Production {
    /// The terminals and nonterminals of the right hand side, skipping actions.
    pub fn derivation(&self) -> impl Iterator<Item = GrammarSymbol> + '_ {
        self.rhs
            .iter()
            .copied()
            .filter(|symbol| match symbol {
                GrammarSymbol::Action(_) => false,
                _ => true,
            })
    }

    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.rhs.is_empty() {
            write!(f, "<{}> -> ε", self.lhs)
        } else {
            write!(f, "<{}> -> {}", self.lhs, self.rhs.iter().join(" "))
        }
    }
}

const fn t(terminal: Terminal) -> GrammarSymbol {
    GrammarSymbol::Terminal(terminal)
}

const fn n(nonterminal: NonTerminal) -> GrammarSymbol {
    GrammarSymbol::NonTerminal(nonterminal)
}

const fn a(action: Action) -> GrammarSymbol {
    GrammarSymbol::Action(action)
}

use self::Action as A;
use self::NonTerminal as N;
use crate::token::Terminal as T;

/// The nonterminal derivation starts from.
pub const START: NonTerminal = NonTerminal::Program;

/// Every production of the grammar.
pub static PRODUCTIONS: &[Production] = &[
    Production {
        lhs: N::Program,
        rhs: &[n(N::Statement), n(N::SeparatedList)],
    },
    Production {
        lhs: N::Statement,
        rhs: &[
            t(T::Identifier),
            t(T::AssignmentOp),
            n(N::Expression),
            a(A::Store),
        ],
    },
    Production {
        lhs: N::Statement,
        rhs: &[
            t(T::If),
            a(A::GenLabels),
            n(N::BooleanExpression),
            t(T::Then),
            n(N::Statement),
            a(A::GotoBegin),
            a(A::EndLabel),
            n(N::ElseClause),
            a(A::BeginLabel),
            a(A::PopLabels),
            a(A::ClearRegs),
        ],
    },
    Production {
        lhs: N::Statement,
        rhs: &[
            t(T::While),
            a(A::GenLabels),
            a(A::BeginLabel),
            a(A::ClearRegs),
            n(N::BooleanExpression),
            t(T::Do),
            n(N::Statement),
            a(A::GotoBegin),
            a(A::EndLabel),
            a(A::PopLabels),
            a(A::ClearRegs),
        ],
    },
    Production {
        lhs: N::Statement,
        rhs: &[t(T::Print), n(N::PrintExpression), a(A::PrintPrintf)],
    },
    Production {
        lhs: N::Statement,
        rhs: &[t(T::Begin), n(N::StatementList), t(T::End)],
    },
    Production {
        lhs: N::Statement,
        rhs: &[t(T::Variable), t(T::Identifier), a(A::Declare)],
    },
    Production {
        lhs: N::Statement,
        rhs: &[],
    },
    Production {
        lhs: N::ElseClause,
        rhs: &[t(T::Else), n(N::Statement)],
    },
    Production {
        lhs: N::ElseClause,
        rhs: &[],
    },
    Production {
        lhs: N::StatementList,
        rhs: &[n(N::Statement), n(N::SeparatedList)],
    },
    Production {
        lhs: N::SeparatedList,
        rhs: &[
            t(T::StatementSep),
            n(N::Statement),
            n(N::SeparatedList),
        ],
    },
    Production {
        lhs: N::SeparatedList,
        rhs: &[],
    },
    Production {
        lhs: N::PrintExpression,
        rhs: &[n(N::Expression), a(A::PrintIfmt)],
    },
    Production {
        lhs: N::PrintExpression,
        rhs: &[t(T::StringConst), a(A::PrintSfmt)],
    },
    Production {
        lhs: N::BooleanExpression,
        rhs: &[
            n(N::Expression),
            t(T::RelationalOp),
            a(A::PushOp),
            n(N::Expression),
            a(A::Compute),
        ],
    },
    Production {
        lhs: N::Expression,
        rhs: &[n(N::Term), n(N::Addition)],
    },
    Production {
        lhs: N::Addition,
        rhs: &[
            t(T::AdditiveOp),
            a(A::PushOp),
            n(N::Term),
            a(A::Compute),
            n(N::Addition),
        ],
    },
    Production {
        lhs: N::Addition,
        rhs: &[],
    },
    Production {
        lhs: N::Term,
        rhs: &[n(N::Factor), n(N::Multiplication)],
    },
    Production {
        lhs: N::Multiplication,
        rhs: &[
            t(T::MultiplicativeOp),
            a(A::PushOp),
            n(N::Factor),
            a(A::Compute),
            n(N::Multiplication),
        ],
    },
    Production {
        lhs: N::Multiplication,
        rhs: &[],
    },
    Production {
        lhs: N::Factor,
        rhs: &[t(T::Identifier)],
    },
    Production {
        lhs: N::Factor,
        rhs: &[t(T::Number)],
    },
    Production {
        lhs: N::Factor,
        rhs: &[t(T::LeftParen), n(N::Expression), t(T::RightParen)],
    },
    Production {
        lhs: N::Factor,
        rhs: &[n(N::SignedTerm)],
    },
    Production {
        lhs: N::SignedTerm,
        rhs: &[
            t(T::AdditiveOp),
            a(A::PushOp),
            n(N::Term),
            a(A::Sign),
        ],
    },
];

#[test]
fn test_every_nonterminal_has_productions() {
    for nonterminal in NonTerminal::ALL.iter() {
        assert!(
            PRODUCTIONS.iter().any(|p| p.lhs == *nonterminal),
            "{} has no productions",
            nonterminal
        );
    }
}

#[test]
fn test_display_production() {
    assert_eq!(
        PRODUCTIONS[16].to_string(),
        "<expression> -> <term> <addition>"
    );
    assert_eq!(PRODUCTIONS[7].to_string(), "<statement> -> ε");
}

#[test]
fn test_epsilon_productions() {
    let epsilon = PRODUCTIONS
        .iter()
        .filter(|p| p.is_epsilon())
        .map(|p| p.lhs)
        .collect::<Vec<_>>();

    assert_eq!(
        epsilon,
        vec![
            NonTerminal::Statement,
            NonTerminal::ElseClause,
            NonTerminal::SeparatedList,
            NonTerminal::Addition,
            NonTerminal::Multiplication,
        ]
    );
}
