//! Terminal symbols of the HansenLite language and the lexemes carrying them.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::parsing::Position;

/// The terminal alphabet of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Terminal {
    Variable,
    Print,
    If,
    Then,
    Else,
    While,
    Do,
    Begin,
    End,
    Identifier,
    Number,
    StringConst,
    AssignmentOp,
    AdditiveOp,
    MultiplicativeOp,
    RelationalOp,
    StatementSep,
    LeftParen,
    RightParen,
    EndOfInput,
}

impl Terminal {
    /// Every terminal, in declaration order.
    pub const ALL: [Terminal; 20] = [
        Terminal::Variable,
        Terminal::Print,
        Terminal::If,
        Terminal::Then,
        Terminal::Else,
        Terminal::While,
        Terminal::Do,
        Terminal::Begin,
        Terminal::End,
        Terminal::Identifier,
        Terminal::Number,
        Terminal::StringConst,
        Terminal::AssignmentOp,
        Terminal::AdditiveOp,
        Terminal::MultiplicativeOp,
        Terminal::RelationalOp,
        Terminal::StatementSep,
        Terminal::LeftParen,
        Terminal::RightParen,
        Terminal::EndOfInput,
    ];
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Terminal::Variable => "'variable'",
            Terminal::Print => "'print'",
            Terminal::If => "'if'",
            Terminal::Then => "'then'",
            Terminal::Else => "'else'",
            Terminal::While => "'while'",
            Terminal::Do => "'do'",
            Terminal::Begin => "'begin'",
            Terminal::End => "'end'",
            Terminal::Identifier => "identifier",
            Terminal::Number => "number",
            Terminal::StringConst => "string constant",
            Terminal::AssignmentOp => "':='",
            Terminal::AdditiveOp => "additive operator",
            Terminal::MultiplicativeOp => "multiplicative operator",
            Terminal::RelationalOp => "relational operator",
            Terminal::StatementSep => "';'",
            Terminal::LeftParen => "'('",
            Terminal::RightParen => "')'",
            Terminal::EndOfInput => "end of input",
        };

        write!(f, "{}", name)
    }
}

lazy_static! {
    static ref RESERVED_WORDS: HashMap<&'static str, Terminal> = {
        let mut words = HashMap::new();

        words.insert("variable", Terminal::Variable);
        words.insert("print", Terminal::Print);
        words.insert("if", Terminal::If);
        words.insert("then", Terminal::Then);
        words.insert("else", Terminal::Else);
        words.insert("while", Terminal::While);
        words.insert("do", Terminal::Do);
        words.insert("begin", Terminal::Begin);
        words.insert("end", Terminal::End);

        for op in &["+", "-"] {
            words.insert(*op, Terminal::AdditiveOp);
        }

        for op in &["*", "/"] {
            words.insert(*op, Terminal::MultiplicativeOp);
        }

        for op in &["<", "<=", "<>", "=", ">", ">="] {
            words.insert(*op, Terminal::RelationalOp);
        }

        words.insert(":=", Terminal::AssignmentOp);
        words.insert(";", Terminal::StatementSep);
        words.insert("(", Terminal::LeftParen);
        words.insert(")", Terminal::RightParen);

        words
    };
}

/// Looks up `text` in the reserved word table. Lookup is exact and case sensitive.
pub fn reserved_word(text: &str) -> Option<Terminal> {
    RESERVED_WORDS.get(text).copied()
}

/// A classified and positioned span of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub text: String,
    pub kind: Terminal,
    /// Position of the first character of the lexeme.
    pub position: Position,
}

impl Lexeme {
    pub fn new<S: Into<String>>(text: S, kind: Terminal, position: Position) -> Lexeme {
        Lexeme {
            text: text.into(),
            kind,
            position,
        }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            Terminal::EndOfInput => write!(f, "end of input"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Operators of the four operator classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Assign,
}

impl Operator {
    pub fn from_text(text: &str) -> Option<Operator> {
        let op = match text {
            "+" => Operator::Add,
            "-" => Operator::Subtract,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            "=" => Operator::Equal,
            "<>" => Operator::NotEqual,
            "<" => Operator::Less,
            "<=" => Operator::LessEqual,
            ">" => Operator::Greater,
            ">=" => Operator::GreaterEqual,
            ":=" => Operator::Assign,
            _ => return None,
        };

        Some(op)
    }

    pub fn is_relational(self) -> bool {
        match self {
            Operator::Equal
            | Operator::NotEqual
            | Operator::Less
            | Operator::LessEqual
            | Operator::Greater
            | Operator::GreaterEqual => true,
            _ => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Assign => ":=",
        };

        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words() {
        assert_eq!(reserved_word("while"), Some(Terminal::While));
        assert_eq!(reserved_word("While"), None);
        assert_eq!(reserved_word("<>"), Some(Terminal::RelationalOp));
        assert_eq!(reserved_word(":="), Some(Terminal::AssignmentOp));
        assert_eq!(reserved_word("x"), None);
    }

    #[test]
    fn test_operator_text() {
        for text in &["+", "-", "*", "/", "=", "<>", "<", "<=", ">", ">=", ":="] {
            let op = Operator::from_text(text).unwrap();
            assert_eq!(op.to_string(), *text);
        }

        assert!(Operator::from_text("<=").unwrap().is_relational());
        assert!(!Operator::from_text("*").unwrap().is_relational());
    }
}
