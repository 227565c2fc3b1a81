//! Source code locations.

use std::fmt;

/// Line and column of a character in the source code. Both count from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// The line number.
    pub line: usize,
    /// The column number within the line.
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Position {
        Position { line, column }
    }

    /// Moves the position past the character `ch`.
    pub(crate) fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[test]
fn test_advance() {
    let mut pos = Position::default();

    for ch in "ab\nc".chars() {
        pos.advance(ch);
    }

    assert_eq!(pos, Position::new(2, 2));
}
