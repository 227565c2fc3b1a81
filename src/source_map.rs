//! Mapping between lines of the compiled output and source code positions.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use crate::compiler::{CompileTarget, SegmentType};
use crate::parsing::Position;

/// Captures position information produced during the compilation process
/// and produces a mapping from output line numbers into source code positions.
pub struct SourceMap<T: CompileTarget> {
    /// The actual artifact of the compilation.
    pub compiled: T,

    tmp: HashMap<T::Location, Position>,

    /// Map from output line numbers into source positions.
    pub source_map: BTreeMap<usize, Position>,
}

impl<T: CompileTarget> SourceMap<T> {
    /// Returns the position in the source code which produced the given output line.
    pub fn get_source_position(&self, line: usize) -> Option<&Position> {
        self.source_map.get(&line)
    }
}

impl<T: CompileTarget + Display> SourceMap<T> {
    /// Renders the compiled output with a `@ line:col` comment after every
    /// line that has a known source position.
    pub fn annotated(&self) -> String {
        let rendered = self.compiled.to_string();
        let width = rendered.lines().map(|line| line.len()).max().unwrap_or(0) + 4;

        let mut out = String::new();

        for (i, line) in rendered.lines().enumerate() {
            match self.source_map.get(&(i + 1)) {
                Some(pos) => out.push_str(&format!("{:<width$}@ {}\n", line, pos, width = width)),
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }

        out
    }
}

impl<T: CompileTarget> CompileTarget for SourceMap<T> {
    type Location = T::Location;

    fn create() -> Self {
        SourceMap {
            compiled: T::create(),
            tmp: HashMap::new(),
            source_map: BTreeMap::new(),
        }
    }

    fn push_line(
        &mut self,
        position: Option<Position>,
        line: String,
        segment: SegmentType,
    ) -> Self::Location {
        let loc = self.compiled.push_line(position, line, segment);

        if let Some(position) = position {
            self.tmp.insert(loc.clone(), position);
        }

        loc
    }

    fn to_line_number(&self, loc: &Self::Location) -> usize {
        self.compiled.to_line_number(loc)
    }

    fn finish(mut self) -> Self {
        let mut map = BTreeMap::new();

        for (loc, position) in self.tmp.drain() {
            let line = self.compiled.to_line_number(&loc);
            map.insert(line, position);
        }

        self.source_map = map;
        self.compiled = self.compiled.finish();

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, Assembly};

    #[test]
    fn test_source_positions() {
        let source = "variable x;\nx := 5;\nprint \"hi\"";
        let map: SourceMap<Assembly> = compile(source).unwrap();

        let lines = map.compiled.to_string();
        let lines = lines.lines().collect::<Vec<_>>();

        let store = lines.iter().position(|line| line.contains("str r4")).unwrap() + 1;
        assert_eq!(map.get_source_position(store), Some(&Position::new(2, 6)));

        let pool = lines.iter().position(|line| line.starts_with("str_1:")).unwrap() + 1;
        assert_eq!(map.get_source_position(pool), Some(&Position::new(3, 7)));

        let reserve = lines.iter().position(|line| line.contains("sub sp")).unwrap() + 1;
        assert_eq!(map.get_source_position(reserve), Some(&Position::new(1, 10)));
    }

    #[test]
    fn test_annotated() {
        let map: SourceMap<Assembly> = compile("print 1").unwrap();
        let annotated = map.annotated();

        assert!(annotated.lines().any(|line| line.starts_with("\tbl printf") && line.ends_with("@ 1:7")));
        assert!(annotated.lines().any(|line| line == "\t.data"));
    }
}
