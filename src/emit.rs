//! Output of assembly lines, control flow labels and string constants.

use std::collections::HashMap;
use std::fmt::Display;

use crate::compiler::{CompileTarget, SegmentType};
use crate::parsing::Position;

/// Label of the `printf` format for integers.
pub const INTEGER_FORMAT: &str = "ifmt";
/// Label of the `printf` format for strings.
pub const STRING_FORMAT: &str = "sfmt";

pub const BEGIN_LABEL_PREFIX: &str = "begin_";
pub const END_LABEL_PREFIX: &str = "end_";
pub const STRING_LABEL_PREFIX: &str = "str_";

/// Distance between consecutive variable slots in the stack frame.
pub const LOCAL_VAR_OFFSET: i64 = -4;

/// Frame pointer relative offset of the variable in `slot`.
pub fn frame_offset(slot: usize) -> i64 {
    LOCAL_VAR_OFFSET * slot as i64
}

/// Pool of string constants. Every distinct literal gets exactly one label.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    labels: HashMap<String, usize>,
    literals: Vec<String>,
}

impl StringPool {
    /// Returns the label of `literal` and whether the literal was seen for the first time.
    pub fn intern(&mut self, literal: &str) -> (String, bool) {
        if let Some(index) = self.labels.get(literal) {
            return (string_label(*index), false);
        }

        self.literals.push(literal.to_string());
        let index = self.literals.len();
        self.labels.insert(literal.to_string(), index);

        (string_label(index), true)
    }

    /// The literals with their labels, in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> {
        self.literals
            .iter()
            .enumerate()
            .map(|(i, literal)| (string_label(i + 1), literal.as_str()))
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

fn string_label(index: usize) -> String {
    format!("{}{}", STRING_LABEL_PREFIX, index)
}

/// Append-only sink of assembly lines.
///
/// Lines are attributed to the position of the most recently consumed token.
pub struct Emitter<T: CompileTarget> {
    target: T,
    position: Option<Position>,
    labels: Vec<usize>,
    label_count: usize,
    strings: StringPool,
}

impl<T: CompileTarget> Emitter<T> {
    pub fn new(target: T) -> Emitter<T> {
        Emitter {
            target,
            position: None,
            labels: Vec::new(),
            label_count: 0,
            strings: StringPool::default(),
        }
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Position of the source construct currently being translated.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    fn push(&mut self, line: String, segment: SegmentType) {
        self.target.push_line(self.position, line, segment);
    }

    /// Emits an indented instruction or directive into the text segment.
    pub fn instruction<D: Display>(&mut self, instruction: D) {
        self.push(format!("\t{}", instruction), SegmentType::Text);
    }

    /// Emits a label definition into the text segment.
    pub fn label<D: Display>(&mut self, name: D) {
        self.push(format!("{}:", name), SegmentType::Text);
    }

    /// Emits a line into the data segment.
    pub fn data<D: Display>(&mut self, line: D) {
        self.push(line.to_string(), SegmentType::Data);
    }

    /// Allocates a new label id and makes it the innermost one.
    pub fn push_label(&mut self) -> usize {
        self.label_count += 1;
        self.labels.push(self.label_count);
        self.label_count
    }

    pub fn pop_label(&mut self) -> Option<usize> {
        self.labels.pop()
    }

    /// The innermost active label id.
    pub fn current_label(&self) -> Option<usize> {
        self.labels.last().copied()
    }

    pub fn label_depth(&self) -> usize {
        self.labels.len()
    }

    /// Number of label ids allocated so far.
    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// Returns the label of the string constant, defining it in the data
    /// segment the first time the literal is seen.
    pub fn intern_string(&mut self, literal: &str) -> String {
        let (label, fresh) = self.strings.intern(literal);

        if fresh {
            self.data(format!("{}:\t.asciz {}", label, literal));
        }

        label
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    pub fn finish(self) -> T {
        self.target.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Assembly;

    #[test]
    fn test_string_pool_deduplicates() {
        let mut pool = StringPool::default();

        assert_eq!(pool.intern("\"hi\""), ("str_1".to_string(), true));
        assert_eq!(pool.intern("\"ho\""), ("str_2".to_string(), true));
        assert_eq!(pool.intern("\"hi\""), ("str_1".to_string(), false));
        assert_eq!(pool.len(), 2);

        let entries = pool.iter().collect::<Vec<_>>();
        assert_eq!(
            entries,
            vec![
                ("str_1".to_string(), "\"hi\""),
                ("str_2".to_string(), "\"ho\""),
            ]
        );
    }

    #[test]
    fn test_labels_nest() {
        let mut emitter = Emitter::new(Assembly::create());

        assert_eq!(emitter.push_label(), 1);
        assert_eq!(emitter.push_label(), 2);
        assert_eq!(emitter.current_label(), Some(2));
        assert_eq!(emitter.pop_label(), Some(2));
        assert_eq!(emitter.push_label(), 3);
        assert_eq!(emitter.label_depth(), 2);
        assert_eq!(emitter.pop_label(), Some(3));
        assert_eq!(emitter.pop_label(), Some(1));
        assert_eq!(emitter.pop_label(), None);
    }

    #[test]
    fn test_intern_string_defines_once() {
        let mut emitter = Emitter::new(Assembly::create());

        emitter.intern_string("\"a\"");
        emitter.intern_string("\"a\"");
        emitter.instruction("ldr r4, =str_1");

        let assembly = emitter.finish();

        assert_eq!(assembly.data, vec!["str_1:\t.asciz \"a\"".to_string()]);
        assert_eq!(assembly.text, vec!["\tldr r4, =str_1".to_string()]);
    }

    #[test]
    fn test_frame_offset() {
        assert_eq!(frame_offset(1), -4);
        assert_eq!(frame_offset(3), -12);
    }
}
