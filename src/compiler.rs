//! Compilation from HansenLite source to assembly.

use std::fmt;
use std::hash::Hash;
use std::io::BufRead;

use slog::Logger;

use crate::error::CompileError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::parsing::Position;

/// Represents the type of an output segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    /// Segment that contains program instructions and labels.
    /// Pushed lines appear in the order they were pushed.
    Text,

    /// Segment that contains data definitions.
    Data,
}

/// Defines an interface for a data structure into which a program can be compiled.
pub trait CompileTarget: Sized {
    /// Represents a position in the data structure.
    /// This does not change when new lines are pushed to the data structure.
    /// The line number of this location in the rendered output can change.
    type Location: Clone + fmt::Debug + Hash + Eq;

    /// Create an empty instance of itself.
    fn create() -> Self;

    /// Pushes a new line to the data structure.
    ///
    /// # Parameters
    /// - `position`: Location of the source code construct that produced the line.
    /// - `line`: The assembly line without a line terminator.
    /// - `segment`: Segment the line belongs to.
    fn push_line(
        &mut self,
        position: Option<Position>,
        line: String,
        segment: SegmentType,
    ) -> Self::Location;

    /// Finalize the compilation.
    /// The compiler will not modify the data structure after this.
    fn finish(self) -> Self {
        self
    }

    /// Translates the location `loc` into a line number of the rendered output, counting from 1.
    fn to_line_number(&self, loc: &Self::Location) -> usize;
}

/// Assembly text split into its data and text segments.
///
/// Rendered as the data segment followed by the text segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub data: Vec<String>,
    pub text: Vec<String>,
}

impl Assembly {
    /// Iterates over the rendered lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.data.iter().chain(self.text.iter()).map(String::as_str)
    }
}

impl CompileTarget for Assembly {
    type Location = (SegmentType, usize);

    fn create() -> Assembly {
        Assembly::default()
    }

    fn push_line(
        &mut self,
        _position: Option<Position>,
        line: String,
        segment: SegmentType,
    ) -> Self::Location {
        let lines = match segment {
            SegmentType::Text => &mut self.text,
            SegmentType::Data => &mut self.data,
        };

        lines.push(line);

        (segment, lines.len() - 1)
    }

    fn to_line_number(&self, loc: &Self::Location) -> usize {
        match loc {
            (SegmentType::Data, index) => index + 1,
            (SegmentType::Text, index) => self.data.len() + index + 1,
        }
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}

/// Compiles the given HansenLite program.
/// Supports compilation into multiple data structures, but most often the compilation target is
/// [Assembly] possibly in combination with [SourceMap](crate::source_map::SourceMap).
pub fn compile<T>(source: &str) -> Result<T, CompileError>
where
    T: CompileTarget,
{
    compile_with_logger(Lexer::new(source, None), None)
}

/// Compiles the program read from `reader`.
pub fn compile_reader<T, R, L>(reader: R, logger: L) -> Result<T, CompileError>
where
    T: CompileTarget,
    R: BufRead,
    L: Into<Option<Logger>>,
{
    let logger = logger.into();
    let lexer = Lexer::from_reader(reader, logger.clone());

    compile_with_logger(lexer, logger)
}

pub fn compile_with_logger<T, L>(lexer: Lexer, logger: L) -> Result<T, CompileError>
where
    T: CompileTarget,
    L: Into<Option<Logger>>,
{
    Parser::new(lexer, T::create(), logger)?.parse()
}

/// Compiles the program and renders the assembly text.
pub fn compile_to_string(source: &str) -> Result<String, CompileError> {
    compile::<Assembly>(source).map(|assembly| assembly.to_string())
}

#[test]
fn test_compile() {
    let source = r#"
{ print 7 }
begin
    variable x;
    x := 3 + 4;
    print x
end
    "#;

    let assembly: Assembly = compile(source).unwrap();
    println!("{}", assembly);

    assert_eq!(
        assembly.data,
        vec![
            "\t.global main",
            "\t.extern printf",
            "\t.data",
            "ifmt:\t.asciz \"%d\"",
            "sfmt:\t.asciz \"%s\"",
        ]
    );

    assert_eq!(
        assembly.text,
        vec![
            "\t.text",
            "main:",
            "\tpush {fp, lr}",
            "\tmov fp, sp",
            "\tsub sp, sp, #4",
            "\tldr r4, =3",
            "\tldr r5, =4",
            "\tadd r4, r4, r5",
            "\tstr r4, [fp, #-4]",
            "\tldr r0, =ifmt",
            "\tldr r4, [fp, #-4]",
            "\tpush {r1-r3, r12}",
            "\tmov r1, r4",
            "\tbl printf",
            "\tpop {r1-r3, r12}",
            "\tmov r0, #0",
            "\tmov sp, fp",
            "\tpop {fp, pc}",
        ]
    );
}

#[test]
fn test_line_numbers() {
    let assembly: Assembly = compile("print \"a\"").unwrap();

    assert_eq!(assembly.to_line_number(&(SegmentType::Data, 0)), 1);
    assert_eq!(assembly.to_line_number(&(SegmentType::Text, 0)), 7);
    assert_eq!(assembly.to_string().lines().nth(6), Some("\t.text"));
}
