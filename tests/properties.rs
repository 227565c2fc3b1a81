use hansenlite::compiler::{compile, compile_reader, compile_to_string, Assembly};
use hansenlite::error::{CompileError, ErrorKind};
use hansenlite::parsing::Position;
use hansenlite::token::Terminal;

use std::io::{self, BufReader, Read};

use assert_matches::assert_matches;

fn text(source: &str) -> Vec<String> {
    compile::<Assembly>(source).unwrap().text
}

fn error(source: &str) -> CompileError {
    compile::<Assembly>(source).unwrap_err()
}

fn position(err: &CompileError) -> Option<(usize, usize)> {
    err.position.map(|Position { line, column }| (line, column))
}

#[test]
fn test_valid_programs_have_entry_and_return() {
    let sources = [
        "",
        ";;",
        "print 1",
        "begin end",
        "begin print 1; end;",
        "variable x; x := 1; while x < 10 do x := x * 2; print x",
        "begin variable a; variable b; a := 1; b := -a; if a <> b then print \"differ\" end",
    ];

    for source in sources.iter() {
        let output = compile_to_string(source).unwrap();

        assert!(output.contains("\nmain:\n"), "{}", source);
        assert!(output.ends_with("\tmov r0, #0\n\tmov sp, fp\n\tpop {fp, pc}\n"), "{}", source);
    }
}

#[test]
fn test_syntax_error_positions() {
    let err = error("variable x;\nx := 3 +;\n");

    assert!(err.is_syntax());
    assert_eq!(position(&err), Some((2, 9)));
    assert_matches!(
        err.kind,
        ErrorKind::NoProduction { ref expected, found: Terminal::StatementSep, .. }
            if expected == &[
                Terminal::Identifier,
                Terminal::Number,
                Terminal::AdditiveOp,
                Terminal::LeftParen,
            ]
    );
    assert_eq!(
        err.to_string(),
        "syntax error at line 2 col 9: expected identifier, number, additive operator, or '(', found ';' while parsing term"
    );

    let err = error("variable 5");
    assert_eq!(position(&err), Some((1, 10)));
    assert_matches!(
        err.kind,
        ErrorKind::UnexpectedToken { expected: Terminal::Identifier, found: Terminal::Number, .. }
    );

    let err = error("begin\n  print 1\n");
    assert_eq!(position(&err), Some((3, 1)));
    assert_eq!(
        err.to_string(),
        "syntax error at line 3 col 1: expected 'end', found end of input"
    );

    let err = error("print 1 print 2");
    assert!(err.is_syntax());
    assert_eq!(position(&err), Some((1, 9)));
}

#[test]
fn test_declare_store_print() {
    let text = text("variable x; x := 3 + 4; print x;");

    let reserve = text.iter().position(|l| l == "\tsub sp, sp, #4").unwrap();
    let store = text.iter().position(|l| l == "\tstr r4, [fp, #-4]").unwrap();
    let format = text.iter().position(|l| l == "\tldr r0, =ifmt").unwrap();
    let call = text.iter().position(|l| l == "\tbl printf").unwrap();

    assert!(reserve < store);
    assert!(store < format);
    assert!(format < call);
    assert_eq!(text[store - 1], "\tadd r4, r4, r5");
}

#[test]
fn test_nested_labels() {
    let source = r#"
variable i;
i := 0;
while i < 4 do
begin
    if i = 1 then print "one" else print "other";
    if i > 2 then print "big";
    i := i + 1
end;
print "done"
"#;

    let text = text(source);

    for id in 1..=3 {
        let begin = format!("begin_{}:", id);
        let end = format!("end_{}:", id);

        assert_eq!(text.iter().filter(|l| **l == begin).count(), 1);
        assert_eq!(text.iter().filter(|l| **l == end).count(), 1);
    }

    assert!(!text.contains(&"begin_4:".to_string()));

    let line = |label: &str| text.iter().position(|l| l == label).unwrap();

    assert!(line("begin_1:") < line("end_2:"));
    assert!(line("begin_2:") < line("end_3:"));
    assert!(line("begin_3:") < line("\tb begin_1"));
    assert!(line("\tb begin_1") < line("end_1:"));
    assert_eq!(text.iter().filter(|l| *l == "\tbne end_2").count(), 1);
    assert_eq!(text.iter().filter(|l| *l == "\tble end_3").count(), 1);
}

#[test]
fn test_dangling_else() {
    let text = text("variable x; if x = 1 then if x = 2 then print 1 else print 2");

    let line = |label: &str| text.iter().position(|l| l == label).unwrap();

    assert_eq!(text[line("end_2:") + 1], "\tldr r0, =ifmt");
    assert!(line("begin_2:") < line("end_1:"));
    assert_eq!(line("end_1:") + 1, line("begin_1:"));
}

#[test]
fn test_string_pool() {
    let assembly: Assembly = compile("print \"hi\"; print \"hi\"; print \"ho\"").unwrap();

    let pooled = assembly
        .data
        .iter()
        .filter(|l| l.starts_with("str_"))
        .collect::<Vec<_>>();

    assert_eq!(pooled, vec!["str_1:\t.asciz \"hi\"", "str_2:\t.asciz \"ho\""]);
    assert_eq!(
        assembly
            .text
            .iter()
            .filter(|l| *l == "\tldr r4, =str_1")
            .count(),
        2
    );
}

#[test]
fn test_register_exhaustion() {
    // five pending temporaries and the 11 fill the bank, the 12 finds no register
    let source = "variable x; x := (1+2)*((3+4)*((5+6)*((7+8)*((9+10)*(11+12)))))";
    let column = source.find("12").unwrap() + 1;

    for _ in 0..2 {
        let err = error(source);

        assert_matches!(err.kind, ErrorKind::RegisterExhausted { available: 6 });
        assert_eq!(position(&err), Some((1, column)));
    }

    let text = text("variable x; x := (1+2)*((3+4)*((5+6)*((7+8)*(9+10))))");
    assert!(text.contains(&"\tadd r8, r8, r9".to_string()));
}

#[test]
fn test_idempotent() {
    let source = "variable n; n := 5; while n > 0 do begin print n; print \"\\n\"; n := n - 1 end";

    assert_eq!(compile_to_string(source).unwrap(), compile_to_string(source).unwrap());
}

#[test]
fn test_redeclaration() {
    let err = error("variable x; variable x");

    assert_matches!(
        err.kind,
        ErrorKind::Redeclaration { ref name, previous } if name == "x" && previous == Position::new(1, 10)
    );
    assert_eq!(position(&err), Some((1, 22)));
}

#[test]
fn test_undefined_variable() {
    let err = error("print y");

    assert_matches!(
        err.kind,
        ErrorKind::UndefinedVariable { ref name, suggestion: None } if name == "y"
    );
    assert_eq!(position(&err), Some((1, 7)));
}

#[test]
fn test_lexical_error() {
    let err = error("variable x;\nx := 1 # 2");

    assert!(err.is_lexical());
    assert_matches!(err.kind, ErrorKind::UnexpectedCharacter('#'));
    assert_eq!(position(&err), Some((2, 8)));
}

struct FailingReader {
    sent: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        }

        let line = b"print 1;\n";
        buf[..line.len()].copy_from_slice(line);
        self.sent = true;

        Ok(line.len())
    }
}

#[test]
fn test_io_error() {
    let reader = BufReader::new(FailingReader { sent: false });
    let err = compile_reader::<Assembly, _, _>(reader, None).unwrap_err();

    assert_matches!(err.kind, ErrorKind::Io(_));
    assert_eq!(position(&err), Some((2, 1)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_reader_matches_str() {
    let source = "variable x;\nx := 2 * 21;\nprint x\n";
    let reader = io::Cursor::new(source.as_bytes());

    let from_reader: Assembly = compile_reader(reader, None).unwrap();
    let from_str: Assembly = compile(source).unwrap();

    assert_eq!(from_reader, from_str);
}
