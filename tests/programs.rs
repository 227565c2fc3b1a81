use hansenlite::compiler::{compile, compile_to_string, Assembly};
use hansenlite::error::ErrorKind;

use assert_matches::assert_matches;

fn compile_program(source: &str) -> Assembly {
    match compile(source) {
        Ok(assembly) => assembly,
        Err(err) => panic!("compilation failed: {}", err),
    }
}

fn count(lines: &[String], line: &str) -> usize {
    lines.iter().filter(|l| *l == line).count()
}

/// Checks the frame setup, the epilogue, the variable slots, the string pool
/// and that every control flow label is defined exactly once.
fn check_structure(assembly: &Assembly, variables: usize, strings: usize, labels: usize) {
    let text = &assembly.text;

    assert_eq!(&text[..4], &["\t.text", "main:", "\tpush {fp, lr}", "\tmov fp, sp"]);
    assert_eq!(
        &text[text.len() - 3..],
        &["\tmov r0, #0", "\tmov sp, fp", "\tpop {fp, pc}"]
    );

    assert_eq!(count(text, "\tsub sp, sp, #4"), variables);

    let pooled = assembly
        .data
        .iter()
        .filter(|line| line.starts_with("str_"))
        .count();
    assert_eq!(pooled, strings);

    for id in 1..=labels {
        assert_eq!(count(text, &format!("begin_{}:", id)), 1, "begin_{}", id);
        assert_eq!(count(text, &format!("end_{}:", id)), 1, "end_{}", id);
    }

    assert_eq!(count(text, &format!("begin_{}:", labels + 1)), 0);
    assert_eq!(
        count(text, "\tbl printf"),
        text.iter().filter(|line| line.starts_with("\tldr r0, =")).count()
    );
}

#[test]
fn test_euclid() {
    let assembly = compile_program(include_str!("programs/euclid.hl"));
    println!("{}", assembly);

    check_structure(&assembly, 2, 4, 2);

    assert_eq!(assembly.data[5], "str_1:\t.asciz \"a is 732\\n\"");
    assert_eq!(assembly.data[8], "str_4:\t.asciz \"\\n\"");

    let text = &assembly.text;
    let body = text.iter().position(|line| line == "begin_1:").unwrap();

    assert_eq!(
        &text[body..body + 5],
        &[
            "begin_1:",
            "\tldr r4, [fp, #-8]",
            "\tldr r5, =0",
            "\tcmp r4, r5",
            "\tbeq end_1",
        ]
    );
}

#[test]
fn test_factorial() {
    let assembly = compile_program(include_str!("programs/factorial.hl"));
    check_structure(&assembly, 3, 3, 1);

    assert!(assembly.text.contains(&"\tmul r4, r4, r5".to_string()));
}

#[test]
fn test_fibonacci() {
    let assembly = compile_program(include_str!("programs/fibonacci.hl"));
    check_structure(&assembly, 5, 1, 1);

    let text = &assembly.text;
    let end = text.iter().position(|line| line == "end_1:").unwrap();

    assert_eq!(
        &text[end + 1..end + 3],
        &["\tldr r0, =ifmt", "\tldr r4, [fp, #-12]"]
    );
}

#[test]
fn test_pascal_triangle() {
    let assembly = compile_program(include_str!("programs/pascal_triangle.hl"));
    check_structure(&assembly, 4, 2, 2);

    assert!(assembly.text.contains(&"\tsdiv r4, r4, r5".to_string()));
}

#[test]
fn test_prime_factor() {
    let assembly = compile_program(include_str!("programs/prime_factor.hl"));
    check_structure(&assembly, 2, 4, 2);
}

#[test]
fn test_fermat() {
    let assembly = compile_program(include_str!("programs/fermat.hl"));
    check_structure(&assembly, 5, 3, 2);
}

#[test]
fn test_halving() {
    let assembly = compile_program(include_str!("programs/halving.hl"));
    check_structure(&assembly, 2, 3, 1);
}

#[test]
fn test_pythagorean_crlf() {
    let assembly = compile_program(include_str!("programs/pythagorean.hl"));
    check_structure(&assembly, 9, 4, 1);

    assert_eq!(
        assembly
            .data
            .iter()
            .filter(|line| line.ends_with("\", \""))
            .count(),
        1
    );
}

#[test]
fn test_bezier_undefined_variable() {
    let err = compile::<Assembly>(include_str!("programs/bezier.hl")).unwrap_err();

    assert_matches!(
        err.kind,
        ErrorKind::UndefinedVariable { ref name, suggestion: Some(ref suggestion) }
            if name == "po" && suggestion == "p0"
    );
    assert_eq!(err.position.map(|p| (p.line, p.column)), Some((20, 5)));
}

#[test]
fn test_idempotent() {
    let source = include_str!("programs/prime_factor.hl");

    let first = compile_to_string(source).unwrap();
    let second = compile_to_string(source).unwrap();

    assert_eq!(first, second);
}
