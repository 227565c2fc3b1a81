use hansenlite::{
    compiler::{compile, compile_reader, compile_with_logger, Assembly},
    lexer::Lexer,
    source_map::SourceMap,
};

use std::io::Cursor;

use slog::{o, Drain, Level, Logger};
use slog_term::{CompactFormat, FullFormat, TermDecorator};

fn create_logger() -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .build()
        .filter_level(Level::Trace)
        .fuse();

    Logger::root(drain, o!("test" => "logging"))
}

#[test]
fn test_fibonacci_with_logger() {
    let source = include_str!("programs/fibonacci.hl");
    let logger = create_logger();

    let lexer = Lexer::new(source, logger.clone());
    let logged: Assembly = compile_with_logger(lexer, logger)
        .expect("could not compile the program");

    let silent: Assembly = compile(source).unwrap();

    assert_eq!(logged, silent);
}

#[test]
fn test_source_map_with_logger() {
    let source = include_str!("programs/euclid.hl");

    let decorator = TermDecorator::new().build();
    let drain = CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let logger = Logger::root(drain, o!());

    let mapped: SourceMap<Assembly> = compile_reader(Cursor::new(source.as_bytes()), logger)
        .expect("could not compile the program");

    println!("{}", mapped.annotated());

    assert_eq!(mapped.compiled, compile::<Assembly>(source).unwrap());
}
