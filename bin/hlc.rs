use hansenlite::{
    compiler::{compile_reader, Assembly},
    error::CompileError,
    source_map::SourceMap,
};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Level, Logger};
use slog_term::{FullFormat, TermDecorator};

enum Error {
    Compile(CompileError),
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Error {
        Error::Compile(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("hlc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles HansenLite programs into ARM assembly")
        .arg(Arg::with_name("source")
             .help("File containing HansenLite source")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("output")
             .help("Output file, defaults to SOURCE with the extension .s")
             .short("o")
             .long("output")
             .value_name("FILE")
             .takes_value(true))
        .arg(Arg::with_name("annotate")
             .help("Annotates every line with the source position that produced it")
             .short("a")
             .long("annotate"))
        .arg(Arg::with_name("verbose")
             .help("Logs the compilation, repeat for more detail")
             .short("v")
             .long("verbose")
             .multiple(true))
        .get_matches()
}

fn create_logger(verbosity: u64) -> Logger {
    if verbosity == 0 {
        return Logger::root(Discard, o!());
    }

    let level = if verbosity > 1 { Level::Trace } else { Level::Debug };

    let decorator = TermDecorator::new().stderr().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().filter_level(level).fuse();

    Logger::root(drain, o!())
}

fn main() {
    let args = parse_arguments();

    let source = match args.value_of("source") {
        Some(source) => Path::new(source),
        None => return,
    };

    let output = args
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| source.with_extension("s"));

    let result = {
        let logger = create_logger(args.occurrences_of("verbose"));
        run(source, &output, args.is_present("annotate"), logger)
    };

    match result {
        Ok(()) => (),
        Err(Error::IO(io)) => {
            eprintln!("IO error: {}", io);
            std::process::exit(1);
        }
        Err(Error::Compile(err)) => {
            eprintln!("Compiler Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn run(source: &Path, output: &Path, annotate: bool, logger: Logger) -> Result<(), Error> {
    let start = Instant::now();
    let reader = BufReader::new(File::open(source)?);

    let assembly = if annotate {
        compile_reader::<SourceMap<Assembly>, _, _>(reader, logger)?.annotated()
    } else {
        compile_reader::<Assembly, _, _>(reader, logger)?.to_string()
    };

    std::fs::write(output, assembly)?;

    println!(
        "Compiled {} in {}ms",
        source.display(),
        start.elapsed().as_millis()
    );

    Ok(())
}
