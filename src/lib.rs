//! A single-pass compiler for the HansenLite teaching language.
//!
//! HansenLite is a small imperative language with integer variables, `if`/`while`
//! statements and a `print` statement. This crate translates it into ARM
//! assembly which calls `printf` for output.
//!
//! The compiler does not build a syntax tree. A table driven lexer feeds a
//! predictive parser whose control stack contains terminals, nonterminals and
//! semantic actions. Code is emitted by the actions as the parser reaches them.
//!
//! # Example
//! ```
//! use hansenlite::compiler::{compile, Assembly};
//!
//! fn main() {
//!     let source = r#"
//!         { prints 7 }
//!         begin
//!             variable x;
//!             x := 3 + 4;
//!             print x
//!         end
//!     "#;
//!
//!     let assembly: Assembly = compile(source).expect("could not compile the program");
//!
//!     assert!(assembly.text.contains(&"main:".to_string()));
//!     println!("{}", assembly);
//! }
//! ```
//!
//! # Executables
//!
//! ## `hlc`
//!
//! Compiles a source file into a sibling `.s` file. Enabled by the `hlc` feature.
//!
//! ```text
//! $ hlc gcd.hl
//! Compiled gcd.hl in 2ms
//! ```
pub mod parsing;
pub mod token;
pub mod lexer;
pub mod symbol_table;
pub mod grammar;
pub mod parse_table;
pub mod regalloc;
pub mod emit;
pub mod parser;
mod actions;
pub mod compiler;
pub mod source_map;
pub mod error;
