//! A tree-walking interpreter for the Monkey language, with quote/unquote
//! macros, floats, loops and `switch`.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`] for a session that keeps its
//! definitions between inputs, or use [`parse`] and [`run`] directly:
//!
//! ```
//! use rmonkey::env::Env;
//! use rmonkey::value::Value;
//!
//! let (prg, errors) = rmonkey::parse("let sq = fn(x) { x * x }; sq(7)");
//! assert!(errors.is_empty());
//! assert_eq!(rmonkey::run(&prg, &Env::new()), Ok(Value::Integer(49)));
//! ```
//!
//! # Limitations
//!
//! - Closures capturing the scope they are stored in form reference cycles
//! that are never reclaimed.
//! - `run` does not expand macros; see [`macros`].

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

use std::io;
use std::rc::Rc;

pub mod ast;
pub mod builtins;
pub mod diag;
pub mod env;
pub mod eval;
pub mod interpreter;
pub mod macros;
pub mod modify;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

use ast::Program;
use env::Env;
use eval::Evaluator;
use macros::MacroError;
use value::Value;

/// Parses `source`, returning the tree and one message per syntax error.
///
/// The tree must not be evaluated when messages are returned.
pub fn parse(source: &str) -> (Program, Vec<String>) {
    let (prg, errors) = parser::parse(source);
    (prg, errors.messages())
}

/// Evaluates an already expanded `prg` in `env`, printing to stdout.
///
/// Runtime failures are returned as `Value::Error`.
pub fn run(prg: &Program, env: &Rc<Env>) -> Result<Value, MacroError> {
    let mut stdout = io::stdout();
    Evaluator::new(&mut stdout).eval_program(prg, env)
}
