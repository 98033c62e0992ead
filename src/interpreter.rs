//! API to control the interpreter.

use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::diag::SyntaxErrors;
use crate::env::Env;
use crate::eval::{Evaluator, RuntimeError};
use crate::macros::{define_macros, MacroError};
use crate::parser::parse;
use crate::value::Value;

/// Tree-walk interpreter session.
///
/// Bindings and macros defined by one call to [`Interpreter::eval`] are
/// visible to the following ones.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function then additional times to call this
/// function:
///
/// ```
/// # use rmonkey::interpreter::{Interpreter, Error};
/// # use rmonkey::value::Value;
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let func_def = r#"
///     let max = fn(x, y) {
///         if (x > y) {
///             return x;
///         } else {
///             return y;
///         }
///     };
/// "#;
/// interp.eval(func_def)?;
///
/// interp.eval("puts(max(10, 20));").expect("interpreter error");
/// let v = interp.eval("max(5, 4)")?;
///
/// assert_eq!(v, Value::Integer(5));
/// assert_eq!(output, b"20\n");
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    evaluator: Evaluator<'t, W>,
    env: Rc<Env>,
    macro_env: Rc<Env>,
}

/// Errors the interpreter can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// The source does not parse.  Nothing was evaluated.
    #[error("{0}")]
    Syntax(#[from] SyntaxErrors),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("macro error: {0}")]
    Macro(#[from] MacroError),
}

impl<W: Write> Interpreter<'_, W> {
    pub fn new(output: &mut W) -> Interpreter<'_, W> {
        Interpreter {
            evaluator: Evaluator::new(output),
            env: Env::new(),
            macro_env: Env::new(),
        }
    }

    /// Parses, expands and evaluates `source`, returning the value of its last statement.
    pub fn eval(&mut self, source: &str) -> Result<Value, Error> {
        let (mut prg, errors) = parse(source);
        if !errors.is_empty() {
            return Err(errors.into());
        }
        define_macros(&mut prg, &self.macro_env)?;
        let prg = self.evaluator.expand_macros(prg, &self.macro_env)?;
        debug!(statements = prg.statements.len(), "evaluating program");
        match self.evaluator.eval_program(&prg, &self.env)? {
            Value::Error(e) => Err(e.into()),
            v => Ok(v),
        }
    }

    /// Global scope of the session.
    pub fn env(&self) -> &Rc<Env> {
        &self.env
    }
}
