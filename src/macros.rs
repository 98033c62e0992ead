//! Quasi-quoting and macro expansion.
//!
//! Macros are expanded before evaluation: [`define_macros`] pulls the
//! `let name = macro(...) { ... }` statements out of a program, then
//! [`Evaluator::expand_macros`] replaces every call to one of them by the
//! syntax tree its body quotes.

use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::ast::{Expr, Ident, Node, Program, Stmt};
use crate::env::Env;
use crate::eval::{EvalError, EvalResult, Evaluator, RuntimeError};
use crate::modify::{modify, modify_as};
use crate::value::{Macro, Value};

/// Misuse of macros or of `unquote`.  Unlike runtime errors these abort the
/// whole program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MacroError {
    #[error("macro {name} must return a quote, got {got}")]
    NotQuote { name: Ident, got: &'static str },
    #[error("unquote takes exactly one argument, got {0}")]
    UnquoteArity(usize),
    #[error("wrong number of arguments to macro {name}: expected {expected}, got {got}")]
    Arity {
        name: Ident,
        expected: usize,
        got: usize,
    },
    #[error("error while expanding macro {name}: {error}")]
    Runtime { name: Ident, error: RuntimeError },
}

/// Moves the top-level macro definitions of `prg` into `env`.
pub fn define_macros(prg: &mut Program, env: &Rc<Env>) -> Result<(), MacroError> {
    let mut kept = Vec::with_capacity(prg.statements.len());
    for stmt in std::mem::take(&mut prg.statements) {
        match stmt {
            Stmt::Let {
                name,
                value: Expr::Macro { params, body },
            } => {
                debug!(%name, "defining macro");
                let m = Macro {
                    params,
                    body,
                    env: env.clone(),
                };
                env.define(&name, Value::Macro(Rc::new(m)))
                    .map_err(|error| MacroError::Runtime { name, error })?;
            }
            stmt => kept.push(stmt),
        }
    }
    prg.statements = kept;
    Ok(())
}

/// Arguments of `unquote(...)` if `node` is such a call.
fn unquote_args(node: &Node) -> Option<&[Expr]> {
    match node {
        Node::Expr(Expr::Call { callee, args }) => match callee.as_ref() {
            Expr::Ident(name) if name == "unquote" => Some(args),
            _ => None,
        },
        _ => None,
    }
}

/// Turns the value of an unquoted expression back into syntax.
fn value_to_node(value: Value) -> Option<Node> {
    let expr = match value {
        Value::Integer(n) => Expr::Int(n),
        Value::Float(n) => Expr::Float(n),
        Value::Boolean(b) => Expr::Bool(b),
        Value::String(s) => Expr::Str(s.to_string()),
        Value::Null => Expr::Null,
        Value::Quote(node) => return Some(Rc::try_unwrap(node).unwrap_or_else(|n| (*n).clone())),
        _ => return None,
    };
    Some(Node::Expr(expr))
}

impl<W: Write> Evaluator<'_, W> {
    /// `quote(arg)`: `arg` unevaluated, except for its `unquote(...)` calls
    /// which are evaluated in `env` and spliced back in.
    pub(crate) fn eval_quote(&mut self, arg: &Expr, env: &Rc<Env>) -> EvalResult {
        let mut failure: Option<EvalError> = None;
        let node = modify(Node::Expr(arg.clone()), |node| {
            if failure.is_some() {
                return node;
            }
            let inner = match unquote_args(&node) {
                Some([inner]) => inner,
                Some(args) => {
                    failure = Some(MacroError::UnquoteArity(args.len()).into());
                    return node;
                }
                None => return node,
            };
            match self.eval_expr(inner, env) {
                Ok(value) => match value_to_node(value) {
                    Some(n) => n,
                    None => {
                        warn!(%node, "unquoted value has no syntax, leaving call in place");
                        node
                    }
                },
                Err(e) => {
                    failure = Some(e);
                    node
                }
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(Value::Quote(Rc::new(node))),
        }
    }

    /// Replaces calls to macros defined in `env` by their expansion.
    pub fn expand_macros(&mut self, prg: Program, env: &Rc<Env>) -> Result<Program, MacroError> {
        let mut failure = None;
        let expanded = modify_as(prg, |node| {
            if failure.is_some() {
                return node;
            }
            let Node::Expr(Expr::Call { callee, args }) = &node else {
                return node;
            };
            let Expr::Ident(name) = callee.as_ref() else {
                return node;
            };
            let Some(Value::Macro(m)) = env.get(name) else {
                return node;
            };
            match self.expand_call(name, &m, args) {
                Ok(expansion) => expansion,
                Err(e) => {
                    failure = Some(e);
                    node
                }
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(expanded),
        }
    }

    fn expand_call(&mut self, name: &str, m: &Macro, args: &[Expr]) -> Result<Node, MacroError> {
        if args.len() != m.params.len() {
            return Err(MacroError::Arity {
                name: name.to_string(),
                expected: m.params.len(),
                got: args.len(),
            });
        }
        debug!(%name, "expanding macro call");
        let runtime = |error| MacroError::Runtime {
            name: name.to_string(),
            error,
        };
        let scope = Env::enclosed_by(&m.env);
        for (param, arg) in m.params.iter().zip(args) {
            let quoted = Value::Quote(Rc::new(Node::Expr(arg.clone())));
            scope.define(param, quoted).map_err(runtime)?;
        }
        let result = match self.eval_block(&m.body, &scope) {
            Ok(Value::Return(v)) => *v,
            Ok(v) => v,
            Err(EvalError::Runtime(e)) => return Err(runtime(e)),
            Err(EvalError::Macro(e)) => return Err(e),
        };
        match result {
            Value::Quote(node) => Ok(Rc::try_unwrap(node).unwrap_or_else(|n| (*n).clone())),
            other => Err(MacroError::NotQuote {
                name: name.to_string(),
                got: other.type_name(),
            }),
        }
    }
}
