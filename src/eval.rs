//! Tree-walking evaluator.
//!
//! Runtime failures travel back up the call tree as `Err(RuntimeError)` and are
//! checked after every sub-evaluation with `?`.  A `return` travels as an
//! ordinary `Value::Return` that blocks hand back untouched and that only the
//! enclosing call (or the program) unwraps.

use std::collections::HashMap;
use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;
use tracing::trace;

use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::builtins;
use crate::env::Env;
use crate::macros::MacroError;
use crate::value::{floats_equal, Function, HashPair, Hashable, Macro, Value, FALSE, NULL, TRUE};

/// Kinds of [`RuntimeError`], for callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UndefinedIdentifier,
    TypeMismatch,
    UnknownOperator,
    ArityMismatch,
    NotCallable,
    UnusableHashKey,
    KeyNotFound,
    IndexOutOfBounds,
    UnsupportedIndexOperation,
    ConstReassignment,
    DivisionByZero,
    UnsupportedArgument,
    Output,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("identifier not found: {0}")]
    UndefinedIdentifier(String),
    #[error("type mismatch: {left} {op} {right}")]
    TypeMismatch {
        left: &'static str,
        op: String,
        right: &'static str,
    },
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("wrong number of arguments to {callee}: expected {expected}, got {got}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
    },
    #[error("not a function: {0}")]
    NotCallable(&'static str),
    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("index out of bounds: {index} (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("index operator not supported: {0}")]
    UnsupportedIndexOperation(String),
    #[error("cannot reassign constant: {0}")]
    ConstReassignment(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("argument to `{builtin}` not supported, got {got}")]
    UnsupportedArgument {
        builtin: &'static str,
        got: &'static str,
    },
    #[error("output error: {0}")]
    Output(String),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::UndefinedIdentifier(_) => ErrorKind::UndefinedIdentifier,
            RuntimeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            RuntimeError::UnknownOperator(_) => ErrorKind::UnknownOperator,
            RuntimeError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            RuntimeError::NotCallable(_) => ErrorKind::NotCallable,
            RuntimeError::UnusableHashKey(_) => ErrorKind::UnusableHashKey,
            RuntimeError::KeyNotFound(_) => ErrorKind::KeyNotFound,
            RuntimeError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            RuntimeError::UnsupportedIndexOperation(_) => ErrorKind::UnsupportedIndexOperation,
            RuntimeError::ConstReassignment(_) => ErrorKind::ConstReassignment,
            RuntimeError::DivisionByZero => ErrorKind::DivisionByZero,
            RuntimeError::UnsupportedArgument { .. } => ErrorKind::UnsupportedArgument,
            RuntimeError::Output(_) => ErrorKind::Output,
        }
    }
}

/// Why an evaluation stopped early.  Macro misuse is never turned into a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Macro(#[from] MacroError),
}

pub type EvalResult = Result<Value, EvalError>;

/// Value of a sub-evaluation.  Errors and a pending `return` leave the
/// enclosing evaluation right away.
macro_rules! operand {
    ($result:expr) => {
        match $result? {
            v @ Value::Return(_) => return Ok(v),
            v => v,
        }
    };
}

#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
}

impl<'a, W: Write> Evaluator<'a, W> {
    /// Creates an evaluator whose `puts` writes to `output`.
    pub fn new(output: &'a mut W) -> Evaluator<'a, W> {
        Evaluator { output }
    }

    /// Evaluates a whole program in `env`.
    ///
    /// Runtime failures come back as `Value::Error`; a top-level `return`
    /// yields its value.  Only macro misuse is reported as `Err`.
    pub fn eval_program(&mut self, prg: &Program, env: &Rc<Env>) -> Result<Value, MacroError> {
        match self.eval_statements(&prg.statements, env) {
            Ok(Value::Return(v)) => Ok(*v),
            Ok(v) => Ok(v),
            Err(EvalError::Runtime(e)) => Ok(Value::Error(e)),
            Err(EvalError::Macro(e)) => Err(e),
        }
    }

    /// Evaluates the statements of `block` in `env` itself.
    pub(crate) fn eval_block(&mut self, block: &Block, env: &Rc<Env>) -> EvalResult {
        self.eval_statements(&block.statements, env)
    }

    fn eval_statements(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> EvalResult {
        let mut result = NULL;
        for stmt in stmts {
            result = self.eval_stmt(stmt, env)?;
            if let Value::Return(_) = result {
                break;
            }
        }
        Ok(result)
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: &Rc<Env>) -> EvalResult {
        trace!(%stmt, "eval");
        match stmt {
            Stmt::Let { name, value } => {
                let v = operand!(self.eval_expr(value, env));
                env.define(name, v)?;
                Ok(NULL)
            }
            Stmt::Const { name, value } => {
                let v = operand!(self.eval_expr(value, env));
                env.define_const(name, v)?;
                Ok(NULL)
            }
            Stmt::Assign { name, value } => {
                let v = operand!(self.eval_expr(value, env));
                env.assign(name, v)?;
                Ok(NULL)
            }
            Stmt::Return(value) => match self.eval_expr(value, env)? {
                v @ Value::Return(_) => Ok(v),
                v => Ok(Value::Return(Box::new(v))),
            },
            Stmt::Expr(e) => self.eval_expr(e, env),
        }
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &Rc<Env>) -> EvalResult {
        match expr {
            Expr::Ident(name) => self.eval_identifier(name, env),
            Expr::Int(n) => Ok(Value::Integer(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Bool(b) => Ok(Value::from(*b)),
            Expr::Str(s) => Ok(Value::from(s.as_str())),
            Expr::Null => Ok(NULL),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(operand!(self.eval_expr(item, env)));
                }
                Ok(Value::from(values))
            }
            Expr::Hash(pairs) => self.eval_hash(pairs, env),
            Expr::Prefix { op, right } => {
                let right = operand!(self.eval_expr(right, env));
                Ok(eval_prefix(*op, right)?)
            }
            Expr::Infix { left, op, right } => self.eval_infix(left, *op, right, env),
            Expr::If {
                clauses,
                alternative,
            } => {
                for (condition, consequence) in clauses {
                    if operand!(self.eval_expr(condition, env)).is_truthy() {
                        return self.eval_block(consequence, env);
                    }
                }
                match alternative {
                    Some(block) => self.eval_block(block, env),
                    None => Ok(NULL),
                }
            }
            Expr::Switch {
                subject,
                cases,
                default,
            } => {
                let subject = operand!(self.eval_expr(subject, env));
                for (value, block) in cases {
                    if operand!(self.eval_expr(value, env)) == subject {
                        return self.eval_block(block, env);
                    }
                }
                match default {
                    Some(block) => self.eval_block(block, env),
                    None => Ok(NULL),
                }
            }
            Expr::While { condition, body } => {
                while operand!(self.eval_expr(condition, env)).is_truthy() {
                    let iteration = Env::enclosed_by(env);
                    operand!(self.eval_block(body, &iteration));
                }
                Ok(NULL)
            }
            Expr::For {
                init,
                condition,
                afterthought,
                body,
            } => {
                // The loop variable lives in its own scope around the body.
                let scope = Env::enclosed_by(env);
                operand!(self.eval_stmt(init, &scope));
                while operand!(self.eval_expr(condition, &scope)).is_truthy() {
                    let iteration = Env::enclosed_by(&scope);
                    operand!(self.eval_block(body, &iteration));
                    operand!(self.eval_stmt(afterthought, &scope));
                }
                Ok(NULL)
            }
            Expr::Function { name, params, body } => Ok(Value::Function(Rc::new(Function {
                name: name.clone(),
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),
            Expr::Macro { params, body } => Ok(Value::Macro(Rc::new(Macro {
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            }))),
            Expr::Call { callee, args } => {
                if let Expr::Ident(name) = callee.as_ref() {
                    if name == "quote" {
                        return match args.as_slice() {
                            [arg] => self.eval_quote(arg, env),
                            _ => Err(RuntimeError::ArityMismatch {
                                callee: "quote".to_string(),
                                expected: 1,
                                got: args.len(),
                            }
                            .into()),
                        };
                    }
                }
                let callee = operand!(self.eval_expr(callee, env));
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(operand!(self.eval_expr(arg, env)));
                }
                self.apply_function(callee, values)
            }
            Expr::Index { left, index } => {
                let left = operand!(self.eval_expr(left, env));
                let index = operand!(self.eval_expr(index, env));
                Ok(eval_index(&left, &index)?)
            }
        }
    }

    fn eval_identifier(&mut self, name: &str, env: &Rc<Env>) -> EvalResult {
        if let Some(v) = env.get(name) {
            return Ok(v);
        }
        match builtins::lookup(name) {
            Some(b) => Ok(Value::Builtin(b)),
            None => Err(RuntimeError::UndefinedIdentifier(name.to_string()).into()),
        }
    }

    fn eval_hash(&mut self, pairs: &[(Expr, Expr)], env: &Rc<Env>) -> EvalResult {
        let mut map = HashMap::with_capacity(pairs.len());
        for (key_expr, value_expr) in pairs {
            let key = operand!(self.eval_expr(key_expr, env));
            let hash_key = key
                .hash_key()
                .ok_or_else(|| RuntimeError::UnusableHashKey(key.type_name()))?;
            let value = operand!(self.eval_expr(value_expr, env));
            map.insert(hash_key, HashPair { key, value });
        }
        Ok(Value::Hash(Rc::new(map)))
    }

    fn eval_infix(
        &mut self,
        left: &Expr,
        op: InfixOp,
        right: &Expr,
        env: &Rc<Env>,
    ) -> EvalResult {
        let left = operand!(self.eval_expr(left, env));
        match op {
            InfixOp::And if !left.is_truthy() => Ok(FALSE),
            InfixOp::Or if left.is_truthy() => Ok(TRUE),
            InfixOp::And | InfixOp::Or => {
                let right = operand!(self.eval_expr(right, env));
                Ok(Value::from(right.is_truthy()))
            }
            _ => {
                let right = operand!(self.eval_expr(right, env));
                Ok(eval_binary(op, &left, &right)?)
            }
        }
    }

    /// Calls a function or builtin value with already evaluated arguments.
    pub fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> EvalResult {
        match callee {
            Value::Function(f) => {
                if args.len() != f.params.len() {
                    return Err(RuntimeError::ArityMismatch {
                        callee: f.name.clone().unwrap_or_else(|| "anonymous function".to_string()),
                        expected: f.params.len(),
                        got: args.len(),
                    }
                    .into());
                }
                let scope = Env::enclosed_by(&f.env);
                for (param, arg) in f.params.iter().zip(args) {
                    scope.define(param, arg)?;
                }
                match self.eval_block(&f.body, &scope)? {
                    Value::Return(v) => Ok(*v),
                    v => Ok(v),
                }
            }
            Value::Builtin(b) => Ok((b.func)(&args, &mut *self.output)?),
            other => Err(RuntimeError::NotCallable(other.type_name()).into()),
        }
    }
}

fn eval_prefix(op: PrefixOp, right: Value) -> Result<Value, RuntimeError> {
    match (op, right) {
        (PrefixOp::Not, v) => Ok(Value::from(!v.is_truthy())),
        (PrefixOp::Neg, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
        (PrefixOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (PrefixOp::Neg, v) => Err(RuntimeError::UnknownOperator(format!("-{}", v.type_name()))),
    }
}

fn unknown_operator(left: &Value, op: InfixOp, right: &Value) -> RuntimeError {
    RuntimeError::UnknownOperator(format!("{} {} {}", left.type_name(), op, right.type_name()))
}

/// Dispatches a (non short-circuiting) binary operator on the operand types.
fn eval_binary(op: InfixOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix(op, *l, *r),
        (Value::Float(l), Value::Float(r)) => eval_float_infix(op, *l, *r),
        (Value::Integer(l), Value::Float(r)) => eval_float_infix(op, *l as f64, *r),
        (Value::Float(l), Value::Integer(r)) => eval_float_infix(op, *l, *r as f64),
        (Value::Boolean(l), Value::Boolean(r)) => match op {
            InfixOp::Eq => Ok(Value::from(l == r)),
            InfixOp::NotEq => Ok(Value::from(l != r)),
            _ => Err(unknown_operator(left, op, right)),
        },
        (Value::String(l), Value::String(r)) => match op {
            InfixOp::Add => {
                let mut s = String::with_capacity(l.len() + r.len());
                s.push_str(l);
                s.push_str(r);
                Ok(Value::from(s.as_str()))
            }
            InfixOp::Eq => Ok(Value::from(l == r)),
            InfixOp::NotEq => Ok(Value::from(l != r)),
            _ => Err(unknown_operator(left, op, right)),
        },
        _ if left.is_same_type(right) => match op {
            InfixOp::Eq => Ok(Value::from(left == right)),
            InfixOp::NotEq => Ok(Value::from(left != right)),
            _ => Err(unknown_operator(left, op, right)),
        },
        _ => Err(RuntimeError::TypeMismatch {
            left: left.type_name(),
            op: op.to_string(),
            right: right.type_name(),
        }),
    }
}

fn eval_integer_infix(op: InfixOp, l: i64, r: i64) -> Result<Value, RuntimeError> {
    let v = match op {
        InfixOp::Add => Value::Integer(l.wrapping_add(r)),
        InfixOp::Sub => Value::Integer(l.wrapping_sub(r)),
        InfixOp::Mul => Value::Integer(l.wrapping_mul(r)),
        InfixOp::Div | InfixOp::FloorDiv | InfixOp::Mod if r == 0 => {
            return Err(RuntimeError::DivisionByZero)
        }
        InfixOp::Div => Value::Integer(l.wrapping_div(r)),
        InfixOp::FloorDiv => {
            let q = l.wrapping_div(r);
            if l.wrapping_rem(r) != 0 && ((l < 0) != (r < 0)) {
                Value::Integer(q - 1)
            } else {
                Value::Integer(q)
            }
        }
        InfixOp::Mod => Value::Integer(l.wrapping_rem(r)),
        InfixOp::Pow => match u32::try_from(r) {
            Ok(exp) => Value::Integer(l.wrapping_pow(exp)),
            Err(_) => Value::Float((l as f64).powf(r as f64)),
        },
        InfixOp::Eq => Value::from(l == r),
        InfixOp::NotEq => Value::from(l != r),
        InfixOp::Less => Value::from(l < r),
        InfixOp::Greater => Value::from(l > r),
        InfixOp::LessEq => Value::from(l <= r),
        InfixOp::GreaterEq => Value::from(l >= r),
        InfixOp::And | InfixOp::Or => {
            return Err(unknown_operator(&Value::Integer(l), op, &Value::Integer(r)))
        }
    };
    Ok(v)
}

fn eval_float_infix(op: InfixOp, l: f64, r: f64) -> Result<Value, RuntimeError> {
    let v = match op {
        InfixOp::Add => Value::Float(l + r),
        InfixOp::Sub => Value::Float(l - r),
        InfixOp::Mul => Value::Float(l * r),
        InfixOp::Div | InfixOp::FloorDiv | InfixOp::Mod if r == 0.0 => {
            return Err(RuntimeError::DivisionByZero)
        }
        InfixOp::Div => Value::Float(l / r),
        InfixOp::FloorDiv => Value::Float((l / r).floor()),
        InfixOp::Mod => Value::Float(l % r),
        InfixOp::Pow => Value::Float(l.powf(r)),
        InfixOp::Eq => Value::from(floats_equal(l, r)),
        InfixOp::NotEq => Value::from(!floats_equal(l, r)),
        InfixOp::Less => Value::from(l < r && !floats_equal(l, r)),
        InfixOp::Greater => Value::from(l > r && !floats_equal(l, r)),
        InfixOp::LessEq => Value::from(l < r || floats_equal(l, r)),
        InfixOp::GreaterEq => Value::from(l > r || floats_equal(l, r)),
        InfixOp::And | InfixOp::Or => {
            return Err(unknown_operator(&Value::Float(l), op, &Value::Float(r)))
        }
    };
    Ok(v)
}

fn eval_index(left: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match (left, index) {
        (Value::Array(items), Value::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or(RuntimeError::IndexOutOfBounds {
                index: *i,
                len: items.len(),
            }),
        (Value::String(s), Value::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::from(c.to_string().as_str()))
            .ok_or(RuntimeError::IndexOutOfBounds {
                index: *i,
                len: s.chars().count(),
            }),
        (Value::Hash(pairs), key) => {
            let hash_key = key
                .hash_key()
                .ok_or_else(|| RuntimeError::UnusableHashKey(key.type_name()))?;
            pairs
                .get(&hash_key)
                .map(|p| p.value.clone())
                .ok_or_else(|| RuntimeError::KeyNotFound(key.to_string()))
        }
        _ => Err(RuntimeError::UnsupportedIndexOperation(format!(
            "{}[{}]",
            left.type_name(),
            index.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval_with_output(input: &str) -> (Value, String) {
        let (prg, errors) = parse(input);
        assert!(errors.is_empty(), "syntax errors: {}", errors);
        let mut out: Vec<u8> = Vec::new();
        let env = Env::new();
        let v = Evaluator::new(&mut out)
            .eval_program(&prg, &env)
            .expect("no macro misuse");
        (v, String::from_utf8(out).expect("error while converting output"))
    }

    fn eval(input: &str) -> Value {
        eval_with_output(input).0
    }

    fn eval_err(input: &str) -> RuntimeError {
        match eval(input) {
            Value::Error(e) => e,
            v => panic!("expected an error for {:?}, got {}", input, v),
        }
    }

    #[test]
    fn integer_arithmetic() {
        let cases = [
            ("5", 5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
            ("-7 / 2", -3),
            ("-7 // 2", -4),
            ("7 // -2", -4),
            ("7 // 2", 3),
            ("7 % 3", 1),
            ("-7 % 3", -1),
            ("2 ** 10", 1024),
            ("2 ** 3 ** 2", 512),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn float_arithmetic() {
        assert_eq!(eval("0.1 + 0.2"), Value::Float(0.3));
        assert_eq!(eval("1 + 0.5"), Value::Float(1.5));
        assert_eq!(eval("7.0 // 2"), Value::Float(3.0));
        assert_eq!(eval("2 ** -1"), Value::Float(0.5));
        assert_eq!(eval("-1.5"), Value::Float(-1.5));
        assert_eq!(eval("0.1 + 0.2 == 0.3"), TRUE);
        assert_eq!(eval("0.3 <= 0.1 + 0.2"), TRUE);
        assert_eq!(eval("0.3 < 0.1 + 0.2"), FALSE);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval_err("1 / 0"), RuntimeError::DivisionByZero);
        assert_eq!(eval_err("1 % 0"), RuntimeError::DivisionByZero);
        assert_eq!(eval_err("1.0 // 0"), RuntimeError::DivisionByZero);
        assert_eq!(eval_err("1.0 / 0.0"), RuntimeError::DivisionByZero);
        match eval("1.0 / 0.0000000001") {
            Value::Float(f) if f > 1e9 => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn boolean_expressions() {
        let cases = [
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 <= 1", true),
            ("2 >= 3", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("true == true", true),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("(1 > 2) == true", false),
            ("\"a\" == \"a\"", true),
            ("\"a\" != \"b\"", true),
            ("null == null", true),
            ("[1, 2] == [1, 2]", true),
            ("true && false", false),
            ("0 && \"x\"", true),
            ("null || false", false),
            ("false || 1", true),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::from(expected), "input: {}", input);
        }
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(eval("false && undefined_name"), FALSE);
        assert_eq!(eval("true || undefined_name"), TRUE);
    }

    #[test]
    fn bang_operator() {
        let cases = [
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!!true", true),
            ("!!false", false),
            ("!!5", true),
            ("!null", true),
            ("!0", false),
            ("!\"\"", false),
            ("![]", false),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::from(expected), "input: {}", input);
        }
    }

    #[test]
    fn if_else_expressions() {
        let cases = [
            ("if (true) { 10 }", Value::Integer(10)),
            ("if (false) { 10 }", NULL),
            ("if (1) { 10 }", Value::Integer(10)),
            ("if (0) { 10 }", Value::Integer(10)),
            ("if (1 < 2) { 10 } else { 20 }", Value::Integer(10)),
            ("if (1 > 2) { 10 } else { 20 }", Value::Integer(20)),
            ("if (1 > 2) { 10 } else if (2 > 1) { 15 } else { 20 }", Value::Integer(15)),
            ("if (false) { 10 } else if (null) { 15 }", NULL),
            ("if (false) { 10 } else if (false) { 15 } else { 20 }", Value::Integer(20)),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn return_statements() {
        let cases = [
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
            ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", 10),
            ("let f = fn(x) { return x; x + 10; }; f(10);", 10),
            ("let f = fn(x) { let result = x + 10; return result; return 10; }; f(10);", 20),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn return_does_not_leak_out_of_call() {
        assert_eq!(
            eval("let f = fn() { return 1; }; let g = fn() { f(); 2 }; g()"),
            Value::Integer(2)
        );
    }

    #[test]
    fn return_inside_operand_leaves_function() {
        let bodies = [
            "let a = 1 + if (true) { return 10 } else { 0 }; 99",
            "let a = [if (true) { return 10 }]; 99",
            "if (if (true) { return 10 }) { 1 } else { 2 }; 99",
            "switch (if (true) { return 10 }) { case 1: 1 }; 99",
            "switch (1) { case if (true) { return 10 }: 1 }; 99",
            "{ \"k\": if (true) { return 10 } }; 99",
            "{ if (true) { return 10 }: 1 }; 99",
            "[1, 2][if (true) { return 10 }]; 99",
            "-if (true) { return 10 }; 99",
            "true && if (true) { return 10 }; 99",
            "while (if (true) { return 10 }) { }; 99",
            "let x = 0; x = x + if (true) { return 10 }; 99",
            "for (let i = if (true) { return 10 }; i < 1; i++) { }; 99",
            "len(if (true) { return 10 }); 99",
        ];
        for body in bodies {
            let input = format!("let f = fn() {{ {} }}; f()", body);
            assert_eq!(eval(&input), Value::Integer(10), "input: {}", input);
        }
    }

    #[test]
    fn return_inside_argument_skips_call() -> Result<(), String> {
        let (v, out) =
            eval_with_output("let f = fn() { puts(if (true) { return 10 }); 99 }; f()");
        match v {
            Value::Integer(10) => (),
            r => return Err(format!("unexpected output: {:?}", r)),
        }
        assert_eq!(out, "");
        Ok(())
    }

    #[test]
    fn error_kinds() {
        let cases = [
            ("5 + true;", ErrorKind::TypeMismatch),
            ("5 + true; 5;", ErrorKind::TypeMismatch),
            ("1 == true", ErrorKind::TypeMismatch),
            ("-true", ErrorKind::UnknownOperator),
            ("true + false;", ErrorKind::UnknownOperator),
            ("\"a\" - \"b\"", ErrorKind::UnknownOperator),
            ("5; true + false; 5", ErrorKind::UnknownOperator),
            ("if (10 > 1) { true + false; }", ErrorKind::UnknownOperator),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                ErrorKind::UnknownOperator,
            ),
            ("foobar", ErrorKind::UndefinedIdentifier),
            ("x = 1", ErrorKind::UndefinedIdentifier),
            ("fn(x) { x }(1, 2)", ErrorKind::ArityMismatch),
            ("5()", ErrorKind::NotCallable),
            ("{[1]: 2}", ErrorKind::UnusableHashKey),
            ("{fn(x) { x }: \"Monkey\"}[fn(x) { x }]", ErrorKind::UnusableHashKey),
            ("{1: 2}[[1]]", ErrorKind::UnusableHashKey),
            ("{\"a\": 1}[\"b\"]", ErrorKind::KeyNotFound),
            ("[1, 2, 3][5]", ErrorKind::IndexOutOfBounds),
            ("[1, 2, 3][-1]", ErrorKind::IndexOutOfBounds),
            ("1[0]", ErrorKind::UnsupportedIndexOperation),
            ("[1][\"a\"]", ErrorKind::UnsupportedIndexOperation),
            ("const c = 1; c = 2", ErrorKind::ConstReassignment),
            ("const c = 1; let c = 2", ErrorKind::ConstReassignment),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_err(input).kind(), expected, "input: {}", input);
        }
    }

    #[test]
    fn error_messages() {
        assert_eq!(eval_err("5 + true").to_string(), "type mismatch: integer + boolean");
        assert_eq!(eval_err("-true").to_string(), "unknown operator: -boolean");
        assert_eq!(eval_err("foobar").to_string(), "identifier not found: foobar");
    }

    #[test]
    fn let_statements() {
        let cases = [
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
            ("let a = 1; let a = 2; a", 2),
            ("const a = 3; a", 3),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn assignment_forms() {
        let cases = [
            ("let a = 1; a = 5; a", 5),
            ("let a = 1; a += 5; a", 6),
            ("let a = 10; a -= 3; a", 7),
            ("let a = 3; a *= 3; a", 9),
            ("let a = 9; a /= 2; a", 4),
            ("let a = -9; a //= 2; a", -5),
            ("let a = 1; a++; a++; a", 3),
            ("let a = 1; a--; a", 0),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn function_object() {
        match eval("fn(x) { x + 2; };") {
            Value::Function(f) => {
                assert_eq!(f.params, vec!["x".to_string()]);
                assert_eq!(f.body.to_string(), "{ (x + 2) }");
            }
            v => panic!("unexpected output: {:?}", v),
        }
    }

    #[test]
    fn function_application() {
        let cases = [
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("fn(x) { x; }(5)", 5),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn function_without_statements_yields_null() {
        assert_eq!(eval("fn() { }()"), NULL);
    }

    #[test]
    fn arity_mismatch_names_function() {
        for input in ["let f = fn(a) { a }; f()", "let f = fn(a) { a }; f(1, 2)"] {
            match eval_err(input) {
                RuntimeError::ArityMismatch {
                    callee, expected: 1, ..
                } if callee == "f" => (),
                e => panic!("unexpected output: {:?}", e),
            }
        }
    }

    #[test]
    fn closures() {
        let input = r#"
            let new_adder = fn(x) { fn(y) { x + y }; };
            let add_two = new_adder(2);
            add_two(2);
        "#;
        assert_eq!(eval(input), Value::Integer(4));
    }

    #[test]
    fn closures_capture_by_reference() {
        let input = r#"
            let counter = fn() { let c = 0; fn() { c = c + 1; c } }();
            counter();
            counter();
        "#;
        assert_eq!(eval(input), Value::Integer(2));
    }

    #[test]
    fn closures_see_later_outer_mutation() {
        assert_eq!(
            eval("let x = 1; let get = fn() { x }; x = 5; get()"),
            Value::Integer(5)
        );
    }

    #[test]
    fn recursion() {
        let input = r#"
            let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } };
            fib(15)
        "#;
        assert_eq!(eval(input), Value::Integer(610));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(eval("\"Hello\" + \" \" + \"World!\""), Value::from("Hello World!"));
    }

    #[test]
    fn string_index() {
        assert_eq!(eval("\"abc\"[1]"), Value::from("b"));
        assert_eq!(eval_err("\"abc\"[3]").kind(), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn builtin_functions() {
        assert_eq!(eval("len(\"four\")"), Value::Integer(4));
        assert_eq!(eval("len([1, 2, 3])"), Value::Integer(3));
        assert_eq!(
            eval("rest(push([1, 2], 3))"),
            Value::from(vec![Value::Integer(2), Value::Integer(3)])
        );
        assert_eq!(eval_err("len(1)").kind(), ErrorKind::UnsupportedArgument);
    }

    #[test]
    fn builtins_can_be_shadowed() {
        assert_eq!(eval("let len = fn(x) { 42 }; len([])"), Value::Integer(42));
    }

    #[test]
    fn puts_writes_to_output() {
        let (v, out) = eval_with_output("puts(\"hello\", 1 + 2)");
        assert_eq!(v, NULL);
        assert_eq!(out, "hello\n3\n");
    }

    #[test]
    fn array_literals_and_indexing() {
        assert_eq!(
            eval("[1, 2 * 2, 3 + 3]"),
            Value::from(vec![Value::Integer(1), Value::Integer(4), Value::Integer(6)])
        );
        let cases = [
            ("[1, 2, 3][0]", 1),
            ("[1, 2, 3][2]", 3),
            ("let i = 0; [1][i];", 1),
            ("[1, 2, 3][1 + 1];", 3),
            ("let my_array = [1, 2, 3]; my_array[0] + my_array[1] + my_array[2];", 6),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn hash_literals() {
        let input = r#"
            let two = "two";
            {
                "one": 10 - 9,
                two: 1 + 1,
                "thr" + "ee": 6 / 2,
                4: 4,
                true: 5,
                false: 6
            }
        "#;
        match eval(input) {
            Value::Hash(pairs) => {
                let expected = [
                    (Value::from("one"), 1),
                    (Value::from("two"), 2),
                    (Value::from("three"), 3),
                    (Value::Integer(4), 4),
                    (TRUE, 5),
                    (FALSE, 6),
                ];
                assert_eq!(pairs.len(), expected.len());
                for (key, value) in expected {
                    let hash_key = key.hash_key().expect("hashable key");
                    assert_eq!(pairs[&hash_key].value, Value::Integer(value));
                }
            }
            v => panic!("unexpected output: {:?}", v),
        }
    }

    #[test]
    fn hash_equality_ignores_insertion_order() {
        assert_eq!(
            eval("{1: \"a\", true: \"b\", \"1\": \"c\"} == {\"1\": \"c\", 1: \"a\", true: \"b\"}"),
            TRUE
        );
        assert_eq!(eval("len({1: 1, true: 2, \"1\": 3})"), Value::Integer(3));
    }

    #[test]
    fn hash_index() {
        let cases = [
            ("{\"foo\": 5}[\"foo\"]", 5),
            ("let key = \"foo\"; {\"foo\": 5}[key]", 5),
            ("{5: 5}[5]", 5),
            ("{true: 5}[true]", 5),
            ("{false: 5}[false]", 5),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            eval("let i = 0; let sum = 0; while (i < 5) { sum += i; i++ } sum"),
            Value::Integer(10)
        );
        assert_eq!(eval("while (false) { 1 }"), NULL);
    }

    #[test]
    fn return_inside_loop() {
        assert_eq!(
            eval(
                "let f = fn() { let i = 0; while (true) { if (i == 3) { return i; } i++; } }; f()"
            ),
            Value::Integer(3)
        );
    }

    #[test]
    fn return_from_nested_loops() {
        let input = "let f = fn() { \
                     for (let i = 0; i < 5; i++) { \
                     let j = 0; \
                     while (j < 5) { if (i * j == 6) { return [i, j] } j++ } \
                     } \
                     }; f()";
        assert_eq!(
            eval(input),
            Value::from(vec![Value::Integer(2), Value::Integer(3)])
        );
    }

    #[test]
    fn error_inside_loop_stops_it() {
        let (v, out) = eval_with_output(
            "let i = 0; while (i < 3) { i++; puts(i); if (i == 2) { i + true } }",
        );
        match v {
            Value::Error(e) if e.kind() == ErrorKind::TypeMismatch => (),
            r => panic!("unexpected output: {:?}", r),
        }
        assert_eq!(out, "1\n2\n");
        assert_eq!(
            eval_err("for (let i = 0; i < 3; i = i + true) { }").kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            eval_err("for (let i = 0; true < false; i++) { }").kind(),
            ErrorKind::UnknownOperator
        );
    }

    #[test]
    fn for_loop() {
        assert_eq!(
            eval("let sum = 0; for (let i = 0; i < 5; i++) { sum += i } sum"),
            Value::Integer(10)
        );
    }

    #[test]
    fn for_loop_variable_does_not_leak() {
        assert_eq!(
            eval_err("for (let i = 0; i < 2; i++) { } i").kind(),
            ErrorKind::UndefinedIdentifier
        );
    }

    #[test]
    fn loop_body_gets_fresh_scope_per_iteration() {
        assert_eq!(
            eval("let n = 0; for (let i = 0; i < 3; i++) { const x = i; n += x } n"),
            Value::Integer(3)
        );
    }

    #[test]
    fn switch_expression() {
        let cases = [
            ("switch (2) { case 1: 10 case 2: 20 default: 30 }", Value::Integer(20)),
            ("switch (5) { case 1: 10 case 2: 20 default: 30 }", Value::Integer(30)),
            ("switch (5) { case 1: 10 }", NULL),
            ("switch (\"b\") { case 1: 10 case \"b\": 20 }", Value::Integer(20)),
            ("switch (1 + 1) { case 2: let x = 3; x * 2 case 3: 0 }", Value::Integer(6)),
        ];
        for (input, expected) in cases {
            assert_eq!(eval(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn quote_requires_one_argument() {
        assert_eq!(eval_err("quote(1, 2)").kind(), ErrorKind::ArityMismatch);
    }
}
