//! Runtime values.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Block, Ident, Node};
use crate::builtins::Builtin;
use crate::env::Env;
use crate::eval::RuntimeError;

/// Two floats closer than this compare equal.
pub const EPSILON: f64 = 1e-9;

pub const NULL: Value = Value::Null;
pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Hash(Rc<HashMap<HashKey, HashPair>>),
    Function(Rc<Function>),
    Builtin(Builtin),
    Error(RuntimeError),
    /// A `return` on its way up to the enclosing call.
    Return(Box<Value>),
    Quote(Rc<Node>),
    Macro(Rc<Macro>),
}

/// Digest of a value usable as a hash map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
}

/// Hash map entry.  The original key is kept so maps can be printed and iterated.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Values that can serve as hash map keys.
pub trait Hashable {
    fn hash_key(&self) -> Option<HashKey>;
}

impl Hashable for Value {
    fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey::Integer(*n)),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::String(s) => Some(HashKey::String(s.clone())),
            _ => None,
        }
    }
}

/// User function closing over the environment it was defined in.
pub struct Function {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Block,
    pub env: Rc<Env>,
}

pub struct Macro {
    pub params: Vec<Ident>,
    pub body: Block,
    pub env: Rc<Env>,
}

// The environment is left out: it may contain the function itself.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macro")
            .field("params", &self.params)
            .finish()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        if b {
            TRUE
        } else {
            FALSE
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(items))
    }
}

impl Value {
    /// `null` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Error(_) => "error",
            Value::Return(_) => "return",
            Value::Quote(_) => "quote",
            Value::Macro(_) => "macro",
        }
    }

    pub fn is_same_type(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

pub fn floats_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => floats_equal(*a, *b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::Quote(a), Value::Quote(b)) => a == b,
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "\"{}\"", s),
        v => write!(f, "{}", v),
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Ident]) -> fmt::Result {
    write!(f, "({})", params.join(", "))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_nested(f, item)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_nested(f, &pair.key)?;
                    write!(f, ": ")?;
                    write_nested(f, &pair.value)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => {
                write!(f, "fn")?;
                write_params(f, &func.params)?;
                write!(f, " {}", func.body)
            }
            Value::Builtin(b) => write!(f, "builtin function {}", b.name),
            Value::Error(e) => write!(f, "ERROR: {}", e),
            Value::Return(v) => write!(f, "{}", v),
            Value::Quote(node) => write!(f, "QUOTE({})", node),
            Value::Macro(m) => {
                write!(f, "macro")?;
                write_params(f, &m.params)?;
                write!(f, " {}", m.body)
            }
        }
    }
}
