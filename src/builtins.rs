//! Functions available to every program without being defined.

use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::eval::RuntimeError;
use crate::value::{Value, NULL};

pub type BuiltinFn = fn(&[Value], &mut dyn Write) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

const BUILTINS: [Builtin; 8] = [
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "last",
        func: builtin_last,
    },
    Builtin {
        name: "rest",
        func: builtin_rest,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
    Builtin {
        name: "puts",
        func: builtin_puts,
    },
    Builtin {
        name: "keys",
        func: builtin_keys,
    },
    Builtin {
        name: "type",
        func: builtin_type,
    },
];

/// Finds the builtin called `name`.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

fn check_arity(name: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::ArityMismatch {
            callee: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

fn unsupported(builtin: &'static str, arg: &Value) -> RuntimeError {
    RuntimeError::UnsupportedArgument {
        builtin,
        got: arg.type_name(),
    }
}

fn array_arg<'v>(
    name: &'static str,
    args: &'v [Value],
) -> Result<&'v Rc<Vec<Value>>, RuntimeError> {
    match &args[0] {
        Value::Array(items) => Ok(items),
        other => Err(unsupported(name, other)),
    }
}

fn builtin_len(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("len", args, 1)?;
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Hash(pairs) => pairs.len(),
        other => return Err(unsupported("len", other)),
    };
    Ok(Value::Integer(len as i64))
}

fn builtin_first(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("first", args, 1)?;
    let items = array_arg("first", args)?;
    Ok(items.first().cloned().unwrap_or(NULL))
}

fn builtin_last(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("last", args, 1)?;
    let items = array_arg("last", args)?;
    Ok(items.last().cloned().unwrap_or(NULL))
}

fn builtin_rest(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("rest", args, 1)?;
    let items = array_arg("rest", args)?;
    if items.is_empty() {
        Ok(NULL)
    } else {
        Ok(Value::from(items[1..].to_vec()))
    }
}

fn builtin_push(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("push", args, 2)?;
    let items = array_arg("push", args)?;
    let mut pushed = Vec::with_capacity(items.len() + 1);
    pushed.extend(items.iter().cloned());
    pushed.push(args[1].clone());
    Ok(Value::from(pushed))
}

fn builtin_puts(args: &[Value], out: &mut dyn Write) -> Result<Value, RuntimeError> {
    for arg in args {
        writeln!(out, "{}", arg).map_err(|e| RuntimeError::Output(e.to_string()))?;
    }
    Ok(NULL)
}

fn builtin_keys(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("keys", args, 1)?;
    match &args[0] {
        Value::Hash(pairs) => Ok(Value::from(
            pairs.values().map(|p| p.key.clone()).collect::<Vec<_>>(),
        )),
        other => Err(unsupported("keys", other)),
    }
}

fn builtin_type(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    check_arity("type", args, 1)?;
    Ok(Value::from(args[0].type_name()))
}
