//! Lexical scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::eval::RuntimeError;
use crate::value::Value;

struct Binding {
    value: Value,
    constant: bool,
}

/// A scope mapping names to values, chained to the scope that encloses it.
///
/// Scopes are shared through `Rc`: a closure keeps the scope it was defined
/// in alive, so later assignments in that scope are visible to it.
#[derive(Default)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Binding>>,
}

impl Env {
    pub fn new() -> Rc<Env> {
        Rc::new(Env::default())
    }

    /// Creates an empty scope nested in `parent`.
    pub fn enclosed_by(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent.clone()),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Looks `name` up in this scope, then in the enclosing ones.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(b) => Some(b.value.clone()),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        self.bind(name, value, false)
    }

    /// Like [`Env::define`] but the binding can never change afterwards.
    pub fn define_const(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        self.bind(name, value, true)
    }

    fn bind(&self, name: &str, value: Value, constant: bool) -> Result<(), RuntimeError> {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(existing) = bindings.get(name) {
            if existing.constant {
                return Err(RuntimeError::ConstReassignment(name.to_string()));
            }
        }
        bindings.insert(name.to_string(), Binding { value, constant });
        Ok(())
    }

    /// Updates the binding of `name` in the scope that defines it.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            if binding.constant {
                return Err(RuntimeError::ConstReassignment(name.to_string()));
            }
            binding.value = value;
            return Ok(());
        }
        match self.parent.as_ref() {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::UndefinedIdentifier(name.to_string())),
        }
    }

    /// Names bound directly in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

// Bindings may hold closures referring back to this scope, so only names are shown.
impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("names", &self.names())
            .field("parent", &self.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let outer = Env::new();
        outer.define("a", Value::Integer(1)).unwrap();
        let inner = Env::enclosed_by(&outer);
        assert_eq!(inner.get("a"), Some(Value::Integer(1)));
        assert_eq!(inner.get("b"), None);
    }

    #[test]
    fn define_shadows_outer_binding() {
        let outer = Env::new();
        outer.define("a", Value::Integer(1)).unwrap();
        let inner = Env::enclosed_by(&outer);
        inner.define("a", Value::Integer(2)).unwrap();
        assert_eq!(inner.get("a"), Some(Value::Integer(2)));
        assert_eq!(outer.get("a"), Some(Value::Integer(1)));
    }

    #[test]
    fn assign_updates_defining_scope() {
        let outer = Env::new();
        outer.define("a", Value::Integer(1)).unwrap();
        let inner = Env::enclosed_by(&outer);
        inner.assign("a", Value::Integer(5)).unwrap();
        assert_eq!(outer.get("a"), Some(Value::Integer(5)));
        assert_eq!(inner.names(), Vec::<String>::new());
    }

    #[test]
    fn assign_to_unknown_name() {
        let env = Env::new();
        match env.assign("nope", Value::Null) {
            Err(RuntimeError::UndefinedIdentifier(name)) if name == "nope" => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn constants_cannot_change() {
        let outer = Env::new();
        outer.define_const("c", Value::Integer(1)).unwrap();
        let inner = Env::enclosed_by(&outer);
        assert_eq!(
            inner.assign("c", Value::Integer(2)),
            Err(RuntimeError::ConstReassignment("c".to_string()))
        );
        assert_eq!(
            outer.define("c", Value::Integer(2)),
            Err(RuntimeError::ConstReassignment("c".to_string()))
        );
        // Shadowing in a nested scope is still a new binding.
        assert_eq!(inner.define("c", Value::Integer(3)), Ok(()));
        assert_eq!(outer.get("c"), Some(Value::Integer(1)));
    }
}
