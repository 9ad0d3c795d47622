use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostics::{RuntimeError, RuntimeResult};
use crate::value::Value;

/// One lexical scope chain. Frames are shared: a closure keeps its defining
/// frame alive by holding another handle to it, so cloning an `Environment`
/// clones the handle, not the bindings.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

struct Frame {
    store: HashMap<String, Value>,
    outer: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            store: HashMap::new(),
            outer: None,
        })))
    }

    /// A fresh frame whose lookups fall through to `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            store: HashMap::new(),
            outer: Some(outer.clone()),
        })))
    }

    /// Declares `name` in this frame only. Redeclaring in the same frame is
    /// a fault; shadowing a name from an enclosing frame is legal.
    pub fn init(&self, name: &str, value: Value) -> RuntimeResult<()> {
        let mut frame = self.0.borrow_mut();
        if frame.store.contains_key(name) {
            return Err(RuntimeError::Redeclaration {
                name: name.to_string(),
            });
        }
        frame.store.insert(name.to_string(), value);
        Ok(())
    }

    /// Reassigns `name` in whichever frame owns it.
    pub fn set(&self, name: &str, value: Value) -> RuntimeResult<()> {
        let mut frame = self.0.borrow_mut();
        if frame.store.contains_key(name) {
            frame.store.insert(name.to_string(), value);
            return Ok(());
        }
        match &frame.outer {
            Some(outer) => outer.set(name, value),
            None => Err(RuntimeError::UndefinedName {
                name: name.to_string(),
            }),
        }
    }

    /// Resolves `name` through the chain; a miss is always a fault.
    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        let frame = self.0.borrow();
        if let Some(value) = frame.store.get(name) {
            return Ok(value.clone());
        }
        match &frame.outer {
            Some(outer) => outer.get(name),
            None => Err(RuntimeError::UndefinedName {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rejects_redeclaration_in_same_frame() {
        let env = Environment::new();
        env.init("key", Value::Integer(25)).expect("first init");
        assert!(matches!(
            env.init("key", Value::Integer(30)),
            Err(RuntimeError::Redeclaration { .. })
        ));
    }

    #[test]
    fn inner_frame_shadows_without_fault() {
        let outer = Environment::new();
        outer.init("key", Value::Integer(25)).expect("outer init");

        let inner = Environment::enclosed(&outer);
        inner.init("key", Value::Integer(50)).expect("shadowing init");
        assert!(matches!(inner.get("key"), Ok(Value::Integer(50))));
        assert!(matches!(outer.get("key"), Ok(Value::Integer(25))));
    }

    #[test]
    fn set_walks_to_the_owning_frame() {
        let outer = Environment::new();
        outer.init("key", Value::Integer(1)).expect("init");
        let inner = Environment::enclosed(&outer);
        inner.set("key", Value::Integer(2)).expect("set through chain");
        assert!(matches!(outer.get("key"), Ok(Value::Integer(2))));
    }

    #[test]
    fn get_and_set_fault_on_missing_names() {
        let env = Environment::new();
        assert!(matches!(
            env.get("ghost"),
            Err(RuntimeError::UndefinedName { .. })
        ));
        assert!(matches!(
            env.set("ghost", Value::Integer(0)),
            Err(RuntimeError::UndefinedName { .. })
        ));
    }
}
