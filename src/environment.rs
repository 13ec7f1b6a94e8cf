use crate::primitives;
use crate::types::{PrimitiveFunc, Sexpr};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

// --- Environment Error ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("Unbound variable \"{0}\"")]
    UnboundVariable(String),
    #[error("Redefinition of \"{0}\" is not allowed")]
    Redefinition(String),
}

// --- Environment Definition ---

/// A frame of the lexical scope chain. Shared ownership through
/// `Rc<RefCell<...>>` lets closures keep their defining environment alive
/// and lets child frames link outward without copying.
#[derive(Debug, Clone)]
pub struct Environment {
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Sexpr>,
    // Filenames already imported through *this* frame; `import` is a no-op
    // for names recorded here.
    imports: HashSet<String>,
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
            imports: HashSet::new(),
        }))
    }

    /// Factory for a fresh default environment: the fixed builtins plus the
    /// boolean literals. Every call produces an independent instance, so
    /// interpreter sessions never share state.
    pub fn new_default() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new();
        {
            let mut env = env_ptr.borrow_mut();
            // basic operations
            env.add_primitive("+", primitives::prim_add);
            env.add_primitive("-", primitives::prim_sub);
            env.add_primitive("*", primitives::prim_mul);
            env.add_primitive("/", primitives::prim_div);
            env.add_primitive(">", primitives::prim_greater_than);
            env.add_primitive("<", primitives::prim_less_than);
            env.add_primitive("=", primitives::prim_equals);
            env.add_primitive("eq?", primitives::prim_is_eq);
            // math
            env.add_primitive("ceiling", primitives::prim_ceiling);
            env.add_primitive("flooring", primitives::prim_flooring);
            // list basics
            env.add_primitive("car", primitives::prim_car);
            env.add_primitive("cdr", primitives::prim_cdr);
            env.add_primitive("cons", primitives::prim_cons);
            // exec flow
            env.add_primitive("begin", primitives::prim_begin);
            // type predicates
            env.add_primitive("list?", primitives::prim_is_list);
            env.add_primitive("boolean?", primitives::prim_is_boolean);
            // boolean literals resolve through the environment
            env.bind("#t".to_string(), Sexpr::Boolean(true));
            env.bind("#f".to_string(), Sexpr::Boolean(false));
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
            imports: HashSet::new(),
        }))
    }

    /// Looks a symbol up, innermost frame first, walking the outer chain.
    pub fn find(&self, name: &str) -> Result<Sexpr, EnvError> {
        if let Some(value) = self.bindings.get(name) {
            Ok(value.clone())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().find(name),
                None => Err(EnvError::UnboundVariable(name.to_string())),
            }
        }
    }

    /// Binds a symbol in the *current* frame only. Redefining a name that
    /// already exists in this frame is an error; shadowing an outer binding
    /// from a child frame is not.
    pub fn define(&mut self, name: String, value: Sexpr) -> Result<(), EnvError> {
        if self.bindings.contains_key(&name) {
            return Err(EnvError::Redefinition(name));
        }
        self.bindings.insert(name, value);
        Ok(())
    }

    /// Unchecked insert, used for parameter binding and builtin
    /// registration.
    pub fn bind(&mut self, name: String, value: Sexpr) {
        self.bindings.insert(name, value);
    }

    /// Whether a symbol is bound in the current frame (outer frames are not
    /// consulted).
    pub fn is_defined(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn is_imported(&self, filename: &str) -> bool {
        self.imports.contains(filename)
    }

    pub fn record_import(&mut self, filename: String) {
        self.imports.insert(filename);
    }

    fn add_primitive(&mut self, name: &str, func: PrimitiveFunc) {
        self.bind(
            name.to_string(),
            Sexpr::Procedure(crate::types::Procedure::Primitive(func, name.to_string())),
        );
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.bindings.keys() {
            identifiers.insert(identifier.to_string());
        }
        match &self.outer {
            Some(outer_env_ptr) => outer_env_ptr.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Gets every identifier visible from this environment (used for REPL
    /// completion).
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}
