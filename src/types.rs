use crate::environment::Environment;
use crate::evaluator::EvalResult;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A symbolic expression. This one enum is both the AST the parser builds
/// and the value the evaluator returns, so quoted code is directly usable as
/// list data.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Symbol(String),  // e.g. +, variable-name, quote
    Integer(i64),    // 42
    Float(f64),      // 4.5
    Boolean(bool),   // #t / #f, reached through the default environment
    List(Vec<Sexpr>),
    Procedure(Procedure),
    /// The "no value" result: a cond with no matching clause, a passed
    /// assert, a repeated import. Distinct from #f and from ().
    Unit,
}

impl Sexpr {
    pub fn type_name(&self) -> &'static str {
        match self {
            Sexpr::Symbol(_) => "symbol",
            Sexpr::Integer(_) => "integer",
            Sexpr::Float(_) => "float",
            Sexpr::Boolean(_) => "boolean",
            Sexpr::List(_) => "list",
            Sexpr::Procedure(_) => "procedure",
            Sexpr::Unit => "unit",
        }
    }
}

// Display renders an expression back to source-like text without evaluating
// anything; error messages use it for quoting forms back at the user.
impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::Integer(i) => write!(f, "{}", i),
            Sexpr::Float(n) => write!(f, "{}", format_float(*n)),
            Sexpr::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Sexpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Sexpr::Procedure(Procedure::Primitive(_, name)) => {
                write!(f, "#<primitive:{}>", name)
            }
            Sexpr::Procedure(Procedure::Lambda(lambda)) => {
                write!(f, "#<lambda ({})>", lambda.params.join(" "))
            }
            Sexpr::Unit => write!(f, "#<unspecified>"),
        }
    }
}

/// Floats always carry a decimal point so they stay distinguishable from
/// integers in rendered output (19.0, not 19).
pub(crate) fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

pub type PrimitiveFunc = fn(Vec<Sexpr>) -> EvalResult;

#[derive(Clone)]
pub enum Procedure {
    /// A host-provided callable plus its name for display. Exempt from the
    /// closure arity check; primitives validate their own arguments.
    Primitive(PrimitiveFunc, String),
    /// A user-defined closure.
    Lambda(Rc<Lambda>),
}

/// Parameter symbols, an unevaluated body, and the environment that was
/// active at definition time, captured by reference.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Sexpr,
    pub env: Rc<RefCell<Environment>>,
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Primitive(_, name) => write!(f, "Primitive({})", name),
            Procedure::Lambda(lambda) => write!(f, "Lambda({})", lambda.params.join(" ")),
        }
    }
}

// Function pointers compare by name; lambdas compare by identity. Good
// enough for tests and for the evaluator's own needs.
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Procedure::Primitive(_, n1), Procedure::Primitive(_, n2)) => n1 == n2,
            (Procedure::Lambda(l1), Procedure::Lambda(l2)) => Rc::ptr_eq(l1, l2),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_atoms() {
        assert_eq!(Sexpr::Integer(5).to_string(), "5");
        assert_eq!(Sexpr::Float(4.5).to_string(), "4.5");
        assert_eq!(Sexpr::Float(19.0).to_string(), "19.0");
        assert_eq!(Sexpr::Boolean(true).to_string(), "#t");
        assert_eq!(Sexpr::Boolean(false).to_string(), "#f");
        assert_eq!(Sexpr::Symbol("merge-sort".to_string()).to_string(), "merge-sort");
        assert_eq!(Sexpr::Unit.to_string(), "#<unspecified>");
    }

    #[test]
    fn test_display_lists() {
        let list = Sexpr::List(vec![
            Sexpr::Symbol("+".to_string()),
            Sexpr::Integer(1),
            Sexpr::List(vec![Sexpr::Symbol("quote".to_string()), Sexpr::List(vec![])]),
        ]);
        assert_eq!(list.to_string(), "(+ 1 (quote ()))");
        assert_eq!(Sexpr::List(vec![]).to_string(), "()");
    }
}
