use crate::environment::{EnvError, Environment};
use crate::parser::{ParseError, parse_str};
use crate::types::{Lambda, Procedure, Sexpr};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::rc::Rc;
use thiserror::Error;

// --- Evaluation Error ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Env(#[from] EnvError),
    // import re-runs the whole pipeline, so parse failures surface here too
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Expected a procedure, got: {0}")]
    NotAProcedure(String),
    #[error("Expected a symbol, got: {0}")]
    NotASymbol(String),
    #[error("Expected {expected} params for '{name}', {given} given")]
    ArityMismatch {
        name: String,
        expected: usize,
        given: usize,
    },
    #[error("Invalid arguments - {0}")]
    InvalidArguments(String),
    #[error("Invalid special form - {0}")]
    InvalidSpecialForm(String),
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),
    #[error("Failed to import '{0}': {1}")]
    ImportFailed(String, String),
}

// Result type alias for convenience
pub type EvalResult<T = Sexpr> = Result<T, EvalError>;

// --- Evaluate Function ---

/// Evaluates an expression within the given environment.
///
/// Evaluation recurses on the host call stack; there is no tail-call
/// optimization, so Lisp-level recursion depth is bounded by host stack
/// depth.
pub fn evaluate(expr: Sexpr, env: Rc<RefCell<Environment>>) -> EvalResult {
    match expr {
        // Variable reference
        Sexpr::Symbol(name) => Ok(env.borrow().find(&name)?),
        // Special forms and procedure application
        Sexpr::List(elements) => evaluate_combination(elements, env),
        // Everything else is a constant literal
        other => Ok(other),
    }
}

/// Runs the whole pipeline against a source string: tokenize, parse one
/// top-level expression, evaluate it.
pub fn evaluate_source(input: &str, env: Rc<RefCell<Environment>>) -> EvalResult {
    let expr = parse_str(input)?;
    evaluate(expr, env)
}

/// The keywords that override ordinary evaluate-then-apply dispatch.
pub fn special_form_identifiers() -> HashSet<String> {
    [
        "quote", "if", "or", "and", "cond", "define", "lambda", "assert", "import",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn evaluate_combination(elements: Vec<Sexpr>, env: Rc<RefCell<Environment>>) -> EvalResult {
    let Some((first, rest)) = elements.split_first() else {
        return Err(EvalError::InvalidSpecialForm(
            "cannot evaluate an empty combination".to_string(),
        ));
    };

    if let Sexpr::Symbol(name) = first {
        match name.as_str() {
            "quote" => return evaluate_quote(rest),
            "if" => return evaluate_if(rest, env),
            "or" => return evaluate_or(rest, env),
            "and" => return evaluate_and(rest, env),
            "cond" => return evaluate_cond(rest, env),
            "define" => return evaluate_define(rest, env),
            "lambda" => return evaluate_lambda(rest, env),
            "assert" => return evaluate_assert(rest, env),
            "import" => return evaluate_import(rest, env),
            _ => {}
        }
    }
    evaluate_procedure(first, rest, env)
}

/// Truthiness: #f, zero (either flavor), the empty list and the no-value
/// marker are falsy; everything else is truthy.
fn is_truthy(value: &Sexpr) -> bool {
    match value {
        Sexpr::Boolean(b) => *b,
        Sexpr::Integer(i) => *i != 0,
        Sexpr::Float(f) => *f != 0.0,
        Sexpr::List(items) => !items.is_empty(),
        Sexpr::Unit => false,
        Sexpr::Symbol(_) | Sexpr::Procedure(_) => true,
    }
}

fn evaluate_quote(operands: &[Sexpr]) -> EvalResult {
    if let [operand] = operands {
        Ok(operand.clone())
    } else {
        Err(EvalError::InvalidSpecialForm(
            "quote expects exactly one operand".to_string(),
        ))
    }
}

fn evaluate_if(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    if let [test, consequent, alternate] = operands {
        let test_result = evaluate(test.clone(), env.clone())?;
        // exactly one branch gets evaluated
        if is_truthy(&test_result) {
            evaluate(consequent.clone(), env)
        } else {
            evaluate(alternate.clone(), env)
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            "if expects a test, a consequent and an alternate".to_string(),
        ))
    }
}

/// Short-circuits only when the first operand is *identically* the boolean
/// true value. Any other result, truthy or not, falls through to the second
/// operand, so `(or 5 10)` is `10`.
fn evaluate_or(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    if let [first, second] = operands {
        let value = evaluate(first.clone(), env.clone())?;
        if value == Sexpr::Boolean(true) {
            Ok(value)
        } else {
            evaluate(second.clone(), env)
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            "or expects exactly two operands".to_string(),
        ))
    }
}

/// Mirror of `or`: short-circuits only on the identical boolean false value.
fn evaluate_and(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    if let [first, second] = operands {
        let value = evaluate(first.clone(), env.clone())?;
        if value == Sexpr::Boolean(false) {
            Ok(value)
        } else {
            evaluate(second.clone(), env)
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            "and expects exactly two operands".to_string(),
        ))
    }
}

fn evaluate_cond(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    for clause in operands {
        let Sexpr::List(pair) = clause else {
            return Err(EvalError::InvalidSpecialForm(
                "cond clause must be a (predicate expression) pair".to_string(),
            ));
        };
        let [predicate, expression] = &pair[..] else {
            return Err(EvalError::InvalidSpecialForm(
                "cond clause must be a (predicate expression) pair".to_string(),
            ));
        };
        let matched = match predicate {
            // the literal symbol `else` is always true
            Sexpr::Symbol(s) if s == "else" => true,
            _ => is_truthy(&evaluate(predicate.clone(), env.clone())?),
        };
        if matched {
            return evaluate(expression.clone(), env);
        }
    }
    // no clause matched: the distinguished no-value marker, not #f or ()
    Ok(Sexpr::Unit)
}

fn evaluate_define(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    match operands {
        [Sexpr::Symbol(name), expression] => {
            // the redefinition check comes before the operand is evaluated
            if env.borrow().is_defined(name) {
                return Err(EnvError::Redefinition(name.clone()).into());
            }
            let value = evaluate(expression.clone(), env.clone())?;
            env.borrow_mut().define(name.clone(), value.clone())?;
            Ok(value)
        }
        [other, _] => Err(EvalError::NotASymbol(other.to_string())),
        _ => Err(EvalError::InvalidSpecialForm(
            "define expects a symbol and an expression".to_string(),
        )),
    }
}

fn evaluate_lambda(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    match operands {
        [Sexpr::List(params), body] => {
            let params = params
                .iter()
                .map(|param| match param {
                    Sexpr::Symbol(name) => Ok(name.clone()),
                    other => Err(EvalError::NotASymbol(other.to_string())),
                })
                .collect::<EvalResult<Vec<String>>>()?;
            Ok(Sexpr::Procedure(Procedure::Lambda(Rc::new(Lambda {
                params,
                body: body.clone(),
                env,
            }))))
        }
        _ => Err(EvalError::InvalidSpecialForm(
            "lambda expects a parameter list and a body".to_string(),
        )),
    }
}

fn evaluate_assert(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    if let [test] = operands {
        let result = evaluate(test.clone(), env)?;
        if result == Sexpr::Boolean(false) {
            Err(EvalError::AssertionFailed(format!("(assert {})", test)))
        } else {
            Ok(Sexpr::Unit)
        }
    } else {
        Err(EvalError::InvalidSpecialForm(
            "assert expects exactly one operand".to_string(),
        ))
    }
}

/// `(import name)` reads `name.scm` (relative to the working directory) and
/// evaluates its single top-level expression against the *same* environment:
/// definitions land directly in the importing scope. The filename is
/// recorded before loading, and a recorded filename makes the import a
/// no-op.
fn evaluate_import(operands: &[Sexpr], env: Rc<RefCell<Environment>>) -> EvalResult {
    match operands {
        [Sexpr::Symbol(filename)] => {
            if env.borrow().is_imported(filename) {
                return Ok(Sexpr::Unit);
            }
            env.borrow_mut().record_import(filename.clone());
            load_file(&format!("{}.scm", filename), env)
        }
        _ => Err(EvalError::InvalidSpecialForm(
            "import expects a literal filename".to_string(),
        )),
    }
}

fn load_file(name: &str, env: Rc<RefCell<Environment>>) -> EvalResult {
    let source = fs::read_to_string(name)
        .map_err(|e| EvalError::ImportFailed(name.to_string(), e.to_string()))?;
    evaluate_source(&source, env)
}

fn evaluate_procedure(
    operator: &Sexpr,
    operands: &[Sexpr],
    env: Rc<RefCell<Environment>>,
) -> EvalResult {
    let callee = evaluate(operator.clone(), env.clone())?;
    let procedure = match callee {
        Sexpr::Procedure(procedure) => procedure,
        other => return Err(EvalError::NotAProcedure(other.to_string())),
    };

    // Evaluate the operands left to right in the calling environment.
    let mut args: Vec<Sexpr> = Vec::with_capacity(operands.len());
    for operand in operands {
        args.push(evaluate(operand.clone(), env.clone())?);
    }

    // Only user closures get the exact-arity check; the error names the
    // operator expression as written.
    if let Procedure::Lambda(lambda) = &procedure
        && lambda.params.len() != args.len()
    {
        return Err(EvalError::ArityMismatch {
            name: operator.to_string(),
            expected: lambda.params.len(),
            given: args.len(),
        });
    }

    apply(&procedure, args)
}

/// Invokes a procedure with already-evaluated arguments. No arity check
/// happens here: closures bind parameters positionally for as many argument
/// pairs as exist, which is what lets `lispify` poke zero-argument thunks.
pub fn apply(procedure: &Procedure, args: Vec<Sexpr>) -> EvalResult {
    match procedure {
        Procedure::Primitive(func, _) => func(args),
        Procedure::Lambda(lambda) => {
            let frame = Environment::new_enclosed(lambda.env.clone());
            {
                let mut frame_mut = frame.borrow_mut();
                for (param, arg) in lambda.params.iter().zip(args) {
                    frame_mut.bind(param.clone(), arg);
                }
            }
            evaluate(lambda.body.clone(), frame)
        }
    }
}

/// Renders a value back to source-like text. Lists render recursively; a
/// procedure is invoked with zero arguments and its result rendered, which
/// is only meaningful for zero-argument thunks.
pub fn lispify(value: &Sexpr) -> EvalResult<String> {
    match value {
        Sexpr::List(items) => {
            let rendered = items
                .iter()
                .map(lispify)
                .collect::<EvalResult<Vec<String>>>()?;
            Ok(format!("({})", rendered.join(" ")))
        }
        Sexpr::Procedure(procedure) => lispify(&apply(procedure, Vec::new())?),
        other => Ok(other.to_string()),
    }
}
