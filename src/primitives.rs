use crate::evaluator::{EvalError, EvalResult};
use crate::types::Sexpr;

// Checks the number of arguments a primitive received. Primitives are exempt
// from the closure arity check, so each one validates for itself.
macro_rules! check_arity {
    ($args:expr, $expected:expr, $name:expr) => {
        if $args.len() != $expected {
            return Err(EvalError::InvalidArguments(format!(
                "Primitive '{}' expects exactly {} arguments, got {}",
                $name,
                $expected,
                $args.len()
            )));
        }
    };
    ($args:expr, min $expected:expr, $name:expr) => {
        if $args.len() < $expected {
            return Err(EvalError::InvalidArguments(format!(
                "Primitive '{}' expects at least {} arguments, got {}",
                $name,
                $expected,
                $args.len()
            )));
        }
    };
}

// Extracts a number from an argument or returns an InvalidArguments error.
macro_rules! expect_number {
    ($arg:expr, $name:expr, $arg_pos:expr) => {
        match $arg {
            Sexpr::Integer(i) => Num::Int(*i),
            Sexpr::Float(f) => Num::Float(*f),
            other => {
                return Err(EvalError::InvalidArguments(format!(
                    "Primitive '{}' expects a number for argument {}, got {}",
                    $name,
                    $arg_pos,
                    other.type_name()
                )));
            }
        }
    };
}

/// The host integer/float duality: arithmetic stays integral while both
/// operands are integers and promotes to float as soon as one isn't.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn binary_numeric(
    args: &[Sexpr],
    name: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult {
    check_arity!(args, 2, name);
    let left = expect_number!(&args[0], name, 1);
    let right = expect_number!(&args[1], name, 2);
    match (left, right) {
        // integer overflow fails the expression, like division by zero does
        (Num::Int(x), Num::Int(y)) => match int_op(x, y) {
            Some(result) => Ok(Sexpr::Integer(result)),
            None => Err(EvalError::InvalidArguments(format!(
                "Primitive '{}' overflowed the integer range",
                name
            ))),
        },
        (x, y) => Ok(Sexpr::Float(float_op(x.as_f64(), y.as_f64()))),
    }
}

pub fn prim_add(args: Vec<Sexpr>) -> EvalResult {
    binary_numeric(&args, "+", i64::checked_add, |x, y| x + y)
}

pub fn prim_sub(args: Vec<Sexpr>) -> EvalResult {
    binary_numeric(&args, "-", i64::checked_sub, |x, y| x - y)
}

pub fn prim_mul(args: Vec<Sexpr>) -> EvalResult {
    binary_numeric(&args, "*", i64::checked_mul, |x, y| x * y)
}

/// Division always yields a float, whatever the operands.
pub fn prim_div(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 2, "/");
    let left = expect_number!(&args[0], "/", 1);
    let right = expect_number!(&args[1], "/", 2);
    if right.as_f64() == 0.0 {
        return Err(EvalError::InvalidArguments("Division by zero".to_string()));
    }
    Ok(Sexpr::Float(left.as_f64() / right.as_f64()))
}

fn binary_comparison(args: &[Sexpr], name: &str, compare: fn(f64, f64) -> bool) -> EvalResult {
    check_arity!(args, 2, name);
    let left = expect_number!(&args[0], name, 1);
    let right = expect_number!(&args[1], name, 2);
    Ok(Sexpr::Boolean(compare(left.as_f64(), right.as_f64())))
}

pub fn prim_greater_than(args: Vec<Sexpr>) -> EvalResult {
    binary_comparison(&args, ">", |x, y| x > y)
}

pub fn prim_less_than(args: Vec<Sexpr>) -> EvalResult {
    binary_comparison(&args, "<", |x, y| x < y)
}

/// Structural equality over any two values, comparing integers and floats
/// numerically. This is the library's empty-list test: `(= l '())`.
pub fn prim_equals(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 2, "=");
    Ok(Sexpr::Boolean(sexpr_equal(&args[0], &args[1])))
}

fn sexpr_equal(left: &Sexpr, right: &Sexpr) -> bool {
    match (left, right) {
        (Sexpr::Integer(i), Sexpr::Float(f)) | (Sexpr::Float(f), Sexpr::Integer(i)) => {
            *i as f64 == *f
        }
        (Sexpr::List(xs), Sexpr::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| sexpr_equal(x, y))
        }
        _ => left == right,
    }
}

/// Atom identity: symbols, integers and booleans compare by value; lists,
/// floats and procedures are never `eq?`.
pub fn prim_is_eq(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 2, "eq?");
    let identical = match (&args[0], &args[1]) {
        (Sexpr::Symbol(a), Sexpr::Symbol(b)) => a == b,
        (Sexpr::Integer(a), Sexpr::Integer(b)) => a == b,
        (Sexpr::Boolean(a), Sexpr::Boolean(b)) => a == b,
        _ => false,
    };
    Ok(Sexpr::Boolean(identical))
}

fn round_to_integer(args: &[Sexpr], name: &str, round: fn(f64) -> f64) -> EvalResult {
    check_arity!(args, 1, name);
    Ok(match expect_number!(&args[0], name, 1) {
        Num::Int(i) => Sexpr::Integer(i),
        Num::Float(f) => Sexpr::Integer(round(f) as i64),
    })
}

pub fn prim_ceiling(args: Vec<Sexpr>) -> EvalResult {
    round_to_integer(&args, "ceiling", f64::ceil)
}

pub fn prim_flooring(args: Vec<Sexpr>) -> EvalResult {
    round_to_integer(&args, "flooring", f64::floor)
}

fn expect_list<'a>(arg: &'a Sexpr, name: &str) -> Result<&'a [Sexpr], EvalError> {
    match arg {
        Sexpr::List(items) => Ok(items),
        other => Err(EvalError::InvalidArguments(format!(
            "Primitive '{}' expects a list, got {}",
            name,
            other.type_name()
        ))),
    }
}

pub fn prim_car(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 1, "car");
    let items = expect_list(&args[0], "car")?;
    match items.first() {
        Some(first) => Ok(first.clone()),
        None => Err(EvalError::InvalidArguments(
            "Primitive 'car' expects a non-empty list".to_string(),
        )),
    }
}

/// The tail of a list; the tail of the empty list is the empty list.
pub fn prim_cdr(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 1, "cdr");
    let items = expect_list(&args[0], "cdr")?;
    Ok(Sexpr::List(items.iter().skip(1).cloned().collect()))
}

/// Concatenating cons: non-list operands are wrapped in singletons first, so
/// `(cons 1 '(2 3))` is `(1 2 3)` and `(cons '(1 2) 3)` is also `(1 2 3)`.
pub fn prim_cons(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 2, "cons");
    let mut args = args;
    let tail = args.pop().unwrap_or(Sexpr::Unit);
    let head = args.pop().unwrap_or(Sexpr::Unit);
    let mut items = match head {
        Sexpr::List(items) => items,
        other => vec![other],
    };
    match tail {
        Sexpr::List(rest) => items.extend(rest),
        other => items.push(other),
    }
    Ok(Sexpr::List(items))
}

/// All arguments are already evaluated left-to-right by the time a builtin
/// runs, so begin only has to hand back the last one.
pub fn prim_begin(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, min 1, "begin");
    let mut args = args;
    Ok(args.pop().unwrap_or(Sexpr::Unit))
}

pub fn prim_is_list(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 1, "list?");
    Ok(Sexpr::Boolean(matches!(args[0], Sexpr::List(_))))
}

pub fn prim_is_boolean(args: Vec<Sexpr>) -> EvalResult {
    check_arity!(args, 1, "boolean?");
    Ok(Sexpr::Boolean(matches!(args[0], Sexpr::Boolean(_))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Sexpr {
        Sexpr::Integer(i)
    }

    fn list(items: Vec<Sexpr>) -> Sexpr {
        Sexpr::List(items)
    }

    #[test]
    fn test_arithmetic_integer_preserving() {
        assert_eq!(prim_add(vec![int(1), int(2)]), Ok(int(3)));
        assert_eq!(prim_sub(vec![int(10), int(3)]), Ok(int(7)));
        assert_eq!(prim_mul(vec![int(6), int(7)]), Ok(int(42)));
    }

    #[test]
    fn test_arithmetic_overflow_is_an_error() {
        // overflow aborts the expression with an error, never the process
        assert!(matches!(
            prim_mul(vec![int(10_000_000_000), int(10_000_000_000)]),
            Err(EvalError::InvalidArguments(_))
        ));
        assert!(matches!(
            prim_add(vec![int(i64::MAX), int(1)]),
            Err(EvalError::InvalidArguments(_))
        ));
        assert!(matches!(
            prim_sub(vec![int(i64::MIN), int(1)]),
            Err(EvalError::InvalidArguments(_))
        ));
        // the boundary itself is still representable
        assert_eq!(prim_add(vec![int(i64::MAX - 1), int(1)]), Ok(int(i64::MAX)));
    }

    #[test]
    fn test_arithmetic_float_promotion() {
        assert_eq!(
            prim_add(vec![int(1), Sexpr::Float(0.5)]),
            Ok(Sexpr::Float(1.5))
        );
        assert_eq!(
            prim_mul(vec![Sexpr::Float(2.5), int(2)]),
            Ok(Sexpr::Float(5.0))
        );
    }

    #[test]
    fn test_division_always_floats() {
        assert_eq!(prim_div(vec![int(10), int(2)]), Ok(Sexpr::Float(5.0)));
        assert_eq!(prim_div(vec![int(10), int(4)]), Ok(Sexpr::Float(2.5)));
        assert!(matches!(
            prim_div(vec![int(1), int(0)]),
            Err(EvalError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_arity_is_validated_by_the_primitive() {
        assert!(matches!(
            prim_add(vec![int(1), int(2), int(3)]),
            Err(EvalError::InvalidArguments(_))
        ));
        assert!(matches!(
            prim_add(vec![int(1)]),
            Err(EvalError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_type_errors() {
        assert!(matches!(
            prim_add(vec![int(1), Sexpr::Boolean(true)]),
            Err(EvalError::InvalidArguments(_))
        ));
        assert!(matches!(
            prim_less_than(vec![Sexpr::Symbol("a".to_string()), int(1)]),
            Err(EvalError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            prim_less_than(vec![int(1), int(2)]),
            Ok(Sexpr::Boolean(true))
        );
        assert_eq!(
            prim_greater_than(vec![int(1), int(2)]),
            Ok(Sexpr::Boolean(false))
        );
        assert_eq!(
            prim_less_than(vec![int(1), Sexpr::Float(1.5)]),
            Ok(Sexpr::Boolean(true))
        );
    }

    #[test]
    fn test_equals_is_structural() {
        assert_eq!(prim_equals(vec![int(5), int(5)]), Ok(Sexpr::Boolean(true)));
        assert_eq!(
            prim_equals(vec![int(5), Sexpr::Float(5.0)]),
            Ok(Sexpr::Boolean(true))
        );
        assert_eq!(
            prim_equals(vec![list(vec![]), list(vec![])]),
            Ok(Sexpr::Boolean(true))
        );
        assert_eq!(
            prim_equals(vec![list(vec![int(1), int(2)]), list(vec![int(1), int(2)])]),
            Ok(Sexpr::Boolean(true))
        );
        assert_eq!(
            prim_equals(vec![list(vec![int(1)]), list(vec![int(2)])]),
            Ok(Sexpr::Boolean(false))
        );
        assert_eq!(
            prim_equals(vec![int(1), Sexpr::Boolean(true)]),
            Ok(Sexpr::Boolean(false))
        );
    }

    #[test]
    fn test_eq_is_atom_identity() {
        assert_eq!(prim_is_eq(vec![int(1), int(1)]), Ok(Sexpr::Boolean(true)));
        assert_eq!(
            prim_is_eq(vec![
                Sexpr::Symbol("a".to_string()),
                Sexpr::Symbol("a".to_string())
            ]),
            Ok(Sexpr::Boolean(true))
        );
        // lists are never eq?, even when structurally equal
        assert_eq!(
            prim_is_eq(vec![list(vec![]), list(vec![])]),
            Ok(Sexpr::Boolean(false))
        );
    }

    #[test]
    fn test_ceiling_flooring() {
        assert_eq!(prim_ceiling(vec![Sexpr::Float(2.1)]), Ok(int(3)));
        assert_eq!(prim_flooring(vec![Sexpr::Float(2.9)]), Ok(int(2)));
        assert_eq!(prim_flooring(vec![Sexpr::Float(-2.5)]), Ok(int(-3)));
        assert_eq!(prim_ceiling(vec![int(4)]), Ok(int(4)));
    }

    #[test]
    fn test_car_cdr() {
        assert_eq!(prim_car(vec![list(vec![int(1), int(2)])]), Ok(int(1)));
        assert_eq!(
            prim_cdr(vec![list(vec![int(1), int(2), int(3)])]),
            Ok(list(vec![int(2), int(3)]))
        );
        // cdr of the empty list is the empty list
        assert_eq!(prim_cdr(vec![list(vec![])]), Ok(list(vec![])));
        assert!(matches!(
            prim_car(vec![list(vec![])]),
            Err(EvalError::InvalidArguments(_))
        ));
        assert!(matches!(
            prim_car(vec![int(1)]),
            Err(EvalError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_cons_wrap_concat() {
        assert_eq!(
            prim_cons(vec![int(1), list(vec![int(2), int(3)])]),
            Ok(list(vec![int(1), int(2), int(3)]))
        );
        assert_eq!(
            prim_cons(vec![list(vec![int(1), int(2)]), int(3)]),
            Ok(list(vec![int(1), int(2), int(3)]))
        );
        assert_eq!(
            prim_cons(vec![int(1), int(2)]),
            Ok(list(vec![int(1), int(2)]))
        );
        assert_eq!(
            prim_cons(vec![list(vec![int(1)]), list(vec![int(2)])]),
            Ok(list(vec![int(1), int(2)]))
        );
    }

    #[test]
    fn test_begin_returns_last() {
        assert_eq!(prim_begin(vec![int(1), int(2), int(3)]), Ok(int(3)));
        assert_eq!(prim_begin(vec![int(7)]), Ok(int(7)));
        assert!(matches!(
            prim_begin(vec![]),
            Err(EvalError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_type_predicates() {
        assert_eq!(
            prim_is_list(vec![list(vec![])]),
            Ok(Sexpr::Boolean(true))
        );
        assert_eq!(prim_is_list(vec![int(1)]), Ok(Sexpr::Boolean(false)));
        assert_eq!(
            prim_is_boolean(vec![Sexpr::Boolean(false)]),
            Ok(Sexpr::Boolean(true))
        );
        assert_eq!(
            prim_is_boolean(vec![Sexpr::Unit]),
            Ok(Sexpr::Boolean(false))
        );
    }
}
