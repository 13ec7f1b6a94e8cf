// Declare modules publicly so they are part of the library interface
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod primitives;
pub mod types;

pub use environment::{EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate, evaluate_source, lispify};
pub use lexer::{LexerError, Token, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use types::{Lambda, Procedure, Sexpr};
