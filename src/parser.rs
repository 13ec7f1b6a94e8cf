use crate::lexer::{LexerError, Token, tokenize};
use crate::types::Sexpr;
use std::iter::Peekable;
use std::vec::IntoIter;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected EOF")]
    UnexpectedEof,
    #[error("Unexpected close bracket found")]
    UnexpectedCloseBracket,
    #[error("Lexer error during parse: {0}")]
    Lexer(#[from] LexerError),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over an owned token stream. Each `parse_expr`
/// call destructively consumes the prefix making up one expression, so a
/// caller holding the parser can pull several top-level expressions out of
/// one stream.
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
        }
    }

    /// Parses a single expression from the front of the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Sexpr> {
        match self.tokens.next() {
            None => Err(ParseError::UnexpectedEof),
            Some(Token::OpenBracket) => {
                let mut elements = Vec::new();
                loop {
                    match self.tokens.peek() {
                        Some(Token::CloseBracket) => {
                            self.tokens.next(); // eat the closing bracket
                            return Ok(Sexpr::List(elements));
                        }
                        Some(_) => elements.push(self.parse_expr()?),
                        None => return Err(ParseError::UnexpectedEof),
                    }
                }
            }
            Some(Token::CloseBracket) => Err(ParseError::UnexpectedCloseBracket),
            Some(Token::Quote) => {
                // 'expr is sugar for (quote expr)
                let quoted = self.parse_expr()?;
                Ok(Sexpr::List(vec![
                    Sexpr::Symbol("quote".to_string()),
                    quoted,
                ]))
            }
            Some(Token::Atom(text)) => Ok(parse_atom(&text)),
        }
    }
}

/// Integers become integers, floats become floats, everything else becomes a
/// symbol. `#t` and `#f` are symbols here; the default environment binds
/// them to the boolean values.
fn parse_atom(text: &str) -> Sexpr {
    if let Ok(i) = text.parse::<i64>() {
        Sexpr::Integer(i)
    } else if let Ok(f) = text.parse::<f64>() {
        Sexpr::Float(f)
    } else {
        Sexpr::Symbol(text.to_string())
    }
}

/// Lexes and parses one top-level expression from a source string. Trailing
/// tokens are left unconsumed: whole-file callers are expected to hand over
/// exactly one expression, wrapping multi-form content in a `(begin ...)`.
pub fn parse_str(input: &str) -> ParseResult<Sexpr> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse_expr()
}
