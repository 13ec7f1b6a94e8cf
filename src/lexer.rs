use logos::Logos;

use thiserror::Error;

/// A single raw token. Brackets and the quote mark stand alone; everything
/// else is an `Atom` fragment that stays un-typed until the parser looks at
/// it. There is no position tracking.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r";[^\n\r]*")] // Skip comments to end of line
#[logos(error = LexerError)]
pub enum Token {
    #[token("(")]
    OpenBracket,
    #[token(")")]
    CloseBracket,
    #[token("'")]
    Quote,
    // A maximal run of anything that isn't whitespace, a bracket, a quote
    // mark or the start of a comment. This matches the splitting behavior of
    // padding the special characters with spaces and splitting on whitespace.
    #[regex(r"[^ \t\n\r()';]+", |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerError {
    #[default]
    #[error("Invalid token")]
    InvalidToken,
}

/// Splits source text into tokens. The skip rules plus the `Atom` catch-all
/// cover every character, so in practice this never fails; the error channel
/// only exists to satisfy the lexer iterator contract.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    Token::lexer(input).collect()
}
