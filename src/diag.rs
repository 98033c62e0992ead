//! Syntax diagnostics accumulated by the parser.

use std::fmt;

use thiserror::Error;

use crate::token::Position;

#[derive(Debug, PartialEq, Clone, Error)]
#[error("{pos}: {error}")]
pub struct Diagnostic {
    pub pos: Position,
    pub error: ParseError,
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error("unexpected token '{found}', expected '{expected}'")]
    UnexpectedToken { found: String, expected: String },
    #[error("no prefix parse rule for '{0}'")]
    NoPrefixRule(String),
    #[error("illegal token '{0}'")]
    IllegalToken(String),
    #[error("cannot parse integer literal: {0}")]
    BadIntegerLiteral(String),
    #[error("cannot parse floating point literal: {0}")]
    BadFloatLiteral(String),
    #[error("postfix '{op}' needs an identifier, found '{target}'")]
    BadPostfixTarget { op: String, target: String },
    #[error("postfix '{op}' on '{target}' is only allowed as a statement")]
    PostfixNotStatement { op: String, target: String },
    #[error("switch needs at least one case")]
    MissingCase,
}

/// Every diagnostic from one parse, in source order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SyntaxErrors(pub Vec<Diagnostic>);

impl SyntaxErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|d| d.to_string()).collect()
    }
}

impl fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "syntax error: {}", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxErrors {}
