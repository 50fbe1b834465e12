//! Error types for expression compilation.

use thiserror::Error;

/// What went wrong while compiling an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// A token appeared where the grammar does not allow it.
    #[error("Unexpected token '{found}', expected {expected}")]
    UnexpectedToken { found: String, expected: String },
    /// The expression ended early.
    #[error("Unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: String },
    #[error("Invalid expression syntax: {message}")]
    InvalidSyntax { message: String },
    /// A character that starts no token.
    #[error("Unexpected character")]
    UnexpectedCharacter,
    #[error("Unterminated string literal")]
    UnterminatedString,
    /// An opening bracket with no closing partner, or a stray closing one.
    #[error("Unmatched '{0}'")]
    UnmatchedBracket(char),
    #[error("Invalid number literal")]
    InvalidNumber,
    /// A binary operator lacking its right (or left) operand.
    #[error("Operator '{operator}' is missing an operand")]
    MissingOperand { operator: String },
    #[error("Slice bounds must be integer literals")]
    InvalidSlice,
}

/// A compilation failure with the position of the offending text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}{}", near(.fragment))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset into the expression
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column (in characters)
    pub column: usize,
    /// The text at the error position (empty at end of input)
    pub fragment: String,
}

impl SyntaxError {
    /// Builds an error at `offset` in `text`, deriving line, column and fragment.
    pub fn at(kind: SyntaxErrorKind, text: &str, offset: usize, len: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = text[line_start..offset].chars().count() + 1;
        let end = (offset + len).min(text.len());
        let fragment = text.get(offset..end).unwrap_or_default().to_string();
        Self {
            kind,
            offset,
            line,
            column,
            fragment,
        }
    }
}

fn near(fragment: &str) -> String {
    if fragment.is_empty() {
        String::new()
    } else {
        format!(" near '{}'", fragment)
    }
}
