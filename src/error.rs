//! Error types for document parsing, evaluation and stream processing.
//!
//! Expression syntax errors live with the compiler in
//! [`expression::error`](crate::expression::error).

use std::io;
use thiserror::Error;

/// Failure while evaluating an operator tree against candidates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("cannot {operation} {lhs} with {rhs}")]
    TypeMismatch {
        operation: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("{operation}: left side produced {lhs} results but right side produced {rhs}")]
    LengthMismatch {
        operation: &'static str,
        lhs: usize,
        rhs: usize,
    },

    #[error("{operation} target is not addressable (it is not part of any document)")]
    NotAddressable { operation: &'static str },

    #[error("expression nesting exceeded the depth limit of {limit}")]
    RecursionLimit { limit: usize },

    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("key '{key}' not found")]
    MissingKey { key: String },

    #[error("operator {operator} is missing its {operand} operand")]
    MissingOperand {
        operator: &'static str,
        operand: &'static str,
    },
}

impl EvaluationError {
    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvaluationError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias used by operators.
pub type EvalResult<T> = Result<T, EvaluationError>;

/// Malformed YAML input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_id}: document {document_index}: {message} at line {line} column {column}")]
pub struct ParseError {
    pub source_id: String,
    pub document_index: usize,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Failure while running an expression over an input stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{source_id}: document {document_index}: {error}")]
    Evaluation {
        source_id: String,
        document_index: usize,
        #[source]
        error: EvaluationError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EvaluationError::TypeMismatch {
            operation: "add",
            lhs: "mapping",
            rhs: "number",
        };
        assert_eq!(err.to_string(), "cannot add mapping with number");

        let err = ParseError {
            source_id: "a.yml".to_string(),
            document_index: 2,
            message: "did not find expected key".to_string(),
            line: 4,
            column: 1,
        };
        assert_eq!(
            err.to_string(),
            "a.yml: document 2: did not find expected key at line 4 column 1"
        );
    }

    #[test]
    fn test_stream_error_names_document() {
        let err = StreamError::Evaluation {
            source_id: "b.yml".to_string(),
            document_index: 0,
            error: EvaluationError::DivisionByZero,
        };
        assert_eq!(err.to_string(), "b.yml: document 0: division by zero");
    }
}
