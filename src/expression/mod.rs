//! Query expression compiler.
//!
//! Turns expression text into an [`OperatorNode`] tree that the
//! [`TreeNavigator`](crate::navigator::TreeNavigator) evaluates.
//!
//! # Supported Syntax
//!
//! - `.` - Identity
//! - `.a`, `.a.b`, `."key with spaces"`, `.["key"]` - Mapping keys
//! - `.[0]`, `.[-1]` - Sequence indices (negative counts from the end)
//! - `.[]` - All children (splat)
//! - `.[1:3]` - Slices
//! - `..` - Recursive descent
//! - `a | b` - Pipe, `a, b` - Union, `a // b` - Alternative
//! - `=`, `|=`, `+=`, ... - Assignment
//! - `style=`, `tag=`, `anchor=`, `line_comment=`, `head_comment=` - Metadata assignment
//! - `+ - * / %`, `== != < <= > >=`, `and`, `or` - Arithmetic, comparison, logic
//! - `[...]`, `{key: value}` - Collection literals
//! - `name`, `name(arg; arg)` - Built-in functions, `select(p)` - Filter
//!
//! # Examples
//!
//! ```
//! use yamlquery::expression::{compile, OperatorKind};
//!
//! let ast = compile(".items[] | select(.price > 10) | .name").unwrap();
//! assert_eq!(ast.kind, OperatorKind::Pipe);
//!
//! assert!(compile(".[").is_err());
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{KindTag, MetadataField, OperatorKind, OperatorNode, SelectorKey, Span};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use parser::Parser;

/// Compiles an expression. Either the whole tree is returned or an error is.
pub fn compile(text: &str) -> Result<OperatorNode, SyntaxError> {
    Parser::parse(text)
}
