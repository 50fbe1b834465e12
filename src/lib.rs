//! yamlquery - a path-expression query and transformation engine for YAML.
//!
//! An expression such as `.spec.containers[] | select(.image == "nginx") | .name`
//! is compiled into an operator tree ([`expression`]), then evaluated by the
//! [`navigator`] against documents held in an arena ([`document`]). Every
//! operator and built-in function lives in the [`operators`] registry. The
//! [`stream`] evaluator drives evaluation over whole input streams and hands the
//! results to a printer from [`file`].
//!
//! # Example
//!
//! ```
//! use yamlquery::expression::compile;
//! use yamlquery::file::printer::{PrintOptions, YamlPrinter};
//! use yamlquery::navigator::NavigatorOptions;
//! use yamlquery::stream::{InputSource, StreamEvaluator};
//!
//! let ast = compile(".items[] | .name").unwrap();
//! let sources = vec![InputSource::new("list.yml", "items:\n  - name: a\n  - name: b\n")];
//! let mut printer = YamlPrinter::new(Vec::new(), PrintOptions::default());
//!
//! StreamEvaluator::new(NavigatorOptions::default())
//!     .run(&sources, &ast, &mut printer)
//!     .unwrap();
//! assert_eq!(String::from_utf8(printer.into_inner()).unwrap(), "a\nb\n");
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod expression;
pub mod file;
pub mod navigator;
pub mod operators;
pub mod stream;
