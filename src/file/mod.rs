//! File input and result output.
//!
//! - [`loader`]: reads files and stdin (with gzip support) into input sources
//! - [`printer`]: YAML and JSON printers for evaluation results

pub mod loader;
pub mod printer;
