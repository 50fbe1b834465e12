//! Input loading.
//!
//! Reads YAML text from files or stdin into [`InputSource`]s for the stream
//! evaluator. Gzip-compressed input is decompressed transparently: files are
//! recognised by their `.gz` extension, stdin by the gzip magic bytes.

use crate::stream::InputSource;
use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Source id used for standard input.
pub const STDIN_SOURCE_ID: &str = "-";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Loads one file as an input source named after its path.
///
/// # Examples
///
/// ```no_run
/// use yamlquery::file::loader::load_source;
///
/// let source = load_source("deployment.yaml").unwrap();
/// assert_eq!(source.source_id, "deployment.yaml");
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid gzip (for `.gz`
/// files) or is not valid UTF-8.
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<InputSource> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read file '{}'", path_ref.display()))?
    };

    Ok(InputSource::new(path_ref.display().to_string(), content))
}

/// Loads every path in order; `-` stands for stdin.
pub fn load_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<InputSource>> {
    paths
        .iter()
        .map(|path| {
            if path.as_ref() == Path::new(STDIN_SOURCE_ID) {
                load_stdin()
            } else {
                load_source(path)
            }
        })
        .collect()
}

/// Reads standard input until EOF.
///
/// # Errors
///
/// Returns an error if reading fails or the input is not valid UTF-8 (after
/// decompression, when it starts with the gzip magic bytes).
pub fn load_stdin() -> Result<InputSource> {
    let stdin = std::io::stdin();
    read_source(stdin.lock(), STDIN_SOURCE_ID)
}

/// Reads `reader` to the end as a source named `source_id`, gunzipping it when
/// it starts with the gzip magic bytes.
pub fn read_source<R: Read>(mut reader: R, source_id: &str) -> Result<InputSource> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .with_context(|| format!("Failed to read from {}", describe(source_id)))?;

    let content = if buffer.starts_with(&GZIP_MAGIC) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer)
            .with_context(|| format!("Invalid UTF-8 in {}", describe(source_id)))?
    };

    Ok(InputSource::new(source_id, content))
}

fn describe(source_id: &str) -> String {
    if source_id == STDIN_SOURCE_ID {
        "stdin".to_string()
    } else {
        format!("'{}'", source_id)
    }
}

/// Reads and decompresses a gzipped file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The file is not valid gzip format (corrupted)
/// - The decompressed content is not valid UTF-8
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;

    let path_ref = path.as_ref();
    let file = fs::File::open(path_ref)
        .with_context(|| format!("Failed to open gzipped file '{}'", path_ref.display()))?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file")?;
    Ok(content)
}

/// Decompresses gzip bytes held in memory.
fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzip data")?;
    Ok(content)
}
