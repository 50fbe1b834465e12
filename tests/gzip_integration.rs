use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use yamlquery::expression::compile;
use yamlquery::file::loader::{load_source, load_sources, read_source};
use yamlquery::file::printer::{PrintOptions, YamlPrinter};
use yamlquery::navigator::NavigatorOptions;
use yamlquery::stream::StreamEvaluator;

/// Helper function to create a temporary file path with the given name
fn temp_file_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn write_gzipped(path: &PathBuf, text: &str) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    fs::write(path, encoder.finish().unwrap()).unwrap();
}

#[test]
fn test_query_across_plain_and_compressed_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let plain = temp_file_path(&temp_dir, "first.yml");
    let compressed = temp_file_path(&temp_dir, "second.yaml.gz");

    fs::write(&plain, "service: api\nport: 8080\n").unwrap();
    write_gzipped(&compressed, "service: web\nport: 80\n---\nservice: db\nport: 5432\n");

    let sources = load_sources(&[plain.clone(), compressed.clone()]).unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[1].source_id, compressed.display().to_string());

    let mut printer = YamlPrinter::new(Vec::new(), PrintOptions::default());
    StreamEvaluator::new(NavigatorOptions::default())
        .run(&sources, &compile(".service").unwrap(), &mut printer)
        .unwrap();
    assert_eq!(
        String::from_utf8(printer.into_inner()).unwrap(),
        "api\n---\nweb\n---\ndb\n"
    );
}

#[test]
fn test_compressed_stdin_is_detected() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"a: 1\n").unwrap();
    let bytes = encoder.finish().unwrap();

    let source = read_source(&bytes[..], "-").unwrap();
    assert_eq!(source.source_id, "-");
    assert_eq!(source.content, "a: 1\n");
}

#[test]
fn test_gz_extension_with_plain_content_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&temp_dir, "fake.yml.gz");
    fs::write(&path, "a: 1\n").unwrap();

    assert!(load_source(&path).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&temp_dir, "absent.yml");

    let err = load_sources(&[path]).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.yml"));
}
