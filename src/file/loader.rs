//! YAML file loading functionality.
//!
//! This module provides functions to load YAML streams from files or stdin,
//! parsing them into `YamlTree` structures that crd-gates can rewrite.
//! Gzip-compressed input is decompressed transparently.

use crate::document::parser::parse_yaml;
use crate::document::tree::YamlTree;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Loads and parses a YAML file from the filesystem.
///
/// Files ending in `.gz` are decompressed first. Every document of the
/// stream becomes one document of the returned tree.
///
/// # Examples
///
/// ```no_run
/// use crd_gates::file::loader::load_yaml_file;
///
/// let tree = load_yaml_file("crds.yaml").unwrap();
/// println!("{} documents", tree.len());
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist
/// - The file cannot be read (permissions, etc.)
/// - The file is not valid UTF-8 or valid gzip
/// - The file contents are not valid YAML
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<YamlTree> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref).context("Failed to read file")?
    };

    parse_yaml(&content).context("Failed to parse YAML")
}

/// Loads and parses YAML from standard input.
///
/// Reads until EOF. Input starting with the gzip magic bytes is
/// decompressed first.
///
/// # Examples
///
/// ```no_run
/// use crd_gates::file::loader::load_yaml_from_stdin;
///
/// // Usage: cat crds.yaml | crd-gates -
/// let tree = load_yaml_from_stdin().unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Reading from stdin fails
/// - The input is not valid UTF-8 or valid gzip
/// - The input contents are not valid YAML
pub fn load_yaml_from_stdin() -> Result<YamlTree> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = decode_bytes(buffer)?;
    parse_yaml(&content).context("Failed to parse YAML")
}

/// Loads YAML from `path`, or from stdin when `path` is `-`.
pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<YamlTree> {
    let path = path.as_ref();
    if path == Path::new("-") {
        load_yaml_from_stdin()
    } else {
        load_yaml_file(path)
    }
}

/// Turns raw input bytes into text, decompressing gzip data.
fn decode_bytes(buffer: Vec<u8>) -> Result<String> {
    if buffer.starts_with(&GZIP_MAGIC) {
        decompress_gzip_bytes(&buffer)
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in input")
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
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped input")?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_bytes_plain() {
        let text = decode_bytes(b"a: 1\n".to_vec()).unwrap();
        assert_eq!(text, "a: 1\n");
    }

    #[test]
    fn test_decode_bytes_gzip() {
        let text = decode_bytes(gzip(b"kind: CustomResourceDefinition\n")).unwrap();
        assert_eq!(text, "kind: CustomResourceDefinition\n");
    }

    #[test]
    fn test_decode_bytes_invalid_utf8() {
        let result = decode_bytes(vec![0xff, 0xfe, 0x00]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid UTF-8"));
    }

    #[test]
    fn test_load_gzipped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crds.yaml.gz");
        fs::write(&path, gzip(b"---\na: 1\n---\nb: 2\n")).unwrap();

        let tree = load_yaml_file(&path).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_load_yaml_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "a: 1\na: 2\n").unwrap();

        let err = load_yaml(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML"));
    }
}
