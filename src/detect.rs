//! Source validation: existence and `%PDF-x.y` header checks.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header information read from the first bytes of a PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// Declared version, e.g. "1.7" or "2.0".
    pub version: String,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;
const HEADER_PROBE: u64 = 16;

/// Validate a source path and read its PDF header.
///
/// Returns `Error::FileNotFound` when the path does not exist, so callers
/// can tell a missing input apart from a malformed one.
pub fn validate_source<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut header = Vec::with_capacity(HEADER_PROBE as usize);
    File::open(path)?.take(HEADER_PROBE).read_to_end(&mut header)?;
    read_header(&header)
}

/// Parse the PDF header from the leading bytes of a file.
pub fn read_header(data: &[u8]) -> Result<PdfHeader> {
    let rest = data.strip_prefix(PDF_MAGIC).ok_or(Error::UnknownFormat)?;
    if rest.len() < VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    let version = String::from_utf8_lossy(&rest[..VERSION_LEN]).into_owned();
    match version.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(PdfHeader { version })
        }
        _ => Err(Error::UnsupportedVersion(version)),
    }
}

/// Check whether a file looks like a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    validate_source(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_header_versions() {
        assert_eq!(read_header(b"%PDF-1.7\n%\xe2\xe3").unwrap().version, "1.7");
        assert_eq!(read_header(b"%PDF-2.0\n").unwrap().version, "2.0");
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(matches!(
            read_header(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(read_header(b"%PDF"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_bad_version() {
        let err = read_header(b"%PDF-x.y\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(v) if v == "x.y"));
    }

    #[test]
    fn test_missing_file() {
        let err = validate_source("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert!(!is_pdf("/definitely/not/here.pdf"));
    }

    #[test]
    fn test_validate_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();
        let header = validate_source(file.path()).unwrap();
        assert_eq!(header.to_string(), "PDF 1.4");
    }
}
