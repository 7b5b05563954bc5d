//! Checksum utilities for downloaded file verification
//!
//! The catalog reports an MD5 digest for every file it lists; these helpers
//! compute and verify that digest over the local copy.

use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors from checksum computation or verification
#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    Mismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Compute the MD5 digest of a file as a lowercase hex string
pub fn compute_file_md5(path: impl AsRef<Path>) -> Result<String, ChecksumError> {
    let mut file = std::fs::File::open(path)?;
    compute_md5(&mut file)
}

/// Compute the MD5 digest of any readable source
pub fn compute_md5<R: Read>(reader: &mut R) -> Result<String, ChecksumError> {
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against an expected MD5 digest (case-insensitive)
pub fn verify_file_md5(path: impl AsRef<Path>, expected: &str) -> Result<(), ChecksumError> {
    let actual = compute_file_md5(path.as_ref())?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ChecksumError::Mismatch {
            file: path.as_ref().display().to_string(),
            expected: expected.to_lowercase(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    #[test]
    fn test_compute_md5() {
        let mut cursor = Cursor::new(b"hello world");
        let digest = compute_md5(&mut cursor).unwrap();
        assert_eq!(digest, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_verify_file_md5_match() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();

        // Uppercase expected digests from the catalog must still verify
        verify_file_md5(file.path(), "5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap();
    }

    #[test]
    fn test_verify_file_md5_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();

        let err = verify_file_md5(file.path(), "00000000000000000000000000000000").unwrap_err();
        assert!(matches!(err, ChecksumError::Mismatch { .. }));
    }
}
