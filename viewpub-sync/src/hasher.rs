//! Streaming SHA-256 content fingerprints.
//!
//! Files are read in fixed-size chunks so memory stays constant regardless of
//! view size. The digest covers file bytes only; no metadata is mixed in.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Hash the file at `path`.
///
/// An unreadable file is an error, never an empty digest: callers building a
/// manifest must fail rather than silently drop the file.
pub fn hash_file(path: &Path) -> Result<String, SyncError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0_u8; CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_err(path, e)),
        };
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash an in-memory buffer; identical to [`hash_file`] over the same bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_file_has_known_digest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.json");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn file_and_buffer_digests_agree_across_chunk_boundary() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.json");
        let bytes: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &bytes).unwrap();

        let digest = hash_file(&path).unwrap();
        assert_eq!(digest, hash_bytes(&bytes));
        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = hash_file(&tmp.path().join("gone.json")).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("gone.json"));
    }

    #[test]
    fn digest_ignores_metadata() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.json");
        let b = tmp.path().join("b.json");
        fs::write(&a, br#"{"metadata":{}}"#).unwrap();
        fs::write(&b, br#"{"metadata":{}}"#).unwrap();
        filetime::set_file_mtime(&b, filetime::FileTime::from_unix_time(0, 0)).unwrap();
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }
}
