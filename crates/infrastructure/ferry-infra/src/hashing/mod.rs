use camino::Utf8Path;
use md5::Context;
use std::fs::File;
use std::io::{BufReader, Read};

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Streaming md5 of a file's contents, as a lowercase hex digest.
/// Content identity on the remote side is keyed by this digest.
pub fn md5_hex(fs_path: &Utf8Path) -> Result<String, HashError> {
    let file = File::open(fs_path)?;
    let mut reader = BufReader::new(file);

    let mut hasher = Context::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.consume(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn digest_matches_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);

        let utf8 = Utf8Path::from_path(&path).unwrap();
        assert_eq!(md5_hex(utf8).unwrap(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn empty_file_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap();

        let utf8 = Utf8Path::from_path(&path).unwrap();
        assert_eq!(md5_hex(utf8).unwrap(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            md5_hex(Utf8Path::new("/no/such/file")),
            Err(HashError::Io(_))
        ));
    }
}
