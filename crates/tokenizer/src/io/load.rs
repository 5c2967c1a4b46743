//! Loading models and options from disk.
//!
//! Model files that cannot be read are reported as
//! [`TokenizerError::ModelLoad`] with the offending path; option files go
//! through the regular I/O and configuration errors.

use crate::tokenizer::TokenizerOptions;
use joinery_core::{Result, TokenizerError};
use std::fs;
use std::path::Path;

/// Read a binary model file.
pub fn read_model_bytes(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|e| TokenizerError::model_load(path, e.to_string()))?;
    if bytes.is_empty() {
        return Err(TokenizerError::model_load(path, "file is empty"));
    }
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Read a text model file.
pub fn read_model_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| TokenizerError::model_load(path, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| {
        TokenizerError::model_load(
            path,
            format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        )
    })
}

/// Read tokenizer options from a JSON file.
pub fn load_options(path: &Path) -> Result<TokenizerOptions> {
    let json = fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
    TokenizerOptions::from_json_str(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_model_is_model_load() {
        let err = read_model_text(Path::new("/nonexistent/codes.bpe")).unwrap_err();
        match err {
            TokenizerError::ModelLoad { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/codes.bpe"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_model_load() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'a', 0xff, b'b']).unwrap();
        let err = read_model_text(file.path()).unwrap_err();
        assert!(matches!(err, TokenizerError::ModelLoad { .. }));
    }

    #[test]
    fn test_empty_binary_model() {
        let file = NamedTempFile::new().unwrap();
        assert!(read_model_bytes(file.path()).is_err());
    }

    #[test]
    fn test_missing_options_is_io() {
        let err = load_options(Path::new("/nonexistent/options.json")).unwrap_err();
        assert!(matches!(err, TokenizerError::Io { .. }));
    }
}
