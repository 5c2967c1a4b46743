//! Writing tokenizer options to disk.

use crate::tokenizer::TokenizerOptions;
use joinery_core::{Result, TokenizerError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write options as pretty-printed JSON.
pub fn save_options(options: &TokenizerOptions, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| TokenizerError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, options)?;
    writer.flush().map_err(|e| TokenizerError::io(path, e))?;
    tracing::debug!("Saved tokenizer options to {}", path.display());
    Ok(())
}
