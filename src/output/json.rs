//! Raw JSON files written atomically

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use super::{OutputError, OutputResult};

/// Writes pretty-printed JSON through a temporary file and rename, so an
/// interrupted export never leaves a truncated file behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStore;

impl JsonStore {
    /// Serialize `value` to `path`, creating parent directories.
    pub fn write<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp)
                .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)
                .map_err(|e| OutputError::SerializationError(e.to_string()))?;
            writer
                .flush()
                .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))?;
        }

        std::fs::rename(&tmp, path)
            .map_err(|e| OutputError::IoError(format!("Failed to rename {}: {}", tmp.display(), e)))?;
        debug!(path = %path.display(), "JSON written");
        Ok(())
    }

    /// Read a JSON file back
    pub fn read(path: &Path) -> OutputResult<serde_json::Value> {
        let file = File::open(path)
            .map_err(|e| OutputError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| OutputError::SerializationError(e.to_string()))
    }

    /// Whether a completed file exists at `path`
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }
}
