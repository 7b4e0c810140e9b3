//! Export output: directory layout, raw JSON store and CSV match index

pub mod csv;
pub mod json;
pub mod path;

pub use csv::{CsvMatchIndexWriter, MatchSummary};
pub use json::JsonStore;
pub use path::OutputLayout;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Writer for the per-player match index
pub trait MatchIndexWriter: OutputWriter {
    /// Write one index row
    fn write_summary(&mut self, summary: &MatchSummary) -> OutputResult<()>;

    /// Write several rows
    fn write_summaries(&mut self, summaries: &[MatchSummary]) -> OutputResult<()> {
        for summary in summaries {
            self.write_summary(summary)?;
        }
        Ok(())
    }
}
