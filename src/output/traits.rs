//! Record sink trait and output errors

use crate::extract::ParticipantRecord;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink already finished")]
    Closed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for the records of one run
///
/// Records arrive in emission order. Nothing a sink receives is considered
/// committed until [`RecordSink::finish`] returns `Ok`.
pub trait RecordSink: Send {
    /// Takes ownership of one emitted record
    fn accept(&mut self, record: ParticipantRecord) -> OutputResult<()>;

    /// Commits everything accepted so far; later calls to `accept` fail
    fn finish(&mut self) -> OutputResult<()>;
}

impl RecordSink for Vec<ParticipantRecord> {
    fn accept(&mut self, record: ParticipantRecord) -> OutputResult<()> {
        self.push(record);
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
