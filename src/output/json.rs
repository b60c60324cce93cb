//! Streaming JSON array file sink
//!
//! Records are written to `<target>.part` as they arrive, one per line:
//!
//! ```text
//! [
//! {"bib_number":"1",...},
//! {"bib_number":"2",...}
//! ]
//! ```
//!
//! `finish` closes the array and renames the partial file over the target.
//! A sink dropped before `finish` deletes its partial file.

use crate::extract::ParticipantRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one event's records as a JSON array file
#[derive(Debug)]
pub struct JsonArraySink {
    target: PathBuf,
    part: PathBuf,
    writer: Option<BufWriter<File>>,
    written: usize,
    committed: bool,
}

impl JsonArraySink {
    /// Opens `<target>.part` for writing, creating parent directories
    pub fn create(target: impl AsRef<Path>) -> OutputResult<Self> {
        let target = target.as_ref().to_path_buf();

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let part = part_path(&target);
        let mut writer = BufWriter::new(File::create(&part)?);
        writer.write_all(b"[")?;

        tracing::debug!("Writing records to {}", part.display());

        Ok(Self {
            target,
            part,
            writer: Some(writer),
            written: 0,
            committed: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Number of records accepted so far
    pub fn written(&self) -> usize {
        self.written
    }
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

impl RecordSink for JsonArraySink {
    fn accept(&mut self, record: ParticipantRecord) -> OutputResult<()> {
        let writer = self.writer.as_mut().ok_or(OutputError::Closed)?;

        let separator: &[u8] = if self.written == 0 { b"\n" } else { b",\n" };
        writer.write_all(separator)?;
        serde_json::to_writer(&mut *writer, &record)?;

        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        let mut writer = self.writer.take().ok_or(OutputError::Closed)?;

        let closing: &[u8] = if self.written == 0 { b"]" } else { b"\n]" };
        writer.write_all(closing)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        fs::rename(&self.part, &self.target)?;
        self.committed = true;

        tracing::info!(
            "Committed {} records to {}",
            self.written,
            self.target.display()
        );
        Ok(())
    }
}

impl Drop for JsonArraySink {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        self.writer.take();
        match fs::remove_file(&self.part) {
            Ok(()) => tracing::debug!("Discarded partial output {}", self.part.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.part.display(), e),
        }
    }
}
