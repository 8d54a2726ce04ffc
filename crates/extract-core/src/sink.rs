//! Persistence of per-page record batches

use crate::assembler::DiaryRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed CSV header, in column order
pub const CSV_HEADER: [&str; 7] = [
    "Filename", "Location", "Date", "FromTime", "ToTime", "Phone", "Activity",
];

/// Receives one complete batch per page
pub trait RecordSink {
    /// Persist a page batch; returns the number of records written
    fn write_page(&mut self, records: &[DiaryRecord]) -> Result<usize>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write_page(&mut self, records: &[DiaryRecord]) -> Result<usize> {
        (**self).write_page(records)
    }
}

/// How an existing CSV file is treated when a document run starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep existing rows and add new ones
    #[default]
    Append,
    /// Truncate the file, then append page by page
    Overwrite,
}

/// CSV file sink with the diary header
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Open a sink at `path`, creating parent directories as needed
    pub fn open(path: impl AsRef<Path>, mode: WriteMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if mode == WriteMode::Overwrite {
            fs::File::create(&path)?;
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn needs_header(&self) -> bool {
        fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0)
    }
}

impl RecordSink for CsvSink {
    fn write_page(&mut self, records: &[DiaryRecord]) -> Result<usize> {
        let needs_header = self.needs_header();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(CSV_HEADER)?;
        }

        let mut written = 0;
        for record in records.iter().filter(|r| r.has_activity()) {
            writer.serialize(record)?;
            written += 1;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", written, self.path.display());
        Ok(written)
    }
}
