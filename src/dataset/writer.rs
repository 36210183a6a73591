use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use super::RatingRow;
use crate::shared::constants;

fn header_writer<W: std::io::Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(inner)
}

/// Writes the full table to `path`, replacing any existing file.
///
/// The header row is written even when there are no rows.
pub fn write_csv(rows: &[RatingRow], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create dataset {}", path.display()))?;
    let mut writer = header_writer(file);

    writer
        .write_record(constants::CSV_COLUMNS)
        .with_context(|| format!("failed to write header to {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

/// Appends every accepted row to a side file as soon as it is rated, so an
/// aborted run still leaves its ratings on disk.
///
/// Rows are only ever appended; an existing file is never truncated.
pub struct CheckpointWriter {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

/// `<stem>-<stamp>.csv` next to `path`.
fn rotated_path(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}-{}.csv", stem, stamp))
}

impl CheckpointWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path, writer: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves a checkpoint left by an earlier, unfinished run out of the way
    /// under a timestamped name, and returns where it went.
    pub fn preserve_previous(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut target = rotated_path(&self.path, &stamp);
        let mut n = 1;
        while target.exists() {
            target = rotated_path(&self.path, &format!("{}-{}", stamp, n));
            n += 1;
        }

        fs::rename(&self.path, &target).with_context(|| {
            format!(
                "failed to move previous checkpoint {} to {}",
                self.path.display(),
                target.display()
            )
        })?;
        crate::utils::logger::warn(&format!(
            "previous checkpoint kept as {}",
            target.display()
        ));
        Ok(Some(target))
    }

    pub fn append(&mut self, row: &RatingRow) -> Result<()> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("failed to open checkpoint {}", self.path.display()))?;
            let needs_header = file.metadata()?.len() == 0;
            let mut writer = header_writer(file);
            if needs_header {
                writer.write_record(constants::CSV_COLUMNS)?;
            }
            self.writer = Some(writer);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer
                .serialize(row)
                .with_context(|| format!("failed to append to checkpoint {}", self.path.display()))?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Deletes the checkpoint once the final dataset is safely written.
    ///
    /// A writer that never appended leaves any existing file alone.
    pub fn finish(mut self) -> Result<()> {
        if self.writer.take().is_none() {
            return Ok(());
        }
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove checkpoint {}", self.path.display()))?;
        }
        Ok(())
    }
}
