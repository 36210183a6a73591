use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants;

fn read_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    Ok(entries)
}

/// Immediate subdirectories of `root`, sorted by path.
pub fn list_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = read_entries(root)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect();

    dirs.sort();
    Ok(dirs)
}

/// Files in `dir` whose name ends with `.jpg`, sorted by file name.
///
/// The suffix match is literal: `.JPG` and `.jpeg` are not frames.
pub fn list_jpegs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = read_entries(dir)?
        .into_iter()
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map_or(false, |name| name.ends_with(constants::FRAME_SUFFIX))
        })
        .collect();

    // Zero-padded frame names sort into capture order.
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}
