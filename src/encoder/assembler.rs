use anyhow::{anyhow, bail, Context, Result};
use opencv::{
    core::{Mat, Size},
    imgcodecs, imgproc,
    prelude::*,
    videoio,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::error::LabelError;
use crate::shared::constants;

/// Container settings for assembled clips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipFormat {
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    /// `raw` for uncompressed frames, otherwise a four-character code such as `MJPG`.
    pub codec: String,
}

impl Default for ClipFormat {
    fn default() -> Self {
        Self {
            width: constants::DEFAULT_FRAME_WIDTH,
            height: constants::DEFAULT_FRAME_HEIGHT,
            fps: constants::DEFAULT_CONTAINER_FPS,
            codec: constants::DEFAULT_CODEC.to_string(),
        }
    }
}

impl ClipFormat {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn fourcc(&self) -> Result<i32> {
        if self.codec.eq_ignore_ascii_case("raw") {
            return Ok(0);
        }
        let chars: Vec<char> = self.codec.chars().collect();
        let [a, b, c, d] = chars.as_slice() else {
            bail!("codec must be 'raw' or a four-character code, got '{}'", self.codec);
        };
        Ok(videoio::VideoWriter::fourcc(*a, *b, *c, *d)?)
    }
}

/// Owns the OpenCV writer so the container is finalized on every exit path.
struct ClipWriter {
    writer: videoio::VideoWriter,
}

impl ClipWriter {
    fn open(path: &Path, format: &ClipFormat) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("clip path is not valid UTF-8: {}", path.display()))?;

        let writer = videoio::VideoWriter::new(path_str, format.fourcc()?, format.fps, format.size(), true)
            .with_context(|| format!("failed to create video writer at {}", path.display()))?;

        if !writer.is_opened()? {
            bail!(
                "failed to open video writer at {} (codec '{}')",
                path.display(),
                format.codec
            );
        }
        Ok(Self { writer })
    }

    fn write(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}

impl Drop for ClipWriter {
    fn drop(&mut self) {
        let _ = self.writer.release();
    }
}

fn load_frame(path: &Path, target: Size) -> Result<Mat> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("frame path is not valid UTF-8: {}", path.display()))?;

    let frame = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)
        .with_context(|| format!("failed to read frame {}", path.display()))?;
    if frame.empty() {
        bail!("frame {} could not be decoded", path.display());
    }

    let actual = frame.size()?;
    if actual == target {
        return Ok(frame);
    }

    crate::utils::logger::warn(&format!(
        "frame {} is {}x{}, resizing to {}x{}",
        path.display(),
        actual.width,
        actual.height,
        target.width,
        target.height
    ));
    let mut resized = Mat::default();
    imgproc::resize(&frame, &mut resized, target, 0.0, 0.0, imgproc::INTER_AREA)?;
    Ok(resized)
}

/// Writes `frame_paths` in order into `root_path/video_name` and returns the clip path.
pub fn create_video(
    root_path: &Path,
    frame_paths: &[PathBuf],
    video_name: &str,
    format: &ClipFormat,
) -> Result<PathBuf> {
    if frame_paths.is_empty() {
        return Err(LabelError::NoFrames(root_path.to_path_buf()).into());
    }

    let video_path = root_path.join(video_name);
    let target = format.size();
    let mut writer = ClipWriter::open(&video_path, format)?;

    for frame_path in frame_paths {
        let frame = load_frame(frame_path, target)?;
        writer.write(&frame)?;
    }

    writer
        .finish()
        .with_context(|| format!("failed to finalize {}", video_path.display()))?;

    crate::utils::logger::debug(&format!(
        "assembled {} frames into {} ({}x{} @ {} fps)",
        frame_paths.len(),
        video_path.display(),
        format.width,
        format.height,
        format.fps
    ));
    Ok(video_path)
}
