use anyhow::{anyhow, bail, Context, Result};
use fast_image_resize as fr;
use fr::images::Image;
use opencv::{core::Mat, imgproc, prelude::*, videoio};
use std::path::Path;

/// Sequential reader over an assembled clip.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    pub width: u32,
    pub height: u32,
}

impl VideoDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("video path is not valid UTF-8: {}", path.display()))?;

        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("failed to open video {}", path.display()))?;
        if !capture.is_opened()? {
            bail!("Error opening video file: {}", path.display());
        }

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;

        crate::utils::logger::debug(&format!(
            "opened {}: {}x{} @ {} fps, ~{} frames",
            path.display(),
            width,
            height,
            fps,
            frame_count
        ));

        Ok(Self {
            capture,
            width,
            height,
        })
    }

    /// Next BGR frame, or `None` at end of stream.
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    /// Reads the next frame as packed RGB24 scaled onto a `target_w` x `target_h` canvas.
    ///
    /// Returns `false` at end of stream.
    pub fn read_rgb_into(
        &mut self,
        buffer: &mut Vec<u8>,
        target_w: u32,
        target_h: u32,
    ) -> Result<bool> {
        let Some(frame) = self.read_frame()? else {
            return Ok(false);
        };

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;
        if !rgb.is_continuous() {
            bail!("Frame is not continuous");
        }

        let canvas = letterbox_rgb(
            rgb.data_bytes()?,
            rgb.cols() as u32,
            rgb.rows() as u32,
            target_w,
            target_h,
        )?;
        buffer.clear();
        buffer.extend_from_slice(&canvas);
        Ok(true)
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        let _ = self.capture.release();
    }
}

/// Fits an RGB24 image inside a black `target_w` x `target_h` canvas, centered.
pub fn letterbox_rgb(
    rgb: &[u8],
    orig_w: u32,
    orig_h: u32,
    target_w: u32,
    target_h: u32,
) -> Result<Vec<u8>> {
    let scale = (target_w as f64 / orig_w as f64).min(target_h as f64 / orig_h as f64);
    let new_w = ((orig_w as f64 * scale).round() as u32).clamp(1, target_w.max(1));
    let new_h = ((orig_h as f64 * scale).round() as u32).clamp(1, target_h.max(1));

    let src_image = Image::from_vec_u8(orig_w, orig_h, rgb.to_vec(), fr::PixelType::U8x3)?;
    let mut dst_image = Image::new(new_w, new_h, fr::PixelType::U8x3);
    let mut resizer = fr::Resizer::new();
    resizer.resize(&src_image, &mut dst_image, None)?;
    let scaled = dst_image.buffer();

    let mut canvas = vec![0u8; (target_w * target_h * 3) as usize];
    let row_bytes = new_w as usize * 3;
    let x_off = target_w.saturating_sub(new_w) / 2;
    let y_off = target_h.saturating_sub(new_h) / 2;
    for y in 0..new_h.min(target_h) {
        let src = (y * new_w) as usize * 3;
        let dst = ((y_off + y) as usize * target_w as usize + x_off as usize) * 3;
        canvas[dst..dst + row_bytes].copy_from_slice(&scaled[src..src + row_bytes]);
    }

    Ok(canvas)
}
