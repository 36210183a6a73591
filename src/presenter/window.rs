use anyhow::{Context, Result};
use opencv::highgui;
use std::time::Duration;

use super::{key_action, KeyAction, Presenter};
use crate::decoder::VideoDecoder;

/// A single HighGUI window kept on top of other windows.
pub struct WindowPresenter {
    title: String,
    decoder: VideoDecoder,
    shown_once: bool,
}

impl WindowPresenter {
    pub fn open(title: &str, decoder: VideoDecoder) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("failed to open playback window '{}'", title))?;
        Ok(Self {
            title: title.to_string(),
            decoder,
            shown_once: false,
        })
    }

    fn window_closed(&self) -> bool {
        highgui::get_window_property(&self.title, highgui::WND_PROP_VISIBLE)
            .map(|visible| visible < 1.0)
            .unwrap_or(true)
    }
}

impl Presenter for WindowPresenter {
    fn show_next(&mut self) -> Result<bool> {
        let Some(frame) = self.decoder.read_frame()? else {
            return Ok(false);
        };

        highgui::imshow(&self.title, &frame)?;
        if !self.shown_once {
            highgui::set_window_property(&self.title, highgui::WND_PROP_TOPMOST, 1.0)?;
            self.shown_once = true;
        }
        Ok(true)
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<KeyAction> {
        let delay_ms = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let code = highgui::wait_key(delay_ms)?;
        if self.shown_once && self.window_closed() {
            return Ok(KeyAction::Stop);
        }
        Ok(key_action(code))
    }
}

impl Drop for WindowPresenter {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.title);
        // Let the GUI backend process the close.
        let _ = highgui::wait_key(1);
    }
}
