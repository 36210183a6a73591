use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

use super::{KeyAction, Presenter};
use crate::decoder::VideoDecoder;
use crate::renderer::cell::CellData;
use crate::renderer::{DisplayManager, DisplayMode, FrameProcessor};
use crate::sync::CancelToken;

/// Plays a clip inside the terminal using half-block cells.
pub struct TerminalPresenter {
    decoder: VideoDecoder,
    display: DisplayManager,
    processor: FrameProcessor,
    pixels: Vec<u8>,
    cells: Vec<CellData>,
    cancel: CancelToken,
}

/// Largest cell grid with the clip's aspect ratio that fits the terminal.
///
/// Returns pixel dimensions; the height is twice the number of cell rows.
pub fn fit_to_terminal(clip_w: u32, clip_h: u32, cols: u16, rows: u16) -> (u32, u32) {
    // Keep one row free for the status line.
    let max_w = (cols as u32).max(1);
    let max_h = (rows.saturating_sub(1) as u32).max(1) * 2;
    if clip_w == 0 || clip_h == 0 {
        return (max_w, max_h);
    }

    let scale = (max_w as f64 / clip_w as f64).min(max_h as f64 / clip_h as f64);
    let w = ((clip_w as f64 * scale).floor() as u32).clamp(1, max_w);
    let h = ((clip_h as f64 * scale).floor() as u32).clamp(2, max_h.max(2));
    // Whole cells only.
    (w, h - h % 2)
}

impl TerminalPresenter {
    pub fn open(decoder: VideoDecoder, mode: DisplayMode, cancel: CancelToken) -> Result<Self> {
        let mut display = DisplayManager::new(mode)?;
        let (cols, rows) = display.terminal_size()?;
        let (pixel_w, pixel_h) = fit_to_terminal(decoder.width, decoder.height, cols, rows);

        crate::utils::logger::debug(&format!(
            "terminal playback: clip {}x{} -> {}x{} pixels in {}x{} terminal",
            decoder.width, decoder.height, pixel_w, pixel_h, cols, rows
        ));
        display.status_line("q / Esc: stop")?;

        let processor = FrameProcessor::new(pixel_w as usize, pixel_h as usize);
        let cells = vec![CellData::default(); processor.cell_count()];
        Ok(Self {
            decoder,
            display,
            processor,
            pixels: Vec::new(),
            cells,
            cancel,
        })
    }
}

impl Presenter for TerminalPresenter {
    fn show_next(&mut self) -> Result<bool> {
        let (w, h) = (self.processor.width as u32, self.processor.height as u32);
        if !self.decoder.read_rgb_into(&mut self.pixels, w, h)? {
            return Ok(false);
        }

        self.processor.process_frame_into(&self.pixels, &mut self.cells);
        self.display.render_diff(&self.cells, self.processor.width)?;
        Ok(true)
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<KeyAction> {
        if !event::poll(timeout)? {
            return Ok(KeyAction::Continue);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(KeyAction::Continue);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(KeyAction::Continue);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Ok(KeyAction::Stop),
            // Raw mode swallows SIGINT, so Ctrl-C arrives as a key.
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cancel.cancel();
                Ok(KeyAction::Stop)
            }
            _ => Ok(KeyAction::Continue),
        }
    }
}
