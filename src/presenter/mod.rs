//! Clip playback for the rater.
//!
//! Playback runs at a fixed presentation rate independent of the rate the
//! container declares, shows no audio, and stops at end of stream, on `q` or
//! `Esc`, or when the run is cancelled.

pub mod terminal;
pub mod window;

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::decoder::VideoDecoder;
use crate::renderer::DisplayMode;
use crate::shared::constants;
use crate::sync::{CancelToken, FramePacer};

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenterKind {
    /// Native window
    Window,
    /// Inside the terminal (for SSH/headless sessions)
    Terminal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaybackOptions {
    pub fps: f64,
    pub presenter: PresenterKind,
    /// Only used by the terminal presenter.
    pub mode: DisplayMode,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            fps: constants::DEFAULT_PLAYBACK_FPS,
            presenter: PresenterKind::Window,
            mode: DisplayMode::Rgb,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackSummary {
    pub frames_shown: u64,
    pub stopped_early: bool,
    pub elapsed: Duration,
}

/// What the user did while a frame was on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Stop,
}

/// A surface that can show decoded frames.
pub trait Presenter {
    /// Shows the next frame. Returns `false` at end of stream.
    fn show_next(&mut self) -> Result<bool>;

    /// Waits up to `timeout` for input.
    fn poll_key(&mut self, timeout: Duration) -> Result<KeyAction>;
}

/// Maps a key code (as returned by HighGUI) to an action.
pub fn key_action(code: i32) -> KeyAction {
    if code < 0 {
        return KeyAction::Continue;
    }
    match (code & 0xFF) as u8 {
        b'q' | b'Q' | 27 => KeyAction::Stop,
        _ => KeyAction::Continue,
    }
}

/// Runs the paced playback loop over any presenter.
pub fn play<P: Presenter>(
    presenter: &mut P,
    fps: f64,
    cancel: &CancelToken,
) -> Result<PlaybackSummary> {
    let start = Instant::now();
    let mut pacer = FramePacer::new(fps);
    let mut stopped_early = false;
    let mut frames_shown = 0u64;

    while !cancel.is_cancelled() {
        if !presenter.show_next()? {
            break;
        }
        if frames_shown == 0 {
            pacer.reset();
        }
        frames_shown += 1;

        // Input is polled for the whole frame interval, at least once.
        let mut action = presenter.poll_key(pacer.remaining().max(Duration::from_millis(1)))?;
        while action == KeyAction::Continue && !pacer.remaining().is_zero() && !cancel.is_cancelled() {
            action = presenter.poll_key(pacer.remaining())?;
        }
        if action == KeyAction::Stop {
            stopped_early = true;
            break;
        }
        pacer.frame_presented();
    }

    if cancel.is_cancelled() {
        stopped_early = true;
    }

    let elapsed = start.elapsed();
    let stats = pacer.stats();
    crate::utils::logger::debug(&format!(
        "playback ended: {} frames, early={}, {:.2}s, {:.2} fps (target {}), {} resyncs",
        frames_shown,
        stopped_early,
        elapsed.as_secs_f64(),
        stats.effective_fps(elapsed),
        stats.target_fps,
        stats.resyncs
    ));

    Ok(PlaybackSummary {
        frames_shown,
        stopped_early,
        elapsed,
    })
}

/// Opens `path` and plays it with the configured presenter.
pub fn watch_video(
    path: &Path,
    options: &PlaybackOptions,
    cancel: &CancelToken,
) -> Result<PlaybackSummary> {
    let decoder = VideoDecoder::open(path)?;

    match options.presenter {
        PresenterKind::Window => {
            let mut presenter = window::WindowPresenter::open(constants::WINDOW_TITLE, decoder)?;
            play(&mut presenter, options.fps, cancel)
        }
        PresenterKind::Terminal => {
            let mut presenter = terminal::TerminalPresenter::open(decoder, options.mode, cancel.clone())?;
            play(&mut presenter, options.fps, cancel)
        }
    }
}
