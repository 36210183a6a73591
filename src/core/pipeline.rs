use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::core::error::LabelError;
use crate::core::participant::performance_participant;
use crate::dataset::{CheckpointWriter, Dataset, Rating, RatingRow};
use crate::encoder::{create_video, ClipFormat};
use crate::metadata::{get_metadata, JokeLabels};
use crate::presenter::{watch_video, PlaybackOptions};
use crate::sync::CancelToken;
use crate::ui::prompt;
use crate::utils::{file_utils, logger};

/// A joke whose metadata and frames are ready for review.
#[derive(Debug, Clone)]
pub struct PreparedJoke {
    pub participant: String,
    pub joke_dir: PathBuf,
    pub labels: JokeLabels,
    pub frames: Vec<PathBuf>,
}

/// A performance directory and its joke directories.
#[derive(Debug, Clone)]
pub struct PerformanceScan {
    pub performance_dir: PathBuf,
    pub joke_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rated: usize,
    pub skipped: usize,
    pub outcome: RunOutcome,
}

/// Does the interactive part for one joke: build the clip, show it, get a score.
pub trait Reviewer {
    fn review(&mut self, joke: &PreparedJoke, cancel: &CancelToken) -> Result<Rating>;
}

/// Lists `performances_dir/<performance>/<joke>` in path order.
pub fn scan_performances(performances_dir: &Path) -> Result<Vec<PerformanceScan>> {
    file_utils::list_dirs(performances_dir)?
        .into_iter()
        .map(|performance_dir| {
            let joke_dirs = file_utils::list_dirs(&performance_dir)?;
            Ok(PerformanceScan {
                performance_dir,
                joke_dirs,
            })
        })
        .collect()
}

/// Reads labels and frames for one joke.
pub fn prepare_joke(participant: &str, joke_dir: &Path) -> Result<PreparedJoke, LabelError> {
    let metadata = get_metadata(joke_dir)?;
    let labels = JokeLabels::try_from(&metadata)?;

    let frames = file_utils::list_jpegs(joke_dir).map_err(|e| LabelError::Io {
        path: joke_dir.to_path_buf(),
        source: std::io::Error::other(format!("{:#}", e)),
    })?;
    if frames.is_empty() {
        return Err(LabelError::NoFrames(joke_dir.to_path_buf()));
    }

    Ok(PreparedJoke {
        participant: participant.to_string(),
        joke_dir: joke_dir.to_path_buf(),
        labels,
        frames,
    })
}

/// Outcome for errors that end the whole run rather than one joke.
fn stop_outcome(err: &anyhow::Error) -> Option<RunOutcome> {
    match err.downcast_ref::<LabelError>() {
        Some(label_err) if !label_err.is_recoverable() => Some(match label_err {
            LabelError::InputClosed(_) => RunOutcome::InputClosed,
            _ => RunOutcome::Cancelled,
        }),
        _ => None,
    }
}

fn ensure_not_cancelled(cancel: &CancelToken) -> Result<(), LabelError> {
    if cancel.is_cancelled() {
        return Err(LabelError::Cancelled);
    }
    Ok(())
}

fn report_skip(what: &Path, err: &dyn std::fmt::Display) {
    let msg = format!("skipping {}: {}", what.display(), err);
    logger::warn(&msg);
    eprintln!("⚠️  {}", msg);
}

/// Walks every performance and joke, appending one row per rated joke.
///
/// Problems local to a joke skip that joke; earlier rows are never touched.
/// Only dataset I/O errors abort the loop.
pub fn label_performances<V: Reviewer>(
    performances_dir: &Path,
    reviewer: &mut V,
    dataset: &mut Dataset,
    checkpoint: &mut CheckpointWriter,
    cancel: &CancelToken,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        rated: 0,
        skipped: 0,
        outcome: RunOutcome::Completed,
    };

    let performances = scan_performances(performances_dir)?;
    logger::info(&format!(
        "found {} performances under {}",
        performances.len(),
        performances_dir.display()
    ));

    'performances: for performance in performances {
        let participant = match performance_participant(&performance.performance_dir) {
            Ok(code) => code,
            Err(err) => {
                report_skip(&performance.performance_dir, &err);
                summary.skipped += performance.joke_dirs.len();
                continue;
            }
        };
        logger::info(&format!(
            "participant {}: {} jokes in {}",
            participant,
            performance.joke_dirs.len(),
            performance.performance_dir.display()
        ));

        for joke_dir in &performance.joke_dirs {
            if cancel.is_cancelled() {
                summary.outcome = RunOutcome::Cancelled;
                break 'performances;
            }

            let joke = match prepare_joke(&participant, joke_dir) {
                Ok(joke) => joke,
                Err(err) => {
                    report_skip(joke_dir, &err);
                    summary.skipped += 1;
                    continue;
                }
            };

            let rating = match reviewer.review(&joke, cancel) {
                // An answer typed after Ctrl-C is not recorded.
                Ok(_) if cancel.is_cancelled() => {
                    summary.outcome = RunOutcome::Cancelled;
                    break 'performances;
                }
                Ok(rating) => rating,
                Err(err) => {
                    if let Some(outcome) = stop_outcome(&err) {
                        summary.outcome = outcome;
                        break 'performances;
                    }
                    if cancel.is_cancelled() {
                        summary.outcome = RunOutcome::Cancelled;
                        break 'performances;
                    }
                    report_skip(joke_dir, &format!("{:#}", err));
                    summary.skipped += 1;
                    continue;
                }
            };

            let row = RatingRow::new(&participant, &joke.labels, rating);
            logger::info(&format!(
                "rated {}/{} ({}) = {}",
                row.participant, row.joke, row.condition, rating
            ));
            checkpoint.append(&row)?;
            dataset.push(row);
            summary.rated += 1;
        }
    }

    if cancel.is_cancelled() {
        summary.outcome = RunOutcome::Cancelled;
    }
    Ok(summary)
}

/// Console reviewer: assembles the clip at the root, waits for enter, plays
/// it and asks for a score on stdin.
pub struct ConsoleReviewer<R, W> {
    root: PathBuf,
    video_name: String,
    clip: ClipFormat,
    playback: PlaybackOptions,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleReviewer<R, W> {
    pub fn new(
        root: PathBuf,
        video_name: String,
        clip: ClipFormat,
        playback: PlaybackOptions,
        input: R,
        output: W,
    ) -> Self {
        Self {
            root,
            video_name,
            clip,
            playback,
            input,
            output,
        }
    }

    /// Asks for the rater's name. Ctrl-C at the prompt discards the answer.
    pub fn ask_rater_name(&mut self, cancel: &CancelToken) -> Result<String> {
        let name = prompt::ask_rater_name(&mut self.input, &mut self.output)?;
        ensure_not_cancelled(cancel)?;
        Ok(name)
    }

    /// SIGINT does not interrupt a blocking read, so every answer is checked
    /// against the cancel flag before it is accepted.
    fn confirm_start(&mut self, cancel: &CancelToken) -> Result<()> {
        prompt::wait_for_enter(&mut self.input, &mut self.output)?;
        ensure_not_cancelled(cancel)?;
        Ok(())
    }

    fn rate(&mut self, cancel: &CancelToken) -> Result<Rating> {
        let rating = prompt::collect_rating(&mut self.input, &mut self.output)?;
        ensure_not_cancelled(cancel)?;
        Ok(rating)
    }
}

impl<R: BufRead, W: Write> Reviewer for ConsoleReviewer<R, W> {
    fn review(&mut self, joke: &PreparedJoke, cancel: &CancelToken) -> Result<Rating> {
        let clip = create_video(&self.root, &joke.frames, &self.video_name, &self.clip)?;

        self.confirm_start(cancel)?;
        let playback = watch_video(&clip, &self.playback, cancel)?;
        ensure_not_cancelled(cancel)?;
        logger::debug(&format!(
            "{}: showed {} frames{}",
            joke.joke_dir.display(),
            playback.frames_shown,
            if playback.stopped_early { " (stopped early)" } else { "" }
        ));

        self.rate(cancel)
    }
}
