use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};

use crate::core::error::LabelError;
use crate::core::pipeline::{label_performances, ConsoleReviewer, RunOutcome, RunSummary};
use crate::dataset::{rater_csv_path, write_csv, CheckpointWriter, Dataset};
use crate::shared::LabelerConfig;
use crate::sync::CancelToken;
use crate::utils::logger;

/// Full interactive labelling run: rate every joke, then save `<rater>.csv`.
pub fn run(config: &LabelerConfig, cancel: &CancelToken) -> Result<Option<PathBuf>> {
    let performances_dir = config.performances_dir();
    println!("📂 Labelling performances in {}", performances_dir.display());
    println!("   Ctrl-C stops the run; at a prompt it takes effect once you press enter.");

    let stdin = io::stdin();
    let mut reviewer = ConsoleReviewer::new(
        config.root.clone(),
        config.video_name.clone(),
        config.clip.clone(),
        config.playback.clone(),
        stdin.lock(),
        io::stdout(),
    );

    let mut dataset = Dataset::new();
    let mut checkpoint = CheckpointWriter::new(config.checkpoint_path());
    if let Some(previous) = checkpoint.preserve_previous()? {
        println!(
            "💾 Ratings from an unfinished run were moved to {}",
            previous.display()
        );
    }

    let result = label_performances(
        &performances_dir,
        &mut reviewer,
        &mut dataset,
        &mut checkpoint,
        cancel,
    );
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            logger::error(&format!("run failed after {} ratings: {:#}", dataset.len(), err));
            if !dataset.is_empty() {
                eprintln!(
                    "❌ Run failed after {} ratings; they are kept in {}",
                    dataset.len(),
                    checkpoint.path().display()
                );
            }
            return Err(err);
        }
    };
    report(&summary);

    let rater = match (&config.rater, summary.outcome) {
        (Some(rater), _) => Some(rater.clone()),
        (None, RunOutcome::Completed) => match reviewer.ask_rater_name(cancel) {
            Ok(name) => Some(name),
            // Cancelled or closed at the name prompt: the checkpoint keeps the rows.
            Err(err)
                if err
                    .downcast_ref::<LabelError>()
                    .is_some_and(|e| !e.is_recoverable()) =>
            {
                logger::warn(&format!("no rater name: {}", err));
                None
            }
            Err(err) => return Err(err),
        },
        (None, _) => None,
    };

    save_results(&config.root, &dataset, summary.outcome, rater.as_deref(), checkpoint)
}

/// Writes `root/<rater>.csv` and drops the checkpoint. Without a rater the
/// checkpoint stays as the only copy of the rows and `None` is returned.
pub fn save_results(
    root: &Path,
    dataset: &Dataset,
    outcome: RunOutcome,
    rater: Option<&str>,
    checkpoint: CheckpointWriter,
) -> Result<Option<PathBuf>> {
    let Some(rater) = rater else {
        logger::warn(&format!(
            "run {:?} without a rater name; {} rows left in {}",
            outcome,
            dataset.len(),
            checkpoint.path().display()
        ));
        if !dataset.is_empty() {
            println!(
                "💾 {} ratings saved to {}",
                dataset.len(),
                checkpoint.path().display()
            );
        }
        return Ok(None);
    };

    let output = rater_csv_path(root, rater);
    write_csv(dataset.rows(), &output)
        .with_context(|| format!("failed to save ratings for '{}'", rater))?;
    checkpoint.finish()?;

    logger::info(&format!(
        "wrote {} rows to {} (run {:?})",
        dataset.len(),
        output.display(),
        outcome
    ));
    println!("✅ Saved {} ratings to {}", dataset.len(), output.display());
    Ok(Some(output))
}

fn report(summary: &RunSummary) {
    let outcome = match summary.outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::Cancelled => "cancelled",
        RunOutcome::InputClosed => "input closed",
    };
    logger::info(&format!(
        "run {}: {} rated, {} skipped",
        outcome, summary.rated, summary.skipped
    ));
    println!(
        "\n📊 Run {}: {} rated, {} skipped",
        outcome, summary.rated, summary.skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RatingRow;

    fn row(joke: &str, human: i8) -> RatingRow {
        RatingRow {
            participant: "p01".into(),
            condition: "control".into(),
            joke: joke.into(),
            video: "smile".into(),
            audio: "laugh".into(),
            human,
        }
    }

    /// A dataset whose rows also went through the checkpoint, as during a run.
    fn rated(root: &Path, jokes: &[&str]) -> (Dataset, CheckpointWriter, PathBuf) {
        let path = root.join(".face_labeler.partial.csv");
        let mut checkpoint = CheckpointWriter::new(path.clone());
        let mut dataset = Dataset::new();
        for joke in jokes {
            checkpoint.append(&row(joke, 1)).unwrap();
            dataset.push(row(joke, 1));
        }
        (dataset, checkpoint, path)
    }

    fn read_rows(path: &Path) -> Vec<RatingRow> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn completed_run_writes_rater_csv() {
        let root = tempfile::tempdir().unwrap();
        let (dataset, checkpoint, partial) = rated(root.path(), &["a", "b"]);

        let output = save_results(root.path(), &dataset, RunOutcome::Completed, Some("ana"), checkpoint)
            .unwrap()
            .unwrap();

        assert_eq!(output, root.path().join("ana.csv"));
        assert_eq!(read_rows(&output), vec![row("a", 1), row("b", 1)]);
        assert!(!partial.exists());
    }

    #[test]
    fn cancelled_run_with_rater_still_writes_csv() {
        let root = tempfile::tempdir().unwrap();
        let (dataset, checkpoint, partial) = rated(root.path(), &["a"]);

        let output = save_results(root.path(), &dataset, RunOutcome::Cancelled, Some("bo"), checkpoint)
            .unwrap()
            .unwrap();

        assert_eq!(read_rows(&output), vec![row("a", 1)]);
        assert!(!partial.exists());
    }

    #[test]
    fn cancelled_run_without_rater_keeps_checkpoint() {
        let root = tempfile::tempdir().unwrap();
        let (dataset, checkpoint, partial) = rated(root.path(), &["a", "b"]);

        let output =
            save_results(root.path(), &dataset, RunOutcome::Cancelled, None, checkpoint).unwrap();

        assert!(output.is_none());
        assert_eq!(read_rows(&partial), vec![row("a", 1), row("b", 1)]);
        let csvs: Vec<_> = std::fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| !name.starts_with('.'))
            .collect();
        assert!(csvs.is_empty(), "unexpected files: {:?}", csvs);
    }
}
