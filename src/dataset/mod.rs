pub mod writer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::error::LabelError;
use crate::metadata::JokeLabels;

pub use writer::{write_csv, CheckpointWriter};

/// A rater's score for one joke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i8);

impl Rating {
    pub fn value(self) -> i8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 | 0 | 1 => Ok(Rating(value as i8)),
            other => Err(other),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of the output dataset. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRow {
    pub participant: String,
    pub condition: String,
    pub joke: String,
    pub video: String,
    pub audio: String,
    pub human: i8,
}

impl RatingRow {
    pub fn new(participant: &str, labels: &JokeLabels, rating: Rating) -> Self {
        Self {
            participant: participant.to_string(),
            condition: labels.condition.clone(),
            joke: labels.joke.clone(),
            video: labels.video.clone(),
            audio: labels.audio.clone(),
            human: rating.value(),
        }
    }
}

/// Rows collected during a run, in processing order.
#[derive(Debug, Default)]
pub struct Dataset {
    rows: Vec<RatingRow>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: RatingRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[RatingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trims and lower-cases a rater name. The name becomes a file name at the
/// root, so empty names and anything that could leave the root are refused.
pub fn normalize_rater_name(raw: &str) -> Result<String, LabelError> {
    let name = raw.trim().to_lowercase();
    let invalid = |reason| LabelError::InvalidRaterName {
        name: raw.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("is empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(invalid("cannot contain path separators"));
    }
    Ok(name)
}

/// `root/<rater>.csv` for an already normalized name.
pub fn rater_csv_path(root: &Path, rater: &str) -> PathBuf {
    root.join(format!("{}.csv", rater))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rater_names_are_normalized() {
        assert_eq!(normalize_rater_name(" Ana ").unwrap(), "ana");
        assert_eq!(normalize_rater_name("BO").unwrap(), "bo");
        for bad in ["", "   ", "../../tmp/x", "a\\b", "..", "."] {
            assert!(
                matches!(
                    normalize_rater_name(bad),
                    Err(LabelError::InvalidRaterName { .. })
                ),
                "{:?} should be refused",
                bad
            );
        }
    }

    #[test]
    fn rater_csv_lands_in_root() {
        assert_eq!(
            rater_csv_path(Path::new("/study"), "ana"),
            PathBuf::from("/study/ana.csv")
        );
    }

    #[test]
    fn only_three_ratings_exist() {
        for value in [-1, 0, 1] {
            assert_eq!(Rating::try_from(value).unwrap().value() as i64, value);
        }
        for value in [-2, 2, 10, i64::MIN] {
            assert_eq!(Rating::try_from(value), Err(value));
        }
    }

    #[test]
    fn row_takes_labels_and_rating() {
        let labels = JokeLabels {
            joke: "opener".into(),
            video: "smile".into(),
            audio: "laugh".into(),
            condition: "control".into(),
        };
        let row = RatingRow::new("p01", &labels, Rating::try_from(1).unwrap());
        assert_eq!(row.participant, "p01");
        assert_eq!(row.condition, "control");
        assert_eq!(row.human, 1);
    }

    #[test]
    fn dataset_keeps_order() {
        let mut dataset = Dataset::new();
        for joke in ["a", "b", "c"] {
            dataset.push(RatingRow {
                participant: "p01".into(),
                condition: "x".into(),
                joke: joke.into(),
                video: "v".into(),
                audio: "a".into(),
                human: 0,
            });
        }
        let jokes: Vec<_> = dataset.rows().iter().map(|r| r.joke.as_str()).collect();
        assert_eq!(jokes, vec!["a", "b", "c"]);
    }
}
