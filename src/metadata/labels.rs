use serde::Serialize;

use super::parser::Metadata;
use crate::core::error::LabelError;
use crate::shared::constants;

/// The labels of one joke that end up in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JokeLabels {
    pub joke: String,
    pub video: String,
    pub audio: String,
    pub condition: String,
}

impl TryFrom<&Metadata> for JokeLabels {
    type Error = LabelError;

    fn try_from(metadata: &Metadata) -> Result<Self, Self::Error> {
        Ok(Self {
            joke: metadata.require(constants::KEY_JOKE)?.to_string(),
            video: metadata.require(constants::KEY_VIDEO)?.to_string(),
            audio: metadata.require(constants::KEY_AUDIO)?.to_string(),
            condition: metadata.require(constants::KEY_CONDITION)?.to_string(),
        })
    }
}
