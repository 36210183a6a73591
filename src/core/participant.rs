use std::path::Path;

use crate::core::error::LabelError;
use crate::shared::constants;

/// Participant code for a performance path: the first three characters of the
/// performance directory name.
///
/// Both `/` and `\` separate segments. When the path runs through a
/// `performances` directory, the segment right after the last one names the
/// performance, so paths that continue into a joke directory resolve to the
/// same participant.
pub fn get_participant_number(path: &str) -> Result<String, LabelError> {
    let normalized = path.replace('\\', "/");
    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    let performance = segments
        .iter()
        .rposition(|segment| *segment == constants::PERFORMANCES_DIR)
        .and_then(|idx| segments.get(idx + 1))
        .or_else(|| segments.last())
        .ok_or_else(|| LabelError::InvalidParticipantPath(path.to_string()))?;

    Ok(performance
        .chars()
        .take(constants::PARTICIPANT_CODE_LEN)
        .collect())
}

/// Participant code for a directory returned by a performance scan: only its
/// own name counts, wherever the study root lives.
pub fn performance_participant(performance_dir: &Path) -> Result<String, LabelError> {
    let name = performance_dir
        .file_name()
        .ok_or_else(|| LabelError::InvalidParticipantPath(performance_dir.display().to_string()))?;
    get_participant_number(&name.to_string_lossy())
}
