use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::error::LabelError;
use crate::shared::constants;

/// String-to-string view of a joke's `response` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, LabelError> {
        self.get(key)
            .ok_or_else(|| LabelError::MissingKey(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn is_noise(c: char) -> bool {
    matches!(c, ' ' | '{' | '}' | '\'')
}

/// Parses the brace-and-quote wrapped `key: value` text format.
///
/// `source` is only used for error messages.
pub fn parse_metadata(text: &str, source: &Path) -> Result<Metadata, LabelError> {
    let mut metadata = Metadata::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line: String = raw_line.chars().filter(|c| !is_noise(*c)).collect();
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        for segment in line.split(',') {
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once(':') else {
                return Err(LabelError::MalformedMetadata {
                    path: source.to_path_buf(),
                    line: idx + 1,
                    segment: segment.to_string(),
                });
            };
            metadata.insert(key.trim(), value.trim());
        }
    }

    Ok(metadata)
}

fn parse_json_metadata(text: &str, source: &Path) -> Result<Metadata, LabelError> {
    let invalid = |reason: String| LabelError::InvalidJsonMetadata {
        path: source.to_path_buf(),
        reason,
    };

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
    let serde_json::Value::Object(map) = value else {
        return Err(invalid("top-level value is not an object".to_string()));
    };

    let mut metadata = Metadata::default();
    for (key, value) in map {
        let value = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => String::new(),
            _ => return Err(invalid(format!("value of '{}' is not a scalar", key))),
        };
        metadata.insert(key, value);
    }
    Ok(metadata)
}

fn read_text(path: &Path) -> Result<String, LabelError> {
    fs::read_to_string(path).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a joke directory's metadata, preferring `response.json` over `response.txt`.
pub fn get_metadata(dir: &Path) -> Result<Metadata, LabelError> {
    let json_path = dir.join(constants::METADATA_JSON_FILE);
    let txt_path = dir.join(constants::METADATA_TEXT_FILE);

    let (metadata, path) = if json_path.is_file() {
        (parse_json_metadata(&read_text(&json_path)?, &json_path)?, json_path)
    } else if txt_path.is_file() {
        (parse_metadata(&read_text(&txt_path)?, &txt_path)?, txt_path)
    } else {
        return Err(LabelError::MetadataNotFound(dir.to_path_buf()));
    };

    crate::utils::logger::debug(&format!(
        "{}: {} keys [{}]",
        path.display(),
        metadata.len(),
        metadata.keys().collect::<Vec<_>>().join(", ")
    ));
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn src() -> PathBuf {
        PathBuf::from("response.txt")
    }

    #[test]
    fn parses_single_line_dict() {
        let text = "{'joke': 'opener', 'video': 'smile', 'audio': 'laugh', 'performance_tag_condition': 'control'}\n";
        let metadata = parse_metadata(text, &src()).unwrap();

        assert_eq!(metadata.len(), 4);
        assert_eq!(metadata.get("joke"), Some("opener"));
        assert_eq!(metadata.get("video"), Some("smile"));
        assert_eq!(metadata.get("audio"), Some("laugh"));
        assert_eq!(metadata.get("performance_tag_condition"), Some("control"));
    }

    #[test]
    fn values_are_stripped_of_noise_and_line_endings() {
        let text = "{ 'a' : ' x y ' }\r\n";
        let metadata = parse_metadata(text, &src()).unwrap();
        assert_eq!(metadata.get("a"), Some("xy"));
    }

    #[test]
    fn multi_line_and_last_duplicate_wins() {
        let text = "{'joke': 'j1',\n'video': 'happy', 'joke': 'j2'}";
        let metadata = parse_metadata(text, &src()).unwrap();
        assert_eq!(metadata.get("joke"), Some("j2"));
        assert_eq!(metadata.get("video"), Some("happy"));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn value_keeps_text_after_first_colon() {
        let metadata = parse_metadata("{'time': '12:30'}", &src()).unwrap();
        assert_eq!(metadata.get("time"), Some("12:30"));
    }

    #[test]
    fn blank_lines_and_trailing_commas_are_skipped() {
        let metadata = parse_metadata("\n{'a': '1',}\n\n", &src()).unwrap();
        assert_eq!(metadata.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn segment_without_colon_is_malformed() {
        let err = parse_metadata("{'a': '1'}\n{'b'}", &src()).unwrap_err();
        match err {
            LabelError::MalformedMetadata { line, segment, .. } => {
                assert_eq!(line, 2);
                assert_eq!(segment, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn require_reports_missing_key() {
        let metadata = parse_metadata("{'video': 'smile'}", &src()).unwrap();
        assert!(matches!(
            metadata.require("joke"),
            Err(LabelError::MissingKey(key)) if key == "joke"
        ));
    }

    #[test]
    fn get_metadata_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("response.txt"), "{'joke': 'j1', 'audio': 'laugh'}\n").unwrap();

        let metadata = get_metadata(dir.path()).unwrap();
        assert_eq!(metadata.get("joke"), Some("j1"));
        assert_eq!(metadata.get("audio"), Some("laugh"));
    }

    #[test]
    fn get_metadata_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("response.txt"), "{'joke': 'from_text'}").unwrap();
        fs::write(
            dir.path().join("response.json"),
            r#"{"joke": "from json", "take": 2, "ok": true}"#,
        )
        .unwrap();

        let metadata = get_metadata(dir.path()).unwrap();
        assert_eq!(metadata.get("joke"), Some("from json"));
        assert_eq!(metadata.get("take"), Some("2"));
        assert_eq!(metadata.get("ok"), Some("true"));
    }

    #[test]
    fn json_rejects_nested_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("response.json"), r#"{"joke": ["a"]}"#).unwrap();
        assert!(matches!(
            get_metadata(dir.path()),
            Err(LabelError::InvalidJsonMetadata { .. })
        ));
    }

    #[test]
    fn get_metadata_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            get_metadata(dir.path()),
            Err(LabelError::MetadataNotFound(_))
        ));
    }
}
