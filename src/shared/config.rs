use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::dataset::normalize_rater_name;
use crate::encoder::ClipFormat;
use crate::presenter::{PlaybackOptions, PresenterKind};
use crate::renderer::DisplayMode;
use crate::shared::constants;

/// Effective settings for one run.
///
/// Built from defaults, then `face_labeler.config` in the working root,
/// then command-line flags (last one wins).
#[derive(Debug, Clone, Serialize)]
pub struct LabelerConfig {
    pub root: PathBuf,
    pub video_name: String,
    pub clip: ClipFormat,
    pub playback: PlaybackOptions,
    pub rater: Option<String>,
}

/// Flags that may override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub presenter: Option<PresenterKind>,
    pub mode: Option<DisplayMode>,
    pub playback_fps: Option<f64>,
    pub rater: Option<String>,
    pub video_name: Option<String>,
    pub codec: Option<String>,
}

impl LabelerConfig {
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            video_name: constants::DEFAULT_VIDEO_NAME.to_string(),
            clip: ClipFormat::default(),
            playback: PlaybackOptions::default(),
            rater: None,
        }
    }

    pub fn load(overrides: CliOverrides) -> Result<Self> {
        let root = match overrides.root.clone() {
            Some(root) => root,
            None => std::env::current_dir().context("failed to resolve working directory")?,
        };

        let mut config = Self::with_root(root);

        let config_path = config.root.join(constants::CONFIG_FILE);
        if config_path.is_file() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            config
                .apply_config_text(&content)
                .with_context(|| format!("invalid config file {}", config_path.display()))?;
        }

        config.apply_overrides(overrides);
        config.rater = config
            .rater
            .as_deref()
            .map(normalize_rater_name)
            .transpose()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `key = value` lines. Blank lines and `#` comments are ignored.
    pub fn apply_config_text(&mut self, content: &str) -> Result<()> {
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                bail!("line {}: expected `key = value`, got '{}'", idx + 1, trimmed);
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "playback-fps" => self.playback.fps = parse_number(key, value)?,
                "presenter" => {
                    self.playback.presenter = PresenterKind::from_str(value, true)
                        .map_err(|e| anyhow!("{}: {}", key, e))?
                }
                "mode" => {
                    self.playback.mode = DisplayMode::from_str(value, true)
                        .map_err(|e| anyhow!("{}: {}", key, e))?
                }
                "video-name" => self.video_name = value.to_string(),
                "codec" => self.clip.codec = value.to_string(),
                "frame-width" => self.clip.width = parse_number(key, value)?,
                "frame-height" => self.clip.height = parse_number(key, value)?,
                "container-fps" => self.clip.fps = parse_number(key, value)?,
                "rater" => self.rater = Some(value.to_string()),
                other => crate::utils::logger::warn(&format!(
                    "ignoring unknown config key '{}' on line {}",
                    other,
                    idx + 1
                )),
            }
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(root) = overrides.root {
            self.root = root;
        }
        if let Some(presenter) = overrides.presenter {
            self.playback.presenter = presenter;
        }
        if let Some(mode) = overrides.mode {
            self.playback.mode = mode;
        }
        if let Some(fps) = overrides.playback_fps {
            self.playback.fps = fps;
        }
        if let Some(rater) = overrides.rater {
            self.rater = Some(rater);
        }
        if let Some(name) = overrides.video_name {
            self.video_name = name;
        }
        if let Some(codec) = overrides.codec {
            self.clip.codec = codec;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.playback.fps > 0.0) {
            bail!("playback-fps must be positive, got {}", self.playback.fps);
        }
        if !(self.clip.fps > 0.0) {
            bail!("container-fps must be positive, got {}", self.clip.fps);
        }
        if self.clip.width <= 0 || self.clip.height <= 0 {
            bail!("frame size must be positive, got {}x{}", self.clip.width, self.clip.height);
        }
        if self.video_name.trim().is_empty() {
            bail!("video-name must not be empty");
        }
        self.clip.fourcc()?;
        if let Some(rater) = &self.rater {
            if normalize_rater_name(rater)? != *rater {
                bail!("rater '{}' must be trimmed and lower-case", rater);
            }
        }
        Ok(())
    }

    pub fn performances_dir(&self) -> PathBuf {
        self.root.join(constants::PERFORMANCES_DIR)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.root.join(constants::CHECKPOINT_FILE)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow!("{}: '{}' is not a valid number", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_text_overrides_defaults() {
        let mut config = LabelerConfig::with_root(PathBuf::from("/tmp/study"));
        config
            .apply_config_text(
                "# study settings\nplayback-fps = 8\npresenter = terminal\nmode = ascii\nvideo-name = clip.avi\ncodec = MJPG\n",
            )
            .unwrap();

        assert_eq!(config.playback.fps, 8.0);
        assert_eq!(config.playback.presenter, PresenterKind::Terminal);
        assert!(config.playback.mode == DisplayMode::Ascii);
        assert_eq!(config.video_name, "clip.avi");
        assert_eq!(config.clip.codec, "MJPG");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut config = LabelerConfig::with_root(PathBuf::from("."));
        config.apply_config_text("font-size = 2.5\n").unwrap();
        assert_eq!(config.playback.fps, constants::DEFAULT_PLAYBACK_FPS);
    }

    #[test]
    fn bad_values_name_the_key() {
        let mut config = LabelerConfig::with_root(PathBuf::from("."));
        let err = config.apply_config_text("playback-fps = fast").unwrap_err();
        assert!(err.to_string().contains("playback-fps"));

        let err = config.apply_config_text("just a line").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn cli_flags_win_over_file() {
        let mut config = LabelerConfig::with_root(PathBuf::from("."));
        config.apply_config_text("playback-fps = 8\nrater = ana").unwrap();
        config.apply_overrides(CliOverrides {
            playback_fps: Some(2.0),
            rater: Some("bo".to_string()),
            ..Default::default()
        });
        assert_eq!(config.playback.fps, 2.0);
        assert_eq!(config.rater.as_deref(), Some("bo"));
    }

    #[test]
    fn validate_rejects_non_positive_rates() {
        let mut config = LabelerConfig::with_root(PathBuf::from("."));
        config.playback.fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = LabelerConfig::with_root(PathBuf::from("."));
        config.clip.codec = "TOOLONG".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unsafe_rater_names() {
        for bad in ["../../tmp/x", "", "a/b"] {
            let mut config = LabelerConfig::with_root(PathBuf::from("."));
            config.rater = Some(bad.to_string());
            assert!(config.validate().is_err(), "{:?} should be refused", bad);
        }
    }

    #[test]
    fn load_normalizes_rater_from_flags_and_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::CONFIG_FILE), "rater =  Ana \n").unwrap();
        let config = LabelerConfig::load(CliOverrides {
            root: Some(dir.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.rater.as_deref(), Some("ana"));

        let config = LabelerConfig::load(CliOverrides {
            root: Some(dir.path().to_path_buf()),
            rater: Some(" Bo ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.rater.as_deref(), Some("bo"));

        let result = LabelerConfig::load(CliOverrides {
            root: Some(dir.path().to_path_buf()),
            rater: Some("../../tmp/x".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_config_file_from_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(constants::CONFIG_FILE), "playback-fps = 5\n").unwrap();

        let config = LabelerConfig::load(CliOverrides {
            root: Some(dir.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.playback.fps, 5.0);
        assert_eq!(config.performances_dir(), dir.path().join("performances"));
    }
}
