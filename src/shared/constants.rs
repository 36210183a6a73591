pub const APP_NAME: &str = "face_labeler";

pub const CONFIG_FILE: &str = "face_labeler.config";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";
pub const CHECKPOINT_FILE: &str = ".face_labeler.partial.csv";

pub const PERFORMANCES_DIR: &str = "performances";
pub const METADATA_TEXT_FILE: &str = "response.txt";
pub const METADATA_JSON_FILE: &str = "response.json";
pub const FRAME_SUFFIX: &str = ".jpg";

pub const PARTICIPANT_CODE_LEN: usize = 3;

// Clip container defaults. Width x height, portrait.
pub const DEFAULT_VIDEO_NAME: &str = "joke.avi";
pub const DEFAULT_FRAME_WIDTH: i32 = 480;
pub const DEFAULT_FRAME_HEIGHT: i32 = 640;
pub const DEFAULT_CONTAINER_FPS: f64 = 1.0;
pub const DEFAULT_CODEC: &str = "raw";

pub const DEFAULT_PLAYBACK_FPS: f64 = 4.0;
pub const WINDOW_TITLE: &str = "Frame";

pub const KEY_JOKE: &str = "joke";
pub const KEY_VIDEO: &str = "video";
pub const KEY_AUDIO: &str = "audio";
pub const KEY_CONDITION: &str = "performance_tag_condition";

pub const CSV_COLUMNS: &[&str] = &["participant", "condition", "joke", "video", "audio", "human"];

pub const PROMPT_CONTINUE: &str = "\nPress enter to watch next video: ";
pub const PROMPT_RATING: &str = "\tHow would you rate the response? (-1, 0, 1): ";
pub const PROMPT_RATER_NAME: &str = "What is your first name? ";
