mod core;
mod dataset;
mod decoder;
mod encoder;
mod metadata;
mod presenter;
mod renderer;
mod shared;
mod sync;
mod ui;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::participant::{get_participant_number, performance_participant};
use crate::core::pipeline::{prepare_joke, scan_performances};
use crate::presenter::PresenterKind;
use crate::renderer::DisplayMode;
use crate::shared::{CliOverrides, LabelerConfig};
use crate::sync::CancelToken;

#[derive(Parser)]
#[command(author, version, about = "Rate joke performance clips and build a CSV dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct CommonArgs {
    /// Working root containing `performances/` (defaults to the current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    presenter: Option<PresenterKind>,
    /// Terminal presenter colour mode
    #[arg(short, long, value_enum)]
    mode: Option<DisplayMode>,
    /// Presentation rate, independent of the clip's container rate
    #[arg(short = 'f', long)]
    playback_fps: Option<f64>,
    #[arg(long)]
    video_name: Option<String>,
    /// `raw` or a four-character code such as MJPG
    #[arg(long)]
    codec: Option<String>,
}

impl CommonArgs {
    fn overrides(self, rater: Option<String>) -> CliOverrides {
        CliOverrides {
            root: self.root,
            presenter: self.presenter,
            mode: self.mode,
            playback_fps: self.playback_fps,
            rater,
            video_name: self.video_name,
            codec: self.codec,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rate every joke under <root>/performances (default)
    Label {
        #[command(flatten)]
        common: CommonArgs,
        /// Rater name; asked at the end when omitted
        #[arg(long)]
        rater: Option<String>,
    },
    /// Build the clip for one joke directory without rating it
    Assemble {
        #[arg(short, long)]
        joke_dir: PathBuf,
        /// Where to write the clip (defaults to the root)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Play a clip
    Watch {
        #[arg(short, long)]
        video: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Print a joke directory's metadata and labels as JSON
    Inspect {
        #[arg(short, long)]
        joke_dir: PathBuf,
    },
    /// List what a labelling run would rate, without playing anything
    Scan {
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn init(config: &LabelerConfig) {
    crate::utils::logger::init(&config.root);
    if let Ok(json) = serde_json::to_string(config) {
        crate::utils::logger::info(&format!("config: {}", json));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Label {
        common: CommonArgs::default(),
        rater: None,
    });

    match command {
        Commands::Label { common, rater } => {
            let config = LabelerConfig::load(common.overrides(rater))?;
            init(&config);
            let cancel = CancelToken::install_ctrlc()?;
            crate::core::launcher::run(&config, &cancel)?;
        }
        Commands::Assemble {
            joke_dir,
            output,
            common,
        } => {
            let config = LabelerConfig::load(common.overrides(None))?;
            init(&config);
            let participant = get_participant_number(&joke_dir.to_string_lossy())?;
            let joke = prepare_joke(&participant, &joke_dir)?;
            let target_dir = output.unwrap_or_else(|| config.root.clone());
            let clip = crate::encoder::create_video(
                &target_dir,
                &joke.frames,
                &config.video_name,
                &config.clip,
            )?;
            println!(
                "🎬 {} frames -> {} ({}x{} @ {} fps)",
                joke.frames.len(),
                clip.display(),
                config.clip.width,
                config.clip.height,
                config.clip.fps
            );
        }
        Commands::Watch { video, common } => {
            let config = LabelerConfig::load(common.overrides(None))?;
            init(&config);
            let cancel = CancelToken::install_ctrlc()?;
            let summary = crate::presenter::watch_video(&video, &config.playback, &cancel)?;
            println!(
                "▶️  {} frames in {:.2}s{}",
                summary.frames_shown,
                summary.elapsed.as_secs_f64(),
                if summary.stopped_early { " (stopped early)" } else { "" }
            );
        }
        Commands::Inspect { joke_dir } => {
            let metadata = crate::metadata::get_metadata(&joke_dir)?;
            let labels = crate::metadata::JokeLabels::try_from(&metadata);
            let frames = crate::utils::file_utils::list_jpegs(&joke_dir)?;
            let report = serde_json::json!({
                "metadata": metadata,
                "labels": labels.as_ref().ok(),
                "labels_error": labels.as_ref().err().map(|e| e.to_string()),
                "frames": frames.len(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Scan { root } => {
            let config = LabelerConfig::load(CliOverrides {
                root,
                ..Default::default()
            })?;
            let mut ready = 0usize;
            let mut skipped = 0usize;
            for performance in scan_performances(&config.performances_dir())? {
                let participant = match performance_participant(&performance.performance_dir) {
                    Ok(code) => code,
                    Err(err) => {
                        println!("❌ {}", err);
                        skipped += performance.joke_dirs.len();
                        continue;
                    }
                };
                for joke_dir in &performance.joke_dirs {
                    match prepare_joke(&participant, joke_dir) {
                        Ok(joke) => {
                            ready += 1;
                            println!(
                                "✅ {} {} [{}] {} frames",
                                participant,
                                joke.labels.joke,
                                joke.labels.condition,
                                joke.frames.len()
                            );
                        }
                        Err(err) => {
                            skipped += 1;
                            println!("⚠️  {}: {}", joke_dir.display(), err);
                        }
                    }
                }
            }
            println!("\n{} ready, {} would be skipped", ready, skipped);
        }
    }

    Ok(())
}
