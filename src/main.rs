//! trendtrace viewer.
//!
//! Usage: `trendtrace [DATA.csv] [STORY.yaml|STORY.json]`
//!
//! Arguments are told apart by extension. Without a CSV the window opens
//! empty and offers a file dialog. Set `RUST_LOG` to adjust logging.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trendtrace::persistence::load_story_from_path;
use trendtrace::{run_trendtrace, StoryConfig};

fn is_story_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml" | "yml" | "json")
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut csv = None;
    let mut story = None;
    for arg in std::env::args_os().skip(1).map(PathBuf::from) {
        if is_story_file(&arg) {
            story = Some(arg);
        } else {
            csv = Some(arg);
        }
    }

    let cfg = match story {
        Some(path) => match load_story_from_path(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(?path, error = %e, "cannot read story file");
                return ExitCode::FAILURE;
            }
        },
        None => StoryConfig::bitcoin(),
    };

    info!(title = %cfg.title, "starting viewer");
    match run_trendtrace(cfg, csv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "viewer exited with an error");
            ExitCode::FAILURE
        }
    }
}
