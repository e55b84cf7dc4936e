//! Binary entry point that wires configuration and logging, then launches
//! the voice command loop.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use voice_dispatch::assistant::{self, InputMode};
use voice_dispatch::config::{self, CONFIG_PATH};

#[derive(Parser)]
#[command(name = "voice-dispatch")]
#[command(about = "Turn spoken or typed phrases into desktop actions")]
#[command(version)]
struct Cli {
    /// Read commands from the keyboard instead of the microphone
    #[arg(long)]
    text: bool,

    /// Print replies without speaking them
    #[arg(long)]
    mute: bool,

    /// Path to the JSON config file
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Path to the notes file
    #[arg(long)]
    notes: Option<PathBuf>,

    /// Let "read notes"/"show notes" win over the generic "note" rule
    #[arg(long)]
    read_notes_first: bool,

    /// Do not save a note when nothing was said or typed
    #[arg(long)]
    skip_empty_notes: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let directive = log_directive(cli.verbose, std::env::var("RUST_LOG").ok());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli));
    // a typed read may still be blocked on stdin after an interrupt
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config::load_app_config(&cli.config);
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(notes) = cli.notes {
        config.notes_path = notes;
    }
    config.read_notes_first |= cli.read_notes_first;
    config.skip_empty_notes |= cli.skip_empty_notes;

    let mode = if cli.text {
        InputMode::Text
    } else {
        InputMode::Voice
    };
    assistant::run_voice_assistant(&config, mode, cli.mute).await
}

/// Filter directive: `--verbose` forces debug, then `RUST_LOG`, then info.
fn log_directive(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return "debug".to_string();
    }
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins_over_rust_log() {
        assert_eq!(log_directive(true, Some("warn".into())), "debug");
        assert_eq!(log_directive(true, None), "debug");
    }

    #[test]
    fn rust_log_used_without_verbose() {
        assert_eq!(log_directive(false, Some("voice_dispatch=trace".into())), "voice_dispatch=trace");
        assert_eq!(log_directive(false, Some(" ".into())), "info");
        assert_eq!(log_directive(false, None), "info");
    }
}
