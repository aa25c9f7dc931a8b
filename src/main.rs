//! oddtile: find the odd-coloured tile before the countdown runs out.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use oddtile::Rules;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Options derived from CLI that affect game behaviour (rules, timing, seed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rules: Rules,
    pub tick_interval: Duration,
    pub correct_reveal: Duration,
    pub end_reveal: Duration,
    pub seed: Option<u64>,
    pub frame_rate: f64,
    pub no_menu: bool,
    pub no_animation: bool,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            rules: Rules {
                initial_time: args.time_limit,
                time_penalty: args.penalty,
            },
            tick_interval: Duration::from_millis(args.tick_ms),
            correct_reveal: Duration::from_millis(args.reveal_ms),
            end_reveal: Duration::from_millis(args.end_reveal_ms),
            seed: args.seed,
            frame_rate: args.frame_rate,
            no_menu: args.no_menu,
            no_animation: args.no_animation,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default theme");
        theme::Theme::default()
    });
    let config = GameConfig::from(&args);
    info!(?config, "Starting oddtile");
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Log to a file so output does not interfere with the terminal UI.
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Find the odd-coloured tile before the countdown runs out.
#[derive(Debug, Parser)]
#[command(
    name = "oddtile",
    version,
    about = "Find the odd-coloured tile in the grid before time runs out.",
    long_about = "oddtile is a colour discrimination game for the terminal.\n\n\
        One tile in the grid is a slightly different colour. Pick it before the countdown \
        reaches zero. Each cleared stage resets the clock, grows the grid every three stages \
        and makes the colour difference smaller. A wrong pick costs seconds.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Enter / Space  Pick tile\n  \
        Mouse click    Pick tile      E              End game\n  \
        R              Restart        Q / Esc        Quit"
)]
pub struct Args {
    /// Seconds on the clock at the start of every stage.
    #[arg(long, default_value = "15", value_name = "SECS", value_parser = clap::value_parser!(u32).range(1..))]
    pub time_limit: u32,

    /// Seconds lost for a wrong pick.
    #[arg(long, default_value = "3", value_name = "SECS")]
    pub penalty: u32,

    /// Length of one countdown second in milliseconds.
    #[arg(long, default_value = "1000", value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// How long the solved grid stays on screen after a correct pick (0 = skip).
    #[arg(long, default_value = "500", value_name = "MS")]
    pub reveal_ms: u64,

    /// How long the last grid stays on screen before the result (0 = skip).
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub end_reveal_ms: u64,

    /// Seed for reproducible grids. Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Skip the title screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the reveal fade animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Log file (filter with RUST_LOG).
    #[arg(long, default_value = "oddtile.log", value_name = "FILE")]
    pub log_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["oddtile"]);
        let config = GameConfig::from(&args);
        assert_eq!(config.rules, Rules::default());
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.correct_reveal, Duration::from_millis(500));
        assert_eq!(config.end_reveal, Duration::from_millis(1000));
        assert_eq!(config.seed, None);
        assert!(!config.no_menu);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "oddtile",
            "--time-limit",
            "30",
            "--penalty",
            "5",
            "--seed",
            "42",
            "--reveal-ms",
            "0",
        ]);
        let config = GameConfig::from(&args);
        assert_eq!(config.rules.initial_time, 30);
        assert_eq!(config.rules.time_penalty, 5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.correct_reveal, Duration::ZERO);
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        assert!(Args::try_parse_from(["oddtile", "--time-limit", "0"]).is_err());
    }
}
