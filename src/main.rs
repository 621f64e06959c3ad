mod cli;
use cli::{CliMode, USAGE, parse_cli_mode, run_agenda_mode};
mod tui;
use tui::run_tui;

use fixer_schedule::storage::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let (mode, options) = match parse_cli_mode() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return Ok(());
        }
    };

    if mode == CliMode::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match options.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            tracing::error!("Failed to load config from {}: {}", Config::config_path().display(), e);
            return Ok(());
        }
    };

    match mode {
        CliMode::Agenda(date) => run_agenda_mode(&config, date).await,
        _ => run_tui(config).await,
    }
}

fn setup_logging() {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "fixer-schedule.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("fixer-schedule started");
}
