// Prevents console window in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use screenblank::cli::{Cli, ErrorSink};
use screenblank::{config, display, init_logging, platform, Result};

fn main() -> ExitCode {
    // Before anything prints: a GUI-subsystem build has no console otherwise.
    let sink = ErrorSink::new(platform::attach_parent_console());

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if sink.reports(&e) {
                platform::show_error(&e.to_string());
            }
            e.exit();
        }
    };
    init_logging(cli.verbosity());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "screenblank failed");
            match sink {
                ErrorSink::Stderr => eprintln!("error: {e}"),
                ErrorSink::Dialog => platform::show_error(&e.to_string()),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(config::config_path);

    if cli.init_config {
        if config::init_at(&path)? {
            println!("Wrote default configuration to {}", path.display());
        } else {
            println!("Configuration already exists at {}", path.display());
        }
        return Ok(());
    }

    let cfg = config::load_from(&path)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    if cli.list_displays {
        return list_displays();
    }

    // Single-instance check
    if platform::is_already_running() {
        tracing::info!("another instance is already running");
        return Ok(());
    }

    start(&path, cfg)
}

fn list_displays() -> Result<()> {
    let displays = display::arrange(platform::list_displays()?);
    for (slot, d) in displays.iter().enumerate() {
        println!(
            "{}. {} [{}]{} {}",
            slot + 1,
            d.name,
            d.id,
            if d.primary { " (primary)" } else { "" },
            d.bounds
        );
    }
    Ok(())
}

fn start(path: &Path, cfg: config::AppConfig) -> Result<()> {
    tracing::info!(config = %path.display(), "starting screenblank");
    platform::run(cfg)
}
