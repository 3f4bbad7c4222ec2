use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;

use workertrack::app::{App, Devices};
use workertrack::config::Config;
use workertrack::logging;
use workertrack::model::Seed;

#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    seed_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("workertrack {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            flag @ ("--config" | "-c" | "--seed") => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires a path argument", flag);
                    std::process::exit(1);
                };
                if flag == "--seed" {
                    parsed.seed_path = Some(PathBuf::from(value));
                } else {
                    parsed.config_path = Some(PathBuf::from(value));
                }
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"workertrack - TUI task tracker for plantation field workers

USAGE:
    workertrack [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --seed PATH         JSON file with tasks, locations and workers
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    WORKERTRACK_CONFIG  Path to config file (overrides default location)
    WORKERTRACK_LOG     Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/workertrack/config.toml"#
    );
}

fn load_seed(args: &Args, config: &Config) -> Result<Seed> {
    match args.seed_path.as_ref().or(config.seed_path.as_ref()) {
        Some(path) => {
            let seed = Seed::load(path)
                .with_context(|| format!("Failed to load seed {}", path.display()))?;
            tracing::info!(path = %path.display(), tasks = seed.tasks.len(), "Loaded seed data");
            Ok(seed)
        }
        None => Ok(Seed::demo(Utc::now())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    let config = match args.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let seed = load_seed(&args, &config)?;
    let devices = Devices::from_config(&config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, seed, devices);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
