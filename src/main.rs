use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use four_in_a_row::config::AppConfig;
use four_in_a_row::persistence::SnapshotManager;
use four_in_a_row::ui::App;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "four-in-a-row", about = "Two-player four-in-a-row in the terminal")]
struct Cli {
    /// Path to TOML config file
    #[arg(long, default_value = "four_in_a_row.toml")]
    config: PathBuf,

    /// Prefilled name for player 1
    #[arg(long)]
    p1: Option<String>,

    /// Prefilled name for player 2
    #[arg(long)]
    p2: Option<String>,

    /// Ignore any saved game
    #[arg(long)]
    no_resume: bool,

    /// Print the default config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    four_in_a_row::logging::init(&config.logging).context("opening log file")?;
    info!(config = %cli.config.display(), "starting");

    if let Some(name) = cli.p1 {
        config.players.default_player1 = name;
    }
    if let Some(name) = cli.p2 {
        config.players.default_player2 = name;
    }

    let snapshots = SnapshotManager::new(config.snapshot.clone());
    let saved = if cli.no_resume || !config.snapshot.enabled {
        None
    } else {
        snapshots.load().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable snapshot");
            None
        })
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(snapshots, config.players, saved);
    let res = app.run(&mut terminal);

    // Restore terminal even when the UI loop failed
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    );
    let _ = terminal.show_cursor();

    info!("exiting");
    res.context("terminal UI failed")
}
