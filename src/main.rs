mod app;
mod batch;
mod cache;
mod commands;
mod config;
mod discovery;
mod filters;
mod git;
mod github;
mod input;
mod messages;
mod models;
mod theme;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use app::App;
use cache::Caches;
use commands::Command;
use config::Settings;
use messages::Message;

#[derive(Parser)]
#[command(name = "repodash", version, about = "Dashboard for many git repos and their PRs")]
struct Cli {
    /// Directories to scan for repositories (default: the enclosing
    /// repo root, or the current directory)
    paths: Vec<PathBuf>,

    /// Maximum directory depth to scan
    #[arg(long)]
    depth: Option<usize>,

    /// Write a debug log to the state directory
    #[arg(long)]
    verbose: bool,
}

fn setup_verbose_logging() -> Result<()> {
    let log_dir = dirs::state_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("repodash");
    std::fs::create_dir_all(&log_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("debug.log"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();
    tracing::info!("repodash v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn resolve_scan_paths(cli_paths: Vec<PathBuf>, settings: &Settings) -> Result<Vec<PathBuf>> {
    let raw = if !cli_paths.is_empty() {
        cli_paths
    } else {
        let configured = settings.expanded_scan_paths();
        if !configured.is_empty() {
            configured
        } else {
            let cwd = std::env::current_dir()?;
            vec![git::find_repo_root(&cwd).unwrap_or(cwd)]
        }
    };

    Ok(raw
        .into_iter()
        .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
        .collect())
}

fn dispatch(cmd: Command, tx: &mpsc::UnboundedSender<Message>, caches: &Arc<Caches>) {
    let tx = tx.clone();
    let caches = caches.clone();
    tokio::spawn(async move {
        if let Some(msg) = cmd.run(caches).await {
            // The receiver only goes away on shutdown; late results are
            // dropped with it.
            let _ = tx.send(msg);
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    if args.verbose {
        setup_verbose_logging()?;
    }

    let settings = Settings::new().unwrap_or_default();
    let scan_paths = resolve_scan_paths(args.paths, &settings)?;
    let max_depth = args.depth.or(settings.max_depth).unwrap_or(1);

    // Restore the terminal even when we blow up mid-draw.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let caches = Arc::new(Caches::new(&settings.cache_ttls()));
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Terminal input feeds the same queue the commands complete into;
    // the loop below is the only consumer.
    let input_tx = tx.clone();
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if input_tx.send(Message::Key(key)).is_err() {
                    break;
                }
            }
            Ok(Event::Resize(w, h)) => {
                if input_tx.send(Message::Resize(w, h)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });

    let mut app = App::new(scan_paths, max_depth);
    dispatch(app.init_command(), &tx, &caches);

    let result = run_app(&mut terminal, &mut app, &mut rx, &tx, &caches).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<Message>,
    tx: &mpsc::UnboundedSender<Message>,
    caches: &Arc<Caches>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // One message at a time keeps every state change serialized;
        // the timeout just lets loading indicators repaint.
        match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(msg)) => {
                for cmd in app.update(msg) {
                    dispatch(cmd, tx, caches);
                }
                // Drain whatever else has queued up before repainting.
                while let Ok(msg) = rx.try_recv() {
                    for cmd in app.update(msg) {
                        dispatch(cmd, tx, caches);
                    }
                }
            }
            Ok(None) => return Ok(()),
            Err(_) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
