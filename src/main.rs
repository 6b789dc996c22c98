mod api;
mod app;
mod components;
mod config;
mod drive;
mod error;
mod event;
mod handler;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::RemoteStore;
use crate::app::App;
use crate::config::{ApiConfig, AppConfig, SyncConfig};
use crate::drive::store::DriveStore;
use crate::event::{Event, EventHandler};
use crate::handler::Dispatcher;
use crate::tui::{install_panic_hook, Tui};

/// A terminal client for a Telegram-bot cloud drive.
#[derive(Parser, Debug)]
#[command(name = "tgdrive", version, about)]
struct Cli {
    /// Path to a config file (overrides the default lookup chain)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. https://drive.example.com
    #[arg(long)]
    host: Option<String>,

    /// Drive owner id
    #[arg(long)]
    user_id: Option<String>,

    /// Access token
    #[arg(long)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Write empty folders back as placeholder records
    #[arg(long)]
    keep_empty_folders: bool,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,
}

impl Cli {
    /// Partial config built from the CLI flags; merged on top of the files.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            api: ApiConfig {
                host: self.host.clone(),
                user_id: self.user_id.clone(),
                token: self.token.clone(),
                timeout_secs: self.timeout,
            },
            sync: SyncConfig {
                keep_empty_folders: self.keep_empty_folders.then_some(true),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Opt-in file logging: the TUI owns the terminal, so tracing output goes to
/// `tgdrive.log` in the working directory, and only when `TGDRIVE_LOG` is
/// set (its value is the filter, e.g. `debug` or `tgdrive_tui=debug`).
fn init_logging() {
    let Ok(filter) = std::env::var("TGDRIVE_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create("tgdrive.log") else {
        eprintln!("Warning: could not create tgdrive.log; logging disabled");
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let theme = theme::resolve_theme(&config);
    let use_icons = config.use_icons();

    let api = Arc::new(RemoteStore::new(
        config.host()?,
        config.user_id()?,
        config.token()?,
        config.timeout_secs(),
    )?);

    // Load the snapshot before touching the terminal so a dead backend
    // fails with a readable message instead of a broken screen.
    let snapshot = match api.fetch_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("Could not load files. Please check network or server.");
            return Err(err);
        }
    };

    let store = DriveStore::from_records(&snapshot.records, config.keep_empty_folders());
    let mut app = App::new(store, config.folders_first(), snapshot.last_message_id);

    install_panic_hook();

    let mut tui = Tui::new(!cli.no_mouse)?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let dispatcher = Dispatcher::new(Arc::clone(&api), events.sender(), config.confirm_delete());

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, &theme, use_icons, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => dispatcher.handle_key_event(&mut app, key),
            Event::Tick => app.clear_expired_status(),
            Event::SyncDone { generation, result } => app.on_sync_done(generation, result),
            Event::DownloadDone { name, result } => match result {
                Ok(()) => app.set_status(format!("Download request sent: {}", name)),
                Err(err) => app.set_error(format!("Download failed: {}", err)),
            },
            Event::Mouse(_) | Event::Resize(..) => {}
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
