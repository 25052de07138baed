//! instagram-stream: a live-scrolling terminal view of tracked Instagram tags
//! and users.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────────┐ PollMsg  ┌──────────┐  draw()  ┌──────────┐
//! │ poll.rs (task) │ ───────► │  app.rs  │ ───────► │  ui.rs   │
//! │ pulls stream   │ (channel)│ (state)  │          │ (render) │
//! └────────────────┘          └──────────┘          └──────────┘
//!                                  ▲
//!                                  │ handle_key_event()
//!                             ┌──────────┐
//!                             │ input.rs │
//!                             └──────────┘
//! ```
//!
//! The polling itself lives in the library (`instagram_stream`); this binary
//! only consumes the stream and renders it.

mod app;
mod input;
mod poll;
mod ui;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use instagram_stream::config::DEFAULT_HOST;
use instagram_stream::{ClientConfig, InstagramStream, StreamConfig};

use app::App;
use poll::PollMsg;

#[derive(Parser)]
#[command(name = "instagram-stream", about = "Live-scrolling view of new Instagram media")]
struct Cli {
    /// Tag to track (repeatable)
    #[arg(long = "tag", short = 't')]
    tags: Vec<String>,

    /// User id to follow (repeatable)
    #[arg(long = "user", short = 'u')]
    users: Vec<String>,

    /// Access token used for every request
    #[arg(long, env = "INSTAGRAM_ACCESS_TOKEN")]
    token: Option<String>,

    /// API host
    #[arg(long, env = "INSTAGRAM_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Delay between fetches, in milliseconds
    #[arg(long, default_value_t = 720)]
    interval_ms: u64,

    /// Write logs here (the terminal belongs to the UI)
    #[arg(long, env = "INSTAGRAM_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// `#tag @user` summary for the list title.
    fn sources_label(&self) -> String {
        self.tags
            .iter()
            .map(|t| format!("#{t}"))
            .chain(self.users.iter().map(|u| format!("@{u}")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Enters raw mode + alternate screen on construction and restores the
/// terminal on [`Drop`], including during unwinding.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Log to `path` if given; otherwise logging stays off.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.tags.is_empty() && cli.users.is_empty() {
        bail!("nothing to watch: pass at least one --tag or --user");
    }
    init_logging(cli.log_file.as_deref())?;
    install_panic_hook();

    // -- build the stream ----------------------------------------------------
    let mut client_config = ClientConfig::default().with_host(&cli.host);
    client_config.access_token = cli.token.clone();
    let stream_config =
        StreamConfig::default().with_interval(Duration::from_millis(cli.interval_ms));

    let stream = InstagramStream::connect(client_config, stream_config)
        .context("failed to set up the Instagram client")?;
    stream.track_all(&cli.tags).follow_all(&cli.users);
    tracing::info!(tags = ?cli.tags, users = ?cli.users, "starting stream");

    // -- start pulling on a runtime ------------------------------------------
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let rx = poll::spawn(&runtime, stream);

    // -- terminal setup (RAII, Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(cli.sources_label());

    // -- main event loop -----------------------------------------------------
    // ~10 fps: drain stream messages, render, then wait up to one tick for input.
    let tick_rate = Duration::from_millis(100);

    loop {
        let mut batch = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            match msg {
                PollMsg::Item(item) => batch.push(item),
                PollMsg::Error(e) => {
                    app.status = format!("Error: {e}");
                }
            }
        }
        if !batch.is_empty() {
            let added = app.merge_items(batch);
            app.status = format!("{added} new items");
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // Dropping the runtime cancels the stream task, which closes the stream.
    runtime.shutdown_timeout(Duration::from_millis(500));
    Ok(())
}
