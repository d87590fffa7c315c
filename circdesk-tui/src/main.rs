use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod form;
mod sync;
mod ui;

use api::HttpBackend;
use app::{App, SyncEvent};

/// Terminal dashboard for a library management service.
#[derive(Debug, Parser)]
#[command(name = "circdesk", version, about)]
struct Cli {
    /// Base URL of the library management API
    #[arg(
        long,
        env = "CIRCDESK_API_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    api_url: String,

    /// Diagnostic log destination (stdout belongs to the UI)
    #[arg(long, env = "CIRCDESK_LOG_FILE", default_value = "circdesk.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = std::fs::File::create(&cli.log_file)
        .with_context(|| format!("cannot open log file {}", cli.log_file.display()))?;
    let (writer, _guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    info!(api_url = %cli.api_url, "starting circdesk");

    let backend = HttpBackend::new(&cli.api_url)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = App::new(Arc::new(backend), tx);
    app.start();

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, rx).await;
    ratatui::restore();
    result
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    mut rx: UnboundedReceiver<SyncEvent>,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;
        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key);
                }
                Some(Ok(_)) => {} // resizes just redraw on the next pass
                Some(Err(e)) => return Err(e).context("terminal event stream failed"),
                None => break,
            },
            Some(event) = rx.recv() => app.handle_sync(event),
        }
        if app.should_quit {
            break;
        }
    }
    // Abort whatever is still in flight before the terminal goes back.
    app.shutdown();
    Ok(())
}
