mod app;
mod logging;
mod settings;
mod speedtest;
mod ui;
mod updater;

use anyhow::Result;
use app::{poll_event, run_speed_test, App, Effect, Input};
use clap::Parser;
use crossterm::event::Event;
use logging::LogTarget;
use ratatui::DefaultTerminal;
use settings::Settings;
use speedtest::{format_latency, format_mbps, transport::HttpTransport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Level;
use ui::draw_ui;
use ui::spinner::{Spinner, FRAME_INTERVAL};

/// Quick download, upload and latency checks from a terminal menu
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Run one speed test, print the results and exit
    #[arg(long)]
    once: bool,

    /// Download server to try, in order (repeatable, replaces the built-in list)
    #[arg(long = "server", value_name = "URL")]
    servers: Vec<String>,

    /// Time budget for the download test in milliseconds
    #[arg(long, value_name = "MS")]
    duration_ms: Option<u64>,

    /// Endpoint used for latency probes
    #[arg(long, value_name = "URL")]
    ping_url: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log verbosity (defaults to info for a log file, warn otherwise)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<Level>,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if !self.servers.is_empty() {
            settings.download_urls = self.servers.clone();
        }
        if let Some(ms) = self.duration_ms {
            settings.test_duration = Duration::from_millis(ms);
        }
        if let Some(url) = &self.ping_url {
            settings.ping_url = url.clone();
        }
        settings
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = cli.settings();
    settings.validate()?;

    let (target, default_level) = match (&cli.log_file, cli.once) {
        (Some(path), _) => (LogTarget::File(path), Level::INFO),
        (None, true) => (LogTarget::Stderr, Level::WARN),
        (None, false) => (LogTarget::Off, Level::WARN),
    };
    logging::init(target, cli.log_level.unwrap_or(default_level))?;

    let transport = HttpTransport::new(&settings)?;

    if cli.once {
        return run_once(&transport, &settings).await;
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, &transport, settings).await;

    ratatui::restore();
    let app = result?;

    if app.was_cancelled() {
        println!("Speed test cancelled.");
    } else {
        println!("Goodbye!");
    }
    Ok(app.exit_code())
}

async fn run_once(transport: &HttpTransport, settings: &Settings) -> Result<ExitCode> {
    let (update_tx, _) = mpsc::unbounded_channel();
    let result = run_speed_test(transport, settings, update_tx).await;

    println!("Ping:     {}", format_latency(result.ping_ms));
    println!("Download: {}", format_mbps(result.download_mbps));
    println!("Upload:   {}", format_mbps(result.upload_mbps));
    Ok(ExitCode::SUCCESS)
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    transport: &HttpTransport,
    settings: Settings,
) -> Result<App> {
    let mut app = App::new(settings);

    loop {
        terminal.draw(|frame| draw_ui(frame, &app, None))?;

        if app.should_quit() {
            break;
        }

        let Some(Event::Key(key)) = poll_event(Duration::from_millis(250))? else {
            continue;
        };
        let Some(input) = Input::from_key(key) else {
            continue;
        };

        match app.handle_input(input) {
            Effect::RunTest => run_test(terminal, &mut app, transport).await?,
            Effect::RunUpdate => run_update(terminal, &mut app).await?,
            _ => {}
        }
    }

    Ok(app)
}

async fn run_test(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    transport: &HttpTransport,
) -> Result<()> {
    let settings = app.settings.clone();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let test = run_speed_test(transport, &settings, update_tx);
    tokio::pin!(test);

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut shown_phase = app.phase;
    let mut spinner = shown_phase.activity().map(Spinner::start);

    let result = loop {
        tokio::select! {
            result = &mut test => break result,
            Some(update) = update_rx.recv() => app.apply_update(update),
            _ = ticker.tick() => {}
        }

        if app.phase != shown_phase {
            shown_phase = app.phase;
            spinner = shown_phase.activity().map(Spinner::start);
        }

        terminal.draw(|frame| draw_ui(frame, app, spinner.as_ref()))?;
    };

    while let Ok(update) = update_rx.try_recv() {
        app.apply_update(update);
    }
    app.complete_test(result);

    discard_pending_input()
}

async fn run_update(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    let command = app.settings.update.clone();
    let update = command.run();
    tokio::pin!(update);

    let spinner = Spinner::start("Checking for updates...");
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);

    let outcome = loop {
        terminal.draw(|frame| draw_ui(frame, app, Some(&spinner)))?;

        tokio::select! {
            outcome = &mut update => break outcome,
            _ = ticker.tick() => {}
        }
    };
    app.finish_update(outcome);

    discard_pending_input()
}

/// Keys pressed while a test or update was running are not menu choices.
fn discard_pending_input() -> Result<()> {
    while poll_event(Duration::ZERO)?.is_some() {}
    Ok(())
}
