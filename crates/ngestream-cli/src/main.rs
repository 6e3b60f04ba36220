//! `ngestream` — terminal client for a movie's comment thread.
//!
//! # Usage
//!
//! ```text
//! ngestream --movie 550 --url http://localhost:8080 --user alice@example.com --password secret
//! ngestream --movie 550 --config ~/.config/ngestream/config.toml
//! ```
//!
//! Without credentials the thread is read-only.

mod app;
mod client;
mod ui;

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ngestream_core::{CommentThread, DEFAULT_TIMEOUT, Viewer};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ngestream", about = "Terminal client for ngestream movie comments")]
struct Args {
  /// Movie (or TV) id whose comments to open.
  #[arg(short, long, env = "NGESTREAM_MOVIE")]
  movie: String,

  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the ngestream server (default: http://localhost:8080).
  #[arg(long, env = "NGESTREAM_URL")]
  url: Option<String>,

  /// Account email.
  #[arg(long, env = "NGESTREAM_USER")]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "NGESTREAM_PASSWORD")]
  password: Option<String>,

  /// Write logs to this file; the terminal itself is owned by the UI.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Seconds to wait on any single server call.
  #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
  timeout: u64,
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn pick(flag: Option<String>, file: &str) -> Option<String> {
  flag.or_else(|| (!file.is_empty()).then(|| file.to_owned()))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log_file {
    let file = File::create(path)
      .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::INFO.into())
          .from_env_lossy(),
      )
      .with_ansi(false)
      .with_writer(Mutex::new(file))
      .init();
  }

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: pick(args.url, &file_cfg.url)
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: pick(args.user, &file_cfg.username).unwrap_or_default(),
    password: pick(args.password, &file_cfg.password).unwrap_or_default(),
  };

  let client = ApiClient::new(api_config).context("building HTTP client")?;
  let me = client.me().await.context("signing in")?;
  let viewer = me.as_ref().map(|m| Viewer { user_id: m.user_id, tier: m.tier });
  tracing::info!(movie_id = %args.movie, signed_in = viewer.is_some(), "starting");

  let thread = CommentThread::new(client, args.movie, viewer)
    .with_timeout(Duration::from_secs(args.timeout));
  let mut app = App::new(thread);
  app.viewer_name = me.map(|m| m.full_name);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.refresh().await;
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ──────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<ApiClient>,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await
    {
      break;
    }
  }

  Ok(())
}
