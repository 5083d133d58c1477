mod app;
mod browse;
mod charts;
mod config;
mod constants;
mod detail;
mod display;
mod episode;
mod graphics;
mod input;
mod loader;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
  },
};
use std::io::stdout;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use app::App;
use browse::SortKey;
use config::{Config, prefs_path};
use constants::constants;
use display::CliDisplayMode;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// CSV file path or http(s) URL (default: last used, then the bundled dataset)
  source: Option<String>,

  /// Initial sort: 'release_date', 'views', 'likes' or 'original'
  #[arg(short, long)]
  sort: Option<String>,

  /// Thumbnail rendering: 'auto', 'direct', 'ascii' or 'off' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Print a shell completion script and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file under the data dir. The guard must be held for the app lifetime.
fn init_logging(data_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
  use tracing_subscriber::{EnvFilter, fmt, prelude::*};

  let logs_dir = data_dir.join("logs");
  std::fs::create_dir_all(&logs_dir).ok()?;

  let file_appender = tracing_appender::rolling::daily(&logs_dir, "epgrid.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true).with_line_number(true))
    .init();

  Some(guard)
}

/// Pick the source: command line, then saved prefs, then the bundled default.
fn resolve_source(cli: Option<String>, config: &Config) -> String {
  cli.or_else(|| config.source.clone()).unwrap_or_else(|| constants().default_source.clone())
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "epgrid", &mut stdout());
    return Ok(());
  }

  let _log_guard = ProjectDirs::from("", "", "epgrid").and_then(|dirs| init_logging(dirs.data_dir()));
  info!(version = env!("CARGO_PKG_VERSION"), "epgrid starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;
  let result = run(&mut terminal, args).await;
  let _ = execute!(stdout(), DisableMouseCapture);
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args) -> Result<()> {
  let mut config = Config::load();
  if let Some(sort) = args.sort.as_deref() {
    config.sort_key = Some(SortKey::from_config(sort).config_name().to_string());
  }
  let source = resolve_source(args.source, &config);
  let display_mode = display::resolve_display_mode(args.display_mode);
  info!(source = %source, display = display_mode.label(), "starting session");

  let mut app = App::new(&config, source, display_mode, prefs_path());
  app.start_load();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(&mut app, key),
        Event::Mouse(mouse) => input::handle_mouse(&mut app, mouse),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("epgrid exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_precedence() {
    let saved = Config { source: Some("saved.csv".to_string()), ..Config::default() };
    assert_eq!(resolve_source(Some("cli.csv".to_string()), &saved), "cli.csv");
    assert_eq!(resolve_source(None, &saved), "saved.csv");
    assert_eq!(resolve_source(None, &Config::default()), constants().default_source);
  }

  #[test]
  fn cli_parses_source_and_flags() {
    let args = Args::try_parse_from(["epgrid", "https://example.com/e.csv", "-s", "views", "-d", "ascii"]).unwrap();
    assert_eq!(args.source.as_deref(), Some("https://example.com/e.csv"));
    assert_eq!(args.sort.as_deref(), Some("views"));
    assert_eq!(args.display_mode, CliDisplayMode::Ascii);
  }

  #[test]
  fn cli_definition_is_valid() {
    Args::command().debug_assert();
  }
}
