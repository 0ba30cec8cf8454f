//! OrcaFlow TUI - a terminal dashboard for the OrcaFlow marketing platform.
//!
//! Keyboard-driven access to the content planner, the local contact book,
//! and tenant brand settings.

mod app;
mod form;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orcaflow_core::api::ApiClient;
use orcaflow_core::auth::{token_store_for, AuthSession};
use orcaflow_core::calendar::{self, ViewMode};
use orcaflow_core::models::GetPostsParams;
use orcaflow_core::services::Services;
use orcaflow_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "orcaflow.log";

fn env_filter() -> EnvFilter {
    // RUST_LOG overrides, e.g. RUST_LOG=orcaflow_core=debug
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a daily file while the terminal is in raw mode.
fn init_file_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

/// Command-line utilities log to stderr.
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => {
            init_stderr_tracing();
            return login(config).await;
        }
        Some("--logout") => {
            init_stderr_tracing();
            return logout(config).await;
        }
        Some("--posts") => {
            init_stderr_tracing();
            return dump_posts(config, args.get(2).map(String::as_str)).await;
        }
        Some("--help") | Some("-h") => {
            print_usage();
            return Ok(());
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown argument: {}", other);
        }
        None => {}
    }

    let _guard = init_file_tracing(&config)?;
    info!("OrcaFlow TUI starting");

    let mut app = App::new(config)?;

    // Local data first so something is on screen behind the login form
    app.load_from_cache();
    app.start_session_check();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("OrcaFlow TUI shutting down");
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: orcaflow [--login | --logout | --posts [YYYY-MM]]");
    eprintln!();
    eprintln!("  (no args)        Start the dashboard");
    eprintln!("  --login          Sign in and store the session token");
    eprintln!("  --logout         Sign out and remove the stored token");
    eprintln!("  --posts YYYY-MM  Print a month of scheduled posts as JSON");
}

fn build_services(config: &Config) -> Result<Services> {
    let tokens = token_store_for(config.token_backend, config.cache_dir()?);
    let client = ApiClient::with_timeout(config.api_base_url(), tokens, config.request_timeout())?;
    Ok(Services::new(client))
}

/// Prompt for credentials and store the session token
async fn login(mut config: Config) -> Result<()> {
    let services = build_services(&config)?;
    let mut session = AuthSession::new(services.auth.clone());

    let email = match config.login_email() {
        Some(email) => email,
        None => {
            eprint!("Email: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    let password = match Config::login_password() {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Password for {}: ", email))?,
    };

    let user = session
        .login(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.message))?;

    config.last_email = Some(user.email.clone());
    config.save()?;

    eprintln!("Signed in as {} ({})", user.display_name(), user.email);
    Ok(())
}

async fn logout(config: Config) -> Result<()> {
    let services = build_services(&config)?;
    let mut session = AuthSession::new(services.auth.clone());
    session.logout().await;
    eprintln!("Signed out");
    Ok(())
}

/// Print one month of posts to stdout as JSON
async fn dump_posts(config: Config, month: Option<&str>) -> Result<()> {
    let anchor = match month {
        Some(m) => NaiveDate::parse_from_str(&format!("{}-01", m), "%Y-%m-%d")
            .with_context(|| format!("Invalid month '{}', expected YYYY-MM", m))?,
        None => app::today(),
    };
    let range = calendar::date_range(ViewMode::Month, anchor, app::today());

    let services = build_services(&config)?;
    if !services.auth.has_token() {
        anyhow::bail!("Not signed in. Run `orcaflow --login` first.");
    }

    eprintln!("Fetching posts {} to {}...", range.start, range.end);
    let response = services
        .planner
        .list_posts(&GetPostsParams::for_range(range.start, range.end))
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;

    let json = serde_json::to_string_pretty(&response.posts)?;
    println!("{}", json);
    eprintln!("{} posts", response.posts.len());
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Apply finished requests and the unauthorized signal
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
