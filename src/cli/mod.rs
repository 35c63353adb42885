//! TUI front-end entry (Ratatui + Crossterm)
//! - Opens the record store and the fund desk
//! - Sets up terminal

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::AppConfig;
use crate::database::db::{RecordStore, SqliteStore};
use crate::funds::FundDesk;

pub mod input;
pub mod state;
pub mod ui;
pub mod util;

pub async fn run(config: &AppConfig) -> Result<()> {
    let mut app = init_app(config).await?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // restore the terminal even when the loop fails
    let outcome = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    outcome
}

async fn event_loop<S: RecordStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut state::App<S>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await?;
            }
            if app.pending_sync.is_some() {
                // put the busy state on screen before blocking on the network
                terminal.draw(|f| ui::draw(f, app))?;
                app.run_pending_sync().await;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.quit {
            break;
        }
    }
    Ok(())
}

pub async fn init_app(config: &AppConfig) -> Result<state::App<SqliteStore>> {
    // Open store (runs migrations)
    let store = SqliteStore::connect(&config.database_url).await?;

    // Load engine and sync endpoint
    let desk = FundDesk::open(store, config.sync_url.as_deref(), config.sync_timeout).await?;
    tracing::info!(database_url = %config.database_url, "fund desk opened");

    Ok(state::App::new(desk).await)
}
