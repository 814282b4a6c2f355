//! Terminal front end for the conversation.

mod app;
mod event;
mod ui;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;

use crate::client::GatewayClient;

pub use app::{App, Command, FALLBACK_MODELS, Status};
pub use event::{AppEvent, EventHandler};
pub use ui::render;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(300);

/// Run the chat front end until the user quits.
pub async fn run(gateway: GatewayClient, model: String) -> Result<()> {
    install_panic_hook();
    let mut terminal = init()?;
    let mut events = EventHandler::new(TICK_RATE);

    info!(gateway = %gateway.base_url(), model = %model, "Starting chat session");
    let result = app::run_loop(&mut terminal, &mut events, gateway, model).await;

    restore()?;
    result
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Restore the terminal before the default panic output.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
