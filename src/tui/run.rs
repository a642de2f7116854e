//! TUI entry point and terminal setup.

use std::{io, path::Path};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::tui::app::App;

/// Initialise and run the terminal user interface over the store at `db_path`.
///
/// The store is opened before the terminal is touched, so a corrupt file is
/// reported on a normal screen.
pub fn run_tui(db_path: &Path, config: &Config) -> Result<()> {
    let mut app = App::new(db_path, config)?;
    info!(path = %db_path.display(), "starting ui");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    info!("ui closed");
    Ok(())
}
