//! # Task Master
//!
//! A personal productivity dashboard for the terminal: task lists, learning-goal
//! tracking with hours-based progress, bookmarks and a ticket ledger, all kept
//! in one local JSON store.
//!
//! ## Key Features
//!
//! - **One record type, several views**: Tasks, Snippets, Bookmarks, Resources,
//!   Level Up and Ledger all share the same item shape with an open metadata map
//! - **Filter and sort**: tag filters with AND semantics and six sort modes,
//!   including a manual order you rearrange yourself
//! - **Level Up cards**: progress, days left and projected finish date computed
//!   from course length, hours done and a daily study goal
//! - **CLI and TUI**: script it from the shell or manage it interactively
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the TUI
//! tm ui
//!
//! # Track a course
//! tm add "Rust in Action" --type level-up --platform Manning --total-hours 30 --daily-goal 1.5
//!
//! # List tasks tagged 'work', soonest due first
//! tm list --tag work --sort date-asc
//! ```
//!
//! Data lives in `~/.task_master/` (`tasks.json`, `config.toml` and the log file).
//! Set `TM_LOG=debug` for verbose logs.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod fields;
pub mod logging;
pub mod progress;
pub mod reorder;
pub mod store;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod card;
    pub mod colors;
    pub mod enums;
    pub mod filter_bar;
    pub mod input;
    pub mod notify;
    pub mod run;
    pub mod tag_manager;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::{default_data_dir, Config, CONFIG_FILE_NAME, LOG_FILE_NAME, STORE_FILE_NAME};
use db::FileStore;

fn main() {
    let cli = Cli::parse();

    // Determine data directory
    let data_dir = if let Some(db_path) = cli.db.as_ref() {
        db_path.parent().filter(|p| !p.as_os_str().is_empty()).map_or_else(|| PathBuf::from("."), |p| p.to_path_buf())
    } else {
        let dir = default_data_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Failed to create data directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        dir
    };

    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
    let config = match Config::load_from_path(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logging(&data_dir.join(LOG_FILE_NAME), &config.log_level) {
        eprintln!("Failed to open log file: {e}");
    }

    let db_path = cli.db.unwrap_or_else(|| data_dir.join(STORE_FILE_NAME));
    tracing::debug!(db = %db_path.display(), config = %config_path.display(), "starting");

    match cli.command {
        Commands::Ui => {
            cmd_ui(&db_path, &config);
            return;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            return;
        }
        _ => {}
    }

    let mut store = match FileStore::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load store {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Ui | Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Add(args) => cmd_add(&mut store, &config, args),

        Commands::List { kind, sort, tags } => cmd_list(&store, &config, kind, sort, tags),

        Commands::View { id } => cmd_view(&store, id),

        Commands::Plan { id, total_hours, hours_completed, daily_goal } =>
            cmd_plan(&mut store, id, total_hours, hours_completed, daily_goal),

        Commands::Toggle { id } => cmd_toggle(&mut store, id),

        Commands::Archive { id } => cmd_archive(&mut store, id),

        Commands::Tag { id, add, rm } => cmd_tag(&mut store, id, add, rm),

        Commands::Tags => cmd_tags(&store),

        Commands::Move { dragged, target } => cmd_move(&mut store, dragged, target),

        Commands::Delete { id } => cmd_delete(&mut store, id),
    }
}
