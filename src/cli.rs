use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal productivity dashboard: tasks, learning goals and tag filters.
/// Storage defaults to ~/.task_master/tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tm", version, about = "Task Master productivity dashboard")]
pub struct Cli {
    /// Path to the JSON store file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{SortOption, ViewType};

    #[test]
    fn test_parse_add_with_level_up_fields() {
        let cli = Cli::try_parse_from([
            "tm", "add", "Rust course", "--type", "level-up", "--tag", "rust", "--total-hours", "12",
            "--db", "/tmp/x.json",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.json")));
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.kind, ViewType::LevelUp);
        assert_eq!(args.tags, ["rust"]);
        assert_eq!(args.total_hours, Some(12.0));
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["tm", "list", "--sort", "alpha-desc"]).unwrap();
        let Commands::List { kind, sort, tags } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(kind, None);
        assert_eq!(sort, Some(SortOption::AlphaDesc));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_parse_move_and_tag() {
        let cli = Cli::try_parse_from(["tm", "move", "3", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Move { .. }));
        let cli = Cli::try_parse_from(["tm", "tag", "2", "--add", "a", "--add", "b", "--rm", "c"]).unwrap();
        let Commands::Tag { id, add, rm } = cli.command else {
            panic!("expected tag");
        };
        assert_eq!(id, "2");
        assert_eq!(add, ["a", "b"]);
        assert_eq!(rm, ["c"]);
    }
}
