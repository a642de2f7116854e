//! Command implementations for the CLI interface.
//!
//! This module contains the command handlers behind each subcommand. Handlers
//! talk to the store through [`TaskStore`], print their result and exit with
//! status 1 on failure.

use std::collections::BTreeMap;
use std::path::Path;

use clap::{Args, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::{Map, Value};
use tracing::info;

use crate::config::Config;
use crate::dates::{
    self, days_until, format_date, format_due_relative, parse_due_input, to_input_date, to_storage,
};
use crate::db::*;
use crate::error::{Result, TaskMasterError};
use crate::fields::*;
use crate::progress::{format_hours, PlanDraft, StudyPlan};
use crate::store::{NewItem, TaskStore};
use crate::task::*;
use crate::tui::run::run_tui;
use crate::tui::tag_manager::{add_tag, remove_tag};
use crate::view::{sort_items, FilterState};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI.
    Ui,

    /// Add a new item.
    Add(AddArgs),

    /// List the active items of one view.
    List {
        /// View to list (defaults to the configured view)
        #[arg(long = "type", value_enum)]
        kind: Option<ViewType>,
        /// Sort mode (defaults to the configured sort)
        #[arg(long, value_enum)]
        sort: Option<SortOption>,
        /// Only items carrying every given tag (repeatable or comma separated)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// View detailed information about an item.
    View {
        /// Item ID or exact title
        id: String,
    },

    /// Update the study plan of a level-up item.
    Plan {
        /// Item ID or exact title
        id: String,
        #[arg(long)]
        total_hours: Option<String>,
        #[arg(long)]
        hours_completed: Option<String>,
        #[arg(long)]
        daily_goal: Option<String>,
    },

    /// Toggle an item between active and completed.
    Toggle {
        /// Item ID or exact title
        id: String,
    },

    /// Archive an item, hiding it from every view.
    Archive {
        /// Item ID or exact title
        id: String,
    },

    /// Add or remove tags on an item.
    Tag {
        /// Item ID or exact title
        id: String,
        /// Tag to add (repeatable)
        #[arg(long)]
        add: Vec<String>,
        /// Tag to remove (repeatable)
        #[arg(long)]
        rm: Vec<String>,
    },

    /// List all distinct tags with usage counts.
    Tags,

    /// Move an item into another item's slot in manual order.
    Move {
        /// Item to move
        dragged: String,
        /// Item whose slot it takes
        target: String,
    },

    /// Delete an item. Its subtasks become top-level items.
    Delete {
        /// Item ID or exact title
        id: String,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Item title
    pub title: String,

    /// View the item belongs to
    #[arg(long = "type", value_enum, default_value_t = ViewType::Task)]
    pub kind: ViewType,

    /// Free-form content (notes, snippet body, URL)
    #[arg(long)]
    pub content: Option<String>,

    /// Due date (YYYY-MM-DD, today, tomorrow, fri, eow, in 3d, ...)
    #[arg(long)]
    pub due: Option<String>,

    /// Tag (repeatable or comma separated)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long, value_enum)]
    pub recurrence: Option<Recurrence>,

    /// Parent item ID or exact title
    #[arg(long)]
    pub parent: Option<String>,

    /// Course platform (level-up)
    #[arg(long)]
    pub platform: Option<String>,

    /// Course length in hours (level-up)
    #[arg(long)]
    pub total_hours: Option<f64>,

    /// Hours already studied (level-up)
    #[arg(long)]
    pub hours_completed: Option<f64>,

    /// Planned study hours per day (level-up)
    #[arg(long)]
    pub daily_goal: Option<f64>,

    /// Application the ticket belongs to (ledger)
    #[arg(long)]
    pub app_name: Option<String>,

    #[arg(long, value_enum)]
    pub ticket_type: Option<TicketType>,

    #[arg(long, value_enum)]
    pub priority: Option<TicketPriority>,
}

/// Print the error and exit with status 1.
fn or_exit<T>(result: Result<T>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{context}: {e}");
            std::process::exit(1);
        }
    }
}

fn resolve(store: &impl TaskStore, id: &str) -> u64 {
    or_exit(resolve_identifier(id, store.items()), "Error resolving item")
}

/// Launch the terminal user interface.
pub fn cmd_ui(db_path: &Path, config: &Config) {
    if let Err(e) = run_tui(db_path, config) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Turn parsed `add` arguments into a create request.
pub fn build_new_item(args: AddArgs, items: &[TaskItem], user_id: &str) -> Result<NewItem> {
    let due_date = match args.due.as_deref() {
        Some(raw) => Some(parse_due_input(raw).map(to_storage).ok_or_else(|| {
            TaskMasterError::InvalidInput(format!(
                "unrecognised due date '{raw}'. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'"
            ))
        })?),
        None => None,
    };
    let parent_id = match args.parent.as_deref() {
        Some(p) => Some(resolve_identifier(p, items)?),
        None => None,
    };

    let mut metadata = Map::new();
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(v) = value {
            metadata.insert(key.to_string(), v);
        }
    };
    put(META_PLATFORM, args.platform.map(Value::from));
    put(META_TOTAL_HOURS, args.total_hours.map(Value::from));
    put(META_HOURS_COMPLETED, args.hours_completed.map(Value::from));
    put(META_DAILY_STUDY_GOAL, args.daily_goal.map(Value::from));
    put(META_APP_NAME, args.app_name.map(Value::from));
    put(META_TICKET_TYPE, args.ticket_type.map(|t| Value::from(t.as_str())));
    put(META_PRIORITY, args.priority.map(|p| Value::from(p.as_str())));

    Ok(NewItem {
        kind: args.kind,
        title: args.title,
        content: args.content,
        due_date,
        recurrence: args.recurrence.map(|r| r.as_str().to_string()),
        parent_id,
        tags: args.tags,
        metadata,
        user_id: user_id.to_string(),
    })
}

/// Add a new item to the store.
pub fn cmd_add(store: &mut impl TaskStore, config: &Config, args: AddArgs) {
    let new = or_exit(build_new_item(args, store.items(), &config.user_id), "Invalid item");
    let id = or_exit(store.create(new), "Failed to add item");
    println!("Added item {id}");
}

/// List the active items of one view, filtered and sorted the way the UI shows them.
pub fn cmd_list(
    store: &impl TaskStore,
    config: &Config,
    kind: Option<ViewType>,
    sort: Option<SortOption>,
    tags: Vec<String>,
) {
    let kind = kind.unwrap_or(config.default_view);
    let mut filter = FilterState::new(sort.unwrap_or_else(|| config.sort()));
    for tag in split_and_normalise_tags(&tags) {
        filter.toggle_tag(&tag);
    }
    let items = filter.apply(store.items(), kind);
    info!(kind = ?kind, sort = ?filter.sort, shown = items.len(), "list");

    println!("{} - {}", kind.label(), filter.sort.label());
    if items.is_empty() {
        if kind == ViewType::LevelUp {
            println!("No courses in the queue. Add one to start your path.");
        } else {
            println!("No items.");
        }
        return;
    }
    if kind == ViewType::LevelUp {
        print_level_up_table(&items);
    } else {
        print_table(&items);
    }
}

fn print_level_up_table(items: &[&TaskItem]) {
    let today = dates::today();
    println!(
        "{:<5} {:<10} {:<9} {:<13} {:<9} {:<10} {}",
        "ID", "Status", "Progress", "Hours", "Days", "Finish", "Title"
    );
    for t in items {
        let plan = StudyPlan::from_item(t);
        let (days, finish) = if t.status == Status::Completed {
            ("Done".to_string(), "-".to_string())
        } else {
            (plan.days_left().to_string(), plan.finish_label(today))
        };
        println!(
            "{:<5} {:<10} {:<9} {:<13} {:<9} {:<10} {}",
            t.id,
            format_status(t.status),
            format!("{}%", plan.progress_percent()),
            format!("{}/{}", format_hours(plan.hours_completed), format_hours(plan.total_hours)),
            days,
            finish,
            t.title
        );
    }
}

/// View detailed information about a specific item.
pub fn cmd_view(store: &impl TaskStore, id: String) {
    let item_id = resolve(store, &id);
    let Some(item) = store.get(item_id) else {
        eprintln!("Item {item_id} not found.");
        std::process::exit(1);
    };
    let today = dates::today();
    println!("ID:           {}", item.id);
    println!("Title:        {}", item.title);
    println!("View:         {}", item.kind.label());
    println!("Status:       {}", format_status(item.status));
    println!(
        "Due:          {}",
        match item.due_date.as_deref() {
            Some(d) => format!(
                "{} ({}, {})",
                to_input_date(Some(d)),
                format_date(Some(d)),
                format_due_relative(Some(d), today)
            ),
            None => "-".into(),
        }
    );
    if item.due_date.is_some() {
        println!("Days left:    {}", days_until(item.due_date.as_deref()));
    }
    println!("Recurrence:   {}", item.recurrence.as_deref().unwrap_or("-"));
    println!("Parent:       {}", item.parent_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into()));
    println!("Position:     {}", item.position.map(|p| p.to_string()).unwrap_or_else(|| "-".into()));
    println!("Tags:         {}", if item.tags.is_empty() { "-".into() } else { item.tags.join(",") });
    println!("Owner:        {}", item.user_id);
    println!("Created UTC:  {}", item.created_at.to_rfc3339());

    if !item.metadata.is_empty() {
        println!("Metadata:");
        for (k, v) in &item.metadata {
            println!("  {k}: {v}");
        }
    }

    if item.kind == ViewType::LevelUp {
        let plan = StudyPlan::from_item(item);
        println!(
            "Progress:     {}% ({} / {} hrs, {} hrs/day)",
            plan.progress_percent(),
            format_hours(plan.hours_completed),
            format_hours(plan.total_hours),
            format_hours(plan.daily_goal)
        );
        if item.status == Status::Completed {
            println!("Finish:       Done. Great job!");
        } else {
            println!(
                "Finish:       {} days left, {}",
                plan.days_left(),
                plan.finish_label(today)
            );
        }
    }

    println!("Content:\n{}\n", item.content.as_deref().unwrap_or("-"));

    let nested = nest_subtasks(store.items());
    if let Some(node) = nested.iter().find(|t| t.id == item_id) {
        if !node.subtasks.is_empty() {
            println!("Subtasks:");
            print_subtasks(&node.subtasks, 1);
        }
    }
}

fn print_subtasks(subtasks: &[TaskItem], depth: usize) {
    for s in subtasks {
        println!("{}- {} [{}] (#{})", "  ".repeat(depth), s.title, format_status(s.status), s.id);
        print_subtasks(&s.subtasks, depth + 1);
    }
}

/// Stage plan changes on top of the item's current plan and merge them into its metadata.
pub fn plan_metadata(
    item: &TaskItem,
    total_hours: Option<String>,
    hours_completed: Option<String>,
    daily_goal: Option<String>,
) -> Map<String, Value> {
    let mut draft = PlanDraft::from_plan(&StudyPlan::from_item(item));
    if let Some(v) = total_hours {
        draft.total_hours = v;
    }
    if let Some(v) = hours_completed {
        draft.hours_completed = v;
    }
    if let Some(v) = daily_goal {
        draft.daily_goal = v;
    }
    draft.commit(&item.metadata)
}

/// Update the study plan of a level-up item.
pub fn cmd_plan(
    store: &mut impl TaskStore,
    id: String,
    total_hours: Option<String>,
    hours_completed: Option<String>,
    daily_goal: Option<String>,
) {
    let item_id = resolve(store, &id);
    let Some(item) = store.get(item_id) else {
        eprintln!("Item {item_id} not found.");
        std::process::exit(1);
    };
    if item.kind != ViewType::LevelUp {
        eprintln!("Item {item_id} is not a level-up item.");
        std::process::exit(1);
    }
    let metadata = plan_metadata(item, total_hours, hours_completed, daily_goal);
    or_exit(store.update_metadata(item_id, metadata), "Failed to save plan");

    if let Some(item) = store.get(item_id) {
        let plan = StudyPlan::from_item(item);
        println!(
            "Updated plan for {}: {}% complete, {} days left",
            item_id,
            plan.progress_percent(),
            plan.days_left()
        );
    }
}

/// Toggle an item between active and completed.
pub fn cmd_toggle(store: &mut impl TaskStore, id: String) {
    let item_id = resolve(store, &id);
    let current = store.get(item_id).map(|t| t.status).unwrap_or_default();
    let next = or_exit(store.toggle_status(item_id, current), "Failed to update status");
    println!("Item {item_id} is now {}", format_status(next).to_lowercase());
}

/// Archive an item.
pub fn cmd_archive(store: &mut impl TaskStore, id: String) {
    let item_id = resolve(store, &id);
    or_exit(store.set_status(item_id, Status::Archived), "Failed to archive item");
    println!("Archived {item_id}");
}

/// Apply `--add` and `--rm` tag arguments to the current tags.
pub fn apply_tag_changes(current: &[String], add: &[String], rm: &[String]) -> Vec<String> {
    let mut tags = current.to_vec();
    for raw in add.iter().flat_map(|a| a.split(',')) {
        if let Some(next) = add_tag(&tags, raw) {
            tags = next;
        }
    }
    for tag in split_and_normalise_tags(rm) {
        tags = remove_tag(&tags, &tag);
    }
    tags
}

/// Add or remove tags on an item, then print its tags.
pub fn cmd_tag(store: &mut impl TaskStore, id: String, add: Vec<String>, rm: Vec<String>) {
    let item_id = resolve(store, &id);
    let current = store.get(item_id).map(|t| t.tags.clone()).unwrap_or_default();
    if !add.is_empty() || !rm.is_empty() {
        let tags = apply_tag_changes(&current, &add, &rm);
        or_exit(store.update_tags(item_id, tags), "Failed to update tags");
    }
    let tags = store.get(item_id).map(|t| t.tags.join(",")).unwrap_or_default();
    println!("Tags for {item_id}: {}", if tags.is_empty() { "-" } else { &tags });
}

/// Distinct tags with the number of items carrying each.
pub fn tag_counts(items: &[TaskItem]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for t in items {
        for tag in &t.tags {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    counts
}

/// List all distinct tags with their usage counts.
pub fn cmd_tags(store: &impl TaskStore) {
    let counts = tag_counts(store.items());
    if counts.is_empty() {
        println!("No tags found");
        return;
    }
    println!("{:<16} {}", "Tag", "Count");
    for (tag, c) in counts {
        println!("{:<16} {}", truncate(&tag, 16), c);
    }
}

/// Move an item into another item's slot in manual order.
pub fn cmd_move(store: &mut impl TaskStore, dragged: String, target: String) {
    let dragged_id = resolve(store, &dragged);
    let target_id = resolve(store, &target);
    if dragged_id == target_id {
        println!("Nothing to move.");
        return;
    }
    or_exit(store.reorder(dragged_id, target_id), "Failed to move item");

    if let Some(kind) = store.get(dragged_id).map(|t| t.kind) {
        let mut order: Vec<&TaskItem> = store
            .items()
            .iter()
            .filter(|t| t.kind == kind && t.parent_id.is_none() && !t.is_archived())
            .collect();
        sort_items(&mut order, SortOption::Manual);
        println!("Moved {dragged_id}. {} order:", kind.label());
        for (i, t) in order.iter().enumerate() {
            println!("  {}. {} (#{})", i + 1, t.title, t.id);
        }
    }
}

/// Delete an item.
pub fn cmd_delete(store: &mut impl TaskStore, id: String) {
    let item_id = resolve(store, &id);
    let detached = store.items().iter().filter(|t| t.parent_id == Some(item_id)).count();
    or_exit(store.delete(item_id), "Failed to delete item");
    if detached > 0 {
        println!("Deleted {item_id}. {detached} subtask(s) moved to top level.");
    } else {
        println!("Deleted {item_id}.");
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::item;
    use serde_json::json;

    fn add_args(title: &str) -> AddArgs {
        AddArgs {
            title: title.to_string(),
            kind: ViewType::Task,
            content: None,
            due: None,
            tags: Vec::new(),
            recurrence: None,
            parent: None,
            platform: None,
            total_hours: None,
            hours_completed: None,
            daily_goal: None,
            app_name: None,
            ticket_type: None,
            priority: None,
        }
    }

    #[test]
    fn test_build_new_item_metadata() {
        let mut args = add_args("Fix login");
        args.kind = ViewType::Ledger;
        args.app_name = Some("portal".into());
        args.ticket_type = Some(TicketType::Bug);
        args.priority = Some(TicketPriority::High);
        args.recurrence = Some(Recurrence::OneOff);
        args.due = Some("2024-03-05".into());

        let new = build_new_item(args, &[], "me").unwrap();
        assert_eq!(new.kind, ViewType::Ledger);
        assert_eq!(new.due_date.as_deref(), Some("2024-03-05"));
        assert_eq!(new.recurrence.as_deref(), Some("one_off"));
        assert_eq!(
            Value::Object(new.metadata),
            json!({"app_name": "portal", "ticket_type": "bug", "priority": "high"})
        );
    }

    #[test]
    fn test_build_new_item_resolves_parent() {
        let items = vec![item(4, "Parent")];
        let mut args = add_args("child");
        args.parent = Some("parent".into());
        assert_eq!(build_new_item(args, &items, "me").unwrap().parent_id, Some(4));

        let mut args = add_args("child");
        args.parent = Some("9".into());
        assert!(matches!(build_new_item(args, &items, "me"), Err(TaskMasterError::NotFound(9))));
    }

    #[test]
    fn test_build_new_item_rejects_bad_due() {
        let mut args = add_args("x");
        args.due = Some("whenever".into());
        assert!(matches!(build_new_item(args, &[], "me"), Err(TaskMasterError::InvalidInput(_))));

        let mut args = add_args("x");
        args.due = Some("in 999999999d".into());
        assert!(matches!(build_new_item(args, &[], "me"), Err(TaskMasterError::InvalidInput(_))));
    }

    #[test]
    fn test_plan_metadata_keeps_unset_fields() {
        let mut course = item(1, "Rust");
        course.kind = ViewType::LevelUp;
        course.metadata = json!({"total_hours": 20, "hours_completed": 5, "platform": "Udemy"})
            .as_object()
            .unwrap()
            .clone();
        let meta = plan_metadata(&course, None, Some("8".into()), Some("abc".into()));
        assert_eq!(meta["total_hours"], json!(20));
        assert_eq!(meta["hours_completed"], json!(8));
        assert_eq!(meta["daily_study_goal"], json!(0));
        assert_eq!(meta["platform"], json!("Udemy"));
    }

    #[test]
    fn test_apply_tag_changes() {
        let current = vec!["a".to_string(), "b".to_string()];
        let tags = apply_tag_changes(&current, &["C, d".into(), "a".into()], &["B".into()]);
        assert_eq!(tags, ["a", "c", "d"]);
    }

    #[test]
    fn test_tag_counts() {
        let mut one = item(1, "one");
        one.tags = vec!["x".into(), "y".into()];
        let mut two = item(2, "two");
        two.tags = vec!["x".into()];
        let counts = tag_counts(&[one, two]);
        assert_eq!(counts.get("x"), Some(&2));
        assert_eq!(counts.get("y"), Some(&1));
    }
}
