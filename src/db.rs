//! JSON file store and utility functions for item management.
//!
//! This module provides the `Database` file format, the `FileStore` that
//! implements [`TaskStore`] on top of it, and helpers for tag normalisation,
//! identifier resolution and table output.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::dates::format_due_relative;
use crate::error::{Result, TaskMasterError};
use crate::fields::*;
use crate::reorder::move_to_target;
use crate::store::{NewItem, TaskStore};
use crate::task::TaskItem;
use crate::view::sort_items;

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub items: Vec<TaskItem>,
}

impl Database {
    /// Load from a JSON file. A missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "store file missing, starting empty");
            return Ok(Database::default());
        }
        let buf = fs::read_to_string(path)?;
        let db: Database = serde_json::from_str(&buf)?;
        debug!(path = %path.display(), items = db.items.len(), "store loaded");
        Ok(db)
    }

    /// Save to a JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available item ID.
    pub fn next_id(&self) -> u64 {
        self.items.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    pub fn get(&self, id: u64) -> Option<&TaskItem> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut TaskItem> {
        self.items.iter_mut().find(|t| t.id == id)
    }

    /// Remove an item and detach any subtasks pointing at it.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        for t in self.items.iter_mut() {
            if t.parent_id == Some(id) {
                t.parent_id = None;
            }
        }
        self.items.len() != before
    }

    /// Ids of one view kind in manual order, as the reorder math sees them.
    fn manual_order(&self, kind: ViewType) -> Vec<u64> {
        self.top_level_order(kind, false)
    }

    /// Archived top-level items of a view, in their last manual order.
    fn archived_order(&self, kind: ViewType) -> Vec<u64> {
        self.top_level_order(kind, true)
    }

    fn top_level_order(&self, kind: ViewType, archived: bool) -> Vec<u64> {
        let mut list: Vec<&TaskItem> = self
            .items
            .iter()
            .filter(|t| t.kind == kind && t.parent_id.is_none() && t.is_archived() == archived)
            .collect();
        sort_items(&mut list, SortOption::Manual);
        list.into_iter().map(|t| t.id).collect()
    }
}

/// A [`TaskStore`] backed by a single JSON file.
pub struct FileStore {
    db: Database,
    path: PathBuf,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(FileStore { db: Database::load(path)?, path: path.to_path_buf() })
    }

    fn item_mut(&mut self, id: u64) -> Result<&mut TaskItem> {
        self.db.get_mut(id).ok_or(TaskMasterError::NotFound(id))
    }

    fn persist(&self) -> Result<()> {
        self.db.save(&self.path)
    }
}

impl TaskStore for FileStore {
    fn items(&self) -> &[TaskItem] {
        &self.db.items
    }

    fn refresh(&mut self) -> Result<()> {
        self.db = Database::load(&self.path)?;
        Ok(())
    }

    fn create(&mut self, new: NewItem) -> Result<u64> {
        if new.title.trim().is_empty() {
            return Err(TaskMasterError::InvalidInput("title is required".into()));
        }
        if let Some(pid) = new.parent_id {
            if self.db.get(pid).is_none() {
                return Err(TaskMasterError::NotFound(pid));
            }
        }
        let id = self.db.next_id();
        let position = self
            .db
            .items
            .iter()
            .filter(|t| t.kind == new.kind)
            .filter_map(|t| t.position)
            .max()
            .map_or(0, |p| p + 1);
        self.db.items.push(TaskItem {
            id,
            kind: new.kind,
            title: new.title.trim().to_string(),
            content: new.content.filter(|c| !c.trim().is_empty()),
            status: Status::Active,
            recurrence: new.recurrence,
            due_date: new.due_date,
            parent_id: new.parent_id,
            subtasks: Vec::new(),
            tags: split_and_normalise_tags(&new.tags),
            position: Some(position),
            metadata: new.metadata,
            created_at: Utc::now(),
            user_id: new.user_id,
        });
        self.persist()?;
        info!(id, kind = ?new.kind, "item created");
        Ok(id)
    }

    fn update_metadata(&mut self, id: u64, metadata: Map<String, Value>) -> Result<()> {
        self.item_mut(id)?.metadata = metadata;
        self.persist()?;
        info!(id, "metadata updated");
        Ok(())
    }

    fn update_tags(&mut self, id: u64, tags: Vec<String>) -> Result<()> {
        let tags = split_and_normalise_tags(&tags);
        debug!(id, ?tags, "updating tags");
        self.item_mut(id)?.tags = tags;
        self.persist()?;
        info!(id, "tags updated");
        Ok(())
    }

    fn delete(&mut self, id: u64) -> Result<()> {
        if !self.db.remove(id) {
            return Err(TaskMasterError::NotFound(id));
        }
        self.persist()?;
        info!(id, "item deleted");
        Ok(())
    }

    fn reorder(&mut self, dragged: u64, target: u64) -> Result<()> {
        let kind = self.db.get(dragged).ok_or(TaskMasterError::NotFound(dragged))?.kind;
        let target_kind = self.db.get(target).ok_or(TaskMasterError::NotFound(target))?.kind;
        if kind != target_kind {
            return Err(TaskMasterError::InvalidInput(format!(
                "cannot move item {dragged} into a different view"
            )));
        }
        let order = self.db.manual_order(kind);
        let Some(new_order) = move_to_target(&order, dragged, target) else {
            warn!(dragged, target, "reorder ignored");
            return Ok(());
        };
        // archived items keep slots after the live run
        let parked = self.db.archived_order(kind);
        for (pos, id) in new_order.iter().chain(parked.iter()).enumerate() {
            if let Some(t) = self.db.get_mut(*id) {
                t.position = Some(pos as i64);
            }
        }
        self.persist()?;
        info!(dragged, target, "items reordered");
        Ok(())
    }

    fn toggle_status(&mut self, id: u64, current: Status) -> Result<Status> {
        let next = current.toggled();
        self.set_status(id, next)?;
        Ok(next)
    }

    fn set_status(&mut self, id: u64, status: Status) -> Result<()> {
        self.item_mut(id)?.status = status;
        self.persist()?;
        info!(id, ?status, "status updated");
        Ok(())
    }
}

/// Normalise a tag by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalise each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let tags: BTreeSet<String> = inputs
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(normalise_tag)
        .filter(|t| !t.is_empty())
        .collect();
    tags.into_iter().collect()
}

/// Resolve an item identifier (either ID or title) to an item ID.
/// Returns an error if the title matches several items.
pub fn resolve_identifier(identifier: &str, items: &[TaskItem]) -> Result<u64> {
    if let Ok(id) = identifier.trim().parse::<u64>() {
        return items
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.id)
            .ok_or(TaskMasterError::NotFound(id));
    }

    let wanted = identifier.trim().to_lowercase();
    let matches: Vec<u64> = items
        .iter()
        .filter(|t| t.title.to_lowercase() == wanted)
        .map(|t| t.id)
        .collect();

    match matches.as_slice() {
        [] => Err(TaskMasterError::NoMatch(identifier.to_string())),
        [id] => Ok(*id),
        ids => Err(TaskMasterError::Ambiguous {
            title: identifier.to_string(),
            ids: ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", "),
        }),
    }
}

/// Format a status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Active => "Active",
        Status::Completed => "Completed",
        Status::Archived => "Archived",
    }
}

/// Print items in a formatted table.
pub fn print_table(items: &[&TaskItem]) {
    println!(
        "{:<5} {:<10} {:<10} {:<10} {}",
        "ID", "Status", "Due", "Recurs", "Title [tags]"
    );
    let today = crate::dates::today();
    for t in items {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        println!(
            "{:<5} {:<10} {:<10} {:<10} {}{}",
            t.id,
            format_status(t.status),
            format_due_relative(t.due_date.as_deref(), today),
            truncate(t.recurrence.as_deref().unwrap_or("-"), 10),
            t.title,
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("tasks.json")).unwrap();
        (dir, store)
    }

    fn new_item(kind: ViewType, title: &str) -> NewItem {
        NewItem {
            kind,
            title: title.to_string(),
            user_id: "me".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_assigns_ids_and_positions() {
        let (_dir, mut store) = store();
        let a = store.create(new_item(ViewType::Task, "a")).unwrap();
        let b = store.create(new_item(ViewType::Task, "b")).unwrap();
        let c = store.create(new_item(ViewType::LevelUp, "c")).unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(store.get(b).unwrap().position, Some(1));
        assert_eq!(store.get(c).unwrap().position, Some(0));
        assert_eq!(store.get(a).unwrap().status, Status::Active);
    }

    #[test]
    fn test_create_rejects_blank_title_and_missing_parent() {
        let (_dir, mut store) = store();
        assert!(matches!(
            store.create(new_item(ViewType::Task, "  ")),
            Err(TaskMasterError::InvalidInput(_))
        ));
        let mut orphan = new_item(ViewType::Task, "orphan");
        orphan.parent_id = Some(42);
        assert!(matches!(store.create(orphan), Err(TaskMasterError::NotFound(42))));
    }

    #[test]
    fn test_mutations_persist() {
        let (dir, mut store) = store();
        let id = store.create(new_item(ViewType::LevelUp, "Rust")).unwrap();
        let meta = json!({"total_hours": 10}).as_object().unwrap().clone();
        store.update_metadata(id, meta).unwrap();
        store.update_tags(id, vec!["Deep Work, rust".into(), "rust".into()]).unwrap();
        assert_eq!(store.toggle_status(id, Status::Active).unwrap(), Status::Completed);

        let reopened = FileStore::open(&dir.path().join("tasks.json")).unwrap();
        let item = reopened.get(id).unwrap();
        assert_eq!(item.metadata_number("total_hours"), 10.0);
        assert_eq!(item.tags, vec!["deep-work", "rust"]);
        assert_eq!(item.status, Status::Completed);
    }

    #[test]
    fn test_reorder_renumbers_positions() {
        let (_dir, mut store) = store();
        for title in ["a", "b", "c", "d"] {
            store.create(new_item(ViewType::Task, title)).unwrap();
        }
        store.reorder(1, 3).unwrap();
        let mut items: Vec<&TaskItem> = store.items().iter().collect();
        sort_items(&mut items, SortOption::Manual);
        let titles: Vec<&str> = items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a", "d"]);
        assert_eq!(store.get(4).unwrap().position, Some(3));
    }

    #[test]
    fn test_reorder_parks_archived_items_after_live_ones() {
        let (_dir, mut store) = store();
        for title in ["a", "b", "c"] {
            store.create(new_item(ViewType::Task, title)).unwrap();
        }
        store.set_status(1, Status::Archived).unwrap();
        store.reorder(3, 2).unwrap();
        assert_eq!(store.get(3).unwrap().position, Some(0));
        assert_eq!(store.get(2).unwrap().position, Some(1));
        assert_eq!(store.get(1).unwrap().position, Some(2));

        store.set_status(1, Status::Active).unwrap();
        let order = store.db.manual_order(ViewType::Task);
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_reorder_same_item_is_noop() {
        let (_dir, mut store) = store();
        store.create(new_item(ViewType::Task, "a")).unwrap();
        store.create(new_item(ViewType::Task, "b")).unwrap();
        store.reorder(2, 2).unwrap();
        assert_eq!(store.get(2).unwrap().position, Some(1));
    }

    #[test]
    fn test_reorder_across_views_rejected() {
        let (_dir, mut store) = store();
        store.create(new_item(ViewType::Task, "a")).unwrap();
        store.create(new_item(ViewType::Ledger, "b")).unwrap();
        assert!(matches!(store.reorder(1, 2), Err(TaskMasterError::InvalidInput(_))));
    }

    #[test]
    fn test_delete_detaches_subtasks() {
        let (_dir, mut store) = store();
        let parent = store.create(new_item(ViewType::Task, "parent")).unwrap();
        let mut child = new_item(ViewType::Task, "child");
        child.parent_id = Some(parent);
        let child = store.create(child).unwrap();
        store.delete(parent).unwrap();
        assert!(store.get(parent).is_none());
        assert_eq!(store.get(child).unwrap().parent_id, None);
        assert!(matches!(store.delete(parent), Err(TaskMasterError::NotFound(_))));
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Database::load(&path), Err(TaskMasterError::Json(_))));
    }

    #[test]
    fn test_resolve_identifier() {
        let (_dir, mut store) = store();
        store.create(new_item(ViewType::Task, "Write docs")).unwrap();
        store.create(new_item(ViewType::Task, "Review")).unwrap();
        store.create(new_item(ViewType::Ledger, "review")).unwrap();
        assert_eq!(resolve_identifier("1", store.items()).unwrap(), 1);
        assert_eq!(resolve_identifier("write DOCS", store.items()).unwrap(), 1);
        assert!(matches!(resolve_identifier("9", store.items()), Err(TaskMasterError::NotFound(9))));
        assert!(matches!(resolve_identifier("nope", store.items()), Err(TaskMasterError::NoMatch(_))));
        assert!(matches!(
            resolve_identifier("review", store.items()),
            Err(TaskMasterError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_split_and_normalise_tags() {
        let tags = split_and_normalise_tags(&["Rust, Deep Work".into(), " rust ".into(), ",".into()]);
        assert_eq!(tags, vec!["deep-work", "rust"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
