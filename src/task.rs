//! Task item data structure and related functionality.
//!
//! This module defines `TaskItem`, the single record type behind every view:
//! plain tasks, learning goals, bookmarks and ledger tickets. View-specific
//! values live in an open `metadata` object and are read defensively.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::*;

/// Metadata keys used by level-up items.
pub const META_PLATFORM: &str = "platform";
pub const META_TOTAL_HOURS: &str = "total_hours";
pub const META_HOURS_COMPLETED: &str = "hours_completed";
pub const META_DAILY_STUDY_GOAL: &str = "daily_study_goal";

/// Metadata keys used by ledger items.
pub const META_APP_NAME: &str = "app_name";
pub const META_TICKET_TYPE: &str = "ticket_type";
pub const META_PRIORITY: &str = "priority";

/// A task, learning goal or ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ViewType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskItem>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

impl TaskItem {
    /// Archived items are hidden from every active view.
    pub fn is_archived(&self) -> bool {
        self.status == Status::Archived || self.recurrence.as_deref() == Some("archived")
    }

    /// Read a numeric metadata field. Missing, null or unparsable values read as zero.
    pub fn metadata_number(&self, key: &str) -> f64 {
        let n = match self.metadata.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        if n.is_finite() { n } else { 0.0 }
    }

    /// Read a string metadata field.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// True when the item carries every tag in `tags`.
    pub fn has_all_tags(&self, tags: &BTreeSet<String>) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}

/// Nest a flat item list into top-level items carrying their subtasks.
///
/// Items whose parent is missing from `items` are treated as top-level.
pub fn nest_subtasks(items: &[TaskItem]) -> Vec<TaskItem> {
    let known: BTreeSet<u64> = items.iter().map(|t| t.id).collect();
    let mut children: BTreeMap<u64, Vec<&TaskItem>> = BTreeMap::new();
    for item in items {
        if let Some(p) = item.parent_id.filter(|p| known.contains(p) && *p != item.id) {
            children.entry(p).or_default().push(item);
        }
    }

    fn build(item: &TaskItem, children: &BTreeMap<u64, Vec<&TaskItem>>, depth: usize) -> TaskItem {
        let mut node = item.clone();
        node.subtasks = match children.get(&item.id) {
            // cycle guard
            Some(kids) if depth < 64 => kids.iter().map(|k| build(k, children, depth + 1)).collect(),
            _ => Vec::new(),
        };
        node
    }

    items
        .iter()
        .filter(|t| match t.parent_id {
            Some(p) => !known.contains(&p) || p == t.id,
            None => true,
        })
        .map(|t| build(t, &children, 0))
        .collect()
}
