//! The mutation API views call back into.
//!
//! Views never edit items directly. They read a snapshot through
//! [`TaskStore::items`] and express intent through the other methods; the store
//! owns persistence and the index math behind reordering.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::fields::{Status, ViewType};
use crate::task::TaskItem;

/// Fields supplied when creating an item. Everything else is assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub kind: ViewType,
    pub title: String,
    pub content: Option<String>,
    pub due_date: Option<String>,
    pub recurrence: Option<String>,
    pub parent_id: Option<u64>,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
    pub user_id: String,
}

pub trait TaskStore {
    /// Current snapshot of every item, archived ones included.
    fn items(&self) -> &[TaskItem];

    /// Reload the snapshot from the backing store.
    fn refresh(&mut self) -> Result<()>;

    fn get(&self, id: u64) -> Option<&TaskItem> {
        self.items().iter().find(|t| t.id == id)
    }

    fn create(&mut self, item: NewItem) -> Result<u64>;

    /// Replace the item's metadata object wholesale.
    fn update_metadata(&mut self, id: u64, metadata: Map<String, Value>) -> Result<()>;

    /// Replace the item's tags. Tags are normalised by the store.
    fn update_tags(&mut self, id: u64, tags: Vec<String>) -> Result<()>;

    fn delete(&mut self, id: u64) -> Result<()>;

    /// Move `dragged` into the slot `target` occupies in manual order.
    fn reorder(&mut self, dragged: u64, target: u64) -> Result<()>;

    /// Flip between active and completed, given the status the caller saw.
    fn toggle_status(&mut self, id: u64, current: Status) -> Result<Status>;

    fn set_status(&mut self, id: u64, status: Status) -> Result<()>;
}
