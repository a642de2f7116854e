//! Filtering and sorting of the in-memory item list.
//!
//! The filter bar holds the current sort mode and the set of active tags; the
//! list and level-up views ask it which items to show and in which order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::dates::parse_local_date;
use crate::fields::{SortOption, ViewType};
use crate::task::TaskItem;

/// Sort mode and active tag set shared by the filter bar and the views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub sort: SortOption,
    pub active_tags: BTreeSet<String>,
}

impl FilterState {
    pub fn new(sort: SortOption) -> Self {
        FilterState { sort, active_tags: BTreeSet::new() }
    }

    /// Add the tag to the active set, or remove it if already active.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.active_tags.remove(tag) {
            false
        } else {
            self.active_tags.insert(tag.to_string());
            true
        }
    }

    pub fn is_tag_active(&self, tag: &str) -> bool {
        self.active_tags.contains(tag)
    }

    pub fn clear_tags(&mut self) {
        self.active_tags.clear();
    }

    /// Reordering by drag is only meaningful while the list is in manual order.
    pub fn is_manual(&self) -> bool {
        self.sort == SortOption::Manual
    }

    /// True when the item survives archive and tag filtering.
    pub fn matches(&self, item: &TaskItem) -> bool {
        !item.is_archived() && item.has_all_tags(&self.active_tags)
    }

    /// Items of one view kind, filtered and sorted for display.
    pub fn apply<'a>(&self, items: &'a [TaskItem], kind: ViewType) -> Vec<&'a TaskItem> {
        let mut visible: Vec<&TaskItem> = items
            .iter()
            .filter(|t| t.kind == kind && t.parent_id.is_none() && self.matches(t))
            .collect();
        sort_items(&mut visible, self.sort);
        visible
    }
}

/// Sort in place. The sort is stable, so ties keep their input order.
pub fn sort_items(items: &mut [&TaskItem], sort: SortOption) {
    match sort {
        SortOption::Manual => items.sort_by(|a, b| cmp_position(a.position, b.position)),
        SortOption::AlphaAsc => items.sort_by(|a, b| cmp_title(a, b)),
        SortOption::AlphaDesc => items.sort_by(|a, b| cmp_title(b, a)),
        SortOption::DateAsc => items.sort_by(|a, b| cmp_due(a, b, false)),
        SortOption::DateDesc => items.sort_by(|a, b| cmp_due(a, b, true)),
        SortOption::CreatedDesc => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Positioned items first, by position; unpositioned items keep input order after them.
fn cmp_position(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_title(a: &TaskItem, b: &TaskItem) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

/// Items without a due date go last in both directions.
fn cmp_due(a: &TaskItem, b: &TaskItem, descending: bool) -> Ordering {
    let da = a.due_date.as_deref().and_then(parse_local_date);
    let db = b.due_date.as_deref().and_then(parse_local_date);
    match (da, db) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorted, de-duplicated union of all tags on `items`.
pub fn available_tags<'a>(items: impl IntoIterator<Item = &'a TaskItem>) -> Vec<String> {
    let set: BTreeSet<&str> = items
        .into_iter()
        .flat_map(|t| t.tags.iter().map(String::as_str))
        .collect();
    set.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;
    use crate::task::tests::item;

    fn titles(items: &[&TaskItem]) -> Vec<String> {
        items.iter().map(|t| t.title.clone()).collect()
    }

    fn tagged(id: u64, title: &str, tags: &[&str]) -> TaskItem {
        let mut t = item(id, title);
        t.tags = tags.iter().map(|s| s.to_string()).collect();
        t
    }

    #[test]
    fn test_archived_never_visible() {
        let mut archived = item(1, "archived");
        archived.status = Status::Archived;
        let mut recurring_archived = item(2, "recurring");
        recurring_archived.recurrence = Some("archived".into());
        let live = item(3, "live");
        let items = vec![archived, recurring_archived, live];

        for sort in SortOption::ALL {
            let filter = FilterState::new(sort);
            assert_eq!(titles(&filter.apply(&items, ViewType::Task)), vec!["live"]);
        }
    }

    #[test]
    fn test_tag_filter_requires_every_tag() {
        let items = vec![
            tagged(1, "both", &["rust", "cli"]),
            tagged(2, "rust only", &["rust"]),
            tagged(3, "none", &[]),
        ];
        let mut filter = FilterState::default();
        filter.toggle_tag("rust");
        filter.toggle_tag("cli");
        assert_eq!(titles(&filter.apply(&items, ViewType::Task)), vec!["both"]);

        // toggling again removes the tag from the filter
        assert!(!filter.toggle_tag("cli"));
        assert_eq!(
            titles(&filter.apply(&items, ViewType::Task)),
            vec!["both", "rust only"]
        );
    }

    #[test]
    fn test_view_kind_and_subtasks_filtered() {
        let mut course = item(1, "course");
        course.kind = ViewType::LevelUp;
        let mut sub = item(2, "sub");
        sub.parent_id = Some(3);
        let items = vec![course, sub, item(3, "task")];
        let filter = FilterState::default();
        assert_eq!(titles(&filter.apply(&items, ViewType::LevelUp)), vec!["course"]);
        assert_eq!(titles(&filter.apply(&items, ViewType::Task)), vec!["task"]);
    }

    #[test]
    fn test_manual_sort_uses_position_then_input_order() {
        let mut a = item(1, "a");
        a.position = Some(2);
        let mut b = item(2, "b");
        b.position = Some(0);
        let c = item(3, "c");
        let d = item(4, "d");
        let items = vec![c, a, d, b];
        let filter = FilterState::new(SortOption::Manual);
        assert_eq!(titles(&filter.apply(&items, ViewType::Task)), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_alpha_sorts() {
        let items = vec![item(1, "banana"), item(2, "Apple"), item(3, "cherry")];
        let asc = FilterState::new(SortOption::AlphaAsc);
        assert_eq!(titles(&asc.apply(&items, ViewType::Task)), vec!["Apple", "banana", "cherry"]);
        let desc = FilterState::new(SortOption::AlphaDesc);
        assert_eq!(titles(&desc.apply(&items, ViewType::Task)), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_due_sorts_put_missing_dates_last() {
        let mut a = item(1, "late");
        a.due_date = Some("2024-05-01".into());
        let mut b = item(2, "soon");
        b.due_date = Some("2024-03-01T00:00:00Z".into());
        let c = item(3, "undated");
        let items = vec![c, a, b];
        let asc = FilterState::new(SortOption::DateAsc);
        assert_eq!(titles(&asc.apply(&items, ViewType::Task)), vec!["soon", "late", "undated"]);
        let desc = FilterState::new(SortOption::DateDesc);
        assert_eq!(titles(&desc.apply(&items, ViewType::Task)), vec!["late", "soon", "undated"]);
    }

    #[test]
    fn test_created_desc_newest_first_with_stable_ties() {
        let old = item(1, "old");
        let new = item(5, "new");
        let mut twin = item(9, "twin");
        twin.created_at = new.created_at;
        let items = vec![old, new, twin];
        let filter = FilterState::new(SortOption::CreatedDesc);
        assert_eq!(titles(&filter.apply(&items, ViewType::Task)), vec!["new", "twin", "old"]);
    }

    #[test]
    fn test_available_tags_sorted_unique() {
        let items = vec![
            tagged(1, "a", &["rust", "cli"]),
            tagged(2, "b", &["cli", "async"]),
        ];
        assert_eq!(available_tags(&items), vec!["async", "cli", "rust"]);
        assert!(available_tags(&[item(3, "c")]).is_empty());
    }
}
