//! Manual reordering: pick an item up, drop it on another.
//!
//! The drag state only tracks which item is being carried. Dropping produces a
//! [`ReorderIntent`]; applying it to the stored order is the store's job (see
//! [`move_to_target`]).

use crate::view::FilterState;

/// The item currently being carried, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    dragged: Option<u64>,
}

/// Request to move `dragged` to where `target` sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderIntent {
    pub dragged: u64,
    pub target: u64,
}

impl DragState {
    /// Start carrying `id`. Refused unless the list is in manual order.
    pub fn begin(&mut self, id: u64, filter: &FilterState) -> bool {
        if !filter.is_manual() {
            return false;
        }
        self.dragged = Some(id);
        true
    }

    pub fn dragged(&self) -> Option<u64> {
        self.dragged
    }

    pub fn is_dragging(&self, id: u64) -> bool {
        self.dragged == Some(id)
    }

    pub fn cancel(&mut self) {
        self.dragged = None;
    }

    /// Drop the carried item on `target`.
    ///
    /// Returns `None` when nothing is carried, the list is not in manual order,
    /// or the item is dropped on itself. A drop on itself also ends the drag.
    pub fn drop_on(&mut self, target: u64, filter: &FilterState) -> Option<ReorderIntent> {
        if !filter.is_manual() {
            return None;
        }
        let dragged = self.dragged?;
        self.dragged = None;
        if dragged == target {
            return None;
        }
        Some(ReorderIntent { dragged, target })
    }
}

/// New order after moving `dragged` into the slot `target` occupies.
///
/// Moving down lands the item after the target, moving up lands it before.
/// Returns `None` when either id is missing or they are equal.
pub fn move_to_target(order: &[u64], dragged: u64, target: u64) -> Option<Vec<u64>> {
    if dragged == target {
        return None;
    }
    let from = order.iter().position(|&id| id == dragged)?;
    let to = order.iter().position(|&id| id == target)?;
    let mut out = order.to_vec();
    let id = out.remove(from);
    out.insert(to, id);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SortOption;

    #[test]
    fn test_drag_only_in_manual_sort() {
        let mut drag = DragState::default();
        let sorted = FilterState::new(SortOption::AlphaAsc);
        assert!(!drag.begin(1, &sorted));
        assert_eq!(drag.dragged(), None);
        assert_eq!(drag.drop_on(2, &sorted), None);

        let manual = FilterState::new(SortOption::Manual);
        assert!(drag.begin(1, &manual));
        // switching sort mode mid-drag disables the drop
        assert_eq!(drag.drop_on(2, &sorted), None);
        assert_eq!(drag.drop_on(2, &manual), Some(ReorderIntent { dragged: 1, target: 2 }));
        assert_eq!(drag.dragged(), None);
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let manual = FilterState::new(SortOption::Manual);
        let mut drag = DragState::default();
        drag.begin(4, &manual);
        assert!(drag.is_dragging(4));
        assert_eq!(drag.drop_on(4, &manual), None);
        assert_eq!(drag.dragged(), None);
    }

    #[test]
    fn test_drop_without_drag() {
        let manual = FilterState::new(SortOption::Manual);
        let mut drag = DragState::default();
        assert_eq!(drag.drop_on(3, &manual), None);
    }

    #[test]
    fn test_move_to_target() {
        let order = [1, 2, 3, 4];
        assert_eq!(move_to_target(&order, 1, 3), Some(vec![2, 3, 1, 4]));
        assert_eq!(move_to_target(&order, 4, 2), Some(vec![1, 4, 2, 3]));
        assert_eq!(move_to_target(&order, 2, 2), None);
        assert_eq!(move_to_target(&order, 9, 2), None);
    }
}
