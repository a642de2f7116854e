//! Add-item form for the terminal user interface.
//!
//! This module provides the `ItemForm` structure: text inputs and selectors in
//! a fixed navigation order, and the conversion of a filled form into a
//! [`NewItem`] for the store.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::dates::{parse_due_input_from, to_storage};
use crate::error::{Result, TaskMasterError};
use crate::fields::{Recurrence, ViewType};
use crate::progress::coerce_number;
use crate::store::NewItem;
use crate::task::{META_PLATFORM, META_TOTAL_HOURS};
use crate::tui::input::InputField;

/// Navigation order of the form fields.
pub const TITLE_ORDER: usize = 0;
pub const CONTENT_ORDER: usize = 1;
pub const DUE_ORDER: usize = 2;
pub const TAGS_ORDER: usize = 3;
pub const KIND_ORDER: usize = 4;
pub const RECURRENCE_ORDER: usize = 5;
pub const PLATFORM_ORDER: usize = 6;
pub const TOTAL_HOURS_ORDER: usize = 7;

const FIELD_COUNT: usize = 8;

/// Form for creating an item in the current view.
pub struct ItemForm {
    pub title: InputField,
    pub content: InputField,
    pub due: InputField,
    pub tags: InputField,
    pub platform: InputField,
    pub total_hours: InputField,
    pub kind: usize,
    pub recurrence: usize,
    pub current_field: usize,
    pub recurrences: Vec<Option<Recurrence>>,
}

impl ItemForm {
    /// A blank form preset to the view it was opened from.
    pub fn new(kind: ViewType) -> Self {
        let mut form = Self {
            title: InputField::new(),
            content: InputField::new(),
            due: InputField::new(),
            tags: InputField::new(),
            platform: InputField::new(),
            total_hours: InputField::new(),
            kind: ViewType::ALL.iter().position(|&k| k == kind).unwrap_or(0),
            recurrence: 0,
            current_field: TITLE_ORDER,
            recurrences: vec![
                None,
                Some(Recurrence::Daily),
                Some(Recurrence::Weekly),
                Some(Recurrence::Monthly),
                Some(Recurrence::Quarterly),
                Some(Recurrence::OneOff),
            ],
        };
        form.update_active_field();
        form
    }

    pub fn selected_kind(&self) -> ViewType {
        ViewType::ALL[self.kind % ViewType::ALL.len()]
    }

    pub fn selected_recurrence(&self) -> Option<Recurrence> {
        self.recurrences.get(self.recurrence).copied().flatten()
    }

    /// Level-up fields only apply to level-up items.
    pub fn shows_plan_fields(&self) -> bool {
        self.selected_kind() == ViewType::LevelUp
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_ORDER => Some(&mut self.title),
            CONTENT_ORDER => Some(&mut self.content),
            DUE_ORDER => Some(&mut self.due),
            TAGS_ORDER => Some(&mut self.tags),
            PLATFORM_ORDER => Some(&mut self.platform),
            TOTAL_HOURS_ORDER => Some(&mut self.total_hours),
            _ => None,
        }
    }

    fn field_count(&self) -> usize {
        if self.shows_plan_fields() {
            FIELD_COUNT
        } else {
            PLATFORM_ORDER
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        let count = self.field_count();
        self.current_field = (self.current_field + count - 1) % count;
        self.update_active_field();
    }

    pub fn update_active_field(&mut self) {
        for field in [
            &mut self.title,
            &mut self.content,
            &mut self.due,
            &mut self.tags,
            &mut self.platform,
            &mut self.total_hours,
        ] {
            field.active = false;
        }
        if let Some(field) = self.active_input() {
            field.active = true;
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_delete();
        }
    }

    /// Move the cursor in a text field, or cycle a selector.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            KIND_ORDER => {
                let n = ViewType::ALL.len();
                self.kind = if right { (self.kind + 1) % n } else { (self.kind + n - 1) % n };
                // plan fields may have disappeared
                if self.current_field >= self.field_count() {
                    self.current_field = KIND_ORDER;
                }
            }
            RECURRENCE_ORDER => {
                let n = self.recurrences.len();
                self.recurrence = if right { (self.recurrence + 1) % n } else { (self.recurrence + n - 1) % n };
            }
            _ => {
                if let Some(field) = self.active_input() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    /// Build the create request. Due dates go through the natural-language parser.
    pub fn to_new_item(&self, user_id: &str, today: NaiveDate) -> Result<NewItem> {
        let title = self
            .title
            .non_empty()
            .ok_or_else(|| TaskMasterError::InvalidInput("title is required".into()))?;

        let due_date = match self.due.non_empty() {
            Some(raw) => Some(
                parse_due_input_from(&raw, today)
                    .map(to_storage)
                    .ok_or_else(|| TaskMasterError::InvalidInput(format!("unrecognised due date '{raw}'")))?,
            ),
            None => None,
        };

        let kind = self.selected_kind();
        let mut metadata = Map::new();
        if kind == ViewType::LevelUp {
            if let Some(platform) = self.platform.non_empty() {
                metadata.insert(META_PLATFORM.into(), Value::from(platform));
            }
            let total = coerce_number(&self.total_hours.value);
            metadata.insert(META_TOTAL_HOURS.into(), Value::from(total));
        }

        Ok(NewItem {
            kind,
            title,
            content: self.content.non_empty(),
            due_date,
            recurrence: self.selected_recurrence().map(|r| r.as_str().to_string()),
            parent_id: None,
            tags: self.tags.non_empty().into_iter().collect(),
            metadata,
            user_id: user_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn type_str(form: &mut ItemForm, s: &str) {
        for c in s.chars() {
            form.handle_char(c);
        }
    }

    #[test]
    fn test_title_required() {
        let form = ItemForm::new(ViewType::Task);
        assert!(matches!(
            form.to_new_item("me", today()),
            Err(TaskMasterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_builds_task_with_parsed_due_date() {
        let mut form = ItemForm::new(ViewType::Task);
        type_str(&mut form, "Pay rent");
        form.current_field = DUE_ORDER;
        form.update_active_field();
        type_str(&mut form, "tomorrow");
        form.current_field = TAGS_ORDER;
        form.update_active_field();
        type_str(&mut form, "Home, Money");
        form.current_field = RECURRENCE_ORDER;
        form.handle_left_right(false);

        let new = form.to_new_item("me", today()).unwrap();
        assert_eq!(new.title, "Pay rent");
        assert_eq!(new.due_date.as_deref(), Some("2024-03-06"));
        assert_eq!(new.tags, vec!["Home, Money".to_string()]);
        assert_eq!(new.recurrence.as_deref(), Some("one_off"));
        assert!(new.metadata.is_empty());
    }

    #[test]
    fn test_bad_due_date_rejected() {
        let mut form = ItemForm::new(ViewType::Task);
        type_str(&mut form, "x");
        form.due = InputField::with_value("someday");
        assert!(form.to_new_item("me", today()).is_err());
    }

    #[test]
    fn test_level_up_fields() {
        let mut form = ItemForm::new(ViewType::LevelUp);
        assert!(form.shows_plan_fields());
        type_str(&mut form, "Rust course");
        form.current_field = PLATFORM_ORDER;
        form.update_active_field();
        type_str(&mut form, "Udemy");
        form.next_field();
        assert_eq!(form.current_field, TOTAL_HOURS_ORDER);
        type_str(&mut form, "12.5");
        form.next_field();
        assert_eq!(form.current_field, TITLE_ORDER);

        let new = form.to_new_item("me", today()).unwrap();
        assert_eq!(new.kind, ViewType::LevelUp);
        assert_eq!(new.metadata[META_PLATFORM], Value::from("Udemy"));
        assert_eq!(new.metadata[META_TOTAL_HOURS], Value::from(12.5));
    }

    #[test]
    fn test_plan_fields_skipped_for_other_kinds() {
        let mut form = ItemForm::new(ViewType::Task);
        form.current_field = RECURRENCE_ORDER;
        form.next_field();
        assert_eq!(form.current_field, TITLE_ORDER);
        form.prev_field();
        assert_eq!(form.current_field, RECURRENCE_ORDER);
    }
}
