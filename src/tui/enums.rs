//! Enumerations for TUI state management.

/// Application screen for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    List,
    Detail,
    AddItem,
    EditPlan,
    EditTags,
    TagFilter,
    Help,
    Confirm,
}

/// Input mode for text entry fields.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    None,
    Text,
}
