//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles key events, renders the interface and forwards every change to
//! the [`TaskStore`]. Results of store calls are reported through toasts.

use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tracing::{debug, error};

use crate::config::Config;
use crate::dates::{self, days_until_from, format_date, format_due_relative};
use crate::db::{format_status, truncate, FileStore};
use crate::error::{Result, TaskMasterError};
use crate::fields::{SortOption, Status, ViewType};
use crate::progress::{format_hours, StudyPlan};
use crate::reorder::DragState;
use crate::store::TaskStore;
use crate::task::{nest_subtasks, TaskItem, META_APP_NAME, META_PLATFORM, META_PRIORITY, META_TICKET_TYPE};
use crate::tui::{
    card::{render_level_up, render_plan_editor, PlanEditor},
    colors::{text_on, view_color, EMERALD, ROSE},
    enums::{AppState, InputMode},
    filter_bar::render_filter_bar,
    notify::{render_confirm, render_toast, ConfirmModal, Toast, ToastKind},
    tag_manager::{render_tag_manager, TagManager},
    task_form::{ItemForm, PLATFORM_ORDER, RECURRENCE_ORDER, KIND_ORDER},
    utils::centered_rect,
};
use crate::view::{available_tags, FilterState};

/// Main application state for the terminal user interface.
///
/// Holds the current screen, the store, the filter and drag state of the
/// active view and whatever popup is open.
pub struct App<S: TaskStore> {
    state: AppState,
    /// Screen to go back to when a popup closes.
    return_state: AppState,
    store: S,
    view: ViewType,
    filter: FilterState,
    drag: DragState,
    list_state: TableState,
    visible: Vec<u64>,
    tags: Vec<String>,
    tag_cursor: usize,
    form: ItemForm,
    plan_editor: Option<PlanEditor>,
    tag_manager: Option<TagManager>,
    confirm: ConfirmModal,
    pending_delete: Option<u64>,
    toast: Option<Toast>,
    next_toast_id: u64,
    input_mode: InputMode,
    user_id: String,
    today: NaiveDate,
}

impl App<FileStore> {
    /// Open the store file at `db_path` and build the app around it.
    pub fn new(db_path: &Path, config: &Config) -> Result<Self> {
        Ok(App::with_store(FileStore::open(db_path)?, config))
    }
}

impl<S: TaskStore> App<S> {
    pub fn with_store(store: S, config: &Config) -> Self {
        let mut app = App {
            state: AppState::List,
            return_state: AppState::List,
            store,
            view: config.default_view,
            filter: FilterState::new(config.sort()),
            drag: DragState::default(),
            list_state: TableState::default(),
            visible: Vec::new(),
            tags: Vec::new(),
            tag_cursor: 0,
            form: ItemForm::new(config.default_view),
            plan_editor: None,
            tag_manager: None,
            confirm: ConfirmModal::default(),
            pending_delete: None,
            toast: None,
            next_toast_id: 1,
            input_mode: InputMode::None,
            user_id: config.user_id.clone(),
            today: dates::today(),
        };
        app.update_visible();
        app
    }

    /// Recompute the visible list for the current view, keeping the selection on the same item.
    fn update_visible(&mut self) {
        let previous_id = self.selected_id();
        let previous_idx = self.list_state.selected();

        let items = self.store.items();
        self.visible = self.filter.apply(items, self.view).iter().map(|t| t.id).collect();
        self.tags = available_tags(items.iter().filter(|t| t.kind == self.view && !t.is_archived()));
        if self.tag_cursor >= self.tags.len() {
            self.tag_cursor = self.tags.len().saturating_sub(1);
        }

        let idx = previous_id
            .and_then(|id| self.visible.iter().position(|&v| v == id))
            .or_else(|| match previous_idx {
                _ if self.visible.is_empty() => None,
                Some(i) => Some(i.min(self.visible.len() - 1)),
                None => Some(0),
            });
        self.list_state.select(idx);
    }

    fn select_id(&mut self, id: u64) {
        if let Some(idx) = self.visible.iter().position(|&v| v == id) {
            self.list_state.select(Some(idx));
        }
    }

    fn selected_id(&self) -> Option<u64> {
        self.list_state.selected().and_then(|i| self.visible.get(i)).copied()
    }

    fn selected_item(&self) -> Option<&TaskItem> {
        self.selected_id().and_then(|id| self.store.get(id))
    }

    fn select_next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = self.list_state.selected().map_or(0, |i| (i + 1) % self.visible.len());
        self.list_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len();
        let i = self.list_state.selected().map_or(0, |i| (i + len - 1) % len);
        self.list_state.select(Some(i));
    }

    fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast::new(self.next_toast_id, kind, message));
        self.next_toast_id += 1;
    }

    fn success(&mut self, message: impl Into<String>) {
        self.notify(ToastKind::Success, message);
    }

    fn info(&mut self, message: impl Into<String>) {
        self.notify(ToastKind::Info, message);
    }

    fn fail(&mut self, err: TaskMasterError) {
        error!(error = %err, "store call failed");
        self.notify(ToastKind::Error, err.to_string());
    }

    fn switch_view(&mut self, forward: bool) {
        let n = ViewType::ALL.len();
        let idx = ViewType::ALL.iter().position(|&v| v == self.view).unwrap_or(0);
        let next = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
        self.set_view(ViewType::ALL[next]);
    }

    fn set_view(&mut self, view: ViewType) {
        self.view = view;
        self.drag.cancel();
        self.filter.clear_tags();
        self.list_state.select(None);
        self.update_visible();
    }

    fn set_sort(&mut self, sort: SortOption) {
        self.filter.sort = sort;
        if !self.filter.is_manual() {
            self.drag.cancel();
        }
        self.update_visible();
    }

    fn reload(&mut self) {
        match self.store.refresh() {
            Ok(()) => {
                self.update_visible();
                self.info("Reloaded");
            }
            Err(e) => self.fail(e),
        }
    }

    /// Pick up the selected item, or drop the carried one onto it.
    fn pick_or_drop(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let (id, title) = (item.id, item.title.clone());

        if self.drag.dragged().is_none() {
            if self.drag.begin(id, &self.filter) {
                self.info(format!("Moving '{title}'. Pick a target and press m"));
            } else {
                self.info("Switch to Manual sort to reorder");
            }
            return;
        }

        let Some(intent) = self.drag.drop_on(id, &self.filter) else {
            return;
        };
        match self.store.reorder(intent.dragged, intent.target) {
            Ok(()) => {
                self.update_visible();
                self.select_id(intent.dragged);
                self.success("Order updated");
            }
            Err(e) => self.fail(e),
        }
    }

    fn toggle_selected(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let (id, status) = (item.id, item.status);
        match self.store.toggle_status(id, status) {
            Ok(Status::Completed) => self.success("Marked as completed"),
            Ok(_) => self.success("Marked as active"),
            Err(e) => self.fail(e),
        }
        self.update_visible();
    }

    fn archive_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.set_status(id, Status::Archived) {
            Ok(()) => self.success("Archived"),
            Err(e) => self.fail(e),
        }
        self.state = AppState::List;
        self.update_visible();
    }

    fn open_add_form(&mut self) {
        self.form = ItemForm::new(self.view);
        self.input_mode = InputMode::Text;
        self.state = AppState::AddItem;
    }

    fn submit_add_form(&mut self) {
        let created = self
            .form
            .to_new_item(&self.user_id, self.today)
            .and_then(|new| {
                let kind = new.kind;
                self.store.create(new).map(|id| (id, kind))
            });
        match created {
            Ok((id, kind)) => {
                if kind != self.view {
                    self.set_view(kind);
                } else {
                    self.update_visible();
                }
                self.select_id(id);
                self.input_mode = InputMode::None;
                self.state = AppState::List;
                self.success("Item created");
            }
            Err(e) => self.fail(e),
        }
    }

    fn open_plan_editor(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        if item.kind != ViewType::LevelUp {
            self.info("Study plans apply to Level Up items");
            return;
        }
        let editor = PlanEditor::for_item(item);
        self.plan_editor = Some(editor);
        self.return_state = self.state;
        self.input_mode = InputMode::Text;
        self.state = AppState::EditPlan;
    }

    fn close_popup(&mut self) {
        self.plan_editor = None;
        self.tag_manager = None;
        self.input_mode = InputMode::None;
        self.state = self.return_state;
    }

    fn save_plan(&mut self) {
        let Some(editor) = self.plan_editor.as_ref() else {
            return;
        };
        let (id, metadata) = (editor.item_id, editor.commit());
        match self.store.update_metadata(id, metadata) {
            Ok(()) => {
                self.close_popup();
                self.update_visible();
                self.success("Plan saved");
            }
            Err(e) => self.fail(e),
        }
    }

    fn open_tag_manager(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let system = available_tags(self.store.items().iter().filter(|t| !t.is_archived()));
        let manager = TagManager::new(item.id, item.tags.clone(), system);
        self.tag_manager = Some(manager);
        self.return_state = self.state;
        self.state = AppState::EditTags;
    }

    /// Forward a new tag list for the managed item and record what the store kept.
    fn commit_tags(&mut self, tags: Option<Vec<String>>) {
        let (Some(tags), Some(id)) = (tags, self.tag_manager.as_ref().map(|m| m.item_id)) else {
            return;
        };
        debug!(id, ?tags, "tag change");
        match self.store.update_tags(id, tags) {
            Ok(()) => {
                let stored = self.store.get(id).map(|t| t.tags.clone()).unwrap_or_default();
                if let Some(manager) = self.tag_manager.as_mut() {
                    manager.apply(stored);
                }
                self.update_visible();
                self.success("Tags updated");
            }
            Err(e) => self.fail(e),
        }
    }

    fn ask_delete(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let id = item.id;
        let description = format!("'{}' will be permanently removed. This cannot be undone.", item.title);
        self.pending_delete = Some(id);
        self.confirm = ConfirmModal::open("Delete item", description);
        self.return_state = self.state;
        self.state = AppState::Confirm;
    }

    /// Run work that was requested by the previous key press and shown as in progress.
    pub(crate) fn tick(&mut self) {
        if !self.confirm.processing {
            return;
        }
        if let Some(id) = self.pending_delete.take() {
            match self.store.delete(id) {
                Ok(()) => self.success("Item deleted"),
                Err(e) => self.fail(e),
            }
        }
        self.confirm.close();
        self.state = AppState::List;
        self.update_visible();
    }

    /// Poll for and handle keyboard events based on current application state.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Dispatch one key press. Returns true if the application should quit.
    pub(crate) fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.state {
            AppState::List => return self.handle_list_key(key),
            AppState::Detail => self.handle_detail_key(key),
            AppState::AddItem => self.handle_form_key(key),
            AppState::EditPlan => self.handle_plan_key(key),
            AppState::EditTags => self.handle_tags_key(key),
            AppState::TagFilter => self.handle_tag_filter_key(key),
            AppState::Help => self.state = AppState::List,
            AppState::Confirm => self.handle_confirm_key(key),
        }
        false
    }

    fn handle_list_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.drag.dragged().is_some() {
                    self.drag.cancel();
                    self.info("Move cancelled");
                } else {
                    return true;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Tab => self.switch_view(true),
            KeyCode::BackTab => self.switch_view(false),
            KeyCode::Char('s') => self.set_sort(self.filter.sort.next()),
            KeyCode::Char('S') => self.set_sort(self.filter.sort.prev()),
            KeyCode::Char('f') => {
                self.tag_cursor = 0;
                self.state = AppState::TagFilter;
            }
            KeyCode::Char('m') => self.pick_or_drop(),
            KeyCode::Char('c') | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('A') => self.archive_selected(),
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('e') => self.open_plan_editor(),
            KeyCode::Char('g') => self.open_tag_manager(),
            KeyCode::Char('d') => self.ask_delete(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('x') => self.toast = None,
            KeyCode::Enter => {
                if self.selected_id().is_some() {
                    self.state = AppState::Detail;
                }
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_detail_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::List,
            KeyCode::Char('c') => self.toggle_selected(),
            KeyCode::Char('A') => self.archive_selected(),
            KeyCode::Char('e') => self.open_plan_editor(),
            KeyCode::Char('g') => self.open_tag_manager(),
            KeyCode::Char('d') => self.ask_delete(),
            KeyCode::Char('x') => self.toast = None,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.input_mode = InputMode::None;
                self.state = AppState::List;
            }
            KeyCode::Enter => self.submit_add_form(),
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => self.form.handle_left_right(false),
            KeyCode::Right => self.form.handle_left_right(true),
            KeyCode::Backspace => self.form.handle_backspace(),
            KeyCode::Delete => self.form.handle_delete(),
            KeyCode::Char(c) => self.form.handle_char(c),
            _ => {}
        }
    }

    fn handle_plan_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.close_popup();
                self.info("Changes discarded");
            }
            KeyCode::Enter => self.save_plan(),
            _ => {
                let Some(editor) = self.plan_editor.as_mut() else {
                    return;
                };
                match key {
                    KeyCode::Tab | KeyCode::Down => editor.next_field(),
                    KeyCode::BackTab | KeyCode::Up => editor.prev_field(),
                    KeyCode::Left => editor.current_field().move_cursor_left(),
                    KeyCode::Right => editor.current_field().move_cursor_right(),
                    KeyCode::Backspace => editor.current_field().handle_backspace(),
                    KeyCode::Delete => editor.current_field().handle_delete(),
                    KeyCode::Char(c) => editor.current_field().handle_char(c),
                    _ => {}
                }
            }
        }
    }

    fn handle_tags_key(&mut self, key: KeyCode) {
        let Some(manager) = self.tag_manager.as_mut() else {
            self.close_popup();
            return;
        };

        if manager.input.active {
            match key {
                KeyCode::Esc => {
                    manager.input.active = false;
                    manager.input.clear();
                    self.input_mode = InputMode::None;
                }
                KeyCode::Enter => {
                    let tags = manager.add_from_input();
                    if tags.is_none() {
                        self.info("Tag is empty or already present");
                    }
                    self.commit_tags(tags);
                }
                KeyCode::Backspace => manager.input.handle_backspace(),
                KeyCode::Delete => manager.input.handle_delete(),
                KeyCode::Left => manager.input.move_cursor_left(),
                KeyCode::Right => manager.input.move_cursor_right(),
                KeyCode::Char(c) => manager.input.handle_char(c),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.close_popup(),
            KeyCode::Down | KeyCode::Char('j') => manager.move_cursor(true),
            KeyCode::Up | KeyCode::Char('k') => manager.move_cursor(false),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let tags = manager.toggle_selected();
                self.commit_tags(tags);
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                let tags = manager.remove_selected();
                self.commit_tags(tags);
            }
            KeyCode::Char('n') => {
                manager.input.active = true;
                self.input_mode = InputMode::Text;
            }
            _ => {}
        }
    }

    fn handle_tag_filter_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('q') => self.state = AppState::List,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                if !self.tags.is_empty() {
                    self.tag_cursor = (self.tag_cursor + 1) % self.tags.len();
                }
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                if !self.tags.is_empty() {
                    let len = self.tags.len();
                    self.tag_cursor = (self.tag_cursor + len - 1) % len;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(tag) = self.tags.get(self.tag_cursor).cloned() {
                    self.filter.toggle_tag(&tag);
                    self.update_visible();
                }
            }
            KeyCode::Char('c') => {
                self.filter.clear_tags();
                self.update_visible();
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) {
        if self.confirm.processing {
            return;
        }
        match key {
            KeyCode::Char('y') | KeyCode::Enter => self.confirm.processing = true,
            KeyCode::Char('n') | KeyCode::Esc => {
                self.confirm.close();
                self.pending_delete = None;
                self.state = self.return_state;
            }
            _ => {}
        }
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let accent = view_color(self.view);
        let titles: Vec<String> = ViewType::ALL
            .iter()
            .map(|&v| {
                let count = self
                    .store
                    .items()
                    .iter()
                    .filter(|t| t.kind == v && t.parent_id.is_none() && !t.is_archived())
                    .count();
                format!("{} ({count})", v.label())
            })
            .collect();
        let selected = ViewType::ALL.iter().position(|&v| v == self.view).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(Span::styled(
                "TASK MASTER",
                Style::default().add_modifier(Modifier::BOLD),
            )))
            .highlight_style(Style::default().bg(accent).fg(text_on(accent)).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_body(&mut self, f: &mut Frame, area: Rect) {
        if self.view == ViewType::LevelUp {
            let items: Vec<&TaskItem> = self.visible.iter().filter_map(|&id| self.store.get(id)).collect();
            render_level_up(
                f,
                area,
                &items,
                self.list_state.selected(),
                self.drag.dragged(),
                self.filter.is_manual(),
                self.today,
            );
            return;
        }

        let accent = view_color(self.view);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({}) - Press 'h' for help", self.view.label(), self.visible.len()));

        if self.visible.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Nothing here yet. Press 'a' to add an item.",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )),
            ])
            .alignment(Alignment::Center)
            .block(block);
            f.render_widget(empty, area);
            return;
        }

        let header = Row::new(["", "ID", "Status", "Due", "Recurs", "Title", "Info"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(accent).fg(text_on(accent)))
        .height(1);

        let manual = self.filter.is_manual();
        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|&id| self.store.get(id))
            .map(|t| {
                let carried = self.drag.is_dragging(t.id);
                let grip = match (carried, manual) {
                    (true, _) => "➤",
                    (false, true) => "⋮⋮",
                    (false, false) => "",
                };
                let overdue = days_until_from(t.due_date.as_deref(), self.today) < 0;
                let style = if carried {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
                } else if t.status == Status::Completed {
                    Style::default().fg(EMERALD).add_modifier(Modifier::CROSSED_OUT)
                } else if overdue {
                    Style::default().fg(ROSE)
                } else {
                    Style::default()
                };
                let tags = if t.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", t.tags.join(","))
                };
                Row::new(vec![
                    Cell::from(grip),
                    Cell::from(t.id.to_string()),
                    Cell::from(format_status(t.status)),
                    Cell::from(format_due_relative(t.due_date.as_deref(), self.today)),
                    Cell::from(t.recurrence.clone().unwrap_or_else(|| "-".into())),
                    Cell::from(format!("{}{}", t.title, tags)),
                    Cell::from(item_info(t)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(25),
            Constraint::Length(24),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.list_state);
    }

    fn render_detail(&self, f: &mut Frame, area: Rect) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled(item.title.clone(), bold.fg(view_color(item.kind)))),
            Line::from(""),
            Line::from(vec![Span::styled("ID: ", bold), Span::raw(item.id.to_string())]),
            Line::from(vec![Span::styled("View: ", bold), Span::raw(item.kind.label())]),
            Line::from(vec![Span::styled("Status: ", bold), Span::raw(format_status(item.status))]),
            Line::from(vec![
                Span::styled("Due: ", bold),
                Span::raw(match item.due_date.as_deref() {
                    Some(d) => format!("{} ({})", format_date(Some(d)), format_due_relative(Some(d), self.today)),
                    None => "-".to_string(),
                }),
            ]),
            Line::from(vec![
                Span::styled("Recurrence: ", bold),
                Span::raw(item.recurrence.clone().unwrap_or_else(|| "-".into())),
            ]),
            Line::from(vec![
                Span::styled("Tags: ", bold),
                Span::raw(if item.tags.is_empty() { "-".to_string() } else { item.tags.join(", ") }),
            ]),
            Line::from(vec![
                Span::styled("Created: ", bold),
                Span::raw(item.created_at.format("%Y-%m-%d %H:%M").to_string()),
            ]),
        ];

        if item.kind == ViewType::LevelUp {
            let plan = StudyPlan::from_item(item);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Study plan", bold)));
            if let Some(p) = item.metadata_str(META_PLATFORM) {
                lines.push(Line::from(format!("  Platform: {p}")));
            }
            lines.push(Line::from(format!(
                "  {} / {} hrs ({}%), {} hrs/day",
                format_hours(plan.hours_completed),
                format_hours(plan.total_hours),
                plan.progress_percent(),
                format_hours(plan.daily_goal)
            )));
            if item.status == Status::Completed {
                lines.push(Line::from("  Done. Great job!"));
            } else {
                lines.push(Line::from(format!(
                    "  {} days left, finish {}",
                    plan.days_left(),
                    plan.finish_label(self.today)
                )));
            }
        }

        if let Some(content) = item.content.as_deref() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Content", bold)));
            lines.extend(content.lines().map(|l| Line::from(l.to_string())));
        }

        let subtasks = nest_subtasks(self.store.items())
            .into_iter()
            .find(|t| t.id == item.id)
            .map(|t| t.subtasks)
            .unwrap_or_default();
        if !subtasks.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Subtasks", bold)));
            for s in subtasks {
                let mark = if s.status == Status::Completed { "[x]" } else { "[ ]" };
                lines.push(Line::from(format!("  {mark} {} (ID: {})", s.title, s.id)));
            }
        }

        let detail = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Item Details - Esc to return"))
            .wrap(Wrap { trim: false });
        f.render_widget(detail, area);
    }

    fn render_form(&self, f: &mut Frame, area: Rect) {
        let rect = centered_rect(70, 90, area);
        f.render_widget(Clear, rect);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Add Item")
            .border_style(Style::default().fg(view_color(self.form.selected_kind())));
        let inner = block.inner(rect);
        f.render_widget(block, rect);

        let mut constraints = vec![Constraint::Length(3); PLATFORM_ORDER];
        if self.form.shows_plan_fields() {
            constraints.extend([Constraint::Length(3), Constraint::Length(3)]);
        }
        constraints.push(Constraint::Min(0));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let form = &self.form;
        let recurrence = form.selected_recurrence().map_or("None", |r| r.as_str());
        let mut fields: Vec<(&str, String, Option<&crate::tui::input::InputField>)> = vec![
            ("Title", form.title.value.clone(), Some(&form.title)),
            ("Content", form.content.value.clone(), Some(&form.content)),
            ("Due (today, fri, in 3d, 2024-03-05)", form.due.value.clone(), Some(&form.due)),
            ("Tags (comma separated)", form.tags.value.clone(), Some(&form.tags)),
            ("View", format!("< {} >", form.selected_kind().label()), None),
            ("Recurrence", format!("< {recurrence} >"), None),
        ];
        if form.shows_plan_fields() {
            fields.push(("Platform", form.platform.value.clone(), Some(&form.platform)));
            fields.push(("Total hours", form.total_hours.value.clone(), Some(&form.total_hours)));
        }

        for (i, (label, value, input)) in fields.into_iter().enumerate() {
            let focused = form.current_field == i;
            let style = if focused { Style::default().fg(Color::Yellow) } else { Style::default() };
            f.render_widget(
                Paragraph::new(value).style(style).block(Block::default().borders(Borders::ALL).title(label)),
                chunks[i],
            );
            if let Some(input) = input.filter(|inp| inp.active) {
                f.set_cursor_position((chunks[i].x + input.cursor as u16 + 1, chunks[i].y + 1));
            }
        }

        let hint = if matches!(form.current_field, KIND_ORDER | RECURRENCE_ORDER) {
            "←/→: Change   Tab: Next field   Enter: Create   Esc: Cancel"
        } else {
            "Tab/↑↓: Navigate   Enter: Create   Esc: Cancel"
        };
        if let Some(last) = chunks.last() {
            f.render_widget(Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)), *last);
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().add_modifier(Modifier::BOLD)));
        let help_text = vec![
            heading("Task Master Help"),
            Line::from(""),
            heading("Views:"),
            Line::from("  Tab/Shift+Tab  Switch view"),
            Line::from("  ↑/k, ↓/j       Navigate items"),
            Line::from("  Enter          View item details"),
            Line::from("  s / S          Next / previous sort mode"),
            Line::from("  f              Filter by tags (Space toggles, c clears)"),
            Line::from("  m              Pick up / drop an item (Manual sort only)"),
            Line::from(""),
            heading("Items:"),
            Line::from("  a              Add item"),
            Line::from("  c / Space      Toggle completed"),
            Line::from("  A              Archive"),
            Line::from("  e              Edit study plan (Level Up)"),
            Line::from("  g              Manage tags"),
            Line::from("  d              Delete"),
            Line::from("  r              Reload from disk"),
            Line::from("  x              Dismiss notification"),
            Line::from("  q/Esc/Ctrl+C   Quit"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = match (self.state, self.input_mode) {
            (_, InputMode::Text) => "Editing | Enter: Save  Esc: Cancel".to_string(),
            (AppState::List, _) => match self.drag.dragged().and_then(|id| self.store.get(id)) {
                Some(t) => format!("Moving '{}' | m: Drop here  Esc: Cancel", truncate(&t.title, 30)),
                None => format!(
                    "{} items | Sort: {} | 'h' for help",
                    self.visible.len(),
                    self.filter.sort.label()
                ),
            },
            (AppState::Detail, _) => "Item Details".to_string(),
            (AppState::AddItem, _) => "Add Item".to_string(),
            (AppState::EditPlan, _) => "Edit Study Plan".to_string(),
            (AppState::EditTags, _) => "Manage Tags".to_string(),
            (AppState::TagFilter, _) => "Tag Filter | ←/→: Move  Space: Toggle  c: Clear  Esc: Done".to_string(),
            (AppState::Help, _) => "Help".to_string(),
            (AppState::Confirm, _) => "Confirm Action".to_string(),
        };
        let accent = view_color(self.view);
        let status = Paragraph::new(text)
            .style(Style::default().bg(accent).fg(text_on(accent)))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    pub(crate) fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        let cursor = (self.state == AppState::TagFilter).then_some(self.tag_cursor);
        render_filter_bar(f, chunks[1], &self.filter, &self.tags, cursor, view_color(self.view));

        let base = if matches!(self.state, AppState::EditPlan | AppState::EditTags | AppState::Confirm) {
            self.return_state
        } else {
            self.state
        };
        match base {
            AppState::Detail => self.render_detail(f, chunks[2]),
            AppState::Help => self.render_help(f, chunks[2]),
            _ => self.render_body(f, chunks[2]),
        }

        match self.state {
            AppState::AddItem => self.render_form(f, chunks[2]),
            AppState::EditPlan => {
                if let Some(editor) = self.plan_editor.as_ref() {
                    let title = self.store.get(editor.item_id).map(|t| t.title.clone()).unwrap_or_default();
                    let rect = centered_rect(60, 70, chunks[2]);
                    f.render_widget(Clear, rect);
                    render_plan_editor(f, rect, editor, &title);
                }
            }
            AppState::EditTags => {
                if let Some(manager) = self.tag_manager.as_ref() {
                    let title = self.store.get(manager.item_id).map(|t| t.title.clone()).unwrap_or_default();
                    render_tag_manager(f, chunks[2], manager, &title);
                }
            }
            AppState::Confirm => render_confirm(f, chunks[2], &self.confirm),
            _ => {}
        }

        if let Some(toast) = self.toast.as_ref() {
            render_toast(f, chunks[2], toast);
        }
        self.render_status_bar(f, chunks[3]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.today = dates::today();
            terminal.draw(|f| self.render(f))?;
            self.tick();

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Per-view summary column: ledger ticket fields, platform, or the first line of content.
fn item_info(t: &TaskItem) -> String {
    match t.kind {
        ViewType::Ledger => {
            let parts: Vec<&str> = [META_TICKET_TYPE, META_PRIORITY]
                .iter()
                .filter_map(|k| t.metadata_str(k))
                .collect();
            let mut info = parts.join("/");
            if let Some(app) = t.metadata_str(META_APP_NAME) {
                info.push_str(&format!(" @{app}"));
            }
            truncate(info.trim(), 24)
        }
        _ => truncate(t.content.as_deref().and_then(|c| c.lines().next()).unwrap_or(""), 24),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewItem;
    use crate::tui::notify::tests::buffer_text;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use tempfile::TempDir;

    fn config() -> Config {
        Config { user_id: "me".into(), ..Config::default() }
    }

    fn app_with(items: &[(ViewType, &str, &[&str])]) -> (TempDir, App<FileStore>) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(&dir.path().join("tasks.json")).unwrap();
        for (kind, title, tags) in items {
            store
                .create(NewItem {
                    kind: *kind,
                    title: title.to_string(),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    user_id: "me".into(),
                    ..NewItem::default()
                })
                .unwrap();
        }
        (dir, App::with_store(store, &config()))
    }

    fn press(app: &mut App<FileStore>, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App<FileStore>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn titles(app: &App<FileStore>) -> Vec<String> {
        app.visible.iter().filter_map(|&id| app.store.get(id)).map(|t| t.title.clone()).collect()
    }

    fn screen(app: &mut App<FileStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_quit_keys() {
        let (_d, mut app) = app_with(&[]);
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_reorder_by_pick_and_drop() {
        let (_d, mut app) = app_with(&[
            (ViewType::Task, "one", &[]),
            (ViewType::Task, "two", &[]),
            (ViewType::Task, "three", &[]),
        ]);
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(titles(&app), ["two", "three", "one"]);
        assert_eq!(app.selected_id(), Some(1));
        assert_eq!(app.toast.as_ref().map(|t| t.kind), Some(ToastKind::Success));
    }

    #[test]
    fn test_drag_refused_outside_manual_sort() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "b", &[]), (ViewType::Task, "a", &[])]);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.filter.sort, SortOption::AlphaAsc);
        assert_eq!(titles(&app), ["a", "b"]);
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.drag.dragged(), None);
        assert_eq!(app.toast.as_ref().map(|t| t.kind), Some(ToastKind::Info));
    }

    #[test]
    fn test_tag_filter_and_semantics() {
        let (_d, mut app) = app_with(&[
            (ViewType::Task, "both", &["home", "urgent"]),
            (ViewType::Task, "home only", &["home"]),
            (ViewType::Task, "none", &[]),
        ]);
        assert_eq!(app.tags, ["home", "urgent"]);
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(titles(&app), ["both", "home only"]);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(titles(&app), ["both"]);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(titles(&app).len(), 3);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::List);
    }

    #[test]
    fn test_toggle_and_archive() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "one", &[]), (ViewType::Task, "two", &[])]);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.store.get(1).unwrap().status, Status::Completed);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.store.get(1).unwrap().status, Status::Active);
        press(&mut app, KeyCode::Char('A'));
        assert_eq!(titles(&app), ["two"]);
        assert_eq!(app.selected_id(), Some(2));
    }

    #[test]
    fn test_delete_goes_through_confirm() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "doomed", &[])]);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::List);
        assert_eq!(app.store.items().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.confirm.processing);
        assert!(screen(&mut app).contains("Purging..."));
        // ignored while processing
        press(&mut app, KeyCode::Esc);
        assert!(app.confirm.open);
        app.tick();
        assert!(!app.confirm.open);
        assert!(app.store.items().is_empty());
        assert_eq!(app.state, AppState::List);
    }

    #[test]
    fn test_add_item_form() {
        let (_d, mut app) = app_with(&[]);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::AddItem);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddItem);
        assert_eq!(app.toast.as_ref().map(|t| t.kind), Some(ToastKind::Error));

        type_str(&mut app, "Write report");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Work");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::List);
        assert_eq!(titles(&app), ["Write report"]);
        assert_eq!(app.store.get(1).unwrap().tags, ["work"]);
    }

    #[test]
    fn test_plan_editor_saves_only_on_enter() {
        let (_d, mut app) = app_with(&[(ViewType::LevelUp, "Rust course", &[])]);
        app.store
            .update_metadata(1, json!({"total_hours": 10, "hours_completed": 2}).as_object().unwrap().clone())
            .unwrap();
        app.set_view(ViewType::LevelUp);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditPlan);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "6");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.get(1).unwrap().metadata["hours_completed"], json!(2));

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "6");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::List);
        let meta = &app.store.get(1).unwrap().metadata;
        assert_eq!(meta["hours_completed"], json!(6));
        assert_eq!(meta["daily_study_goal"], json!(1));
    }

    #[test]
    fn test_level_up_detail_finish_line() {
        let (_d, mut app) = app_with(&[
            (ViewType::LevelUp, "Marathon course", &[]),
            (ViewType::LevelUp, "Finished course", &[]),
        ]);
        let meta = |v: serde_json::Value| v.as_object().unwrap().clone();
        app.store.update_metadata(1, meta(json!({"total_hours": 1e12, "daily_study_goal": 1}))).unwrap();
        app.store.update_metadata(2, meta(json!({"total_hours": 10, "hours_completed": 10}))).unwrap();
        app.store.toggle_status(2, Status::Active).unwrap();
        app.set_view(ViewType::LevelUp);
        screen(&mut app);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Detail);
        assert!(screen(&mut app).contains("days left, finish -"));

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        let text = screen(&mut app);
        assert!(text.contains("Done. Great job!"));
        assert!(!text.contains("days left"));
    }

    #[test]
    fn test_plan_editor_only_for_level_up() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "plain", &[])]);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::List);
    }

    #[test]
    fn test_tag_manager_updates_store() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "one", &["alpha"]), (ViewType::Task, "two", &[])]);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.state, AppState::EditTags);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.store.get(2).unwrap().tags, ["alpha"]);

        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "Side Project");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.store.get(2).unwrap().tags, ["alpha", "side-project"]);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::List);
    }

    #[test]
    fn test_view_switch_and_empty_level_up() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "one", &[])]);
        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.view, ViewType::LevelUp);
        assert!(app.visible.is_empty());
        let text = screen(&mut app);
        assert!(text.contains("No courses in the queue. Add one to start your path."));
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.view, ViewType::Resource);
    }

    #[test]
    fn test_archived_items_hidden() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "kept", &[]), (ViewType::Task, "gone", &[])]);
        app.store.set_status(2, Status::Archived).unwrap();
        app.update_visible();
        for sort in SortOption::ALL {
            app.set_sort(sort);
            assert_eq!(titles(&app), ["kept"]);
        }
    }

    #[test]
    fn test_list_screen_renders_items() {
        let (_d, mut app) = app_with(&[(ViewType::Task, "Buy milk", &["home"])]);
        let text = screen(&mut app);
        assert!(text.contains("Buy milk [home]"));
        assert!(text.contains("Manual / Default"));
        assert!(text.contains("#home"));
    }
}
