//! Per-item tag manager.
//!
//! Every operation returns the item's complete new tag list, which the app
//! forwards to [`crate::store::TaskStore::update_tags`].

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::db::normalise_tag;
use crate::tui::colors::CYAN;
use crate::tui::input::InputField;
use crate::tui::utils::centered_rect;

/// Add `tag` if the item lacks it, drop it otherwise.
pub fn toggle_tag(current: &[String], tag: &str) -> Vec<String> {
    if current.iter().any(|t| t == tag) {
        remove_tag(current, tag)
    } else {
        let mut out = current.to_vec();
        out.push(tag.to_string());
        out
    }
}

/// Add a new tag after normalising it. `None` when it is blank or already present.
pub fn add_tag(current: &[String], raw: &str) -> Option<Vec<String>> {
    let tag = normalise_tag(raw);
    if tag.is_empty() || current.contains(&tag) {
        return None;
    }
    let mut out = current.to_vec();
    out.push(tag);
    Some(out)
}

pub fn remove_tag(current: &[String], tag: &str) -> Vec<String> {
    current.iter().filter(|t| *t != tag).cloned().collect()
}

/// State of the tag manager popup for one item.
pub struct TagManager {
    pub item_id: u64,
    pub item_tags: Vec<String>,
    /// Every tag known across the store, offered for toggling.
    pub system_tags: Vec<String>,
    pub cursor: usize,
    pub input: InputField,
}

impl TagManager {
    pub fn new(item_id: u64, item_tags: Vec<String>, system_tags: Vec<String>) -> Self {
        TagManager {
            item_id,
            item_tags,
            system_tags,
            cursor: 0,
            input: InputField::new(),
        }
    }

    /// Tags listed in the popup: known tags plus any the item carries that are not known yet.
    pub fn entries(&self) -> Vec<String> {
        let mut all = self.system_tags.clone();
        for t in &self.item_tags {
            if !all.contains(t) {
                all.push(t.clone());
            }
        }
        all.sort();
        all
    }

    pub fn selected(&self) -> Option<String> {
        self.entries().get(self.cursor).cloned()
    }

    pub fn move_cursor(&mut self, down: bool) {
        let len = self.entries().len();
        if len == 0 {
            self.cursor = 0;
        } else if down {
            self.cursor = (self.cursor + 1) % len;
        } else {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    pub fn toggle_selected(&self) -> Option<Vec<String>> {
        self.selected().map(|tag| toggle_tag(&self.item_tags, &tag))
    }

    pub fn remove_selected(&self) -> Option<Vec<String>> {
        let tag = self.selected()?;
        self.item_tags.contains(&tag).then(|| remove_tag(&self.item_tags, &tag))
    }

    /// Add whatever is typed in the input field.
    pub fn add_from_input(&self) -> Option<Vec<String>> {
        add_tag(&self.item_tags, &self.input.value)
    }

    /// Record the tags the store accepted.
    pub fn apply(&mut self, tags: Vec<String>) {
        self.item_tags = tags;
        self.input.clear();
        let len = self.entries().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

pub fn render_tag_manager(f: &mut Frame, area: Rect, manager: &TagManager, title: &str) {
    let rect = centered_rect(50, 60, area);
    f.render_widget(Clear, rect);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Tags - {title}"))
        .border_style(Style::default().fg(CYAN));
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3), Constraint::Length(1)])
        .split(inner);

    let entries = manager.entries();
    if entries.is_empty() {
        f.render_widget(
            Paragraph::new("No tags found").style(Style::default().fg(Color::DarkGray)),
            chunks[0],
        );
    } else {
        let items: Vec<ListItem> = entries
            .iter()
            .map(|tag| {
                let on = manager.item_tags.contains(tag);
                let mark = if on { "[x]" } else { "[ ]" };
                let style = if on { Style::default().fg(CYAN) } else { Style::default() };
                ListItem::new(Line::from(vec![Span::raw(format!("{mark} ")), Span::styled(format!("#{tag}"), style)]))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(manager.cursor));
        let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(list, chunks[0], &mut state);
    }

    let input = Paragraph::new(manager.input.value.clone())
        .block(Block::default().borders(Borders::ALL).title("New tag"))
        .style(if manager.input.active { Style::default().fg(Color::Yellow) } else { Style::default() });
    f.render_widget(input, chunks[1]);
    if manager.input.active {
        f.set_cursor_position((chunks[1].x + manager.input.cursor as u16 + 1, chunks[1].y + 1));
    }

    f.render_widget(
        Paragraph::new("Space: Toggle  x: Remove  n: New  Enter: Add  Esc: Close")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}
