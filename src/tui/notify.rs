//! Toast notifications and the confirmation modal.
//!
//! Both are plain render functions over small value types. They keep no timers
//! or queues: the app decides when a toast appears or is dismissed and when the
//! modal is open or busy.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::colors::{DARK_RED, EMERALD, ROSE};
use crate::tui::utils::{bottom_right_rect, centered_rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A dismissible notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn new(id: u64, kind: ToastKind, message: impl Into<String>) -> Self {
        Toast { id, kind, message: message.into() }
    }

    fn accent(&self) -> Color {
        match self.kind {
            ToastKind::Error => ROSE,
            ToastKind::Success | ToastKind::Info => EMERALD,
        }
    }

    fn icon(&self) -> &'static str {
        match self.kind {
            ToastKind::Error => "✖",
            ToastKind::Success => "✔",
            ToastKind::Info => "ℹ",
        }
    }
}

/// Draw the toast in the bottom-right corner of `area`.
pub fn render_toast(f: &mut Frame, area: Rect, toast: &Toast) {
    let accent = toast.accent();
    let width = (toast.message.chars().count() as u16).saturating_add(12).max(24);
    let rect = bottom_right_rect(width, 3, area);
    f.render_widget(Clear, rect);

    let line = Line::from(vec![
        Span::styled(format!("{} ", toast.icon()), Style::default().fg(accent)),
        Span::styled(toast.message.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("  [x]", Style::default().fg(Color::DarkGray)),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent)),
    );
    f.render_widget(paragraph, rect);
}

/// Confirmation dialog for destructive actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmModal {
    pub open: bool,
    pub title: String,
    pub description: String,
    pub processing: bool,
}

impl ConfirmModal {
    pub fn open(title: impl Into<String>, description: impl Into<String>) -> Self {
        ConfirmModal {
            open: true,
            title: title.into(),
            description: description.into(),
            processing: false,
        }
    }

    pub fn close(&mut self) {
        *self = ConfirmModal::default();
    }
}

/// Draw the modal over `area`. Nothing is drawn while it is closed.
pub fn render_confirm(f: &mut Frame, area: Rect, modal: &ConfirmModal) {
    if !modal.open {
        return;
    }
    let rect = centered_rect(50, 30, area);
    f.render_widget(Clear, rect);

    let block = Block::default()
        .title(Span::styled(
            format!(" ⚠ {} ", modal.title.to_uppercase()),
            Style::default().fg(ROSE).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .style(Style::default().bg(DARK_RED));
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let description = Paragraph::new(modal.description.clone())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(description, chunks[0]);

    let actions = if modal.processing {
        Line::from(Span::styled("Purging...", Style::default().add_modifier(Modifier::ITALIC)))
    } else {
        Line::from(vec![
            Span::raw("[n] Abort"),
            Span::raw("    "),
            Span::styled("[y] Confirm Purge", Style::default().fg(ROSE).add_modifier(Modifier::BOLD)),
        ])
    };
    f.render_widget(Paragraph::new(actions).alignment(Alignment::Center), chunks[1]);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    pub(crate) fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn draw(render: impl FnOnce(&mut Frame)) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(render).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_toast_shows_message() {
        let toast = Toast::new(1, ToastKind::Error, "Save failed");
        let text = draw(|f| render_toast(f, f.area(), &toast));
        assert!(text.contains("Save failed"));
        assert!(text.contains("[x]"));
    }

    #[test]
    fn test_closed_modal_renders_nothing() {
        let modal = ConfirmModal::default();
        let text = draw(|f| render_confirm(f, f.area(), &modal));
        assert!(text.trim().is_empty());
    }

    #[test]
    fn test_modal_processing_state() {
        let mut modal = ConfirmModal::open("Delete item", "This cannot be undone.");
        let text = draw(|f| render_confirm(f, f.area(), &modal));
        assert!(text.contains("Confirm Purge"));
        assert!(!text.contains("Purging..."));

        modal.processing = true;
        let text = draw(|f| render_confirm(f, f.area(), &modal));
        assert!(text.contains("Purging..."));
        assert!(!text.contains("Confirm Purge"));

        modal.close();
        assert!(!modal.open);
    }
}
