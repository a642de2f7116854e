//! Level-up view: a vertical path of course cards with progress and a staged plan editor.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use serde_json::{Map, Value};

use crate::fields::Status;
use crate::progress::{format_hours, PlanDraft, StudyPlan};
use crate::task::{TaskItem, META_PLATFORM};
use crate::tui::colors::{CYAN, EMERALD};
use crate::tui::input::InputField;

const CARD_HEIGHT: u16 = 6;

/// Field labels in editor order.
pub const PLAN_LABELS: [&str; 3] = ["Done (Hrs)", "Total (Hrs)", "Study/Day"];

/// Staged edits of one card's study plan.
pub struct PlanEditor {
    pub item_id: u64,
    pub fields: [InputField; 3],
    pub current: usize,
    original: Map<String, Value>,
}

impl PlanEditor {
    pub fn for_item(item: &TaskItem) -> Self {
        let draft = PlanDraft::from_plan(&StudyPlan::from_item(item));
        let mut editor = PlanEditor {
            item_id: item.id,
            fields: [
                InputField::with_value(&draft.hours_completed),
                InputField::with_value(&draft.total_hours),
                InputField::with_value(&draft.daily_goal),
            ],
            current: 0,
            original: item.metadata.clone(),
        };
        editor.update_active_field();
        editor
    }

    pub fn draft(&self) -> PlanDraft {
        PlanDraft {
            hours_completed: self.fields[0].value.clone(),
            total_hours: self.fields[1].value.clone(),
            daily_goal: self.fields[2].value.clone(),
        }
    }

    /// Metadata to hand to the store on save.
    pub fn commit(&self) -> Map<String, Value> {
        self.draft().commit(&self.original)
    }

    pub fn next_field(&mut self) {
        self.current = (self.current + 1) % self.fields.len();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current = (self.current + self.fields.len() - 1) % self.fields.len();
        self.update_active_field();
    }

    fn update_active_field(&mut self) {
        for (i, f) in self.fields.iter_mut().enumerate() {
            f.active = i == self.current;
        }
    }

    pub fn current_field(&mut self) -> &mut InputField {
        &mut self.fields[self.current]
    }
}

/// Render the level-up path. `selected` indexes into `items`.
pub fn render_level_up(
    f: &mut Frame,
    area: Rect,
    items: &[&TaskItem],
    selected: Option<usize>,
    dragged: Option<u64>,
    is_manual: bool,
    today: NaiveDate,
) {
    if items.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from("🎓"),
            Line::from(Span::styled(
                "No courses in the queue. Add one to start your path.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let visible = (area.height / CARD_HEIGHT).max(1) as usize;
    let selected_idx = selected.unwrap_or(0);
    let offset = selected_idx.saturating_sub(visible - 1);

    for (slot, (idx, item)) in items.iter().enumerate().skip(offset).take(visible).enumerate() {
        let rect = Rect {
            x: area.x,
            y: area.y + slot as u16 * CARD_HEIGHT,
            width: area.width,
            height: CARD_HEIGHT.min(area.height.saturating_sub(slot as u16 * CARD_HEIGHT)),
        };
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(4), Constraint::Min(10)])
            .split(rect);

        render_node(f, chunks[0], item, idx + 1 < items.len());
        render_course_card(
            f,
            chunks[1],
            item,
            Some(idx) == selected,
            dragged == Some(item.id),
            is_manual,
            today,
        );
    }
}

/// The path marker to the left of a card: a node, then an arrow to the next card.
fn render_node(f: &mut Frame, area: Rect, item: &TaskItem, has_next: bool) {
    let (node, color) = if item.status == Status::Completed {
        ("✔", EMERALD)
    } else {
        ("●", Color::Gray)
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {node}"), Style::default().fg(color))),
        Line::from(" │"),
        Line::from(" │"),
    ];
    if has_next {
        lines.push(Line::from(" ↓"));
    }
    f.render_widget(Paragraph::new(lines).style(Style::default().fg(Color::DarkGray)), area);
}

/// One course card: title, tags, progress bar and derived stats.
pub fn render_course_card(
    f: &mut Frame,
    area: Rect,
    item: &TaskItem,
    is_selected: bool,
    is_dragging: bool,
    is_manual: bool,
    today: NaiveDate,
) {
    let plan = StudyPlan::from_item(item);
    let completed = item.status == Status::Completed;

    let grip = if is_manual { "⋮⋮ " } else { "" };
    let title_style = if completed {
        Style::default().fg(EMERALD).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut title = vec![Span::raw(grip), Span::styled(item.title.clone(), title_style)];
    if let Some(platform) = item.metadata_str(META_PLATFORM) {
        title.push(Span::styled(format!("  @{platform}"), Style::default().fg(Color::DarkGray)));
    }

    let border_style = if is_dragging {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else if is_selected {
        Style::default().fg(CYAN)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Line::from(title));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let tags = if item.tags.is_empty() {
        Line::from(Span::styled("no tags", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(
            item.tags
                .iter()
                .map(|t| Span::styled(format!("#{t} "), Style::default().fg(Color::Magenta)))
                .collect::<Vec<_>>(),
        )
    };
    f.render_widget(Paragraph::new(tags), rows[0]);

    let progress = plan.progress_percent();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(CYAN).bg(Color::Rgb(30, 41, 59)))
        .percent(progress)
        .label(format!("{progress}%"));
    f.render_widget(gauge, rows[1]);

    let (days, finish) = if completed {
        ("Done".to_string(), "Great job!".to_string())
    } else {
        (
            format!("{} Days", plan.days_left()),
            format!("Finish: {}", plan.finish_label(today)),
        )
    };
    let stats = Line::from(vec![
        Span::styled("⏱ ", Style::default().fg(CYAN)),
        Span::styled(
            format!("{} / {} hrs", format_hours(plan.hours_completed), format_hours(plan.total_hours)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" Progress ({progress}%)"), Style::default().fg(Color::DarkGray)),
        Span::raw("   "),
        Span::styled("📅 ", Style::default().fg(Color::Magenta)),
        Span::styled(days, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {finish}"), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(stats), rows[2]);
}

/// The plan editor shown in place of the stats while a card is being edited.
pub fn render_plan_editor(f: &mut Frame, area: Rect, editor: &PlanEditor, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Edit Plan - {title}"))
        .border_style(Style::default().fg(CYAN));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    for (i, (field, label)) in editor.fields.iter().zip(PLAN_LABELS).enumerate() {
        let style = if field.active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let input = Paragraph::new(field.value.clone())
            .block(Block::default().borders(Borders::ALL).title(label))
            .style(style);
        f.render_widget(input, rows[i]);
        if field.active {
            f.set_cursor_position((rows[i].x + field.cursor as u16 + 1, rows[i].y + 1));
        }
    }

    let preview = editor.draft().plan();
    let hint = Paragraph::new(vec![
        Line::from(format!(
            "Preview: {}% complete, {} days left",
            preview.progress_percent(),
            preview.days_left()
        )),
        Line::from("Enter: Save   Tab/↑↓: Next field   Esc: Discard"),
    ])
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hint, rows[3]);
}
