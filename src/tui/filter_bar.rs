//! Header row with the sort mode and the tag chips.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::colors::{text_on, CYAN};
use crate::view::FilterState;

/// Draw the filter bar. `cursor` marks the focused chip while the tag filter is open.
pub fn render_filter_bar(
    f: &mut Frame,
    area: Rect,
    filter: &FilterState,
    tags: &[String],
    cursor: Option<usize>,
    accent: Color,
) {
    let mut lines = vec![Line::from(vec![
        Span::styled("Sort: ", Style::default().fg(Color::DarkGray)),
        Span::styled(filter.sort.label(), Style::default().fg(accent).add_modifier(Modifier::BOLD)),
        Span::styled("  [s/S]", Style::default().fg(Color::DarkGray)),
        Span::raw("   "),
        Span::styled(
            if filter.is_manual() { "drag enabled" } else { "drag off" },
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ])];

    if tags.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tags found",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else {
        let mut chips = vec![Span::styled("Tags: ", Style::default().fg(Color::DarkGray))];
        for (i, tag) in tags.iter().enumerate() {
            let mut style = if filter.is_tag_active(tag) {
                Style::default().bg(CYAN).fg(text_on(CYAN)).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            if cursor == Some(i) {
                style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
            }
            chips.push(Span::styled(format!(" #{tag} "), style));
            chips.push(Span::raw(" "));
        }
        lines.push(Line::from(chips));
    }

    let bar = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(bar, area);
}
