//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::ViewType;

// Each view gets its own accent so the active tab is obvious.

/// Used for Tasks
pub const PURPLE: Color = Color::Rgb(168, 85, 247);
/// Used for Level Up
pub const CYAN: Color = Color::Rgb(6, 182, 212);
/// Used for Ledger
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for Snippets, Bookmarks and Resources
pub const SLATE: Color = Color::Rgb(71, 85, 105);

/// Success toasts and completed items
pub const EMERALD: Color = Color::Rgb(16, 185, 129);
/// Error toasts and destructive confirmation
pub const ROSE: Color = Color::Rgb(244, 63, 94);
/// Confirmation modal background
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);

pub fn view_color(kind: ViewType) -> Color {
    match kind {
        ViewType::Task => PURPLE,
        ViewType::LevelUp => CYAN,
        ViewType::Ledger => GOLD,
        ViewType::CodeSnippet | ViewType::SocialBookmark | ViewType::Resource => SLATE,
    }
}

/// Readable foreground for text drawn on top of `bg`.
pub fn text_on(bg: Color) -> Color {
    match bg {
        GOLD | CYAN => Color::Rgb(20, 20, 20),
        _ => Color::White,
    }
}
