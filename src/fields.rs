//! Enumerations and field types for Task Master items.
//!
//! This module defines the closed sets used to classify items: the view kind an
//! item belongs to, its lifecycle status, recurrence cadences, the list sort
//! modes and the ledger ticket fields stored in metadata.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The view an item is rendered in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    #[default]
    Task,
    CodeSnippet,
    SocialBookmark,
    Resource,
    LevelUp,
    Ledger,
}

impl ViewType {
    pub const ALL: [ViewType; 6] = [
        ViewType::Task,
        ViewType::CodeSnippet,
        ViewType::SocialBookmark,
        ViewType::Resource,
        ViewType::LevelUp,
        ViewType::Ledger,
    ];

    /// Display label used for tabs and tables.
    pub fn label(self) -> &'static str {
        match self {
            ViewType::Task => "Tasks",
            ViewType::CodeSnippet => "Snippets",
            ViewType::SocialBookmark => "Bookmarks",
            ViewType::Resource => "Resources",
            ViewType::LevelUp => "Level Up",
            ViewType::Ledger => "Ledger",
        }
    }
}

/// Item lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Active,
    Completed,
    Archived,
}

impl Status {
    /// The status a toggle moves to. Archived items come back as active.
    pub fn toggled(self) -> Status {
        match self {
            Status::Completed => Status::Active,
            Status::Active | Status::Archived => Status::Completed,
        }
    }
}

/// Known recurrence cadences. Items store the raw string so unknown values survive a round trip.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    OneOff,
    Archived,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Quarterly => "quarterly",
            Recurrence::OneOff => "one_off",
            Recurrence::Archived => "archived",
        }
    }
}

/// Sort modes offered by the filter bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Manual,
    AlphaAsc,
    AlphaDesc,
    DateAsc,
    DateDesc,
    CreatedDesc,
}

impl SortOption {
    /// Filter bar order.
    pub const ALL: [SortOption; 6] = [
        SortOption::Manual,
        SortOption::AlphaAsc,
        SortOption::AlphaDesc,
        SortOption::DateAsc,
        SortOption::DateDesc,
        SortOption::CreatedDesc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOption::Manual => "Manual / Default",
            SortOption::AlphaAsc => "Alphabetical (A-Z)",
            SortOption::AlphaDesc => "Alphabetical (Z-A)",
            SortOption::DateAsc => "Due Date (Soonest)",
            SortOption::DateDesc => "Due Date (Latest)",
            SortOption::CreatedDesc => "Newest Added",
        }
    }

    /// Parse a stored sort value. Unknown values fall back to manual.
    pub fn parse_lenient(s: &str) -> SortOption {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "alpha_asc" => SortOption::AlphaAsc,
            "alpha_desc" => SortOption::AlphaDesc,
            "date_asc" => SortOption::DateAsc,
            "date_desc" => SortOption::DateDesc,
            "created_desc" => SortOption::CreatedDesc,
            _ => SortOption::Manual,
        }
    }

    /// Next mode in filter bar order, wrapping around.
    pub fn next(self) -> SortOption {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous mode in filter bar order, wrapping around.
    pub fn prev(self) -> SortOption {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Ledger ticket type, stored as `metadata.ticket_type`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TicketType {
    Bug,
    Feature,
    Refactor,
}

impl TicketType {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketType::Bug => "bug",
            TicketType::Feature => "feature",
            TicketType::Refactor => "refactor",
        }
    }
}

/// Ledger ticket priority, stored as `metadata.priority`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TicketPriority {
    Critical,
    High,
    Normal,
    Low,
}

impl TicketPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::Critical => "critical",
            TicketPriority::High => "high",
            TicketPriority::Normal => "normal",
            TicketPriority::Low => "low",
        }
    }
}
