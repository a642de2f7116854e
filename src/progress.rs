//! Study-plan metrics for level-up items.
//!
//! A learning goal is described by three numbers kept in item metadata: the
//! course length in hours, the hours already done and the daily study goal.
//! Everything shown on a level-up card is derived from those.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::dates::{add_days, format_short};
use crate::task::{TaskItem, META_DAILY_STUDY_GOAL, META_HOURS_COMPLETED, META_TOTAL_HOURS};

/// Daily goal assumed when an item has none recorded.
pub const DEFAULT_DAILY_GOAL: f64 = 1.0;

/// The three numeric inputs of a level-up card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudyPlan {
    pub total_hours: f64,
    pub hours_completed: f64,
    pub daily_goal: f64,
}

impl StudyPlan {
    /// Read the plan from item metadata. A zero or missing daily goal reads as one hour per day.
    pub fn from_item(item: &TaskItem) -> Self {
        let daily_goal = item.metadata_number(META_DAILY_STUDY_GOAL);
        StudyPlan {
            total_hours: item.metadata_number(META_TOTAL_HOURS),
            hours_completed: item.metadata_number(META_HOURS_COMPLETED),
            daily_goal: if daily_goal == 0.0 { DEFAULT_DAILY_GOAL } else { daily_goal },
        }
    }

    /// Percent complete, rounded and capped at 100. Zero when the total is not positive.
    pub fn progress_percent(&self) -> u16 {
        if self.total_hours <= 0.0 {
            return 0;
        }
        let pct = (self.hours_completed / self.total_hours * 100.0).round();
        pct.clamp(0.0, 100.0) as u16
    }

    pub fn hours_left(&self) -> f64 {
        (self.total_hours - self.hours_completed).max(0.0)
    }

    /// Whole days needed at the daily goal. Zero when the goal is not positive.
    pub fn days_left(&self) -> i64 {
        if self.daily_goal <= 0.0 {
            return 0;
        }
        (self.hours_left() / self.daily_goal).ceil() as i64
    }

    /// Date the course is finished if the daily goal is kept from `today`.
    ///
    /// `None` when the finish lies beyond the representable calendar.
    pub fn projected_finish(&self, today: NaiveDate) -> Option<NaiveDate> {
        add_days(today, self.days_left())
    }

    /// Short finish date for display, `-` when there is none.
    pub fn finish_label(&self, today: NaiveDate) -> String {
        self.projected_finish(today).map_or_else(|| "-".to_string(), format_short)
    }
}

/// Staged edits of a card's plan. Nothing reaches the store until [`PlanDraft::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub total_hours: String,
    pub hours_completed: String,
    pub daily_goal: String,
}

impl PlanDraft {
    pub fn from_plan(plan: &StudyPlan) -> Self {
        PlanDraft {
            total_hours: format_hours(plan.total_hours),
            hours_completed: format_hours(plan.hours_completed),
            daily_goal: format_hours(plan.daily_goal),
        }
    }

    /// The plan the draft currently describes. Unparsable fields count as zero.
    pub fn plan(&self) -> StudyPlan {
        StudyPlan {
            total_hours: coerce_number(&self.total_hours),
            hours_completed: coerce_number(&self.hours_completed),
            daily_goal: coerce_number(&self.daily_goal),
        }
    }

    /// Merge the draft into `original`, overwriting only the three plan fields.
    pub fn commit(&self, original: &Map<String, Value>) -> Map<String, Value> {
        let plan = self.plan();
        let mut merged = original.clone();
        merged.insert(META_TOTAL_HOURS.into(), number_value(plan.total_hours));
        merged.insert(META_HOURS_COMPLETED.into(), number_value(plan.hours_completed));
        merged.insert(META_DAILY_STUDY_GOAL.into(), number_value(plan.daily_goal));
        merged
    }
}

/// Numeric coercion used by plan inputs: blank or invalid text becomes zero.
pub fn coerce_number(s: &str) -> f64 {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Render hours without a trailing `.0` for whole numbers.
pub fn format_hours(h: f64) -> String {
    if h.fract() == 0.0 {
        format!("{}", h as i64)
    } else {
        format!("{h}")
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::from(0))
    }
}
