// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View models rendered by the front-end.

use crate::models::Habit;
use crate::time_utils::display_check_in;
use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Transient, dismissible error shown after a failed data call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Notice {
    pub message: String,
    /// The failed action can be retried unchanged
    pub retryable: bool,
}

/// One check-in line of a habit card.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInEntry {
    /// Raw stored value; send it back to delete this check-in
    pub timestamp: String,
    /// Human-readable form, or "Invalid date"
    pub display: String,
}

/// One habit as shown in the list.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HabitCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub check_ins: Vec<CheckInEntry>,
}

impl From<&Habit> for HabitCard {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id.clone(),
            name: habit.name.clone(),
            description: habit.description.clone(),
            created_at: habit.created_at,
            check_ins: habit
                .progress
                .iter()
                .map(|timestamp| CheckInEntry {
                    timestamp: timestamp.clone(),
                    display: display_check_in(timestamp),
                })
                .collect(),
        }
    }
}

/// The main view: habit list plus any pending notice.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HabitListView {
    /// The list is hidden while there are no habits
    pub show_list: bool,
    pub habits: Vec<HabitCard>,
    pub notice: Option<Notice>,
}

impl HabitListView {
    pub fn new(habits: &[Habit], notice: Option<Notice>) -> Self {
        Self {
            show_list: !habits.is_empty(),
            habits: habits.iter().map(HabitCard::from).collect(),
            notice,
        }
    }
}
