// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Habit model for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored habit record in Firestore.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Document ID, assigned by the store on insert
    #[serde(alias = "_firestore_id", default)]
    pub id: String,
    /// Habit name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Owner uid (stored as `userId`)
    #[serde(rename = "userId")]
    pub owner_id: String,
    /// Creation time, only used for ordering
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Check-in timestamps (ISO 8601), insertion order, no exact duplicates
    #[serde(default)]
    pub progress: Vec<String>,
}

impl Habit {
    /// Add a check-in unless the exact string is already present.
    ///
    /// Returns `true` if the list changed.
    pub fn add_check_in(&mut self, timestamp: &str) -> bool {
        if self.progress.iter().any(|t| t == timestamp) {
            return false;
        }
        self.progress.push(timestamp.to_string());
        true
    }

    /// Remove every entry equal to `timestamp`. Returns `true` if the list changed.
    pub fn remove_check_in(&mut self, timestamp: &str) -> bool {
        let before = self.progress.len();
        self.progress.retain(|t| t != timestamp);
        self.progress.len() != before
    }
}

/// New habit document as written on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    pub description: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    pub progress: Vec<String>,
}

impl NewHabit {
    pub fn new(owner_id: &str, name: &str, description: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            owner_id: owner_id.to_string(),
            created_at,
            progress: Vec::new(),
        }
    }

    /// Materialize the stored record once the store assigned an id.
    pub fn into_habit(self, id: String) -> Habit {
        Habit {
            id,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            created_at: self.created_at,
            progress: self.progress,
        }
    }
}

/// Canonical list order: newest `created_at` first.
pub fn sort_newest_first(habits: &mut [Habit]) {
    habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
