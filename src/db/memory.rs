// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same semantics as the Firestore one.
//!
//! Used with `HABIT_STORE=memory` and by tests. Every call is counted so
//! tests can assert that no store interaction happened.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{sort_newest_first, Habit, NewHabit};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Habit documents kept in a concurrent map keyed by document id.
#[derive(Default)]
pub struct MemoryStore {
    habits: DashMap<String, Habit>,
    next_id: AtomicU64,
    calls: AtomicU64,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations attempted so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail with a database error (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stored copy of a habit, bypassing the call counter.
    pub fn get(&self, habit_id: &str) -> Option<Habit> {
        self.habits.get(habit_id).map(|h| h.clone())
    }

    fn begin(&self, operation: &str) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database(format!(
                "memory store unavailable during {}",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_habits(&self, owner_id: &str) -> Result<Vec<Habit>, AppError> {
        self.begin("list")?;
        let mut habits: Vec<Habit> = self
            .habits
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        // Ties on created_at fall back to id, like Firestore's implicit __name__ order.
        habits.sort_by(|a, b| a.id.cmp(&b.id));
        sort_newest_first(&mut habits);
        Ok(habits)
    }

    async fn insert_habit(&self, habit: &NewHabit) -> Result<Habit, AppError> {
        self.begin("insert")?;
        let id = format!("habit-{:08}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = habit.clone().into_habit(id.clone());
        self.habits.insert(id, stored.clone());
        Ok(stored)
    }

    async fn add_check_in(&self, habit_id: &str, timestamp: &str) -> Result<(), AppError> {
        self.begin("add_check_in")?;
        let mut habit = self
            .habits
            .get_mut(habit_id)
            .ok_or_else(|| AppError::NotFound(format!("Habit {} not found", habit_id)))?;
        habit.add_check_in(timestamp);
        Ok(())
    }

    async fn remove_check_in(&self, habit_id: &str, timestamp: &str) -> Result<(), AppError> {
        self.begin("remove_check_in")?;
        let mut habit = self
            .habits
            .get_mut(habit_id)
            .ok_or_else(|| AppError::NotFound(format!("Habit {} not found", habit_id)))?;
        habit.remove_check_in(timestamp);
        Ok(())
    }

    async fn delete_habit(&self, habit_id: &str) -> Result<(), AppError> {
        self.begin("delete")?;
        self.habits.remove(habit_id);
        Ok(())
    }
}
