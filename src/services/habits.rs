// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit repository: owner-scoped CRUD and the session's in-memory habit list.
//!
//! Every operation takes the caller's [`SessionState`]. Without a signed-in
//! user the operation returns immediately without touching the store.
//! Every successful mutation leaves the list in canonical order (newest
//! `created_at` first); a failed store call leaves the list unchanged and
//! raises a dismissible [`Notice`].

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{sort_newest_first, AuthUser, Habit, HabitListView, NewHabit, Notice};
use crate::session::SessionState;
use crate::time_utils::iso_timestamp;
use std::sync::Arc;

/// Habit list of one session, synchronized with the document store.
pub struct HabitRepository {
    store: Arc<dyn DocumentStore>,
    /// uid the cached list belongs to
    owner: Option<String>,
    habits: Vec<Habit>,
    loaded: bool,
    notice: Option<Notice>,
}

impl HabitRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            owner: None,
            habits: Vec::new(),
            loaded: false,
            notice: None,
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn view(&self) -> HabitListView {
        HabitListView::new(&self.habits, self.notice.clone())
    }

    /// Guard: the signed-in user, or `None` to skip the operation.
    ///
    /// Switching to a different user drops the cached list.
    fn active_user<'s>(&mut self, session: &'s SessionState) -> Option<&'s AuthUser> {
        let Some(user) = session.user() else {
            tracing::debug!("No active session, skipping habit operation");
            return None;
        };
        if self.owner.as_deref() != Some(user.uid.as_str()) {
            self.owner = Some(user.uid.clone());
            self.habits.clear();
            self.loaded = false;
            self.notice = None;
        }
        Some(user)
    }

    /// Log a failed store call and raise a notice for retryable failures.
    fn fail(&mut self, action: &'static str, err: AppError) -> AppError {
        tracing::error!(action, error = %err, "Habit store call failed");
        if err.is_retryable() {
            self.notice = Some(Notice {
                message: AppError::DATA_ACCESS_MESSAGE.to_string(),
                retryable: true,
            });
        }
        err
    }

    async fn query(&self, owner_id: &str) -> Result<Vec<Habit>, AppError> {
        let mut habits = self.store.list_habits(owner_id).await?;
        sort_newest_first(&mut habits);
        tracing::debug!(owner_id, count = habits.len(), "Habits fetched");
        Ok(habits)
    }

    async fn fetch(&mut self, owner_id: &str) -> Result<(), AppError> {
        match self.query(owner_id).await {
            Ok(habits) => {
                self.habits = habits;
                self.loaded = true;
                Ok(())
            }
            Err(err) => Err(self.fail("list", err)),
        }
    }

    /// Re-fetch the owner's habits, newest first.
    pub async fn list(&mut self, session: &SessionState) -> Result<&[Habit], AppError> {
        if let Some(user) = self.active_user(session) {
            self.fetch(&user.uid).await?;
        }
        Ok(&self.habits)
    }

    /// The habit must belong to the session owner's list.
    ///
    /// An id missing from the cached list triggers one re-fetch, since the
    /// habit may have been created from another session.
    async fn require_owned(
        &mut self,
        session: &SessionState,
        habit_id: &str,
    ) -> Result<(), AppError> {
        let Some(user) = self.active_user(session) else {
            return Ok(());
        };
        let fetched = !self.loaded;
        if fetched {
            self.fetch(&user.uid).await?;
        }
        if self.contains(habit_id) {
            return Ok(());
        }
        if !fetched {
            self.fetch(&user.uid).await?;
            if self.contains(habit_id) {
                return Ok(());
            }
        }
        Err(AppError::NotFound(format!("Habit {} not found", habit_id)))
    }

    fn contains(&self, habit_id: &str) -> bool {
        self.habits.iter().any(|h| h.id == habit_id)
    }

    /// Create a habit with empty progress; returns its id.
    pub async fn create(
        &mut self,
        session: &SessionState,
        name: &str,
        description: &str,
    ) -> Result<Option<String>, AppError> {
        let Some(user) = self.active_user(session) else {
            return Ok(None);
        };

        let new_habit = NewHabit::new(&user.uid, name, description, chrono::Utc::now());
        let created = match self.store.insert_habit(&new_habit).await {
            Ok(created) => created,
            Err(err) => return Err(self.fail("create", err)),
        };
        tracing::info!(habit_id = %created.id, owner_id = %user.uid, "Habit created");

        let id = created.id.clone();
        match self.query(&user.uid).await {
            Ok(habits) => {
                self.habits = habits;
                self.loaded = true;
            }
            Err(err) => {
                // The insert went through, so there is nothing to retry.
                tracing::warn!(error = %err, "Refresh after create failed, applying locally");
                self.habits.push(created);
                sort_newest_first(&mut self.habits);
            }
        }
        Ok(Some(id))
    }

    /// Record a check-in (set-union on the exact string).
    ///
    /// `timestamp` defaults to now in the stored ISO format.
    pub async fn check_in(
        &mut self,
        session: &SessionState,
        habit_id: &str,
        timestamp: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        if self.active_user(session).is_none() {
            return Ok(None);
        }
        self.require_owned(session, habit_id).await?;

        let timestamp = timestamp
            .map(str::to_string)
            .unwrap_or_else(|| iso_timestamp(chrono::Utc::now()));

        if let Err(err) = self.store.add_check_in(habit_id, &timestamp).await {
            return Err(self.fail("check_in", err));
        }

        if let Some(habit) = self.habits.iter_mut().find(|h| h.id == habit_id) {
            habit.add_check_in(&timestamp);
        }
        sort_newest_first(&mut self.habits);
        tracing::info!(habit_id, timestamp = %timestamp, "Checked in");
        Ok(Some(timestamp))
    }

    /// Remove a check-in by exact string. Absent strings are a no-op.
    pub async fn delete_check_in(
        &mut self,
        session: &SessionState,
        habit_id: &str,
        timestamp: &str,
    ) -> Result<(), AppError> {
        if self.active_user(session).is_none() {
            return Ok(());
        }
        self.require_owned(session, habit_id).await?;

        if let Err(err) = self.store.remove_check_in(habit_id, timestamp).await {
            return Err(self.fail("delete_check_in", err));
        }

        if let Some(habit) = self.habits.iter_mut().find(|h| h.id == habit_id) {
            if !habit.remove_check_in(timestamp) {
                tracing::debug!(habit_id, timestamp, "Check-in not present, nothing removed");
            }
        }
        sort_newest_first(&mut self.habits);
        Ok(())
    }

    /// Delete a habit and drop it from the list.
    pub async fn delete_habit(
        &mut self,
        session: &SessionState,
        habit_id: &str,
    ) -> Result<(), AppError> {
        if self.active_user(session).is_none() {
            return Ok(());
        }
        self.require_owned(session, habit_id).await?;

        if let Err(err) = self.store.delete_habit(habit_id).await {
            return Err(self.fail("delete_habit", err));
        }

        self.habits.retain(|h| h.id != habit_id);
        tracing::info!(habit_id, "Habit deleted");
        Ok(())
    }
}
