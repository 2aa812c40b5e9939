// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod habit;
pub mod user;
pub mod view;

pub use habit::{sort_newest_first, Habit, NewHabit};
pub use user::AuthUser;
pub use view::{CheckInEntry, HabitCard, HabitListView, Notice};
