//! Database layer (Firestore, plus an in-process store for local runs).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Habit, NewHabit};

/// Collection names as constants.
pub mod collections {
    pub const HABITS: &str = "habits";
}

/// Document store operations on the habit collection.
///
/// Implementations must scope `list_habits` to the owner and order it by
/// `createdAt` descending. Check-in updates have set semantics on exact
/// string match and fail for a habit that does not exist.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Habits whose `userId` equals `owner_id`, newest first.
    async fn list_habits(&self, owner_id: &str) -> Result<Vec<Habit>, AppError>;

    /// Insert a new habit; returns the stored record with its generated id.
    async fn insert_habit(&self, habit: &NewHabit) -> Result<Habit, AppError>;

    /// Array-union `timestamp` into `progress`.
    async fn add_check_in(&self, habit_id: &str, timestamp: &str) -> Result<(), AppError>;

    /// Array-remove `timestamp` from `progress`.
    async fn remove_check_in(&self, habit_id: &str, timestamp: &str) -> Result<(), AppError>;

    async fn delete_habit(&self, habit_id: &str) -> Result<(), AppError>;
}
