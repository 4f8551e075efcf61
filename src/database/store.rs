use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::{
    Goal, GoalDetail, GoalFields, NewHabit, NewUser, Subgoal, Task, TaskList, TaskListWithTasks,
    User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence seam for every handler. All reads skip soft-deleted rows.
///
/// `save_*` methods write the mutable columns of the given row, bump
/// `updated_at` and return the stored row, or `None` when the row has been
/// deleted in the meantime.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // Users
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Checks every row, deleted or not, other than `exclude`
    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        exclude: Option<i64>,
    ) -> Result<bool, StoreError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn save_user(&self, user: &User) -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    // Task lists
    async fn lists_for_user(&self, user_id: i64) -> Result<Vec<TaskListWithTasks>, StoreError>;
    async fn find_list(&self, id: i64) -> Result<Option<TaskList>, StoreError>;
    async fn insert_list(&self, user_id: i64, name: &str) -> Result<TaskList, StoreError>;
    async fn save_list(&self, list: &TaskList) -> Result<Option<TaskList>, StoreError>;
    async fn delete_list(&self, id: i64) -> Result<bool, StoreError>;

    // Tasks
    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError>;
    async fn insert_task(&self, list_id: i64, text: &str) -> Result<Task, StoreError>;
    async fn save_task(&self, task: &Task) -> Result<Option<Task>, StoreError>;
    async fn delete_task(&self, id: i64) -> Result<bool, StoreError>;

    // Goals
    async fn goals_for_user(&self, user_id: i64) -> Result<Vec<GoalDetail>, StoreError>;
    async fn find_goal(&self, id: i64) -> Result<Option<Goal>, StoreError>;
    async fn goal_detail(&self, goal: Goal) -> Result<GoalDetail, StoreError>;
    async fn insert_goal(
        &self,
        user_id: i64,
        fields: GoalFields,
        subgoals: Vec<String>,
        habits: Vec<NewHabit>,
    ) -> Result<GoalDetail, StoreError>;
    async fn save_goal(&self, goal: &Goal) -> Result<Option<Goal>, StoreError>;
    async fn delete_goal(&self, id: i64) -> Result<bool, StoreError>;

    // Subgoals
    async fn find_subgoal(&self, id: i64) -> Result<Option<Subgoal>, StoreError>;
    async fn save_subgoal(&self, subgoal: &Subgoal) -> Result<Option<Subgoal>, StoreError>;
}
