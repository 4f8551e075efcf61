use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskList {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub task_list_id: i64,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A list as returned to clients, tasks ordered oldest first
#[derive(Debug, Clone, Serialize)]
pub struct TaskListWithTasks {
    #[serde(flatten)]
    pub list: TaskList,
    pub tasks: Vec<Task>,
}

impl TaskListWithTasks {
    pub fn empty(list: TaskList) -> Self {
        Self {
            list,
            tasks: Vec::new(),
        }
    }
}
