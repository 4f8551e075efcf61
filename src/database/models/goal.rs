use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub description: String,
    pub what: String,
    pub how_much: String,
    pub resources: String,
    pub alignment: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subgoal {
    pub id: i64,
    pub goal_id: i64,
    pub name: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: i64,
    pub goal_id: i64,
    pub name: String,
    pub frequency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Writable goal fields shared by create and replace
#[derive(Debug, Clone)]
pub struct GoalFields {
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub description: String,
    pub what: String,
    pub how_much: String,
    pub resources: String,
    pub alignment: String,
}

#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub frequency: String,
}

/// A goal with its children, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct GoalDetail {
    #[serde(flatten)]
    pub goal: Goal,
    pub subgoals: Vec<Subgoal>,
    pub habits: Vec<Habit>,
    pub subgoal_progress: BTreeMap<String, bool>,
}

impl GoalDetail {
    pub fn new(goal: Goal, subgoals: Vec<Subgoal>, habits: Vec<Habit>) -> Self {
        let subgoal_progress = subgoals
            .iter()
            .map(|s| (s.name.clone(), s.completed))
            .collect();
        Self {
            goal,
            subgoals,
            habits,
            subgoal_progress,
        }
    }
}
