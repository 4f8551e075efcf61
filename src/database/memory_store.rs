//! In-process store with the same soft-delete and uniqueness rules as the
//! PostgreSQL schema. Backs the integration tests and local experiments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::models::{
    Goal, GoalDetail, GoalFields, Habit, NewHabit, NewUser, Subgoal, Task, TaskList,
    TaskListWithTasks, User,
};
use crate::database::store::{Store, StoreError};

#[derive(Default)]
struct Tables {
    sequence: i64,
    users: BTreeMap<i64, User>,
    lists: BTreeMap<i64, TaskList>,
    tasks: BTreeMap<i64, Task>,
    goals: BTreeMap<i64, Goal>,
    subgoals: BTreeMap<i64, Subgoal>,
    habits: BTreeMap<i64, Habit>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn conflicts(&self, username: &str, email: &str, exclude: Option<i64>) -> bool {
        self.users
            .values()
            .filter(|u| Some(u.id) != exclude)
            .any(|u| u.username == username || u.email == email)
    }

    fn detail(&self, goal: Goal) -> GoalDetail {
        let subgoals = self
            .subgoals
            .values()
            .filter(|s| s.goal_id == goal.id && s.deleted_at.is_none())
            .cloned()
            .collect();
        let habits = self
            .habits
            .values()
            .filter(|h| h.goal_id == goal.id && h.deleted_at.is_none())
            .cloned()
            .collect();
        GoalDetail::new(goal, subgoals, habits)
    }
}

/// Live row lookup shared by every table
fn live<T: Clone>(
    table: &BTreeMap<i64, T>,
    id: i64,
    deleted: impl Fn(&T) -> bool,
) -> Option<T> {
    table.get(&id).filter(|row| !deleted(row)).cloned()
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(live(&tables.users, id, |u| u.deleted_at.is_some()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username && u.deleted_at.is_none())
            .cloned())
    }

    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        exclude: Option<i64>,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.conflicts(username, email, exclude))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.conflicts(&user.username, &user.email, None) {
            return Err(StoreError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let row = User {
            id: tables.next_id(),
            name: user.name,
            username: user.username,
            email: user.email,
            password: user.password,
            occupation: user.occupation,
            about: user.about,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.conflicts(&user.username, &user.email, Some(user.id)) {
            return Err(StoreError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
        let Some(row) = tables
            .users
            .get_mut(&user.id)
            .filter(|u| u.deleted_at.is_none())
        else {
            return Ok(None);
        };
        row.name = user.name.clone();
        row.username = user.username.clone();
        row.email = user.email.clone();
        row.password = user.password.clone();
        row.occupation = user.occupation.clone();
        row.about = user.about.clone();
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.users.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }

    async fn lists_for_user(&self, user_id: i64) -> Result<Vec<TaskListWithTasks>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .lists
            .values()
            .filter(|l| l.user_id == user_id && l.deleted_at.is_none())
            .map(|list| {
                let tasks = tables
                    .tasks
                    .values()
                    .filter(|t| t.task_list_id == list.id && t.deleted_at.is_none())
                    .cloned()
                    .collect();
                TaskListWithTasks {
                    list: list.clone(),
                    tasks,
                }
            })
            .collect())
    }

    async fn find_list(&self, id: i64) -> Result<Option<TaskList>, StoreError> {
        let tables = self.tables.read().await;
        Ok(live(&tables.lists, id, |l| l.deleted_at.is_some()))
    }

    async fn insert_list(&self, user_id: i64, name: &str) -> Result<TaskList, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = TaskList {
            id: tables.next_id(),
            user_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.lists.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_list(&self, list: &TaskList) -> Result<Option<TaskList>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.lists.get_mut(&list.id) {
            Some(row) if row.deleted_at.is_none() => {
                row.name = list.name.clone();
                row.updated_at = Utc::now();
                Some(row.clone())
            }
            _ => None,
        })
    }

    async fn delete_list(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.lists.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(live(&tables.tasks, id, |t| t.deleted_at.is_some()))
    }

    async fn insert_task(&self, list_id: i64, text: &str) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Task {
            id: tables.next_id(),
            task_list_id: list_id,
            text: text.to_string(),
            completed: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.tasks.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.tasks.get_mut(&task.id) {
            Some(row) if row.deleted_at.is_none() => {
                row.text = task.text.clone();
                row.completed = task.completed;
                row.updated_at = Utc::now();
                Some(row.clone())
            }
            _ => None,
        })
    }

    async fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.tasks.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }

    async fn goals_for_user(&self, user_id: i64) -> Result<Vec<GoalDetail>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .goals
            .values()
            .filter(|g| g.user_id == user_id && g.deleted_at.is_none())
            .map(|goal| tables.detail(goal.clone()))
            .collect())
    }

    async fn find_goal(&self, id: i64) -> Result<Option<Goal>, StoreError> {
        let tables = self.tables.read().await;
        Ok(live(&tables.goals, id, |g| g.deleted_at.is_some()))
    }

    async fn goal_detail(&self, goal: Goal) -> Result<GoalDetail, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.detail(goal))
    }

    async fn insert_goal(
        &self,
        user_id: i64,
        fields: GoalFields,
        subgoals: Vec<String>,
        habits: Vec<NewHabit>,
    ) -> Result<GoalDetail, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let goal = Goal {
            id: tables.next_id(),
            user_id,
            name: fields.name,
            deadline: fields.deadline,
            description: fields.description,
            what: fields.what,
            how_much: fields.how_much,
            resources: fields.resources,
            alignment: fields.alignment,
            completed: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.goals.insert(goal.id, goal.clone());

        for name in subgoals {
            let row = Subgoal {
                id: tables.next_id(),
                goal_id: goal.id,
                name,
                completed: false,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            tables.subgoals.insert(row.id, row);
        }
        for habit in habits {
            let row = Habit {
                id: tables.next_id(),
                goal_id: goal.id,
                name: habit.name,
                frequency: habit.frequency,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            tables.habits.insert(row.id, row);
        }

        Ok(tables.detail(goal))
    }

    async fn save_goal(&self, goal: &Goal) -> Result<Option<Goal>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.goals.get_mut(&goal.id) {
            Some(row) if row.deleted_at.is_none() => {
                row.name = goal.name.clone();
                row.deadline = goal.deadline;
                row.description = goal.description.clone();
                row.what = goal.what.clone();
                row.how_much = goal.how_much.clone();
                row.resources = goal.resources.clone();
                row.alignment = goal.alignment.clone();
                row.completed = goal.completed;
                row.updated_at = Utc::now();
                Some(row.clone())
            }
            _ => None,
        })
    }

    async fn delete_goal(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.goals.get_mut(&id) {
            Some(row) if row.deleted_at.is_none() => {
                row.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }

    async fn find_subgoal(&self, id: i64) -> Result<Option<Subgoal>, StoreError> {
        let tables = self.tables.read().await;
        Ok(live(&tables.subgoals, id, |s| s.deleted_at.is_some()))
    }

    async fn save_subgoal(&self, subgoal: &Subgoal) -> Result<Option<Subgoal>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.subgoals.get_mut(&subgoal.id) {
            Some(row) if row.deleted_at.is_none() => {
                row.name = subgoal.name.clone();
                row.completed = subgoal.completed;
                row.updated_at = Utc::now();
                Some(row.clone())
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            name: username.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            occupation: String::new(),
            about: String::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_identity_conflicts_even_after_delete() {
        let store = MemoryStore::new();
        let ada = store.insert_user(new_user("ada", "ada@example.com")).await.unwrap();
        assert!(matches!(
            store.insert_user(new_user("ada", "other@example.com")).await,
            Err(StoreError::Conflict(_))
        ));

        assert!(store.delete_user(ada.id).await.unwrap());
        assert!(store.find_user(ada.id).await.unwrap().is_none());
        assert!(store
            .identity_taken("x", "ada@example.com", None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn deleted_list_hides_its_tasks() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("bob", "bob@example.com")).await.unwrap();
        let list = store.insert_list(user.id, "Chores").await.unwrap();
        store.insert_task(list.id, "Dishes").await.unwrap();

        let lists = store.lists_for_user(user.id).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].tasks.len(), 1);

        assert!(store.delete_list(list.id).await.unwrap());
        assert!(!store.delete_list(list.id).await.unwrap());
        assert!(store.lists_for_user(user.id).await.unwrap().is_empty());
        assert!(store.save_list(&list).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn goal_children_are_created_with_goal() {
        let store = MemoryStore::new();
        let fields = GoalFields {
            name: "Marathon".to_string(),
            deadline: Utc::now(),
            description: String::new(),
            what: String::new(),
            how_much: String::new(),
            resources: String::new(),
            alignment: String::new(),
        };
        let detail = store
            .insert_goal(
                1,
                fields,
                vec!["5k".to_string(), "half".to_string()],
                vec![NewHabit {
                    name: "Run".to_string(),
                    frequency: "daily".to_string(),
                }],
            )
            .await
            .unwrap();
        assert_eq!(detail.subgoals.len(), 2);
        assert_eq!(detail.habits.len(), 1);
        assert_eq!(detail.subgoal_progress.get("5k"), Some(&false));

        let goals = store.goals_for_user(1).await.unwrap();
        assert_eq!(goals.len(), 1);
        assert!(store.goals_for_user(2).await.unwrap().is_empty());
    }
}
