use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{
    Goal, GoalDetail, GoalFields, Habit, NewHabit, NewUser, Subgoal, Task, TaskList,
    TaskListWithTasks, User,
};
use crate::database::store::{Store, StoreError};

const USER_COLUMNS: &str =
    "id, name, username, email, password, occupation, about, created_at, updated_at, deleted_at";
const LIST_COLUMNS: &str = "id, user_id, name, created_at, updated_at, deleted_at";
const TASK_COLUMNS: &str =
    "id, task_list_id, text, completed, created_at, updated_at, deleted_at";
const GOAL_COLUMNS: &str = "id, user_id, name, deadline, description, what, how_much, resources, \
     alignment, completed, created_at, updated_at, deleted_at";
const SUBGOAL_COLUMNS: &str = "id, goal_id, name, completed, created_at, updated_at, deleted_at";
const HABIT_COLUMNS: &str = "id, goal_id, name, frequency, created_at, updated_at, deleted_at";

/// PostgreSQL-backed store over a shared pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn soft_delete(&self, table: &'static str, id: i64) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE {} SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
            table
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn children_of(
        &self,
        goal_ids: &[i64],
    ) -> Result<(Vec<Subgoal>, Vec<Habit>), StoreError> {
        if goal_ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let subgoals = sqlx::query_as::<_, Subgoal>(&format!(
            "SELECT {} FROM subgoals WHERE goal_id = ANY($1) AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC",
            SUBGOAL_COLUMNS
        ))
        .bind(goal_ids)
        .fetch_all(&self.pool)
        .await?;

        let habits = sqlx::query_as::<_, Habit>(&format!(
            "SELECT {} FROM habits WHERE goal_id = ANY($1) AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC",
            HABIT_COLUMNS
        ))
        .bind(goal_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok((subgoals, habits))
    }
}

/// Map unique-constraint violations to `StoreError::Conflict`
fn unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict("Username or email already exists".to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        exclude: Option<i64>,
    ) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM users
                 WHERE (username = $1 OR email = $2)
                 AND ($3::BIGINT IS NULL OR id <> $3)
             )",
        )
        .bind(username)
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, username, email, password, occupation, about)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.occupation)
        .bind(&user.about)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation)
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = $2, username = $3, email = $4, password = $5,
                 occupation = $6, about = $7, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.occupation)
        .bind(&user.about)
        .fetch_optional(&self.pool)
        .await
        .map_err(unique_violation)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        self.soft_delete("users", id).await
    }

    async fn lists_for_user(&self, user_id: i64) -> Result<Vec<TaskListWithTasks>, StoreError> {
        let lists = sqlx::query_as::<_, TaskList>(&format!(
            "SELECT {} FROM task_lists WHERE user_id = $1 AND deleted_at IS NULL ORDER BY id ASC",
            LIST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if lists.is_empty() {
            return Ok(Vec::new());
        }

        let list_ids: Vec<i64> = lists.iter().map(|l| l.id).collect();
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE task_list_id = ANY($1) AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC",
            TASK_COLUMNS
        ))
        .bind(&list_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_list: HashMap<i64, Vec<Task>> = HashMap::new();
        for task in tasks {
            by_list.entry(task.task_list_id).or_default().push(task);
        }

        Ok(lists
            .into_iter()
            .map(|list| {
                let tasks = by_list.remove(&list.id).unwrap_or_default();
                TaskListWithTasks { list, tasks }
            })
            .collect())
    }

    async fn find_list(&self, id: i64) -> Result<Option<TaskList>, StoreError> {
        let list = sqlx::query_as::<_, TaskList>(&format!(
            "SELECT {} FROM task_lists WHERE id = $1 AND deleted_at IS NULL",
            LIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    async fn insert_list(&self, user_id: i64, name: &str) -> Result<TaskList, StoreError> {
        let list = sqlx::query_as::<_, TaskList>(&format!(
            "INSERT INTO task_lists (user_id, name) VALUES ($1, $2) RETURNING {}",
            LIST_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    async fn save_list(&self, list: &TaskList) -> Result<Option<TaskList>, StoreError> {
        let saved = sqlx::query_as::<_, TaskList>(&format!(
            "UPDATE task_lists SET name = $2, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            LIST_COLUMNS
        ))
        .bind(list.id)
        .bind(&list.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_list(&self, id: i64) -> Result<bool, StoreError> {
        self.soft_delete("task_lists", id).await
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn insert_task(&self, list_id: i64, text: &str) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (task_list_id, text) VALUES ($1, $2) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(list_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn save_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let saved = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET text = $2, completed = $3, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(&task.text)
        .bind(task.completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        self.soft_delete("tasks", id).await
    }

    async fn goals_for_user(&self, user_id: i64) -> Result<Vec<GoalDetail>, StoreError> {
        let goals = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {} FROM goals WHERE user_id = $1 AND deleted_at IS NULL ORDER BY id ASC",
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let goal_ids: Vec<i64> = goals.iter().map(|g| g.id).collect();
        let (subgoals, habits) = self.children_of(&goal_ids).await?;

        let mut subgoals_by_goal: HashMap<i64, Vec<Subgoal>> = HashMap::new();
        for subgoal in subgoals {
            subgoals_by_goal.entry(subgoal.goal_id).or_default().push(subgoal);
        }
        let mut habits_by_goal: HashMap<i64, Vec<Habit>> = HashMap::new();
        for habit in habits {
            habits_by_goal.entry(habit.goal_id).or_default().push(habit);
        }

        Ok(goals
            .into_iter()
            .map(|goal| {
                let subgoals = subgoals_by_goal.remove(&goal.id).unwrap_or_default();
                let habits = habits_by_goal.remove(&goal.id).unwrap_or_default();
                GoalDetail::new(goal, subgoals, habits)
            })
            .collect())
    }

    async fn find_goal(&self, id: i64) -> Result<Option<Goal>, StoreError> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {} FROM goals WHERE id = $1 AND deleted_at IS NULL",
            GOAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(goal)
    }

    async fn goal_detail(&self, goal: Goal) -> Result<GoalDetail, StoreError> {
        let (subgoals, habits) = self.children_of(&[goal.id]).await?;
        Ok(GoalDetail::new(goal, subgoals, habits))
    }

    async fn insert_goal(
        &self,
        user_id: i64,
        fields: GoalFields,
        subgoals: Vec<String>,
        habits: Vec<NewHabit>,
    ) -> Result<GoalDetail, StoreError> {
        // Goal and children land together or not at all
        let mut tx = self.pool.begin().await?;

        let goal = sqlx::query_as::<_, Goal>(&format!(
            "INSERT INTO goals (user_id, name, deadline, description, what, how_much, resources, alignment)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .bind(&fields.name)
        .bind(fields.deadline)
        .bind(&fields.description)
        .bind(&fields.what)
        .bind(&fields.how_much)
        .bind(&fields.resources)
        .bind(&fields.alignment)
        .fetch_one(&mut *tx)
        .await?;

        let mut created_subgoals = Vec::with_capacity(subgoals.len());
        for name in &subgoals {
            let subgoal = sqlx::query_as::<_, Subgoal>(&format!(
                "INSERT INTO subgoals (goal_id, name) VALUES ($1, $2) RETURNING {}",
                SUBGOAL_COLUMNS
            ))
            .bind(goal.id)
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;
            created_subgoals.push(subgoal);
        }

        let mut created_habits = Vec::with_capacity(habits.len());
        for habit in &habits {
            let habit = sqlx::query_as::<_, Habit>(&format!(
                "INSERT INTO habits (goal_id, name, frequency) VALUES ($1, $2, $3) RETURNING {}",
                HABIT_COLUMNS
            ))
            .bind(goal.id)
            .bind(&habit.name)
            .bind(&habit.frequency)
            .fetch_one(&mut *tx)
            .await?;
            created_habits.push(habit);
        }

        tx.commit().await?;
        Ok(GoalDetail::new(goal, created_subgoals, created_habits))
    }

    async fn save_goal(&self, goal: &Goal) -> Result<Option<Goal>, StoreError> {
        let saved = sqlx::query_as::<_, Goal>(&format!(
            "UPDATE goals
             SET name = $2, deadline = $3, description = $4, what = $5, how_much = $6,
                 resources = $7, alignment = $8, completed = $9, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            GOAL_COLUMNS
        ))
        .bind(goal.id)
        .bind(&goal.name)
        .bind(goal.deadline)
        .bind(&goal.description)
        .bind(&goal.what)
        .bind(&goal.how_much)
        .bind(&goal.resources)
        .bind(&goal.alignment)
        .bind(goal.completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_goal(&self, id: i64) -> Result<bool, StoreError> {
        self.soft_delete("goals", id).await
    }

    async fn find_subgoal(&self, id: i64) -> Result<Option<Subgoal>, StoreError> {
        let subgoal = sqlx::query_as::<_, Subgoal>(&format!(
            "SELECT {} FROM subgoals WHERE id = $1 AND deleted_at IS NULL",
            SUBGOAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subgoal)
    }

    async fn save_subgoal(&self, subgoal: &Subgoal) -> Result<Option<Subgoal>, StoreError> {
        let saved = sqlx::query_as::<_, Subgoal>(&format!(
            "UPDATE subgoals SET name = $2, completed = $3, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            SUBGOAL_COLUMNS
        ))
        .bind(subgoal.id)
        .bind(&subgoal.name)
        .bind(subgoal.completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }
}
