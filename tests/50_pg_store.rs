//! Runs the PostgreSQL store against a live database named by `DATABASE_URL`.
//!
//! Ignored by default: `DATABASE_URL=postgres://... cargo test -- --ignored`

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use accountability_api::database::models::{GoalFields, NewHabit, NewUser};
use accountability_api::database::{schema, PgStore, Store, StoreError};

async fn store() -> Result<PgStore> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&url).await?;
    schema::migrate(&pool).await?;
    Ok(PgStore::new(pool))
}

/// Unique per run so repeated runs against the same database do not collide
fn new_user(tag: &str) -> NewUser {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let username = format!("{}-{}", tag, &suffix[..12]);
    NewUser {
        name: tag.to_string(),
        email: format!("{}@example.com", username),
        username,
        password: "not-a-real-hash".to_string(),
        occupation: String::new(),
        about: String::new(),
    }
}

fn fields(name: &str) -> GoalFields {
    GoalFields {
        name: name.to_string(),
        deadline: Utc::now() + Duration::days(30),
        description: String::new(),
        what: String::new(),
        how_much: String::new(),
        resources: String::new(),
        alignment: String::new(),
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn duplicate_username_is_conflict() -> Result<()> {
    let store = store().await?;
    let user = new_user("dup");
    store.insert_user(user.clone()).await?;

    let mut again = new_user("dup");
    again.username = user.username.clone();
    match store.insert_user(again).await {
        Err(StoreError::Conflict(_)) => {}
        other => anyhow::bail!("expected conflict, got {:?}", other.map(|u| u.id)),
    }

    assert!(store.identity_taken(&user.username, "nobody@example.com", None).await?);
    Ok(())
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn goal_insert_is_all_or_nothing() -> Result<()> {
    let store = store().await?;
    let user = store.insert_user(new_user("goals")).await?;

    let detail = store
        .insert_goal(
            user.id,
            fields("Marathon"),
            vec!["5k".to_string(), "half".to_string()],
            vec![NewHabit {
                name: "Run".to_string(),
                frequency: "daily".to_string(),
            }],
        )
        .await?;
    assert_eq!(detail.goal.user_id, user.id);
    assert_eq!(detail.subgoals.len(), 2);
    assert_eq!(detail.habits.len(), 1);

    // VARCHAR(255) rejects the second subgoal, so nothing from this call lands
    let failed = store
        .insert_goal(
            user.id,
            fields("Swim"),
            vec!["ok".to_string(), "x".repeat(300)],
            Vec::new(),
        )
        .await;
    assert!(matches!(failed, Err(StoreError::Database(_))));

    let goals = store.goals_for_user(user.id).await?;
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].goal.name, "Marathon");
    Ok(())
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn soft_deleted_rows_are_hidden() -> Result<()> {
    let store = store().await?;
    let user = store.insert_user(new_user("soft")).await?;
    let list = store.insert_list(user.id, "Chores").await?;
    let task = store.insert_task(list.id, "Dishes").await?;

    let mut toggled = task.clone();
    toggled.completed = true;
    let saved = store.save_task(&toggled).await?.context("task vanished")?;
    assert!(saved.completed);

    assert!(store.delete_task(task.id).await?);
    assert!(store.find_task(task.id).await?.is_none());
    assert!(!store.delete_task(task.id).await?);

    assert!(store.delete_user(user.id).await?);
    assert!(store.find_user(user.id).await?.is_none());
    // Reserved even after deletion
    assert!(store.identity_taken(&user.username, &user.email, None).await?);
    Ok(())
}
