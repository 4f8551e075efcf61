mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn lists_include_tasks_in_creation_order() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;

    let list = server.create_list(&token, "Chores").await?;
    server.create_task(&token, list, "Dishes").await?;
    server.create_task(&token, list, "Laundry").await?;

    let lists = server.lists(&token).await?;
    assert_eq!(lists.as_array().unwrap().len(), 1);
    assert_eq!(lists[0]["name"], "Chores");
    assert_eq!(lists[0]["tasks"][0]["text"], "Dishes");
    assert_eq!(lists[0]["tasks"][1]["text"], "Laundry");
    assert_eq!(lists[0]["tasks"][0]["completed"], false);
    Ok(())
}

#[tokio::test]
async fn bare_path_matches_trailing_slash() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;

    let res = server
        .authed(Method::POST, "/api/tasklist", &token)
        .json(&json!({ "name": "Errands" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server.authed(Method::GET, "/api/tasklist", &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"][0]["name"], "Errands");
    Ok(())
}

#[tokio::test]
async fn lists_are_private_to_owner() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, ada) = server.user("ada").await?;
    let (_, bob) = server.user("bob").await?;

    server.create_list(&ada, "Chores").await?;
    assert_eq!(server.lists(&bob).await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn rename_list() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;
    let list = server.create_list(&token, "Chores").await?;

    let res = server
        .authed(Method::PATCH, &format!("/api/tasklist/{}", list), &token)
        .json(&json!({ "name": "House" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.lists(&token).await?[0]["name"], "House");

    let res = server
        .authed(Method::PATCH, &format!("/api/tasklist/{}", list), &token)
        .json(&json!({ "name": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn other_user_cannot_touch_list() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, ada) = server.user("ada").await?;
    let (_, bob) = server.user("bob").await?;
    let list = server.create_list(&ada, "Chores").await?;
    let task = server.create_task(&ada, list, "Dishes").await?;
    let path = format!("/api/tasklist/{}", list);

    let res = server
        .authed(Method::PATCH, &path, &bob)
        .json(&json!({ "name": "Mine now" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.authed(Method::DELETE, &path, &bob).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .authed(Method::POST, &format!("/api/task/{}", list), &bob)
        .json(&json!({ "text": "Sneaky" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .authed(Method::PATCH, &format!("/api/task/{}/toggle", task), &bob)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let lists = server.lists(&ada).await?;
    assert_eq!(lists[0]["name"], "Chores");
    assert_eq!(lists[0]["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(lists[0]["tasks"][0]["completed"], false);
    Ok(())
}

#[tokio::test]
async fn toggling_twice_restores_task() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;
    let list = server.create_list(&token, "Chores").await?;
    let task = server.create_task(&token, list, "Dishes").await?;
    let path = format!("/api/task/{}/toggle", task);

    let first: Value = server
        .authed(Method::PATCH, &path, &token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(first["data"]["completed"], true);

    let second: Value = server
        .authed(Method::PATCH, &path, &token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(second["data"]["completed"], false);
    Ok(())
}

#[tokio::test]
async fn edit_and_delete_task() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;
    let list = server.create_list(&token, "Chores").await?;
    let task = server.create_task(&token, list, "Dishes").await?;
    let path = format!("/api/task/{}", task);

    let res = server
        .authed(Method::PATCH, &path, &token)
        .json(&json!({ "text": "Wash dishes" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.lists(&token).await?[0]["tasks"][0]["text"], "Wash dishes");

    let res = server.authed(Method::DELETE, &path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.lists(&token).await?[0]["tasks"], json!([]));

    let res = server.authed(Method::DELETE, &path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleted_list_disappears_with_its_tasks() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;
    let list = server.create_list(&token, "Chores").await?;
    let task = server.create_task(&token, list, "Dishes").await?;

    let res = server
        .authed(Method::DELETE, &format!("/api/tasklist/{}", list), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.lists(&token).await?, json!([]));

    let res = server
        .authed(Method::PATCH, &format!("/api/task/{}/toggle", task), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("ada").await?;

    let res = server
        .authed(Method::DELETE, "/api/tasklist/abc", &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Invalid task list ID format");

    let res = server
        .authed(Method::PATCH, "/api/task/-1/toggle", &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
