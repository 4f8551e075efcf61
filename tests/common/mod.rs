#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use accountability_api::config::AppConfig;
use accountability_api::database::MemoryStore;
use accountability_api::{app, AppState};

pub const PASSWORD: &str = "secret1";

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub client: Client,
}

/// Serve the real router on a free port, backed by an empty in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    // Logs only show up for failing tests, filtered by RUST_LOG
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let vars: HashMap<&str, &str> = HashMap::from([
        ("DB_HOST", "localhost"),
        ("DB_PORT", "5432"),
        ("DB_USER", "test"),
        ("DB_PASSWORD", "test"),
        ("DB_NAME", "test"),
        ("SECRET", "integration-test-secret"),
        // Minimum bcrypt cost keeps the suite fast
        ("SECURITY_BCRYPT_COST", "4"),
    ]);
    let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))?;
    let state = AppState::new(config, Arc::new(MemoryStore::new()))?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let server = TestServer {
        base_url,
        state,
        client: Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request carrying a bearer token
    pub fn authed(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(token)
    }

    /// Create `username` with `<username>@example.com` and [`PASSWORD`]; returns the new id
    pub async fn signup(&self, username: &str) -> Result<i64> {
        let res = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
            }))
            .send()
            .await?;
        anyhow::ensure!(
            res.status() == StatusCode::CREATED,
            "signup failed: {}",
            res.status()
        );
        let body: Value = res.json().await?;
        body["data"]["id"].as_i64().context("signup response without id")
    }

    pub async fn login(&self, identity: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "identity": identity, "password": password }))
            .send()
            .await?)
    }

    /// Sign up and log in; returns (user id, token)
    pub async fn user(&self, username: &str) -> Result<(i64, String)> {
        let id = self.signup(username).await?;
        let res = self.login(username, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        let token = body["data"].as_str().context("login response without token")?;
        Ok((id, token.to_string()))
    }

    /// POST a list and return its id
    pub async fn create_list(&self, token: &str, name: &str) -> Result<i64> {
        let body: Value = self
            .authed(Method::POST, "/api/tasklist/", token)
            .json(&json!({ "name": name }))
            .send()
            .await?
            .json()
            .await?;
        body["data"]["id"].as_i64().context("list response without id")
    }

    /// POST a task into `list_id` and return its id
    pub async fn create_task(&self, token: &str, list_id: i64, text: &str) -> Result<i64> {
        let body: Value = self
            .authed(Method::POST, &format!("/api/task/{}", list_id), token)
            .json(&json!({ "text": text }))
            .send()
            .await?
            .json()
            .await?;
        body["data"]["id"].as_i64().context("task response without id")
    }

    /// GET /api/tasklist/ and return `data`
    pub async fn lists(&self, token: &str) -> Result<Value> {
        let body: Value = self
            .authed(Method::GET, "/api/tasklist/", token)
            .send()
            .await?
            .json()
            .await?;
        Ok(body["data"].clone())
    }

    /// GET /api/goal/ and return `data`
    pub async fn goals(&self, token: &str) -> Result<Value> {
        let body: Value = self
            .authed(Method::GET, "/api/goal/", token)
            .send()
            .await?
            .json()
            .await?;
        Ok(body["data"].clone())
    }
}
