use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use category_ledger::{
    AppState,
    client::{AuthApiClient, CategoryApiClient, Credentials, HttpClient},
    config::Config,
    database, router,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

pub const TEST_PASSWORD: &str = "password123";

#[derive(Clone)]
pub struct TestConfig {
    pub temp_dir_path: String,
}

impl TestConfig {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let temp_dir_path = temp_dir.path().to_string_lossy().to_string();
        std::mem::forget(temp_dir);
        Ok(Self { temp_dir_path })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let test_config = TestConfig::new()?;

    let db = database::init_db(&test_config.temp_dir_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))?;

    let state = AppState { db };
    Ok(TestApp {
        router: router(state.clone()),
        state,
    })
}

fn parse_body_as_json_or_string(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8(bytes.to_vec()).expect("utf8 body")),
    }
}

/// Sends a request through the router; `token` becomes a bearer header.
#[allow(dead_code)]
pub async fn json_request(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = payload
        .map(|p| Body::from(p.to_string()))
        .unwrap_or_else(Body::empty);
    let request = builder.body(body).expect("build request");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("execute request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    (status, parse_body_as_json_or_string(&bytes))
}

/// Registers `username` and returns a bearer token for it.
#[allow(dead_code)]
pub async fn register_and_login(app: &TestApp, username: &str) -> anyhow::Result<String> {
    let credentials = json!({ "username": username, "password": TEST_PASSWORD });

    let (status, body) =
        json_request(app, "POST", "/auth/register", None, Some(credentials.clone())).await;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {status} {body}");

    let (status, body) = json_request(app, "POST", "/auth/login", None, Some(credentials)).await;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {status} {body}");

    body["token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No token in login response"))
}

/// Creates a category through the router and returns (status, body).
#[allow(dead_code)]
pub async fn create_category(
    app: &TestApp,
    token: &str,
    name: &str,
    category_type: &str,
    parent_id: Option<i64>,
) -> (StatusCode, Value) {
    let mut payload = json!({ "name": name, "type": category_type });
    if let Some(parent_id) = parent_id {
        payload["parent_id"] = json!(parent_id);
    }
    json_request(app, "POST", "/categories/", Some(token), Some(payload)).await
}

/// Like [`create_category`] but asserts success and returns the new id.
#[allow(dead_code)]
pub async fn create_category_id(
    app: &TestApp,
    token: &str,
    name: &str,
    parent_id: Option<i64>,
) -> i64 {
    let (status, body) = create_category(app, token, name, "EXPENSE", parent_id).await;
    assert_eq!(status, StatusCode::CREATED, "create {name}: {body}");
    body["id"].as_i64().expect("category id")
}

/// Serves the router on an ephemeral local port and returns its base URL.
#[allow(dead_code)]
pub async fn spawn_server(app: &TestApp) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = app.router.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{}", addr))
}

/// Client configuration pointing the category service at `base_url`.
#[allow(dead_code)]
pub fn client_config(base_url: &str) -> Config {
    let base_url = base_url.to_string();
    Config::from_lookup(move |key| match key {
        "CATEGORY_SERVICE_URL" => Some(base_url.clone()),
        "REQUEST_TIMEOUT_SECS" => Some("10".to_string()),
        _ => None,
    })
    .expect("client config")
}

#[allow(dead_code)]
pub fn http_client(base_url: &str, credentials: &Credentials) -> HttpClient {
    HttpClient::for_categories(&client_config(base_url), Arc::new(credentials.clone()))
        .expect("build http client")
}

/// Registers and logs in over HTTP, returning a category client bound to that session.
#[allow(dead_code)]
pub async fn logged_in_client(
    base_url: &str,
    username: &str,
) -> anyhow::Result<(CategoryApiClient, Credentials)> {
    let credentials = Credentials::anonymous();
    let auth = AuthApiClient::new(http_client(base_url, &credentials));
    auth.register(username, TEST_PASSWORD).await?;
    let login = auth.login(username, TEST_PASSWORD).await?;
    credentials.set(login.token);

    Ok((
        CategoryApiClient::new(http_client(base_url, &credentials)),
        credentials,
    ))
}
