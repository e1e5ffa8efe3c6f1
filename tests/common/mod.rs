#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_kernel::{settings::Settings, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub media: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

pub async fn spawn_app() -> TestApp {
    let media = tempfile::tempdir().unwrap();

    let mut settings = Settings::default();
    settings.database.url = "sqlite::memory:".to_string();
    settings.database.max_connections = 1;
    settings.media.root = media.path().to_path_buf();

    let (registry, state) = shelf_app::prepare(settings).await.unwrap();
    let router = shelf_http::build_router(&registry, &state);

    TestApp {
        router,
        state,
        media,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, None)).await
    }

    /// Register `username` and return a bearer token for it.
    pub async fn login_as(&self, username: &str) -> String {
        let credentials = json!({ "username": username, "password": "correct horse" });

        let registered = self.post("/api/users/register", None, credentials.clone()).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let login = self.post("/api/users/login", None, credentials).await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);
        login.body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_book(&self, token: &str, title: &str) -> i32 {
        let response = self
            .post(
                "/api/books",
                Some(token),
                json!({ "title": title, "text": "About the book", "category": "business" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap() as i32
    }

    /// PUT `bytes` as a PNG cover for `book_id`.
    pub async fn upload_thumbnail(&self, token: &str, book_id: i32, bytes: &[u8]) -> TestResponse {
        let boundary = "shelf-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/books/{book_id}/thumbnail"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Files currently present in the upload directory.
    pub fn stored_thumbnails(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.media.path().join("thumbnails")) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| format!("thumbnails/{}", entry.unwrap().file_name().to_string_lossy()))
            .collect();
        names.sort();
        names
    }

    pub async fn review(&self, token: &str, book_id: i32, rate: i64) -> TestResponse {
        self.post(
            &format!("/api/reviews/{book_id}"),
            Some(token),
            json!({ "title": "Review", "text": "Thoughts", "rate": rate }),
        )
        .await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
