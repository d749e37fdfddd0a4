#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tdm_core::imaging::ThumbnailPolicy;
use tdm_core::storage::{MediaSettings, MemoryStorage};
use tdm_db::models::user::{CreateUser, User};
use tdm_db::repositories::UserRepo;
use tdm_db::DbPool;
use tower::ServiceExt;

use tdm_api::auth::jwt::{generate_access_token, JwtConfig};
use tdm_api::auth::password::hash_password;
use tdm_api::config::ServerConfig;
use tdm_api::router::build_app_router;
use tdm_api::state::AppState;

pub const TEST_PASSWORD: &str = "test_password_123!";
pub const MEDIA_URL: &str = "http://media.test/media/";
const BOUNDARY: &str = "tdm-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 5 * 1024 * 1024,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        media: MediaSettings::new("unused-media-root", MEDIA_URL, BTreeMap::new()),
    }
}

/// Everything a test needs: the router plus handles on its pool and storage.
pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub storage: Arc<MemoryStorage>,
    pub config: ServerConfig,
}

impl TestApp {
    /// Fresh in-memory database and storage behind the production middleware stack.
    pub async fn new() -> Self {
        let pool = tdm_db::create_in_memory_pool()
            .await
            .expect("in-memory pool should be created");
        let storage = Arc::new(MemoryStorage::new("default"));
        let config = test_config();

        let state = AppState {
            pool: pool.clone(),
            config: Arc::new(config.clone()),
            storage: storage.clone(),
            thumbnail_policy: ThumbnailPolicy::default(),
        };
        let router = build_app_router(state, &config).expect("router should build");

        Self {
            router,
            pool,
            storage,
            config,
        }
    }

    /// Create an active user directly in the database.
    pub async fn create_user(&self, username: &str) -> User {
        let input = CreateUser {
            username: username.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        };
        UserRepo::create(&self.pool, &input)
            .await
            .expect("user creation should succeed")
    }

    /// Create a user and mint a token for it without going through login.
    pub async fn token(&self) -> String {
        let user = self.create_user("editor").await;
        generate_access_token(user.id, &user.username, &self.config.jwt)
            .expect("token generation should succeed")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }
}

// ---------------------------------------------------------------------------
// Request builders
// ---------------------------------------------------------------------------

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::DELETE).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("valid request")
}

/// Multipart upload with a `file` part and an optional `caption` part.
pub fn upload(
    uri: &str,
    filename: &str,
    data: &[u8],
    caption: Option<&str>,
    token: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(caption) = caption {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\n{caption}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).expect("valid request")
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A small PNG with some structure so it survives resizing.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encoding should succeed");
    out.into_inner()
}
