#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{Router, middleware};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use heightcert::router::init_router;
use heightcert::state::AppState;
use heightcert_config::{CorsConfig, JwtConfig, RateLimitConfig, StorageConfig};
use heightcert_core::{Role, hash_password};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "testpass123";

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Router plus the temp directory backing its file storage; keep both alive.
pub struct TestApp {
    pub router: Router,
    pub jwt_config: JwtConfig,
    _storage_dir: TempDir,
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 7200,
    }
}

/// All requests share one peer address, so limits are raised out of the way.
pub async fn setup_test_app(pool: PgPool) -> TestApp {
    let rate_limit_config = RateLimitConfig {
        general_burst_size: 10_000,
        auth_burst_size: 10_000,
        ..RateLimitConfig::default()
    };
    setup_test_app_with_rate_limit(pool, rate_limit_config).await
}

pub async fn setup_test_app_with_rate_limit(
    pool: PgPool,
    rate_limit_config: RateLimitConfig,
) -> TestApp {
    let storage_dir = tempfile::tempdir().unwrap();
    let storage_config = StorageConfig {
        base_dir: storage_dir.path().to_path_buf(),
        base_url: "http://localhost:3000/files".to_string(),
        max_file_size: 1024 * 1024,
    };
    let jwt_config = test_jwt_config();

    let state = AppState::new(
        pool,
        jwt_config.clone(),
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit_config,
        storage_config,
    );

    TestApp {
        router: init_router(state).layer(middleware::map_request(with_default_peer)),
        jwt_config,
        _storage_dir: storage_dir,
    }
}

/// Peer address `axum::serve` would attach; tests may insert their own first.
pub const DEFAULT_PEER: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    40000,
);

async fn with_default_peer(mut req: Request<Body>) -> Request<Body> {
    if req.extensions().get::<ConnectInfo<SocketAddr>>().is_none() {
        req.extensions_mut().insert(ConnectInfo(DEFAULT_PEER));
    }
    req
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn unique_code(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..8]).to_uppercase()
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (first_name, last_name, email, password, role)
        VALUES ('Test', 'User', $1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(hashed)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser { id, email, role }
}

pub async fn create_test_collaborator(pool: &PgPool) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO collaborators (document_number, first_name, last_name)
        VALUES ($1, 'Ana', 'Rojas')
        RETURNING id
        "#,
    )
    .bind(unique_code("DOC"))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_course(pool: &PgPool) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO courses (code, name, duration_hours, validity_months)
        VALUES ($1, 'Work at height', 40, 12)
        RETURNING id
        "#,
    )
    .bind(unique_code("TAL"))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_training(
    pool: &PgPool,
    course_id: Uuid,
    start_date: DateTime<Utc>,
    status: &str,
) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO trainings (code, course_id, start_date, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(unique_code("TR"))
    .bind(course_id)
    .bind(start_date)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_enrollment(
    pool: &PgPool,
    training_id: Uuid,
    collaborator_id: Uuid,
    certified: bool,
) -> Uuid {
    let certificate_number = certified.then(|| unique_code("CERT"));

    sqlx::query_scalar(
        r#"
        INSERT INTO enrollments (training_id, collaborator_id, certificate_issued, certificate_number, issued_at)
        VALUES ($1, $2, $3, $4, CASE WHEN $3 THEN NOW() END)
        RETURNING id
        "#,
    )
    .bind(training_id)
    .bind(collaborator_id)
    .bind(certified)
    .bind(certificate_number)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn get_auth_token(app: &Router, email: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "email": email,
                "password": TEST_PASSWORD
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}
