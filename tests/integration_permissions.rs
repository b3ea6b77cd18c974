mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{
    body_json, create_test_user, get_auth_token, get_request, json_request, setup_test_app,
    test_jwt_config, unique_code,
};
use heightcert_auth::Claims;
use heightcert_core::Role;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

fn token_with_role(user_id: Uuid, email: &str, role: &str) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: now + 600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(test_jwt_config().secret.as_bytes()),
    )
    .unwrap()
}

fn new_collaborator() -> serde_json::Value {
    json!({
        "document_number": unique_code("DOC"),
        "first_name": "Luis",
        "last_name": "Paredes"
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_viewer_can_read_but_not_write(pool: PgPool) {
    let viewer = create_test_user(&pool, Role::Viewer).await;
    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &viewer.email).await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/collaborators", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(json_request("POST", "/api/collaborators", &token, new_collaborator()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_coordinator_manages_collaborators_not_courses(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/collaborators", &token, new_collaborator()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let course = json!({
        "code": "TAL-01",
        "name": "Work at height",
        "duration_hours": 40,
        "validity_months": 12
    });
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/courses", &token, course))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let coach = json!({ "first_name": "Marta", "last_name": "Soto" });
    let response = app
        .router
        .oneshot(json_request("POST", "/api/coaches", &token, coach))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_user_management_is_admin_only(pool: PgPool) {
    let admin = create_test_user(&pool, Role::Admin).await;
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let app = setup_test_app(pool).await;

    let coordinator_token = get_auth_token(&app.router, &coordinator.email).await;
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/users", &coordinator_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Access denied. Requires ADMIN role");

    let admin_token = get_auth_token(&app.router, &admin.email).await;
    let response = app
        .router
        .oneshot(get_request("/api/users", &admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_changes_role(pool: PgPool) {
    let admin = create_test_user(&pool, Role::Admin).await;
    let viewer = create_test_user(&pool, Role::Viewer).await;
    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &admin.email).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/users/{}/role", viewer.id),
            &token,
            json!({ "role": "COORDINATOR" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "COORDINATOR");

    let response = app
        .router
        .oneshot(json_request(
            "PATCH",
            &format!("/api/users/{}/role", admin.id),
            &token,
            json!({ "role": "VIEWER" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_role_is_denied_everywhere(pool: PgPool) {
    let user = create_test_user(&pool, Role::Viewer).await;
    let app = setup_test_app(pool).await;
    let token = token_with_role(user.id, &user.email, "SUPERVISOR");

    for uri in ["/api/trainings", "/api/dashboard", "/api/collaborators"] {
        let response = app
            .router
            .clone()
            .oneshot(get_request(uri, &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let response = app
        .router
        .oneshot(get_request("/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["role"].is_null());
    assert_eq!(body["permissions"], json!([]));
    assert_eq!(body["can_view"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lowercase_role_claim_is_not_recognised(pool: PgPool) {
    let user = create_test_user(&pool, Role::Admin).await;
    let app = setup_test_app(pool).await;
    let token = token_with_role(user.id, &user.email, "admin");

    let response = app
        .router
        .oneshot(get_request("/api/users", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
