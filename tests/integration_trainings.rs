mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    body_json, create_test_collaborator, create_test_course, create_test_enrollment,
    create_test_training, create_test_user, get_auth_token, get_request, json_request,
    setup_test_app,
};
use heightcert_core::Role;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn status_request(training_id: uuid::Uuid, token: &str, status: &str) -> axum::http::Request<axum::body::Body> {
    json_request(
        "PATCH",
        &format!("/api/trainings/{}/status", training_id),
        token,
        json!({ "status": status, "reason": "integration test" }),
    )
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_refused_once_certificate_issued(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let course_id = create_test_course(&pool).await;
    let training_id =
        create_test_training(&pool, course_id, Utc::now() - Duration::days(3), "ACTIVE").await;
    let collaborator_id = create_test_collaborator(&pool).await;
    create_test_enrollment(&pool, training_id, collaborator_id, true).await;

    let app = setup_test_app(pool.clone()).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .oneshot(status_request(training_id, &token, "CANCELLED"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "cannot cancel: certificates already issued");

    let status: String = sqlx::query_scalar("SELECT status FROM trainings WHERE id = $1")
        .bind(training_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "ACTIVE");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_allowed_without_certificates(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let course_id = create_test_course(&pool).await;
    let training_id =
        create_test_training(&pool, course_id, Utc::now() - Duration::days(3), "ACTIVE").await;
    let collaborator_id = create_test_collaborator(&pool).await;
    create_test_enrollment(&pool, training_id, collaborator_id, false).await;

    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .oneshot(status_request(training_id, &token, "CANCELLED"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(body["status_reason"], "integration test");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_complete_refused_before_start(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let course_id = create_test_course(&pool).await;
    let training_id =
        create_test_training(&pool, course_id, Utc::now() + Duration::days(10), "PLANNED").await;

    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .oneshot(status_request(training_id, &token, "COMPLETED"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "cannot complete before start date");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_complete_after_start(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let course_id = create_test_course(&pool).await;
    let training_id =
        create_test_training(&pool, course_id, Utc::now() - Duration::days(1), "ACTIVE").await;

    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .oneshot(status_request(training_id, &token, "COMPLETED"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "COMPLETED");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_viewer_cannot_change_status(pool: PgPool) {
    let viewer = create_test_user(&pool, Role::Viewer).await;
    let course_id = create_test_course(&pool).await;
    let training_id =
        create_test_training(&pool, course_id, Utc::now() - Duration::days(1), "ACTIVE").await;

    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &viewer.email).await;

    let response = app
        .router
        .oneshot(status_request(training_id, &token, "COMPLETED"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_status_value(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let course_id = create_test_course(&pool).await;
    let training_id = create_test_training(&pool, course_id, Utc::now(), "PLANNED").await;

    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .oneshot(status_request(training_id, &token, "ARCHIVED"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_of_missing_training(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let response = app
        .router
        .oneshot(status_request(uuid::Uuid::new_v4(), &token, "ACTIVE"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_then_update_keeps_status(pool: PgPool) {
    let coordinator = create_test_user(&pool, Role::Coordinator).await;
    let course_id = create_test_course(&pool).await;
    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &coordinator.email).await;

    let start = Utc::now() + Duration::days(7);
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trainings",
            &token,
            json!({
                "code": "TR-2024-001",
                "course_id": course_id,
                "location": "Plant 2",
                "start_date": start,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "PLANNED");
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/trainings/{}", id),
            &token,
            json!({ "location": "Plant 3", "status": "COMPLETED" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["location"], "Plant 3");
    assert_eq!(updated["status"], "PLANNED");

    let response = app
        .router
        .oneshot(get_request(&format!("/api/trainings/{}", id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_reports_counts(pool: PgPool) {
    let viewer = create_test_user(&pool, Role::Viewer).await;
    let course_id = create_test_course(&pool).await;
    let training_id =
        create_test_training(&pool, course_id, Utc::now() - Duration::days(2), "ACTIVE").await;
    let first = create_test_collaborator(&pool).await;
    let second = create_test_collaborator(&pool).await;
    create_test_enrollment(&pool, training_id, first, true).await;
    create_test_enrollment(&pool, training_id, second, false).await;

    let app = setup_test_app(pool).await;
    let token = get_auth_token(&app.router, &viewer.email).await;

    let response = app
        .router
        .oneshot(get_request("/api/trainings?status=ACTIVE", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["enrollment_count"], 2);
    assert_eq!(body["data"][0]["certificate_count"], 1);
}
