use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::{auth_rate_limit, general_rate_limit};
use crate::middleware::role::{require_admin, require_viewer};
use crate::modules::auth::router::{init_auth_router, init_me_router};
use crate::modules::coaches::init_coaches_router;
use crate::modules::collaborators::init_collaborators_router;
use crate::modules::courses::init_courses_router;
use crate::modules::dashboard::init_dashboard_router;
use crate::modules::enrollments::init_enrollments_router;
use crate::modules::trainings::init_trainings_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    // Everything a recognised role may reach; handlers check the exact permission.
    let business = Router::new()
        .nest("/collaborators", init_collaborators_router())
        .nest("/courses", init_courses_router())
        .nest("/coaches", init_coaches_router())
        .nest("/trainings", init_trainings_router())
        .nest(
            "/enrollments",
            init_enrollments_router(state.storage_config.max_file_size),
        )
        .merge(init_dashboard_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_viewer));

    let api = Router::new()
        .nest(
            "/auth",
            init_auth_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_rate_limit))
                .merge(init_me_router()),
        )
        .nest(
            "/users",
            init_users_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        .merge(business)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            general_rate_limit,
        ));

    // Stored certificates carry personal data; same gate as the business routes.
    let files: Router<AppState> = Router::new()
        .nest_service("/files", ServeDir::new(&state.storage_config.base_dir))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_viewer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            general_rate_limit,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api)
        .merge(files)
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
