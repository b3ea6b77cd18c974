use std::net::SocketAddr;
use std::time::Duration;

use dotenvy::dotenv;
use heightcert::logging::{init_tracing, shutdown_tracer};
use heightcert::metrics::{init_metrics, metrics_app};
use heightcert::router::init_router;
use heightcert::state::init_app_state;
use heightcert_config::ServerConfig;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let server_config = ServerConfig::from_env();

    if let Some(handle) = init_metrics() {
        let metrics_address = server_config.metrics_address();
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(&metrics_address).await {
                Ok(listener) => {
                    info!(address = %metrics_address, "Metrics endpoint listening");
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        error!(error = %e, "Metrics server stopped");
                    }
                }
                Err(e) => warn!(address = %metrics_address, error = %e, "Metrics endpoint disabled"),
            }
        });
    }

    let state = match init_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialise application state");
            std::process::exit(1);
        }
    };

    state.rate_limiters.spawn_cleanup(Duration::from_secs(60));

    let app = init_router(state);
    let address = server_config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %address, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(address = %address, "Server running");
    info!("Swagger UI available at http://{}/swagger-ui", address);
    info!("Scalar UI available at http://{}/scalar", address);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!(error = %e, "Server error");
    }

    shutdown_tracer().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
