use std::net::SocketAddr;

use axum::{Router, middleware, routing::get};
use ndao_api::{config::ApiConfig, state::ApiState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables (and .env when present)
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    ndao_api::tracing::init_tracing(&config.env);

    let metrics_handle = ndao_api::metrics::init_metrics()?;
    tracing::info!("Prometheus metrics exporter initialized");

    let state = ApiState::new(config.clone()).await?;
    tracing::info!(
        environment = ?config.endaoment_env,
        auth = %config.endaoment_urls.auth,
        api = %config.endaoment_urls.api,
        "Using Endaoment environment"
    );

    let job_handles = ndao_api::jobs::start_background_jobs(state.login_store.clone());

    let cors = ndao_api::middleware::create_cors_layer([config.frontend_url.as_str()]);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_app = Router::new()
        .route("/metrics", get(ndao_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = ndao_api::router::router()
        .merge(metrics_app)
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(ndao_api::metrics::track_metrics))
        .layer(middleware::from_fn(
            ndao_api::middleware::request_id_middleware,
        ));

    let app = ndao_api::middleware::apply_security_headers(app, config.env.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("The server is running at http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in job_handles {
        handle.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
