use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use cognitrace_backend::config::Config;
use cognitrace_backend::kt::config::KtConfig;
use cognitrace_backend::kt::engine::KtEngine;
use cognitrace_backend::logging::{init_tracing, LogConfig};
use cognitrace_backend::response::panic_response;
use cognitrace_backend::routes::build_router;
use cognitrace_backend::services::question_provider;
use cognitrace_backend::state::AppState;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig::from(&config));
    tracing::info!("Starting cognitrace-backend");
    tracing::debug!(?config, "Loaded configuration");

    if let Err(e) = question_provider::validate_config(&config.llm) {
        panic!("Invalid LLM configuration: {e}");
    }

    let kt_config = KtConfig::from_env(&config.kt);
    tracing::info!(
        learn_rate = kt_config.model.learn_rate,
        slip_rate = kt_config.model.slip_rate,
        guess_rate = kt_config.model.guess_rate,
        stretch_probability = kt_config.difficulty.stretch_probability,
        "Knowledge-tracing model configured"
    );

    let provider = question_provider::build_provider(&config.llm);
    tracing::info!(provider = provider.name(), "Question provider ready");

    let engine = match KtEngine::new(kt_config, provider, config.max_sessions) {
        Ok(engine) => Arc::new(engine),
        Err(e) => panic!("Invalid knowledge-tracing configuration: {e}"),
    };
    let state = AppState::new(engine, &config);

    let app = build_router(state)
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Shutdown complete");
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origin.trim() == "*" {
        // 通配符仅用于开发环境
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any);
    }

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any),
        Err(e) => panic!(
            "FATAL: Invalid CORS_ORIGIN '{}': {}. Fix the CORS_ORIGIN environment variable.",
            config.cors_origin, e
        ),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
}
