use axum::{
    routing::{get, post},
    Router,
};
use pix_core::primitives::{ErrorResponse, HealthResponse, PixChargeResponse, PostPixRequest};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{LogFormat, TracingConfig},
    forwarder::PixForwarder,
    frontend::FrontendAssets,
    routes::default::{get_health, post_pix},
};

pub fn init_tracing(config: &TracingConfig) -> anyhow::Result<()> {
    let (text, json) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(text)
        .with(json)
        .try_init()?;
    Ok(())
}

pub async fn run_server(forwarder: PixForwarder) -> anyhow::Result<()> {
    init_tracing(&forwarder.config.tracing)?;

    if let Some(ref buildtime) = forwarder.build_params.build_time {
        info!("build time: {}", buildtime);
    }
    if let Some(ref commithash) = forwarder.build_params.commit_hash {
        info!("git commit-hash: {}", commithash);
    }
    info!("version: {}", forwarder.build_params.full_version());
    info!("listening on: {}", forwarder.config.server.socket_addr());
    info!("upstream: {}", forwarder.config.upstream.endpoint()?);
    info!(
        "upstream timeout: {}s, force ipv4: {}",
        forwarder.config.upstream.timeout_secs, forwarder.config.upstream.force_ipv4
    );
    if forwarder.has_token() {
        info!("api token: configured");
    } else {
        warn!("api token: missing, POST /pix will fail until PIX_API_TOKEN is set");
    }

    let listener = TcpListener::bind(forwarder.config.server.socket_addr()).await?;
    serve(listener, forwarder).await
}

/// Serves the gateway on an already bound listener until SIGTERM or Ctrl-C.
pub async fn serve(listener: TcpListener, forwarder: PixForwarder) -> anyhow::Result<()> {
    axum::serve(
        listener,
        app(forwarder)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_headers(Any)
                    .allow_methods(Any)
                    .expose_headers(Any),
            )
            .into_make_service(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

#[derive(OpenApi)]
#[openapi(
    paths(crate::routes::default::post_pix, crate::routes::default::get_health),
    components(schemas(PostPixRequest, PixChargeResponse, HealthResponse, ErrorResponse))
)]
struct ApiDoc;

pub fn app(forwarder: PixForwarder) -> Router {
    let assets = FrontendAssets::detect(&forwarder.config.frontend);
    match assets {
        FrontendAssets::None => warn!("no front end found, serving the api only"),
        ref assets => info!("serving front end from {}", assets),
    }

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/pix", post(post_pix))
        .route("/health", get(get_health));

    let router = match assets.service() {
        Some(frontend) => router.fallback_service(frontend),
        None => router,
    };

    router
        .with_state(forwarder)
        .layer(TraceLayer::new_for_http())
}

// ######################################################################################################
