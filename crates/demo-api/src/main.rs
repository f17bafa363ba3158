//! Demo API
//!
//! Minimal service showing the token-gate middleware in front of a public
//! and a protected route. The issuer values below are placeholders; point
//! them at a real identity provider to exercise the gate end to end.

use axum::{middleware, routing::get, Extension, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use token_gate::{GateConfig, IssuerConfig, VerifiedIdentity};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_api=debug,token_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting demo API");

    let primary = IssuerConfig {
        name: "primary".to_string(),
        authority: "https://login.example.com/tenant/".to_string(),
        audience: "api://demo-api".to_string(),
        issuer: "https://issuer.example/".to_string(),
        jwks_uri: "https://issuer.example/.well-known/jwks.json".to_string(),
    };

    let gate = Arc::new(
        GateConfig::new()
            .issuer(primary)
            .protect_paths(["/secure"])
            .build()
            .map_err(|e| {
                error!("Invalid gate configuration: {}", e);
                e
            })?,
    );

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. Gate middleware - Authenticate before any handler runs
    let app = Router::new()
        .route("/public", get(public_route))
        .route("/secure", get(secure_route))
        .layer(middleware::from_fn_with_state(
            gate,
            token_gate::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Demo API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Demo API shutdown complete");

    Ok(())
}

async fn public_route() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Public"}))
}

async fn secure_route(Extension(user): Extension<VerifiedIdentity>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Authenticated",
        "user": user.claims(),
    }))
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
