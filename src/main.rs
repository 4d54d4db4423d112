use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use saas_admin_api::access::AccessGate;
use saas_admin_api::error::ApiError;
use saas_admin_api::guard::AdminGuard;
use saas_admin_api::handlers::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up ADMIN_EMAILS, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = saas_admin_api::config::config();
    tracing::info!(
        "Starting SaaS admin API with {} allowlisted admin email(s)",
        config.admin_emails.len()
    );

    let state = AppState {
        guard: Arc::new(AdminGuard::new(AccessGate::new(
            config.admin_emails.clone(),
        ))),
        session_secret: config.security.session_secret.clone(),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("ADMIN_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 SaaS admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Admin surface
        .route("/admin", get(handlers::admin::admin_home_get))
        .route("/admin/discounts", get(handlers::admin::discounts_get))
        .route(
            "/api/admin/check-access",
            get(handlers::admin::check_access_get),
        )
        .with_state(state)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "SaaS Admin API (Rust)",
            "version": version,
            "description": "Admin allowlist access control for the SaaS kit",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "admin": "/admin (redirect-guarded)",
                "discounts": "/admin/discounts (redirect-guarded, manage_discounts)",
                "check_access": "/api/admin/check-access (session-aware)",
            }
        }
    }))
}

async fn health() -> Result<axum::response::Json<Value>, ApiError> {
    saas_admin_api::database::health_check().await?;

    Ok(axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": "ok"
        }
    })))
}
