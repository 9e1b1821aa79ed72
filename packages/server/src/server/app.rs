//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use whatsapp::{WhatsAppOptions, WhatsAppService};

use crate::config::Config;
use crate::domains::auth::token::TokenCodec;
use crate::kernel::{
    GoogleOAuth, MemoryExpiringStore, PgUserDirectory, ServerDeps, WhatsAppAdapter,
};
use crate::server::middleware::token_auth_middleware;
use crate::server::routes::{
    create_linking_code_handler, google_callback_handler, google_login_handler, health_handler,
    receive_webhook_handler, session_handler, verify_webhook_handler,
};

/// Build the Axum router over assembled dependencies.
///
/// Token auth is soft here: the middleware attaches AuthUser when a valid
/// token is present and each handler decides whether it requires one.
/// Production hardening (rate limiting) is layered on in `build_app`.
pub fn build_router(deps: Arc<ServerDeps>) -> Router {
    let codec = deps.tokens.clone();

    // CORS configuration - the dashboard runs on its own origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/auth/google", get(google_login_handler))
        .route("/auth/google/callback", get(google_callback_handler))
        .route("/auth/phone/code", post(create_linking_code_handler))
        .route("/auth/session", get(session_handler))
        .route(
            "/webhook",
            get(verify_webhook_handler).post(receive_webhook_handler),
        )
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            token_auth_middleware(codec.clone(), req, next)
        }))
        .layer(Extension(deps))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Assemble production dependencies and build the application router
pub fn build_app(config: &Config, pool: PgPool) -> Result<Router> {
    let provider = Arc::new(GoogleOAuth::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_redirect_uri.clone(),
    )?);

    let whatsapp = Arc::new(WhatsAppService::new(WhatsAppOptions {
        access_token: config.whatsapp_access_token.clone(),
        phone_number_id: config.whatsapp_phone_number_id.clone(),
    }));

    let deps = Arc::new(ServerDeps::new(
        provider,
        Arc::new(PgUserDirectory::new(pool)),
        Arc::new(WhatsAppAdapter::new(whatsapp)),
        Arc::new(MemoryExpiringStore::new()),
        Duration::from_secs(config.link_code_ttl_seconds),
        TokenCodec::new(&config.token_secret),
        config.token_ttl_seconds,
        config.webhook_verify_token.clone(),
        config.frontend_callback_url.clone(),
        config.frontend_error_url.clone(),
    ));

    // Rate limiting: 10 requests per second per IP with bursts up to 20
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers() // Extract IP from X-Forwarded-For header
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    Ok(build_router(deps).layer(rate_limit_layer))
}
