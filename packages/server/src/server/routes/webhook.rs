//! WhatsApp webhook routes
//!
//! The POST handler acknowledges the gateway before any identity or session
//! work happens; message processing runs on a spawned task and all of its
//! failures stay on our side of the webhook.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use whatsapp::models::WebhookPayload;

use crate::domains::auth::actions::process_message;
use crate::kernel::ServerDeps;

/// Subscription handshake params, exactly as the gateway sends them
#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Webhook verification: echo the challenge only for a matching verify token
pub async fn verify_webhook_handler(
    Query(params): Query<VerifyParams>,
    Extension(deps): Extension<Arc<ServerDeps>>,
) -> Response {
    let subscribe = params.mode.as_deref() == Some("subscribe");
    let token_matches = params.verify_token.as_deref() == Some(deps.webhook_verify_token.as_str());

    match (subscribe && token_matches, params.challenge) {
        (true, Some(challenge)) => {
            info!("Webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        _ => {
            warn!("Webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// Inbound message webhook: fast-ack, then process asynchronously
pub async fn receive_webhook_handler(
    Extension(deps): Extension<Arc<ServerDeps>>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    if payload.object != "whatsapp_business_account" {
        warn!("Unexpected webhook object: {}", payload.object);
        return StatusCode::NOT_FOUND.into_response();
    }

    for status in payload.status_updates() {
        debug!(
            "Delivery update for {}: {} ({})",
            status.recipient_id, status.status, status.id
        );
    }

    for message in payload.inbound_messages() {
        let Some(text) = &message.text else {
            debug!("Ignoring {} message from {}", message.kind, message.from);
            continue;
        };

        let phone = message.from.clone();
        let body = text.body.clone();
        let deps = deps.clone();
        tokio::spawn(async move {
            process_message(&phone, &body, &deps).await;
        });
    }

    (StatusCode::OK, Json(serde_json::json!({ "status": "received" }))).into_response()
}
