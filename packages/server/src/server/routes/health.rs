use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::kernel::ServerDeps;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    directory: ComponentHealth,
    session_store: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(message),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Health check endpoint
///
/// Checks:
/// - User directory connectivity (cheap primary-key probe)
/// - Session store reachability
///
/// Returns 200 OK if all systems are healthy, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(deps): Extension<Arc<ServerDeps>>,
) -> (StatusCode, Json<HealthResponse>) {
    let directory = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        deps.directory.find_by_id(Uuid::nil()),
    )
    .await
    {
        Ok(Ok(_)) => ComponentHealth::ok(),
        Ok(Err(e)) => ComponentHealth::error(format!("Lookup failed: {}", e)),
        Err(_) => ComponentHealth::error("Lookup timeout (>5s)".to_string()),
    };

    let session_store = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        deps.sessions.get("000000"),
    )
    .await
    {
        Ok(Ok(_)) => ComponentHealth::ok(),
        Ok(Err(e)) => ComponentHealth::error(format!("Read failed: {}", e)),
        Err(_) => ComponentHealth::error("Read timeout (>5s)".to_string()),
    };

    let is_healthy = directory.is_ok() && session_store.is_ok();

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            directory,
            session_store,
        }),
    )
}
