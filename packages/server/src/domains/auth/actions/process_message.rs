//! Process inbound message action
//!
//! Runs after the webhook has already been acknowledged, so nothing here may
//! fail outward: every outcome ends in a chat reply (best-effort) and a log
//! line, never an error to the gateway.

use tracing::{error, info, warn};

use crate::common::AuthError;
use crate::kernel::ServerDeps;

/// Literal, case-sensitive linking command prefix
const AUTHORIZE_PREFIX: &str = "Authorize:";

const INVALID_CODE_REPLY: &str =
    "That code is invalid or has expired. Please generate a new one from your Tempo dashboard and try again.";

const RETRY_LATER_REPLY: &str =
    "Something went wrong on our side. Please try again in a few minutes.";

const AUTHORIZE_FIRST_REPLY: &str =
    "This number isn't connected yet. Please authorize it first: send \"Authorize: <code>\" with the code from your Tempo dashboard.";

const GET_A_CODE_REPLY: &str =
    "Welcome to Tempo! To get started, sign in on the dashboard, generate a linking code, and send it here as \"Authorize: <code>\".";

fn welcome_reply(name: &str) -> String {
    format!("Hi {name}! Your WhatsApp is now connected to Tempo. Just message me here to manage your calendar.")
}

/// Handle one inbound WhatsApp text, fire-and-forget.
pub async fn process_message(phone: &str, text: &str, deps: &ServerDeps) {
    if let Err(err) = handle_message(phone, text, deps).await {
        error!("Failed to process message from {}: {}", phone, err);
        send_reply(deps, phone, RETRY_LATER_REPLY).await;
    }
}

async fn handle_message(phone: &str, text: &str, deps: &ServerDeps) -> Result<(), AuthError> {
    match parse_authorize_code(text) {
        Some(code) => link_phone(phone, code, deps).await,
        None => nudge_unlinked(phone, deps).await,
    }
}

/// Claim the linking session and attach the phone to its user.
async fn link_phone(phone: &str, code: &str, deps: &ServerDeps) -> Result<(), AuthError> {
    let session = match deps.sessions.consume(code).await? {
        Some(session) => session,
        None => {
            info!("No linking session for code sent by {}", phone);
            send_reply(deps, phone, INVALID_CODE_REPLY).await;
            return Ok(());
        }
    };

    // The session is already burnt; an attach failure means a fresh code
    match deps.directory.attach_phone(session.user_id, phone).await {
        Ok(user) => {
            info!("Linked {} to user {}", phone, user.id);
            send_reply(deps, phone, &welcome_reply(&session.name)).await;
        }
        Err(err) => {
            error!("Failed to attach phone for user {}: {}", session.user_id, err);
            send_reply(deps, phone, RETRY_LATER_REPLY).await;
        }
    }
    Ok(())
}

/// No linking command in the text: nudge based on whether we know the number.
///
/// A known number still gets the authorize nudge; nothing auto-attaches.
async fn nudge_unlinked(phone: &str, deps: &ServerDeps) -> Result<(), AuthError> {
    let known = deps.directory.find_by_phone(phone).await?;
    let reply = if known.is_some() {
        AUTHORIZE_FIRST_REPLY
    } else {
        GET_A_CODE_REPLY
    };
    send_reply(deps, phone, reply).await;
    Ok(())
}

/// Match the literal `Authorize:<code>` pattern, code trimmed of whitespace.
fn parse_authorize_code(text: &str) -> Option<&str> {
    let code = text.trim().strip_prefix(AUTHORIZE_PREFIX)?.trim();
    (!code.is_empty()).then_some(code)
}

/// Best-effort send: a failed reply is logged and dropped, never retried.
async fn send_reply(deps: &ServerDeps, phone: &str, body: &str) {
    if let Err(err) = deps.messenger.send_text(phone, body).await {
        warn!(
            "Dropping reply to {}: {}",
            phone,
            AuthError::GatewaySendFailed(err)
        );
    }
}
