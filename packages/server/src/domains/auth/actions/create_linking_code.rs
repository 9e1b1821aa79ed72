//! Create linking code action

use tracing::info;
use uuid::Uuid;

use crate::common::AuthError;
use crate::domains::auth::linking::CodeIssue;
use crate::kernel::ServerDeps;

/// Issue a linking code for a signed-in user.
///
/// The display name stored in the session comes from the directory, not the
/// request, so the eventual welcome message cannot be spoofed.
pub async fn create_linking_code(user_id: Uuid, deps: &ServerDeps) -> Result<CodeIssue, AuthError> {
    let user = deps
        .directory
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::IdentityNotFound)?;

    let issue = deps.sessions.create(user.id, &user.name).await?;
    info!("Linking code {} for user {}", issue.status(), user.id);
    Ok(issue)
}
