//! Auth domain - Google sign-in plus WhatsApp phone linking
//!
//! Flow:
//!   browser → Google consent → callback resolves an identity → session token
//!   dashboard → linking code → "Authorize: <code>" over WhatsApp → phone attached
//!
//! Responsibilities:
//! - Identity resolution against the user directory (login vs signup)
//! - Short-lived linking sessions tying a dashboard login to a phone
//! - Session token issue/verify
//! - Inbound WhatsApp message handling

pub mod actions;
pub mod linking;
pub mod models;
pub mod resolver;
pub mod token;

pub use linking::{CodeIssue, LinkingSession, LinkingSessionStore};
pub use resolver::{IdentityResolver, Resolution};
pub use token::{Claims, TokenCodec, TokenError};
