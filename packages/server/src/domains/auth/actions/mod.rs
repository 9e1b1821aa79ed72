//! Auth domain actions - business logic functions
//!
//! Actions are async functions called directly from route handlers.

mod create_linking_code;
mod oauth_callback;
mod process_message;

pub use create_linking_code::create_linking_code;
pub use oauth_callback::{oauth_callback, CallbackOutcome};
pub use process_message::process_message;
