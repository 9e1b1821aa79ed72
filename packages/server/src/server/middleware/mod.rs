// HTTP middleware
pub mod token_auth;

pub use token_auth::*;
