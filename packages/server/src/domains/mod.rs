//! Domain modules - business logic organized by bounded context.

pub mod auth;
