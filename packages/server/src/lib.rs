// Tempo - Google sign-in and WhatsApp phone linking service
//
// This crate provides the backend auth subsystem: it signs users in with
// Google, links their WhatsApp number through short-lived codes, and issues
// the session tokens the dashboard uses afterwards.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
