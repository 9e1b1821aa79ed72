// Common test utilities

pub mod http;

pub use http::*;
