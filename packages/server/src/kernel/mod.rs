//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod google;
pub mod kv;
pub mod test_dependencies;
pub mod traits;

pub use deps::{PgUserDirectory, ServerDeps, WhatsAppAdapter};
pub use google::GoogleOAuth;
pub use kv::MemoryExpiringStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
