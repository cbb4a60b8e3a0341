#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod notifier;
pub mod retry;
pub mod summary;
pub mod types;
pub mod worker;

use crate::types::environment::Environment;

/// Version reported at startup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// First line the worker logs
#[must_use]
pub fn startup_banner(env: &Environment) -> String {
    format!("Email notify worker starting up (version: {VERSION}) in {env} environment")
}
