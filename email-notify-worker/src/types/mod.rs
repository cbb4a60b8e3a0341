pub mod config;
pub mod environment;
pub mod error;

pub use config::{ConfigError, ServiceConfig};
pub use environment::Environment;
pub use error::{WorkerError, WorkerResult};
