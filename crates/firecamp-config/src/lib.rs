mod error;
mod loader;
mod raw;

pub use error::ConfigError;
pub use loader::{load_request, parse_request_yaml};
