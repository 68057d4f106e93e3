mod configfile;
mod create;
mod delete;
mod error;
mod lifecycle;
mod member;
mod read;

pub use create::create_service;
pub use delete::delete_service;
pub use error::ControlError;
pub use lifecycle::set_service_initialized;
pub use read::{get_service_attr, get_service_by_name, list_service_members};
