//! Command implementations.

pub mod cmd;
pub mod config;
pub mod discover;
pub mod status;

pub use cmd::run_cmd;
pub use config::run_config;
pub use discover::run_discover;
pub use status::run_status;
