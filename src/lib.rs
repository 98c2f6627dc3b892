pub mod config;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod shutdown;
pub mod user;
