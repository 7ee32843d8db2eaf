// QGate Core - Domain Logic & Ports
// NO infrastructure dependencies (hexagonal architecture)

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, AuthError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
