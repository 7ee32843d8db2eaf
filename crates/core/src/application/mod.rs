// Application Layer - Use Cases and Services

pub mod admin;
pub mod authorization;
pub mod cleanup;
pub mod queue;

// Re-exports
pub use admin::{AdminService, CreatedToken};
pub use authorization::AuthorizationService;
pub use cleanup::CleanupScheduler;
pub use queue::QueueService;
