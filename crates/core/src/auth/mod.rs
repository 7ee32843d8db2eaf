// Credential & Token Engine

pub mod credential;
pub mod header;

// Re-exports
pub use credential::{
    generate_salt, generate_token, hash_token, ssha256, verify, DEFAULT_TOKEN_LENGTH,
    SSHA256_PREFIX,
};
pub use header::{basic_credentials, bearer_token, BasicCredentials};
