// Authorization header credential extraction.
//
// Understands the two encodings at the semantic level only; how the header
// arrives on the wire is the transport layer's business. Malformed input
// yields None ("no credential found"), which is distinct from "credential
// present but invalid".

use base64::{engine::general_purpose, Engine as _};

const BEARER_LABEL: &str = "Bearer ";
const BASIC_LABEL: &str = "Basic ";

/// Username/password pair extracted from a Basic credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Extract the bearer secret: label stripped, surrounding whitespace trimmed.
pub fn bearer_token(header: &str) -> Option<String> {
    let token = header.strip_prefix(BEARER_LABEL)?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Extract Basic credentials: label stripped, base64-decoded, split at the
/// first colon. The password may itself contain colons.
pub fn basic_credentials(header: &str) -> Option<BasicCredentials> {
    let encoded = header.strip_prefix(BASIC_LABEL)?.trim();
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
