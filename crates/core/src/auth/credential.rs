// Salted-hash scheme shared by admin passwords and bearer tokens.
//
// Stored form: "{SSHA256}" + base64(salt) + "$" + base64(sha256(salt || secret))
// The '$' delimiter cannot occur in either base64 component, so splitting at
// the first '$' is unambiguous.

use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::error;

/// Scheme tag prepended to every stored hash.
pub const SSHA256_PREFIX: &str = "{SSHA256}";

/// Alphabet for salts.
pub const ALPHANUM: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Alphabet for bearer tokens: alphanumerics plus URL-safe punctuation.
pub const TOKEN_CHARS: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_@.-";

/// Salt length in characters.
pub const SALT_LENGTH: usize = 8;

/// Token length used when the caller passes 0.
pub const DEFAULT_TOKEN_LENGTH: usize = 16;

/// Hash a secret with the given salt into the framed stored form.
///
/// Returns `None` when either input is empty after trimming; the digest
/// itself cannot fail.
pub fn ssha256(salt: &str, secret: &str) -> Option<String> {
    if salt.trim().is_empty() || secret.trim().is_empty() {
        return None;
    }
    let salted = format!("{}{}", salt, secret);
    let digest = Sha256::digest(salted.as_bytes());
    let encoded_salt = general_purpose::STANDARD.encode(salt.as_bytes());
    let encoded_digest = general_purpose::STANDARD.encode(digest);
    Some(format!(
        "{}{}${}",
        SSHA256_PREFIX, encoded_salt, encoded_digest
    ))
}

/// Verify a candidate secret against a stored hash.
///
/// Extracts the embedded salt, recomputes the hash and compares the full
/// strings byte-for-byte. Returns false for any input that does not match the
/// expected prefix/delimiter structure; never panics and never reports why
/// verification failed.
pub fn verify(stored_hash: &str, candidate: &str) -> bool {
    if stored_hash.trim().is_empty() {
        return false;
    }
    if !stored_hash.starts_with(SSHA256_PREFIX) {
        return false;
    }
    let rest = &stored_hash[SSHA256_PREFIX.len()..];
    let Some((encoded_salt, _)) = rest.split_once('$') else {
        return false;
    };
    let Ok(salt_bytes) = general_purpose::STANDARD.decode(encoded_salt) else {
        return false;
    };
    let Ok(salt) = String::from_utf8(salt_bytes) else {
        return false;
    };
    match ssha256(&salt, candidate) {
        Some(recomputed) => recomputed == stored_hash,
        None => false,
    }
}

/// Hash a bearer token with the configured salt.
///
/// When the salt is not configured, the misconfiguration is logged and the
/// raw secret is returned unchanged: lookups against hashed stored tokens
/// will then simply fail. The check is never bypassed.
pub fn hash_token(salt: Option<&str>, secret: &str) -> String {
    match salt.filter(|s| !s.trim().is_empty()) {
        Some(salt) => ssha256(salt, secret).unwrap_or_else(|| secret.to_string()),
        None => {
            error!("token salt not configured; stored hashed tokens will never match");
            secret.to_string()
        }
    }
}

fn random_string(len: usize, chars: &str) -> String {
    let alphabet: Vec<char> = chars.chars().collect();
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect()
}

/// Generate an 8-character alphanumeric salt.
pub fn generate_salt() -> String {
    random_string(SALT_LENGTH, ALPHANUM)
}

/// Generate a random bearer token. A length of 0 falls back to
/// [`DEFAULT_TOKEN_LENGTH`].
pub fn generate_token(len: usize) -> String {
    let len = if len == 0 { DEFAULT_TOKEN_LENGTH } else { len };
    random_string(len, TOKEN_CHARS)
}
