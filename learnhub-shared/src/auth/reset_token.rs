/// Password reset tokens
///
/// A reset token is a random string mailed to the user. Only its SHA-256 hash
/// is stored, next to an expiry timestamp, so a leaked database row cannot be
/// replayed against `reset-password`.
///
/// # Token Format
///
/// `rst_` followed by 40 base62 characters (44 chars total).
///
/// # Example
///
/// ```
/// use learnhub_shared::auth::reset_token::{generate_reset_token, hash_reset_token};
///
/// let (token, hash) = generate_reset_token();
/// assert!(token.starts_with("rst_"));
/// assert_eq!(hash, hash_reset_token(&token));
/// assert_eq!(hash.len(), 64);
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

const TOKEN_RANDOM_LENGTH: usize = 40;
/// Marks reset tokens in mail bodies and logs
pub const TOKEN_PREFIX: &str = "rst_";

/// Total length of a reset token (prefix + random)
pub const RESET_TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Default lifetime of a reset token
pub fn default_ttl() -> Duration {
    Duration::hours(1)
}

/// Generates a reset token and the hash to persist
///
/// Returns `(plaintext_token, sha256_hex)`.
pub fn generate_reset_token() -> (String, String) {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random_part: String = (0..TOKEN_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    let token = format!("{}{}", TOKEN_PREFIX, random_part);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// Hex-encoded SHA-256 of a reset token
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

/// Cheap shape check run before touching the database
pub fn is_well_formed(token: &str) -> bool {
    let token = token.trim();
    token.len() == RESET_TOKEN_LENGTH
        && token.starts_with(TOKEN_PREFIX)
        && token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
}

/// Expiry timestamp for a token issued at `now`
pub fn expires_at(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_token_format() {
        let (token, hash) = generate_reset_token();

        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert!(is_well_formed(&token));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_tokens_differ() {
        let (a, _) = generate_reset_token();
        let (b, _) = generate_reset_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_ignores_surrounding_whitespace() {
        let (token, hash) = generate_reset_token();
        assert_eq!(hash_reset_token(&format!("  {}\n", token)), hash);
    }

    #[test]
    fn test_is_well_formed_rejects_bad_shapes() {
        assert!(!is_well_formed("rst_short"));
        assert!(!is_well_formed(&format!("xyz_{}", "a".repeat(40))));
        assert!(!is_well_formed(&format!("rst_{}!", "a".repeat(39))));
        assert!(is_well_formed(&format!("rst_{}", "a".repeat(40))));
    }

    #[test]
    fn test_expires_at() {
        let now = Utc::now();
        assert_eq!(expires_at(now, default_ttl()) - now, Duration::hours(1));
    }
}
