/// Confirmation codes
///
/// A confirmation code is generated when an account is created, mailed to the
/// user at signup, and later exchanged for an access token. Only the SHA-256
/// digest is stored in `users.confirmation_code`.
///
/// # Example
///
/// ```
/// use yamdb_shared::auth::confirmation::{generate_code, verify_code};
///
/// let (code, digest) = generate_code();
/// assert_eq!(code.len(), 32);
/// assert!(verify_code(&code, &digest));
/// assert!(!verify_code("something-else", &digest));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a generated code
pub const CODE_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a fresh code and its storage digest
///
/// Returns `(plaintext_code, sha256_hex_digest)`.
pub fn generate_code() -> (String, String) {
    let mut rng = rand::thread_rng();
    let code: String = (0..CODE_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let digest = hash_code(&code);

    (code, digest)
}

/// Hex-encoded SHA-256 digest of a code
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks a submitted code against a stored digest in constant time
pub fn verify_code(code: &str, stored_digest: &str) -> bool {
    constant_time_eq(hash_code(code).as_bytes(), stored_digest.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_is_alphanumeric() {
        let (code, digest) = generate_code();

        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_codes_are_unique() {
        let (a, _) = generate_code();
        let (b, _) = generate_code();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_code("abc"), hash_code("abc"));
        assert_eq!(
            hash_code("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_code() {
        let (code, digest) = generate_code();

        assert!(verify_code(&code, &digest));
        assert!(!verify_code("wrong-code", &digest));
        assert!(!verify_code("", &digest));
        assert!(!verify_code(&code, "short"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"diff"));
        assert!(!constant_time_eq(b"same", b"longer"));
    }
}
