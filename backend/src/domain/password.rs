//! Salted password digests.
//!
//! A digest is `base64(HMAC-SHA256(key = salt, message = password))`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::Sha256;

use super::error::{OperationError, OperationResult};
use super::system_user::PASSWORD_SALT_MAX;

type HmacSha256 = Hmac<Sha256>;

/// Salt of decimal digits, used when a user is created.
pub fn numeric_salt() -> String {
    let mut rng = rand::thread_rng();
    (0..PASSWORD_SALT_MAX)
        .map(|_| char::from(b'0' + rng.gen_range(0..10_u8)))
        .collect()
}

/// Salt of ASCII letters and digits, used when a password is changed.
pub fn alphanumeric_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_SALT_MAX)
        .map(char::from)
        .collect()
}

fn keyed_mac(salt: &str, password: &str) -> OperationResult<HmacSha256> {
    let mut mac =
        HmacSha256::new_from_slice(salt.as_bytes()).map_err(OperationError::failure_with)?;
    mac.update(password.as_bytes());
    Ok(mac)
}

/// Digest of `password` under `salt`.
///
/// # Errors
///
/// Fails only if the MAC rejects the salt as a key.
pub fn digest(password: &str, salt: &str) -> OperationResult<String> {
    let mac = keyed_mac(salt, password)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time check of `password` against a stored digest.
pub fn verify(password: &str, salt: &str, stored_digest: &str) -> bool {
    let Ok(expected) = STANDARD.decode(stored_digest) else {
        return false;
    };
    keyed_mac(salt, password).is_ok_and(|mac| mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn digest_matches_reference_vector() {
        // HMAC-SHA256(key = "key", msg = "The quick brown fox jumps over the lazy dog").
        assert_eq!(
            digest("The quick brown fox jumps over the lazy dog", "key").expect("digest"),
            "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg="
        );
    }

    #[rstest]
    fn verify_accepts_only_the_right_password() {
        let salt = numeric_salt();
        let stored = digest("correct horse", &salt).expect("digest");
        assert!(verify("correct horse", &salt, &stored));
        assert!(!verify("wrong horse", &salt, &stored));
        assert!(!verify("correct horse", "other-salt", &stored));
    }

    #[rstest]
    fn verify_rejects_undecodable_digest() {
        assert!(!verify("pw", "salt", "***"));
    }

    #[rstest]
    fn salts_have_expected_shape() {
        let numeric = numeric_salt();
        let mixed = alphanumeric_salt();
        assert_eq!(numeric.len(), PASSWORD_SALT_MAX);
        assert!(numeric.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(mixed.len(), PASSWORD_SALT_MAX);
        assert!(mixed.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[rstest]
    fn digest_fits_stored_column() {
        let stored = digest("pw", &alphanumeric_salt()).expect("digest");
        assert!(stored.len() <= 64);
    }
}
