//! PBKDF2-SHA256 password hashes in the passlib modular-crypt format:
//! `$pbkdf2-sha256$<rounds>$<salt>$<checksum>`, where salt and checksum
//! use passlib's "adapted base64" (standard alphabet, `.` instead of `+`,
//! no padding).

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use sha2::Sha256;

use crate::error::{Error, Result};

const SCHEME: &str = "pbkdf2-sha256";
pub const DEFAULT_ROUNDS: u32 = 29_000;
const SALT_LEN: usize = 16;
const CHECKSUM_LEN: usize = 32;

fn ab64_encode(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes).replace('+', ".")
}

fn ab64_decode(s: &str) -> Result<Vec<u8>> {
    let normalized = s.trim_end_matches('=').replace('.', "+");
    STANDARD_NO_PAD
        .decode(normalized)
        .map_err(|e| Error::Password(format!("invalid base64: {e}")))
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; CHECKSUM_LEN] {
    let mut out = [0u8; CHECKSUM_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

/// Hash `password` with a fresh random salt.
pub fn hash(password: &str, rounds: u32) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    hash_with_salt(password, &salt, rounds)
}

pub fn hash_with_salt(password: &str, salt: &[u8], rounds: u32) -> String {
    let checksum = derive(password, salt, rounds);
    format!(
        "${SCHEME}${rounds}${}${}",
        ab64_encode(salt),
        ab64_encode(&checksum)
    )
}

/// Check `password` against a stored hash.
///
/// Returns `Ok(false)` on mismatch and an error when `stored` is not a
/// well-formed pbkdf2-sha256 hash.
pub fn verify(password: &str, stored: &str) -> Result<bool> {
    let mut parts = stored.split('$');
    let (Some(""), Some(scheme), Some(rounds), Some(salt), Some(checksum)) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(Error::Password("malformed hash".into()));
    };
    if scheme != SCHEME {
        return Err(Error::Password(format!("unsupported scheme {scheme}")));
    }
    let rounds: u32 = rounds
        .parse()
        .map_err(|_| Error::Password(format!("invalid rounds {rounds}")))?;
    let salt = ab64_decode(salt)?;
    let expected = ab64_decode(checksum)?;

    let actual = derive(password, &salt, rounds);
    Ok(constant_time_eq(&actual, &expected))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
