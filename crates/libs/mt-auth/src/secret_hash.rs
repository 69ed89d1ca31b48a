//! Password hashing and verification.
//!
//! Accounts may carry an Argon2 hash (`<NAME>_PASSWORD_HASH`) or a plain
//! password (`<NAME>_PASSWORD`). Hashes are verified with Argon2; plain
//! passwords are compared through SHA-256 digests so the comparison does
//! not leak length or prefix timing.
//!
//! # Examples
//!
//! ```rust
//! use mt_auth::secret_hash::{generate_secret_hash, is_secret_valid};
//!
//! let hash = generate_secret_hash("user_password_123").unwrap();
//! assert!(is_secret_valid("user_password_123", &hash).unwrap());
//! assert!(!is_secret_valid("wrong_password", &hash).unwrap());
//! ```

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHashString, SaltString},
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::prelude::*;

/// Generates an Argon2 hash for the provided password.
///
/// The resulting string embeds the salt and parameters needed for
/// verification and is safe to put in an environment file.
pub fn generate_secret_hash(pw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(pw.as_bytes(), &salt)?.to_string())
}

/// Verifies a password against a stored Argon2 hash.
pub fn is_secret_valid(pw: &str, hash: &str) -> Result<bool> {
    let hash = PasswordHashString::new(hash)?;

    Ok(Argon2::default()
        .verify_password(pw.as_bytes(), &hash.password_hash())
        .is_ok())
}

/// Compares two plaintext secrets without early exit.
pub fn is_plaintext_valid(pw: &str, expected: &str) -> bool {
    let a = Sha256::digest(pw.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a == b
}

impl From<password_hash::Error> for Error {
    fn from(value: password_hash::Error) -> Self {
        Self::PasswordHash(value)
    }
}
