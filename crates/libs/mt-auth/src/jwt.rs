//! JWT token management for the Media Toolkit login session.
//!
//! The toolkit is stateless: a signed token carried in a cookie (or an
//! `Authorization` header) is the whole session. This module handles token
//! signing, verification and claim extraction with secure defaults.
//!
//! # Examples
//!
//! ```rust
//! use mt_auth::jwt::{jwt_encode, jwt_decode};
//! use serde::{Serialize, Deserialize};
//! use std::env;
//! unsafe { env::set_var("JWT_SECRET", "MySuperSecret"); }
//!
//! #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
//! struct SessionClaims {
//!     user: String,
//!     role: String,
//!     exp: usize,
//! }
//!
//! let claims = SessionClaims {
//!     user: "redakcja".to_string(),
//!     role: "redakcja".to_string(),
//!     exp: 4118335200,
//! };
//!
//! let token = jwt_encode(&claims).unwrap();
//! let decoded = jwt_decode::<SessionClaims>(&token).unwrap();
//! assert_eq!(claims, decoded.claims);
//! ```

use crate::prelude::*;
use std::sync::LazyLock;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::{Serialize, de::DeserializeOwned};

/// Lazily initialized cryptographic keys for JWT operations.
///
/// Keys are loaded once from the JWT_SECRET environment variable and reused
/// for all token operations.
static KEYS: LazyLock<Keys> = LazyLock::new(|| {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    Keys::new(secret.as_bytes())
});

static ALGORITHM: LazyLock<Algorithm> = LazyLock::new(|| Algorithm::HS256);

/// Cryptographic key pair for JWT signing and verification.
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Creates a signed JWT token from the provided claims.
///
/// Claims are not encrypted, only signed for integrity; include an
/// expiration claim to prevent token replay.
pub fn jwt_encode<T>(body: &T) -> Result<String>
where
    T: Serialize,
{
    let header = Header::new(*ALGORITHM);
    Ok(encode(&header, body, &KEYS.encoding)?)
}

/// Validates and decodes a JWT token to extract claims.
///
/// Only tokens signed with the configured secret and matching algorithm
/// are accepted.
pub fn jwt_decode<T>(token: &str) -> Result<TokenData<T>>
where
    T: DeserializeOwned,
{
    Ok(decode(token, &KEYS.decoding, &Validation::new(*ALGORITHM))?)
}
