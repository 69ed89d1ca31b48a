//! Session token management for web requests.

use chrono::{TimeDelta, Utc};
use mt_auth::{
    ISS,
    auth_body::AuthBody,
    jwt::{jwt_decode, jwt_encode},
    users::{Role, User, UserRegistry},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::prelude::*;

/// How long a login session stays valid.
pub const SESSION_DURATION_HOURS: i64 = 12;

/// Credentials posted to the login route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// JWT session token carrying the user's identity and role.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken {
    /// Subject (username).
    pub sub: String,
    /// Access role.
    pub role: Role,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at time.
    pub iat: i64,
    /// JWT ID.
    pub jti: Uuid,
}

impl AuthToken {
    pub fn new(user: &User, token_duration: TimeDelta) -> Result<Self> {
        let expiration = Utc::now()
            .checked_add_signed(token_duration)
            .ok_or(Error::AuthTokenCreation)?;

        Ok(Self {
            sub: user.name.clone(),
            role: user.role,
            iss: String::from(ISS),
            exp: expiration.timestamp(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        })
    }
}

/// Checks login credentials against the registry.
pub fn authenticate<'a>(registry: &'a UserRegistry, auth: &LoginRequest) -> Result<&'a User> {
    Ok(registry.authenticate(&auth.username, &auth.password)?)
}

/// Encodes a session token into a JWT string.
pub fn encode_token(token: &AuthToken) -> Result<AuthBody> {
    let token = jwt_encode(&token).map_err(|err| {
        error!("Failed to encode JWT {err}");
        err
    })?;

    Ok(AuthBody::new(token))
}

/// Decodes a JWT string back into a session token.
pub fn decode_token(token: &str) -> Result<AuthToken> {
    Ok(jwt_decode::<AuthToken>(token)
        .map_err(|err| {
            error!("Failed to decode jwt token {err}");
            err
        })?
        .claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_test_secret() {
        unsafe { std::env::set_var("JWT_SECRET", "mt-web-test-secret") };
    }

    #[test]
    #[serial]
    fn token_round_trip_keeps_identity() {
        set_test_secret();
        let registry = UserRegistry::from_env();
        let user = registry.get("test").unwrap();
        let token = AuthToken::new(user, TimeDelta::hours(SESSION_DURATION_HOURS)).unwrap();
        let encoded = encode_token(&token).unwrap();
        let decoded = decode_token(&encoded.access_token).unwrap();
        assert_eq!(decoded.sub, "test");
        assert_eq!(decoded.role, Role::Tester);
        assert!(decoded.exp > Utc::now().timestamp());
    }

    #[test]
    #[serial]
    fn authenticate_maps_registry_errors() {
        set_test_secret();
        let registry = UserRegistry::from_env();
        let request = LoginRequest {
            username: "test".into(),
            password: "wrong".into(),
        };
        assert!(matches!(
            authenticate(&registry, &request),
            Err(Error::Auth(mt_auth::error::Error::WrongCredentials))
        ));
    }
}
