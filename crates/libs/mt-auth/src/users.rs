//! The fixed toolkit user registry.
//!
//! The toolkit serves a small newsroom; accounts are not self-service. Each
//! account reads its secret from the environment, either `<NAME>_PASSWORD`
//! (plaintext, legacy) or `<NAME>_PASSWORD_HASH` (Argon2, preferred). An
//! account with neither variable and no built-in default is disabled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::secret_hash::{is_plaintext_valid, is_secret_valid};

/// Access role carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Redakcja,
    Moderator,
    Tester,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Redakcja => "redakcja",
            Role::Moderator => "moderator",
            Role::Tester => "tester",
        }
    }
}

/// How an account's secret is stored.
#[derive(Debug, Clone)]
enum Secret {
    Hash(String),
    Plain(String),
}

#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub role: Role,
    secret: Secret,
}

impl User {
    fn verify(&self, password: &str) -> Result<bool> {
        match &self.secret {
            Secret::Hash(hash) => is_secret_valid(password, hash),
            Secret::Plain(expected) => Ok(is_plaintext_valid(password, expected)),
        }
    }
}

/// Registry of all accounts allowed to log in.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: HashMap<String, User>,
}

/// Account list mirrored from the deployed toolkit. `None` default means the
/// account stays disabled unless its environment variable is set.
const ACCOUNTS: &[(&str, Role, Option<&str>)] = &[
    ("admin", Role::Admin, None),
    ("redakcja", Role::Redakcja, Some("red!!!akcja")),
    ("ads", Role::Moderator, Some("mod!!!2025")),
    ("tester", Role::Tester, Some("test!n-tv!2025")),
    ("fox", Role::Tester, Some("!!!fox123")),
    ("test", Role::Tester, Some("test")),
];

impl UserRegistry {
    /// Builds the registry from environment variables.
    pub fn from_env() -> Self {
        let mut users = HashMap::new();
        for (name, role, default) in ACCOUNTS {
            let env_prefix = name.to_uppercase();
            let secret = if let Ok(hash) = std::env::var(format!("{env_prefix}_PASSWORD_HASH")) {
                Some(Secret::Hash(hash))
            } else if let Ok(pw) = std::env::var(format!("{env_prefix}_PASSWORD")) {
                Some(Secret::Plain(pw))
            } else {
                default.map(|pw| Secret::Plain(pw.to_string()))
            };

            if let Some(secret) = secret {
                users.insert(
                    name.to_string(),
                    User {
                        name: name.to_string(),
                        role: *role,
                        secret,
                    },
                );
            }
        }
        Self { users }
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    /// Checks credentials and returns the matching user.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<&User> {
        if password.is_empty() {
            return Err(Error::MissingCredentials);
        }
        let user = self.users.get(name).ok_or(Error::UnknownUser)?;
        if user.verify(password)? {
            Ok(user)
        } else {
            Err(Error::WrongCredentials)
        }
    }
}
