//! Request context management for web handlers.

use mt_auth::users::Role;

pub mod resolver;

/// Authenticated identity attached to a request.
#[derive(Clone, Debug)]
pub struct Ctx {
    /// The logged-in username.
    pub user: String,
    /// Access role carried by the session token.
    pub role: Role,
}

impl Ctx {
    pub fn new(user: String, role: Role) -> Self {
        Self { user, role }
    }
}
