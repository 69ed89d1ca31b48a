//! Web middleware for the Media Toolkit.
//!
//! Session tokens, request context resolution, and role-based route
//! protection for the toolkit's HTTP API.

pub mod auth_token;
pub mod ctx;
pub mod error;
pub mod mw_auth;
pub mod prelude;
