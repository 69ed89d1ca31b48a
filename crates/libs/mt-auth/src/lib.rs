//! Authentication building blocks for the Media Toolkit.
//!
//! Provides JWT token management, password verification and the fixed
//! user registry the toolkit authenticates against.

pub mod auth_body;
pub mod error;
pub mod jwt;
pub mod prelude;
pub mod secret_hash;
pub mod users;

pub const TOKEN_TYPE: &str = "Bearer";
pub const ISS: &str = "MT";
