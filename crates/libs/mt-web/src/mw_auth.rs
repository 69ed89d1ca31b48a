//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use mt_auth::users::Role;

use crate::ctx::Ctx;
use crate::prelude::*;

/// Middleware that requires a logged-in user for a route.
pub async fn mw_require_auth(ctx: Result<Ctx>, req: Request, next: Next) -> Result<Response> {
    ctx?;
    Ok(next.run(req).await)
}

/// Middleware that requires one of the listed roles for a route.
pub async fn mw_require_role(
    State(roles): State<&'static [Role]>,
    ctx: Ctx,
    req: Request,
    next: Next,
) -> Result<Response> {
    if !roles.contains(&ctx.role) {
        return Err(Error::ApiForbidden);
    }
    Ok(next.run(req).await)
}

/// A macro for creating role-required middleware layers.
///
/// # Examples
///
/// ```rust
/// use axum::{Router, routing::get};
/// use mt_auth::users::Role;
/// use mt_web::require_role;
///
/// const EDITOR_ROLES: &[Role] = &[Role::Admin, Role::Redakcja];
///
/// let app: Router<()> = Router::new()
///     .route("/panel", get(panel_handler))
///     .layer(require_role!(EDITOR_ROLES));
///
/// async fn panel_handler() -> &'static str {
///     "Editors only"
/// }
/// ```
#[macro_export]
macro_rules! require_role {
    ($roles:expr) => {{
        use mt_web::mw_auth::mw_require_role;
        axum::middleware::from_fn_with_state($roles, mw_require_role)
    }};
}
