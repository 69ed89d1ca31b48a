//! Context resolver extracting the session identity from HTTP requests.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::TimeDelta;
use mt_auth::{auth_body::AuthBody, jwt::jwt_decode, users::UserRegistry};
use tower_cookies::{Cookie, Cookies};

use crate::auth_token::{
    AuthToken, LoginRequest, SESSION_DURATION_HOURS, authenticate, encode_token,
};
use crate::ctx::Ctx;
use crate::prelude::*;

/// The name of the cookie used to store session tokens.
pub const AUTH_TOKEN_COOKIE: &str = "auth-token";

pub const AUTH_HEADER: &str = "Authorization";
pub const AUTH_HEADER_PREFIX: &str = "Bearer ";

/// Middleware resolving the request context from the session token.
///
/// Reads the token from the session cookie or the `Authorization` header,
/// validates it, and stores the outcome in the request extensions. An
/// invalid or expired token also clears the cookie.
#[axum::debug_middleware]
pub async fn mw_ctx_resolver(
    cookies: Cookies,
    headers: HeaderMap,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = cookies
        .get(AUTH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            headers
                .get(AUTH_HEADER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix(AUTH_HEADER_PREFIX))
                .map(|s| s.to_string())
        })
        .ok_or(mt_auth::error::Error::TokenMissing)
        .and_then(|token| Ok(jwt_decode::<AuthToken>(&token)?.claims))
        .and_then(|token| {
            if token.exp < chrono::Utc::now().timestamp() {
                Err(mt_auth::error::Error::TokenExpired)
            } else {
                Ok(token)
            }
        });

    let ctx = token.map(|token: AuthToken| Ctx::new(token.sub, token.role));
    if let Ok(ctx) = &ctx {
        let ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok());
        tracing::debug!(
            "{}",
            access_line(
                ip.as_deref(),
                req.method().as_str(),
                req.uri().path(),
                &ctx.user,
                agent,
            )
        );
    }

    if ctx.is_err() {
        cookies.remove(Cookie::from(AUTH_TOKEN_COOKIE));
    }
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

/// Logs a user in and sets the session cookie.
pub fn login_user(
    registry: &UserRegistry,
    auth: &LoginRequest,
    cookies: &Cookies,
) -> Result<AuthBody> {
    let user = authenticate(registry, auth)?;
    let token = AuthToken::new(user, TimeDelta::hours(SESSION_DURATION_HOURS))?;
    let body = encode_token(&token)?;
    cookies.add(Cookie::new(AUTH_TOKEN_COOKIE, body.access_token.clone()));
    Ok(body)
}

/// Clears the session cookie.
pub fn logout_user(cookies: &Cookies) {
    cookies.remove(Cookie::from(AUTH_TOKEN_COOKIE));
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Ok(parts
            .extensions
            .get::<std::result::Result<Ctx, mt_auth::error::Error>>()
            .ok_or(Error::CtxMissing)?
            .clone()?)
    }
}

/// One access-log line per authenticated request: `ip | page | user | agent`.
fn access_line(
    ip: Option<&str>,
    method: &str,
    path: &str,
    user: &str,
    agent: Option<&str>,
) -> String {
    format!(
        "{} | {method} {path} | {user} | {}",
        ip.unwrap_or("-"),
        agent.unwrap_or("-"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_line_carries_ip_page_user_and_agent() {
        assert_eq!(
            access_line(
                Some("10.0.0.7"),
                "GET",
                "/v1/content/prompts",
                "redakcja",
                Some("curl/8.5"),
            ),
            "10.0.0.7 | GET /v1/content/prompts | redakcja | curl/8.5"
        );
        assert_eq!(
            access_line(None, "POST", "/v1/audiototext/upload", "test", None),
            "- | POST /v1/audiototext/upload | test | -"
        );
    }
}
