use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use tracing::warn;

use crate::state::AppState;
use crate::users::{User, UserError};

pub const REMEMBER_COOKIE: &str = "remember_token";

/// Value of the cookie called `name`, if the request carries one.
/// A value wrapped in double quotes is returned without them.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| unquote(v.trim()).to_string())
        .filter(|v| !v.is_empty())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// `Set-Cookie` value carrying a remember token.
pub fn remember_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!("{REMEMBER_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that drops the remember token from the client.
pub fn expired_remember_cookie(secure: bool) -> String {
    let mut cookie = format!("{REMEMBER_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// The signed-in user, resolved from the remember-token cookie.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, REMEMBER_COOKIE)
            .ok_or((StatusCode::UNAUTHORIZED, "Please log in".to_string()))?;

        match state.users.by_remember_token(&token).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(UserError::NotFound) => {
                warn!("unknown remember token");
                Err((StatusCode::UNAUTHORIZED, "Please log in".to_string()))
            }
            Err(e) => Err((e.status(), e.public())),
        }
    }
}
