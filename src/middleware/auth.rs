use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::{config::Config, error::PortalError, models::auth::SessionContext, AppState};

/// Extract a named cookie value from request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|part| part.trim().strip_prefix(&prefix).map(String::from))
}

pub fn session_cookie(config: &Config, token: &str) -> String {
    let mut cookie = format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_cookie_name, config.session_max_age_seconds
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.session_cookie_name
    )
}

/// Resolve the session for a request: the guard's injected context if it ran,
/// otherwise the session cookie.
fn resolve(parts: &Parts, state: &AppState) -> Option<SessionContext> {
    if let Some(ctx) = parts.extensions.get::<SessionContext>() {
        return Some(ctx.clone());
    }
    let token = get_cookie(&parts.headers, &state.config.session_cookie_name)?;
    state.sessions.verify(&token).ok()
}

/// Extractor for handlers that require a signed-in caller.
pub struct AuthenticatedSession(pub SessionContext);

impl FromRequestParts<AppState> for AuthenticatedSession {
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .map(AuthenticatedSession)
            .ok_or_else(|| PortalError::Auth("Please log in to continue.".into()))
    }
}

/// Extractor for handlers that render differently for anonymous callers.
pub struct MaybeSession(pub Option<SessionContext>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve(parts, state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn get_cookie_finds_value_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; portal_session=abc.def; lang=en"),
        );
        assert_eq!(get_cookie(&headers, "portal_session").as_deref(), Some("abc.def"));
        assert_eq!(get_cookie(&headers, "missing"), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let mut config = Config::with_defaults("http://upstream", "s");
        let cookie = session_cookie(&config, "tok");
        assert!(cookie.starts_with("portal_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));

        config.cookie_secure = true;
        assert!(session_cookie(&config, "tok").ends_with("; Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }
}
