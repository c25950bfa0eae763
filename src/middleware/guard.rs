use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::{
    middleware::auth::{get_cookie, session_cookie},
    services::{metrics::GUARD_REDIRECTS_COUNTER, session::SessionState},
    AppState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    /// `/prefix/:path*`: the prefix itself and everything below it.
    Subtree(String),
}

#[derive(Debug, Clone)]
struct ProtectedPath {
    pattern: PathPattern,
    /// Configured spelling, used as the metrics label.
    source: String,
}

/// Statically configured set of protected path patterns.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    patterns: Vec<ProtectedPath>,
}

impl RouteMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref().trim();
                let pattern = match p.strip_suffix("/:path*") {
                    Some(prefix) => PathPattern::Subtree(prefix.trim_end_matches('/').to_string()),
                    None => PathPattern::Exact(normalize(p).to_string()),
                };
                ProtectedPath {
                    pattern,
                    source: p.to_string(),
                }
            })
            .collect();
        Self { patterns }
    }

    /// The configured pattern covering `path`, if any.
    pub fn matching(&self, path: &str) -> Option<&str> {
        let path = normalize(path);
        self.patterns
            .iter()
            .find(|protected| match &protected.pattern {
                PathPattern::Exact(p) => p == path,
                PathPattern::Subtree(prefix) => {
                    path == prefix
                        || path
                            .strip_prefix(prefix.as_str())
                            .is_some_and(|rest| rest.starts_with('/'))
                }
            })
            .map(|protected| protected.source.as_str())
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.matching(path).is_some()
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Middleware gating the protected pages.
///
/// Unauthenticated or expired sessions are redirected to the configured
/// fallback path. Authenticated requests pass through with the session context
/// in request extensions, and the response carries a re-signed cookie.
pub async fn route_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let Some(pattern) = state.guard.matching(&path) else {
        return next.run(request).await;
    };

    let token = get_cookie(request.headers(), &state.config.session_cookie_name);
    let ctx = match state.sessions.resolve(token.as_deref()) {
        SessionState::Authenticated(ctx) => ctx,
        other => {
            debug!("Guard: {} on {} -> {}", other.name(), path, state.config.guard_redirect_path);
            GUARD_REDIRECTS_COUNTER.with_label_values(&[pattern]).inc();
            return Redirect::temporary(&state.config.guard_redirect_path).into_response();
        }
    };

    let refreshed = state.sessions.refresh(&ctx);
    request.extensions_mut().insert(ctx);
    let mut response = next.run(request).await;

    match refreshed {
        Ok((token, _)) => {
            if let Ok(value) = HeaderValue::from_str(&session_cookie(&state.config, &token)) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        Err(e) => warn!("Guard: could not re-sign session: {}", e),
    }
    response
}
