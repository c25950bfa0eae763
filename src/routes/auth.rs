use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::PortalError,
    middleware::auth::{clear_session_cookie, get_cookie, session_cookie, MaybeSession},
    models::auth::{Credentials, SessionView},
    services::{credentials::CredentialExchange, session::SessionState},
    AppState,
};

/// POST /auth/login
///
/// Exchanges credentials upstream and, on success, sets the session cookie.
/// Any failure answers 401 and leaves the caller anonymous.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Credentials>,
) -> Result<Response, PortalError> {
    let cookie = get_cookie(&headers, &state.config.session_cookie_name);
    // Re-authentication replaces whatever session was there.
    let current = match state.sessions.resolve(cookie.as_deref()) {
        live @ SessionState::Authenticated(_) => live.logout(),
        other => other,
    };
    let pending = current.begin_login()?;

    let minted = match CredentialExchange::authenticate(state.api.as_ref(), &body).await {
        Some(identity) => Some(state.sessions.mint(&identity)?),
        None => None,
    };
    let (token, ctx) = match minted {
        Some((token, ctx)) => (Some(token), Some(ctx)),
        None => (None, None),
    };

    match (pending.complete_login(ctx)?, token) {
        (SessionState::Authenticated(ctx), Some(token)) => {
            info!("Session opened for user {}", ctx.identity.id);
            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, session_cookie(&state.config, &token))],
                Json(SessionView::from(&ctx)),
            )
                .into_response())
        }
        (next, _) => {
            debug!("Login ended {}", next.name());
            Ok((
                StatusCode::UNAUTHORIZED,
                [(header::SET_COOKIE, clear_session_cookie(&state.config))],
                Json(json!({ "error": "Invalid email or password" })),
            )
                .into_response())
        }
    }
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie(&state.config))],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

/// GET /auth/session returns `{user, expires}` or `null`.
pub async fn session(MaybeSession(ctx): MaybeSession) -> Json<Option<SessionView>> {
    Json(ctx.as_ref().map(SessionView::from))
}
