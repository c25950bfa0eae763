use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::PortalError,
    middleware::auth::AuthenticatedSession,
    models::{auth::SessionContext, booking::BookingUpdate},
    services::admin_bookings::{validate_update, AdminBookingList, ListView},
    AppState,
};

fn require_admin(ctx: &SessionContext) -> Result<(), PortalError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(PortalError::Forbidden("Admin access required".into()))
    }
}

/// GET /allbooking
pub async fn list_all_bookings(
    State(state): State<AppState>,
    AuthenticatedSession(ctx): AuthenticatedSession,
) -> Result<Json<Value>, PortalError> {
    require_admin(&ctx)?;
    let mut list = AdminBookingList::new();
    list.load(state.api.as_ref(), ctx.bearer_token()).await;
    Ok(Json(json!(list.view())))
}

/// PUT /allbooking/{id}: edit one booking and return the patched list as
/// `{message, state, bookings}`. The edit is checked before any upstream call.
pub async fn update_booking(
    State(state): State<AppState>,
    AuthenticatedSession(ctx): AuthenticatedSession,
    Path(id): Path<String>,
    Json(body): Json<BookingUpdate>,
) -> Result<Json<Value>, PortalError> {
    require_admin(&ctx)?;
    validate_update(&body)?;
    let bearer = ctx.bearer_token();

    let mut list = AdminBookingList::new();
    list.load(state.api.as_ref(), bearer).await;
    if let ListView::Error { message } = list.view() {
        return Err(PortalError::Remote {
            status: StatusCode::BAD_GATEWAY,
            message: Some(message.to_string()),
        });
    }

    list.begin_edit(&id)?.fields = body;
    let message = list.save(state.api.as_ref(), bearer).await?;

    let mut payload = json!(list.view());
    payload["message"] = json!(message);
    Ok(Json(payload))
}
