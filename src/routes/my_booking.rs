use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{middleware::auth::AuthenticatedSession, services::my_bookings::MyBookingList, AppState};

/// GET /mybooking
pub async fn list_my_bookings(
    State(state): State<AppState>,
    AuthenticatedSession(ctx): AuthenticatedSession,
) -> Json<Value> {
    let mut list = MyBookingList::default();
    list.load(state.api.as_ref(), ctx.bearer_token()).await;
    Json(json!(list.view()))
}
