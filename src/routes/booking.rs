use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    middleware::auth::AuthenticatedSession,
    models::{auth::SessionView, booking::BookingDraft},
    services::booking_form::{format_display_date, BookingForm},
    AppState,
};

/// GET /booking: selectable options for a new reservation.
pub async fn booking_page(
    State(state): State<AppState>,
    AuthenticatedSession(ctx): AuthenticatedSession,
) -> Json<serde_json::Value> {
    let mut form = BookingForm::new();
    form.load_options(state.api.as_ref()).await;

    Json(json!({
        "session": SessionView::from(&ctx),
        "state": form.state(),
        "carModels": form.car_models(),
        "providers": form.providers(),
    }))
}

/// POST /booking: validate and submit a reservation. One submission per
/// session may be in flight at a time.
pub async fn submit_booking(
    State(state): State<AppState>,
    AuthenticatedSession(ctx): AuthenticatedSession,
    Json(draft): Json<BookingDraft>,
) -> Response {
    let pickup = format_display_date(&draft.pickup_date);
    let ret = format_display_date(&draft.return_date);

    let mut form = BookingForm::with_draft(draft);
    let outcome = form
        .submit_exclusive(
            state.api.as_ref(),
            ctx.bearer_token(),
            &state.submissions,
            &ctx.claims.jti,
        )
        .await;
    match outcome {
        Ok(message) => (
            StatusCode::CREATED,
            Json(json!({
                "state": form.state(),
                "message": message,
                "pickupDate": pickup,
                "returnDate": ret,
            })),
        )
            .into_response(),
        Err(e) => (
            e.status(),
            Json(json!({
                "state": form.state(),
                "error": form.status_message().unwrap_or_default(),
            })),
        )
            .into_response(),
    }
}
