use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::{error::PortalError, services::api::RentalBackend, AppState};

/// GET /cars/{id}
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, PortalError> {
    state.api.car(&id).await.map(Json)
}
