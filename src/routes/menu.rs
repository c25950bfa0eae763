use axum::Json;

use crate::{
    middleware::auth::MaybeSession,
    services::navigation::{menu_for, Menu},
};

/// GET /menu
pub async fn top_menu(MaybeSession(ctx): MaybeSession) -> Json<Menu> {
    Json(menu_for(ctx.as_ref()))
}
