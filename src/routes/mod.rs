pub mod admin;
pub mod auth;
pub mod booking;
pub mod cars;
pub mod health;
pub mod menu;
pub mod metrics;
pub mod my_booking;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{middleware::guard::route_guard, AppState};

/// CORS for the front-end origin. Localhost is always allowed for development.
fn cors(app_base_url: &str) -> CorsLayer {
    let base = app_base_url.trim_end_matches('/').to_string();
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| match origin.to_str() {
        Ok(o) => {
            o == base || o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1")
        }
        Err(_) => false,
    });

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
        .allow_origin(origin)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::scrape))
        .route("/menu", get(menu::top_menu))
        // Session
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        // Pages
        .route("/booking", get(booking::booking_page).post(booking::submit_booking))
        .route("/mybooking", get(my_booking::list_my_bookings))
        .route("/allbooking", get(admin::list_all_bookings))
        .route("/allbooking/{id}", put(admin::update_booking))
        .route("/cars/{id}", get(cars::get_car))
        .layer(from_fn_with_state(state.clone(), route_guard))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(&state.config.app_base_url)),
        )
        .with_state(state)
}
