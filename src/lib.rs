// Library exports for the server binary and integration tests
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use middleware::guard::RouteMatcher;
use services::{api::RentalApiClient, booking_form::InFlightSubmissions, session::SessionService};

/// Application state shared across all handlers. Read-only after startup,
/// apart from the set of in-flight booking submissions.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<RentalApiClient>,
    pub sessions: Arc<SessionService>,
    pub guard: Arc<RouteMatcher>,
    pub submissions: Arc<InFlightSubmissions>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let api = RentalApiClient::new(&config)?;
        let sessions = SessionService::new(&config.session_secret, config.session_max_age_seconds);
        let guard = RouteMatcher::new(config.protected_paths.as_slice());
        Ok(Self {
            config: Arc::new(config),
            api: Arc::new(api),
            sessions: Arc::new(sessions),
            guard: Arc::new(guard),
            submissions: Arc::new(InFlightSubmissions::new()),
        })
    }
}
