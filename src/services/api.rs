use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    config::Config,
    error::PortalError,
    models::booking::{BookingDraft, BookingRecord, BookingUpdate, Car, Provider},
};

/// Operations the portal needs from the external car-rental API.
///
/// Every call is a single attempt: non-2xx answers become
/// [`PortalError::Remote`] carrying the server `message`, network or body
/// decoding failures become [`PortalError::Transport`].
pub trait RentalBackend: Send + Sync {
    /// Raw identity payload for an email/password pair.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Value, PortalError>> + Send;

    fn available_cars(&self) -> impl Future<Output = Result<Vec<Car>, PortalError>> + Send;

    fn car(&self, id: &str) -> impl Future<Output = Result<Value, PortalError>> + Send;

    fn providers(&self) -> impl Future<Output = Result<Vec<Provider>, PortalError>> + Send;

    fn create_booking(
        &self,
        bearer: &str,
        draft: &BookingDraft,
    ) -> impl Future<Output = Result<Value, PortalError>> + Send;

    fn my_bookings(
        &self,
        bearer: &str,
    ) -> impl Future<Output = Result<Vec<BookingRecord>, PortalError>> + Send;

    fn all_bookings(
        &self,
        bearer: &str,
    ) -> impl Future<Output = Result<Vec<BookingRecord>, PortalError>> + Send;

    fn update_booking(
        &self,
        bearer: &str,
        id: &str,
        update: &BookingUpdate,
    ) -> impl Future<Output = Result<Value, PortalError>> + Send;
}

/// reqwest-backed client for the external API.
#[derive(Clone)]
pub struct RentalApiClient {
    client: Client,
    base_url: String,
    login_path: String,
}

impl RentalApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.upstream_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.api_base_url.clone(),
            login_path: config.identity_login_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder.bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, PortalError> {
        let response = builder.send().await?;
        read_json(response).await
    }
}

/// Decode an upstream response, classifying failures.
async fn read_json(response: Response) -> Result<Value, PortalError> {
    let status = response.status();
    let text = response.text().await?;
    let body: Option<Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let message = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from);
        debug!("Upstream answered {} ({:?})", status, message);
        return Err(PortalError::Remote { status, message });
    }

    body.ok_or_else(|| PortalError::Transport("upstream returned a non-JSON body".into()))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, PortalError> {
    serde_json::from_value(value).map_err(|e| PortalError::Transport(e.to_string()))
}

/// Booking lists arrive either bare or wrapped in `bookings` / `data`.
pub fn extract_bookings(value: Value) -> Result<Vec<BookingRecord>, PortalError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("bookings")
            .or_else(|| map.remove("data"))
            .unwrap_or(Value::Array(Vec::new())),
        _ => return Err(PortalError::Transport("unexpected bookings payload".into())),
    };
    decode(list)
}

impl RentalBackend for RentalApiClient {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Value, PortalError> {
        let url = self.url(&self.login_path);
        self.send(
            self.client
                .post(url)
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn available_cars(&self) -> Result<Vec<Car>, PortalError> {
        let url = self.url("/api/cars/search");
        let body = self
            .send(self.client.get(url).query(&[("available", "true")]))
            .await?;
        decode(body)
    }

    async fn car(&self, id: &str) -> Result<Value, PortalError> {
        let url = self.url(&format!("/api/cars/{id}"));
        self.send(self.client.get(url)).await.map_err(|e| match e {
            PortalError::Remote { status, .. } => PortalError::Remote {
                status,
                message: Some("Failed to fetch cars".into()),
            },
            other => other,
        })
    }

    async fn providers(&self) -> Result<Vec<Provider>, PortalError> {
        let url = self.url("/api/users/providers");
        let body = self.send(self.client.get(url)).await?;
        decode(body)
    }

    async fn create_booking(&self, bearer: &str, draft: &BookingDraft) -> Result<Value, PortalError> {
        let url = self.url("/api/bookings");
        self.send(self.authorized(self.client.post(url), bearer).json(draft))
            .await
    }

    async fn my_bookings(&self, bearer: &str) -> Result<Vec<BookingRecord>, PortalError> {
        let url = self.url("/api/bookings");
        let body = self.send(self.authorized(self.client.get(url), bearer)).await?;
        extract_bookings(body)
    }

    async fn all_bookings(&self, bearer: &str) -> Result<Vec<BookingRecord>, PortalError> {
        let url = self.url("/api/admins/bookings");
        let body = self.send(self.authorized(self.client.get(url), bearer)).await?;
        extract_bookings(body)
    }

    async fn update_booking(
        &self,
        bearer: &str,
        id: &str,
        update: &BookingUpdate,
    ) -> Result<Value, PortalError> {
        let url = self.url(&format!("/api/admins/bookings/{id}"));
        self.send(self.authorized(self.client.put(url), bearer).json(update))
            .await
    }
}
