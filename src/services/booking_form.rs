use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::PortalError,
    models::booking::{BookingDraft, Car, Provider},
    services::{api::RentalBackend, metrics::BOOKINGS_COUNTER},
};

pub const MSG_MISSING_FIELDS: &str = "Please fill in all fields before booking.";
pub const MSG_DATE_ORDER: &str = "Return Date must be after the Pick-Up Date.";
pub const MSG_BOOKED: &str = "Booking completed successfully!";
pub const MSG_BOOKING_FAILED: &str = "Failed to complete booking.";
pub const MSG_BOOKING_RETRY: &str = "Failed to complete booking. Try again.";
pub const MSG_IN_FLIGHT: &str = "A booking is already being submitted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingField {
    CarModel,
    ProviderId,
    PickupDate,
    ReturnDate,
}

impl FromStr for BookingField {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carModel" | "model" => Ok(BookingField::CarModel),
            "providerId" | "provider" => Ok(BookingField::ProviderId),
            "pickupDate" => Ok(BookingField::PickupDate),
            "returnDate" => Ok(BookingField::ReturnDate),
            _ => Err(PortalError::Validation(format!("Unknown booking field: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Empty,
    PartiallyFilled,
    ReadyToSubmit,
    Submitting,
    Succeeded,
    Failed,
}

/// Parse a form date. Accepts `YYYY-MM-DD` and full RFC 3339 timestamps.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, PortalError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|d| d.date_naive()))
        .map_err(|_| PortalError::Validation(format!("Invalid date: {raw}")))
}

/// Return date may equal but not precede the pickup date.
pub fn check_date_order(pickup: &str, return_date: &str) -> Result<(), PortalError> {
    let pickup = parse_calendar_date(pickup)?;
    let return_date = parse_calendar_date(return_date)?;
    if return_date < pickup {
        return Err(PortalError::Validation(MSG_DATE_ORDER.into()));
    }
    Ok(())
}

/// `2024-06-10` -> `June 10, 2024`.
pub fn format_display_date(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    parse_calendar_date(raw)
        .ok()
        .map(|d| d.format("%B %-d, %Y").to_string())
}

/// Distinct car models in first-seen order.
pub fn unique_models(cars: &[Car]) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for car in cars {
        if !models.contains(&car.model) {
            models.push(car.model.clone());
        }
    }
    models
}

/// Sessions that currently have a booking submission in flight.
///
/// Shared across requests so a second submit from the same session is refused
/// while the first is still waiting on the upstream.
#[derive(Debug, Default)]
pub struct InFlightSubmissions {
    keys: Mutex<HashSet<String>>,
}

impl InFlightSubmissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`. `None` while another claim on it is alive.
    pub fn try_claim(&self, key: &str) -> Option<SubmissionClaim<'_>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(SubmissionClaim {
            owner: self,
            key: key.to_string(),
        })
    }

    pub fn is_claimed(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Held for the duration of one submission; dropping it releases the slot.
#[derive(Debug)]
pub struct SubmissionClaim<'a> {
    owner: &'a InFlightSubmissions,
    key: String,
}

impl Drop for SubmissionClaim<'_> {
    fn drop(&mut self) {
        self.owner
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Booking form controller.
#[derive(Debug, Clone)]
pub struct BookingForm {
    draft: BookingDraft,
    state: FormState,
    car_models: Vec<String>,
    providers: Vec<Provider>,
    status_message: Option<String>,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingForm {
    pub fn new() -> Self {
        Self {
            draft: BookingDraft::default(),
            state: FormState::Empty,
            car_models: Vec::new(),
            providers: Vec::new(),
            status_message: None,
        }
    }

    pub fn with_draft(draft: BookingDraft) -> Self {
        let mut form = Self::new();
        form.draft = draft;
        form.state = form.readiness();
        form
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn car_models(&self) -> &[String] {
        &self.car_models
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Populate the selectable car models and providers. The two fetches run
    /// concurrently; a failure leaves its list empty.
    pub async fn load_options<B: RentalBackend>(&mut self, backend: &B) {
        let (cars, providers) = tokio::join!(backend.available_cars(), backend.providers());

        match cars {
            Ok(cars) => self.car_models = unique_models(&cars),
            Err(e) => warn!("Error fetching cars: {}", e),
        }
        match providers {
            Ok(providers) => self.providers = providers,
            Err(e) => warn!("Error fetching providers: {}", e),
        }
    }

    pub fn set_field(&mut self, field: BookingField, value: impl Into<String>) {
        let value = value.into();
        match field {
            BookingField::CarModel => self.draft.car_model = value,
            BookingField::ProviderId => self.draft.provider_id = value,
            BookingField::PickupDate => self.draft.pickup_date = value,
            BookingField::ReturnDate => self.draft.return_date = value,
        }
        if self.state != FormState::Submitting {
            self.state = self.readiness();
        }
    }

    /// Like [`set_field`](BookingForm::set_field), addressing the field by
    /// its form name.
    pub fn set_named_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), PortalError> {
        let field = name.parse()?;
        self.set_field(field, value);
        Ok(())
    }

    fn filled(&self) -> [bool; 4] {
        [
            !self.draft.car_model.is_empty(),
            !self.draft.provider_id.is_empty(),
            !self.draft.pickup_date.is_empty(),
            !self.draft.return_date.is_empty(),
        ]
    }

    fn readiness(&self) -> FormState {
        let filled = self.filled();
        if filled.iter().all(|f| *f) {
            FormState::ReadyToSubmit
        } else if filled.iter().any(|f| *f) {
            FormState::PartiallyFilled
        } else {
            FormState::Empty
        }
    }

    fn validate(&self) -> Result<(), PortalError> {
        if !self.filled().iter().all(|f| *f) {
            return Err(PortalError::Validation(MSG_MISSING_FIELDS.into()));
        }
        check_date_order(&self.draft.pickup_date, &self.draft.return_date)
    }

    /// Validate and lock the form for submission.
    ///
    /// Refused while a previous submission is still in flight.
    pub fn begin_submit(&mut self) -> Result<BookingDraft, PortalError> {
        if self.state == FormState::Submitting {
            return Err(PortalError::Validation(MSG_IN_FLIGHT.into()));
        }
        if let Err(e) = self.validate() {
            self.status_message = Some(e.to_string());
            return Err(e);
        }
        self.state = FormState::Submitting;
        Ok(self.draft.clone())
    }

    /// Apply the upstream outcome of a submission started by [`begin_submit`].
    ///
    /// [`begin_submit`]: BookingForm::begin_submit
    pub fn finish_submit(&mut self, outcome: Result<Value, PortalError>) -> Result<String, PortalError> {
        match outcome {
            Ok(_) => {
                info!("Booking created for model {}", self.draft.car_model);
                BOOKINGS_COUNTER.with_label_values(&["succeeded"]).inc();
                self.draft = BookingDraft::default();
                self.state = FormState::Succeeded;
                self.status_message = Some(MSG_BOOKED.into());
                Ok(MSG_BOOKED.into())
            }
            Err(PortalError::Remote { status, message }) => {
                warn!("Booking rejected upstream ({}): {:?}", status, message);
                BOOKINGS_COUNTER.with_label_values(&["rejected"]).inc();
                let message = message.unwrap_or_else(|| MSG_BOOKING_FAILED.into());
                self.state = FormState::Failed;
                self.status_message = Some(message.clone());
                Err(PortalError::Remote {
                    status,
                    message: Some(message),
                })
            }
            Err(e) => {
                warn!("Booking error: {}", e);
                BOOKINGS_COUNTER.with_label_values(&["error"]).inc();
                self.state = FormState::Failed;
                self.status_message = Some(MSG_BOOKING_RETRY.into());
                Err(e)
            }
        }
    }

    /// Validate, then issue exactly one booking request.
    pub async fn submit<B: RentalBackend>(
        &mut self,
        backend: &B,
        bearer: &str,
    ) -> Result<String, PortalError> {
        let draft = self.begin_submit()?;
        let outcome = backend.create_booking(bearer, &draft).await;
        self.finish_submit(outcome)
    }

    /// [`submit`](BookingForm::submit) with at most one submission per `key`
    /// in flight across every form sharing `in_flight`.
    pub async fn submit_exclusive<B: RentalBackend>(
        &mut self,
        backend: &B,
        bearer: &str,
        in_flight: &InFlightSubmissions,
        key: &str,
    ) -> Result<String, PortalError> {
        let Some(_claim) = in_flight.try_claim(key) else {
            warn!("Booking refused: another submission is in flight");
            BOOKINGS_COUNTER.with_label_values(&["in_flight"]).inc();
            self.state = FormState::Submitting;
            self.status_message = Some(MSG_IN_FLIGHT.into());
            return Err(PortalError::Validation(MSG_IN_FLIGHT.into()));
        };
        self.submit(backend, bearer).await
    }
}
