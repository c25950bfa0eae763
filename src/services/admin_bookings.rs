use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::PortalError,
    models::booking::{BookingRecord, BookingUpdate},
    services::{api::RentalBackend, booking_form::check_date_order, metrics::BOOKING_UPDATES_COUNTER},
};

pub const MSG_LOAD_FAILED: &str = "Failed to load bookings";
pub const MSG_LOAD_ERROR: &str = "An error occurred while fetching the bookings";
pub const MSG_EDIT_MISSING_FIELDS: &str = "Please fill in all fields";
pub const MSG_UPDATED: &str = "Booking updated successfully!";
pub const MSG_UPDATE_FAILED: &str = "Failed to update booking.";

/// The four mutually exclusive renderings of a booking list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListView<'a> {
    Loading,
    Error { message: &'a str },
    Empty,
    List { bookings: &'a [BookingRecord] },
}

/// Outcome of a list fetch, shared with the "my bookings" page.
#[derive(Debug, Clone, Default)]
pub(crate) enum LoadState {
    #[default]
    Loading,
    Failed(String),
    Loaded,
}

/// Map a fetch failure to the message shown in place of the list.
pub(crate) fn load_error_message(err: &PortalError) -> String {
    match err {
        PortalError::Remote { message, .. } => {
            message.clone().unwrap_or_else(|| MSG_LOAD_FAILED.into())
        }
        _ => MSG_LOAD_ERROR.into(),
    }
}

pub(crate) fn view<'a>(load: &'a LoadState, bookings: &'a [BookingRecord]) -> ListView<'a> {
    match load {
        LoadState::Loading => ListView::Loading,
        LoadState::Failed(message) => ListView::Error { message },
        LoadState::Loaded if bookings.is_empty() => ListView::Empty,
        LoadState::Loaded => ListView::List { bookings },
    }
}

/// Required fields and date order of an admin edit.
pub fn validate_update(f: &BookingUpdate) -> Result<(), PortalError> {
    if f.car_model.is_empty() || f.pickup_date.is_empty() || f.return_date.is_empty() || f.status.is_empty() {
        return Err(PortalError::Validation(MSG_EDIT_MISSING_FIELDS.into()));
    }
    check_date_order(&f.pickup_date, &f.return_date)
}

/// Editable subset of the record currently open for editing.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingEditor {
    pub booking_id: String,
    pub fields: BookingUpdate,
}

/// Admin view over every booking, with inline edit-and-resubmit.
#[derive(Debug, Default)]
pub struct AdminBookingList {
    load: LoadState,
    bookings: Vec<BookingRecord>,
    editor: Option<BookingEditor>,
    message: Option<String>,
}

impl AdminBookingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ListView<'_> {
        view(&self.load, &self.bookings)
    }

    pub fn bookings(&self) -> &[BookingRecord] {
        &self.bookings
    }

    pub fn editor(&self) -> Option<&BookingEditor> {
        self.editor.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub async fn load<B: RentalBackend>(&mut self, backend: &B, bearer: &str) {
        match backend.all_bookings(bearer).await {
            Ok(bookings) => {
                self.bookings = bookings;
                self.load = LoadState::Loaded;
            }
            Err(e) => {
                warn!("Error fetching bookings: {}", e);
                self.load = LoadState::Failed(load_error_message(&e));
            }
        }
    }

    /// Open the editor on one record, seeded from its current values.
    pub fn begin_edit(&mut self, booking_id: &str) -> Result<&mut BookingEditor, PortalError> {
        let record = self
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| PortalError::NotFound(format!("Unknown booking: {booking_id}")))?;
        let editor = BookingEditor {
            booking_id: record.id.clone(),
            fields: BookingUpdate::from_record(record),
        };
        Ok(self.editor.insert(editor))
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    /// Validate the open edit and submit it with one PUT. On success the one
    /// matching record is replaced in a rebuilt list; on failure nothing
    /// changes except the message.
    pub async fn save<B: RentalBackend>(&mut self, backend: &B, bearer: &str) -> Result<String, PortalError> {
        let editor = self
            .editor
            .clone()
            .ok_or_else(|| PortalError::Validation("No booking is being edited".into()))?;

        let f = &editor.fields;
        if let Err(e) = validate_update(f) {
            return Err(self.fail(e));
        }

        match backend.update_booking(bearer, &editor.booking_id, f).await {
            Ok(_) => {
                self.bookings = self
                    .bookings
                    .iter()
                    .map(|b| {
                        if b.id == editor.booking_id {
                            f.apply_to(b)
                        } else {
                            b.clone()
                        }
                    })
                    .collect();
                self.editor = None;
                self.message = Some(MSG_UPDATED.into());
                info!("Booking {} updated", editor.booking_id);
                BOOKING_UPDATES_COUNTER.with_label_values(&["succeeded"]).inc();
                Ok(MSG_UPDATED.into())
            }
            Err(PortalError::Remote { status, message }) => {
                warn!("Booking {} update rejected ({})", editor.booking_id, status);
                BOOKING_UPDATES_COUNTER.with_label_values(&["rejected"]).inc();
                let message = message.unwrap_or_else(|| MSG_UPDATE_FAILED.into());
                Err(self.fail(PortalError::Remote { status, message: Some(message) }))
            }
            Err(e) => {
                warn!("Error updating booking {}: {}", editor.booking_id, e);
                BOOKING_UPDATES_COUNTER.with_label_values(&["error"]).inc();
                self.message = Some(MSG_UPDATE_FAILED.into());
                Err(e)
            }
        }
    }

    fn fail(&mut self, e: PortalError) -> PortalError {
        self.message = Some(e.to_string());
        e
    }
}
