use tracing::warn;

use crate::{
    models::booking::BookingRecord,
    services::{
        admin_bookings::{load_error_message, view, ListView, LoadState},
        api::RentalBackend,
    },
};

/// Read-only list of the signed-in user's own bookings.
#[derive(Debug, Default)]
pub struct MyBookingList {
    load: LoadState,
    bookings: Vec<BookingRecord>,
}

impl MyBookingList {
    pub fn view(&self) -> ListView<'_> {
        view(&self.load, &self.bookings)
    }

    pub async fn load<B: RentalBackend>(&mut self, backend: &B, bearer: &str) {
        match backend.my_bookings(bearer).await {
            Ok(bookings) => {
                self.bookings = bookings;
                self.load = LoadState::Loaded;
            }
            Err(e) => {
                warn!("Error fetching own bookings: {}", e);
                self.load = LoadState::Failed(load_error_message(&e));
            }
        }
    }
}
