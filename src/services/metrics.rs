use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "portal_logins_total",
        "Login attempts by outcome",
        &["status"]
    ).unwrap();

    pub static ref GUARD_REDIRECTS_COUNTER: CounterVec = register_counter_vec!(
        "portal_guard_redirects_total",
        "Protected navigations redirected for lack of a valid session",
        &["path"]
    ).unwrap();

    pub static ref BOOKINGS_COUNTER: CounterVec = register_counter_vec!(
        "portal_booking_submissions_total",
        "Booking submissions by outcome",
        &["status"]
    ).unwrap();

    pub static ref BOOKING_UPDATES_COUNTER: CounterVec = register_counter_vec!(
        "portal_admin_booking_updates_total",
        "Admin booking edits by outcome",
        &["status"]
    ).unwrap();
}
