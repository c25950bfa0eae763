pub mod admin_bookings;
pub mod api;
pub mod booking_form;
pub mod credentials;
pub mod metrics;
pub mod my_bookings;
pub mod navigation;
pub mod session;
