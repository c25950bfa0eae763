use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rental_price: Option<f64>,
    #[serde(default)]
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub telephone: String,
}

/// Booking status as reported upstream; unrecognized values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    #[default]
    Pending,
    Completed,
    Other(String),
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => BookingStatus::Pending,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Other(s),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Completed => "completed",
            BookingStatus::Other(s) => s,
        }
    }
}

/// A booking owned by the external API. Fields this crate does not model are
/// preserved in `extra` so re-serialization is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub car_model: String,
    #[serde(default)]
    pub pickup_date: String,
    #[serde(default)]
    pub return_date: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of POST /api/bookings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    #[serde(default)]
    pub car_model: String,
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub pickup_date: String,
    #[serde(default)]
    pub return_date: String,
}

/// Body of PUT /api/admins/bookings/{id}.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    #[serde(default)]
    pub car_model: String,
    #[serde(default)]
    pub pickup_date: String,
    #[serde(default)]
    pub return_date: String,
    #[serde(default)]
    pub status: String,
}

impl BookingUpdate {
    pub fn from_record(record: &BookingRecord) -> Self {
        Self {
            car_model: record.car_model.clone(),
            pickup_date: record.pickup_date.clone(),
            return_date: record.return_date.clone(),
            status: record.status.as_str().to_string(),
        }
    }

    /// Copy of `record` with the editable fields replaced.
    pub fn apply_to(&self, record: &BookingRecord) -> BookingRecord {
        BookingRecord {
            car_model: self.car_model.clone(),
            pickup_date: self.pickup_date.clone(),
            return_date: self.return_date.clone(),
            status: BookingStatus::from(self.status.clone()),
            ..record.clone()
        }
    }
}
