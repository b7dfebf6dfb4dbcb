//! Booking model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::flight::Flight;

/// Booking lifecycle state. Cancellation is a transition to `cancelled`,
/// never a row deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl Default for BookingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown booking status: {}", s)),
        }
    }
}

/// Passenger contact details, stored as a JSON object in the
/// `passenger_details` TEXT column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Helper to parse passenger details JSON from the database
pub fn parse_passenger_details(json: &str) -> PassengerDetails {
    serde_json::from_str(json).unwrap_or_default()
}

/// A booking row. `user_id` and `flight_id` are plain references checked at
/// creation time only.
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub flight_id: String,
    pub status: BookingStatus,
    pub booking_date: String,
    pub passenger_details: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub flight_id: Option<String>,
    pub passenger_details: Option<PassengerDetails>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
}

/// Wire shape of a booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub flight_id: String,
    pub status: BookingStatus,
    pub booking_date: String,
    pub passenger_details: PassengerDetails,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let passenger_details = parse_passenger_details(&booking.passenger_details);
        Self {
            id: booking.id,
            user_id: booking.user_id,
            flight_id: booking.flight_id,
            status: booking.status,
            booking_date: booking.booking_date,
            passenger_details,
        }
    }
}

/// A booking with its referenced flight resolved inline. `flight` is null
/// when the flight was deleted after the booking was made.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithFlight {
    pub id: String,
    pub user_id: String,
    pub flight_id: String,
    pub status: BookingStatus,
    pub booking_date: String,
    pub passenger_details: PassengerDetails,
    pub flight: Option<Flight>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_default_is_pending() {
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
    }

    #[test]
    fn test_status_round_trip() {
        for (text, status) in [
            ("pending", BookingStatus::Pending),
            ("confirmed", BookingStatus::Confirmed),
            ("cancelled", BookingStatus::Cancelled),
        ] {
            assert_eq!(BookingStatus::from_str(text).unwrap(), status);
            assert_eq!(status.to_string(), text);
        }
        assert!(BookingStatus::from_str("refunded").is_err());
    }

    #[test]
    fn test_parse_passenger_details() {
        let details =
            parse_passenger_details(r#"{"name":"Ada","email":"ada@example.com","phone":"123"}"#);
        assert_eq!(details.name, "Ada");
        assert_eq!(details.email, "ada@example.com");
        assert_eq!(details.phone, "123");
    }

    #[test]
    fn test_parse_passenger_details_tolerates_bad_json() {
        assert_eq!(parse_passenger_details("not json"), PassengerDetails::default());
        assert_eq!(parse_passenger_details("{}"), PassengerDetails::default());
    }

    #[test]
    fn test_booking_response_wire_format() {
        let booking = Booking {
            id: "b-1".to_string(),
            user_id: "u-1".to_string(),
            flight_id: "f-1".to_string(),
            status: BookingStatus::Pending,
            booking_date: "2024-01-01T00:00:00Z".to_string(),
            passenger_details: r#"{"name":"Ada","email":"a@b.c","phone":"1"}"#.to_string(),
        };
        let json = serde_json::to_value(BookingResponse::from(booking)).unwrap();
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["flightId"], "f-1");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["passengerDetails"]["name"], "Ada");
    }
}
