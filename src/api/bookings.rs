//! Booking handlers. Every route is user-scoped: the user id always comes
//! from the verified token, never from the request body, and lookups are
//! filtered by it so callers cannot see or touch other users' bookings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::booking::{
    parse_passenger_details, Booking, BookingResponse, BookingStatus, BookingWithFlight,
    CreateBookingRequest, UpdateBookingRequest,
};
use crate::db::models::flight::Flight;
use crate::AppState;

use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::MessageResponse;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if request.flight_id.as_deref().unwrap_or_default().is_empty() {
        errors.add("flightId", "Flight id is required");
    }
    if request.passenger_details.is_none() {
        errors.add("passengerDetails", "Passenger details are required");
    }
    errors.finish()?;

    let flight_id = request.flight_id.unwrap_or_default();
    let passenger_details = request.passenger_details.unwrap_or_default();

    // The flight must exist at creation time; later deletion is allowed
    let flight_exists: Option<(String,)> = sqlx::query_as("SELECT id FROM flights WHERE id = ?")
        .bind(&flight_id)
        .fetch_optional(&state.db)
        .await?;
    if flight_exists.is_none() {
        return Err(ApiError::bad_request("Unknown flight"));
    }

    let id = Uuid::new_v4().to_string();
    let booking_date = chrono::Utc::now().to_rfc3339();
    let details_json = serde_json::to_string(&passenger_details)
        .map_err(|e| ApiError::internal(format!("Failed to encode passenger details: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO bookings (id, user_id, flight_id, status, booking_date, passenger_details)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.user_id)
    .bind(&flight_id)
    .bind(BookingStatus::Pending)
    .bind(&booking_date)
    .bind(&details_json)
    .execute(&state.db)
    .await?;

    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(booking_id = %booking.id, user_id = %user.user_id, flight_id = %flight_id, "Booking created");

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// Row shape for the booking list join. Flight columns are nullable because
/// the flight may have been deleted since the booking was made.
#[derive(sqlx::FromRow)]
struct BookingFlightRow {
    id: String,
    user_id: String,
    flight_id: String,
    status: BookingStatus,
    booking_date: String,
    passenger_details: String,
    f_id: Option<String>,
    f_flight_number: Option<String>,
    f_departure: Option<String>,
    f_arrival: Option<String>,
    f_time: Option<String>,
    f_logo: Option<String>,
    f_created_at: Option<String>,
    f_updated_at: Option<String>,
}

impl From<BookingFlightRow> for BookingWithFlight {
    fn from(row: BookingFlightRow) -> Self {
        let flight = match (
            row.f_id,
            row.f_flight_number,
            row.f_departure,
            row.f_arrival,
            row.f_time,
            row.f_logo,
            row.f_created_at,
            row.f_updated_at,
        ) {
            (
                Some(id),
                Some(flight_number),
                Some(departure),
                Some(arrival),
                Some(time),
                Some(logo),
                Some(created_at),
                Some(updated_at),
            ) => Some(Flight {
                id,
                flight_number,
                departure,
                arrival,
                time,
                logo,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            user_id: row.user_id,
            flight_id: row.flight_id,
            status: row.status,
            booking_date: row.booking_date,
            passenger_details: parse_passenger_details(&row.passenger_details),
            flight,
        }
    }
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BookingWithFlight>>, ApiError> {
    let rows = sqlx::query_as::<_, BookingFlightRow>(
        r#"
        SELECT b.id, b.user_id, b.flight_id, b.status, b.booking_date, b.passenger_details,
               f.id AS f_id, f.flight_number AS f_flight_number, f.departure AS f_departure,
               f.arrival AS f_arrival, f.time AS f_time, f.logo AS f_logo,
               f.created_at AS f_created_at, f.updated_at AS f_updated_at
        FROM bookings b
        LEFT JOIN flights f ON f.id = b.flight_id
        WHERE b.user_id = ?
        ORDER BY b.booking_date DESC
        "#,
    )
    .bind(&user.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(BookingWithFlight::from).collect()))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let status = request
        .status
        .ok_or_else(|| ApiError::validation_field("status", "Status is required"))?;

    // Scoped by user_id, so a foreign booking looks the same as a missing one
    let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND user_id = ?")
        .bind(status)
        .bind(&id)
        .bind(&user.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }

    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(booking_id = %id, status = %status, "Booking updated");

    Ok(Json(BookingResponse::from(booking)))
}

/// Cancellation keeps the row for history and flips its status.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND user_id = ?")
        .bind(BookingStatus::Cancelled)
        .bind(&id)
        .bind(&user.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }

    tracing::info!(booking_id = %id, "Booking cancelled");

    Ok(Json(MessageResponse {
        message: "Booking cancelled successfully".to_string(),
    }))
}
