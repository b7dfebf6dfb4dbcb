//! Flight catalogue handlers.
//!
//! Reads are public; every mutation sits behind the admin guard and accepts
//! a multipart form so the logo image can ride along with the text fields.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::flight::Flight;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::MessageResponse;

/// Upload cap for logo images. Checked against the decoded part, so the
/// route body limit must sit above this.
pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

/// A decoded `logo` part.
struct LogoUpload {
    original_name: String,
    data: bytes::Bytes,
}

/// Text fields plus the optional logo from a flight multipart form. Empty
/// text parts are treated the same as absent ones.
#[derive(Default)]
struct FlightForm {
    flight_number: Option<String>,
    departure: Option<String>,
    arrival: Option<String>,
    time: Option<String>,
    logo: Option<LogoUpload>,
}

async fn read_flight_form(mut multipart: Multipart) -> Result<FlightForm, ApiError> {
    let mut form = FlightForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "flightNumber" => form.flight_number = non_empty(field.text().await?),
            "departure" => form.departure = non_empty(field.text().await?),
            "arrival" => form.arrival = non_empty(field.text().await?),
            "time" => form.time = non_empty(field.text().await?),
            "logo" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    tracing::warn!(content_type = %content_type, "Rejected non-image logo upload");
                    return Err(ApiError::unsupported_media_type(
                        "Only image files are allowed",
                    ));
                }

                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "logo".to_string());

                let data = field.bytes().await?;
                if data.len() > MAX_LOGO_BYTES {
                    tracing::warn!(size = data.len(), "Rejected oversized logo upload");
                    return Err(ApiError::payload_too_large("Logo exceeds the 5 MiB limit"));
                }

                form.logo = Some(LogoUpload {
                    original_name,
                    data,
                });
            }
            // Unknown parts are ignored
            _ => {}
        }
    }

    Ok(form)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub async fn list_flights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Flight>>, ApiError> {
    let flights = sqlx::query_as::<_, Flight>("SELECT * FROM flights ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(flights))
}

pub async fn create_flight(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Flight>, ApiError> {
    let form = read_flight_form(multipart).await?;

    let mut errors = ValidationErrorBuilder::new();
    if form.flight_number.is_none() {
        errors.add("flightNumber", "Flight number is required");
    }
    if form.departure.is_none() {
        errors.add("departure", "Departure is required");
    }
    if form.arrival.is_none() {
        errors.add("arrival", "Arrival is required");
    }
    if form.time.is_none() {
        errors.add("time", "Time is required");
    }
    errors.finish()?;

    let logo = form
        .logo
        .ok_or_else(|| ApiError::bad_request("Logo image is required"))?;

    let stored_logo = state
        .logos
        .put(&logo.original_name, &logo.data)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store logo: {}", e);
            ApiError::internal("Failed to store logo")
        })?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO flights (id, flight_number, departure, arrival, time, logo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&form.flight_number)
    .bind(&form.departure)
    .bind(&form.arrival)
    .bind(&form.time)
    .bind(&stored_logo)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let flight = sqlx::query_as::<_, Flight>("SELECT * FROM flights WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(flight_id = %flight.id, flight_number = %flight.flight_number, "Flight created");

    Ok(Json(flight))
}

pub async fn update_flight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Flight>, ApiError> {
    let form = read_flight_form(multipart).await?;

    let existing = sqlx::query_as::<_, Flight>("SELECT * FROM flights WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Flight not found"))?;

    // Merge: absent parts keep the stored values
    let flight_number = form.flight_number.unwrap_or(existing.flight_number);
    let departure = form.departure.unwrap_or(existing.departure);
    let arrival = form.arrival.unwrap_or(existing.arrival);
    let time = form.time.unwrap_or(existing.time);

    let logo = match form.logo {
        Some(upload) => state
            .logos
            .put(&upload.original_name, &upload.data)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store logo: {}", e);
                ApiError::internal("Failed to store logo")
            })?,
        None => existing.logo,
    };

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE flights
        SET flight_number = ?, departure = ?, arrival = ?, time = ?, logo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&flight_number)
    .bind(&departure)
    .bind(&arrival)
    .bind(&time)
    .bind(&logo)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let flight = sqlx::query_as::<_, Flight>("SELECT * FROM flights WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(flight))
}

/// Deleting a missing flight still returns 200. Bookings referencing the
/// flight are kept and resolve their `flight` field to null from then on.
pub async fn delete_flight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM flights WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() > 0 {
        tracing::info!(flight_id = %id, "Flight deleted");
    }

    Ok(Json(MessageResponse {
        message: "Flight deleted".to_string(),
    }))
}
