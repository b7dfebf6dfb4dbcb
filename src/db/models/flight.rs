//! Flight record model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A flight as stored and as served. `logo` is the stored filename of the
/// uploaded airline logo, served back under `/uploads/<logo>`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: String,
    pub flight_number: String,
    pub departure: String,
    pub arrival: String,
    pub time: String,
    pub logo: String,
    pub created_at: String,
    pub updated_at: String,
}
