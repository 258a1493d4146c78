//! User account models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use selah_core::capability::Role;
use selah_core::types::{DbId, Timestamp};

/// A row from the `users` table.
///
/// `role` holds the text form of [`selah_core::capability::Role`]; the CHECK
/// constraint keeps it to the three known values.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub role: String,
    pub created_at: Timestamp,
}

/// DTO for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub role: Role,
}
