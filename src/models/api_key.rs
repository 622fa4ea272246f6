//! API Key model for authentication.
//!
//! API keys authenticate the service clients calling this API. Only the
//! SHA-256 hash of a key is stored.

use chrono::{DateTime, Utc};

/// Represents an API key record from the database.
///
/// When a request arrives with `Authorization: Bearer <key>`, the key is
/// hashed with SHA-256 and looked up by `key_hash`. Inactive keys are
/// rejected, which allows revoking access without deleting the row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    /// Unique identifier for this API key
    pub id: i64,

    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    /// Human-readable name of the client using this key
    pub business_name: String,

    /// Timestamp when this API key was created
    pub created_at: DateTime<Utc>,

    /// Whether this API key is currently active
    pub is_active: bool,
}
