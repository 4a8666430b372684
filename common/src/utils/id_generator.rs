//! Unique ID generator.

use uuid::Uuid;

/// Generates unique identifiers for various entities.
pub struct IdGenerator;

impl IdGenerator {
    /// Generates a unique connection profile ID (UUID v4).
    pub fn profile_id() -> String {
        Uuid::new_v4().to_string()
    }
}
