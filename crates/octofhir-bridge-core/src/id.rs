//! Identifier generation for newly created entities.

/// Generates a fresh entity identifier (UUID v4).
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
