use chrono::{DateTime, Utc};

/// A staff record as stored.
///
/// `id_card` and `password` may each be in legacy plaintext or encrypted
/// (`iv:ciphertext`) form; callers go through the field codec before using
/// either.
#[derive(Clone, Debug)]
pub struct StaffRecord {
    /// The unique work identifier staff log in with.
    pub work_id: String,
    /// The identity number, legacy or encrypted at rest.
    pub id_card: String,
    /// The stored password representation, legacy or encrypted at rest.
    pub password: String,
    /// The staff member's name.
    pub name: String,
    /// The staff member's department.
    pub department: Option<String>,
    /// The staff member's position level.
    pub position_level: Option<String>,
    /// The timestamp when the record was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the record was last updated.
    pub updated_at: DateTime<Utc>,
}
