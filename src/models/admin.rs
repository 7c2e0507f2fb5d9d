/// An administrator account.
///
/// Admin passwords are stored and compared as plaintext, unlike staff
/// passwords, which may be encrypted at rest. The asymmetry is kept for
/// compatibility with the existing admins table; changing it means a data
/// migration, not a code change.
#[derive(Clone, Debug)]
pub struct AdminRecord {
    /// The unique identifier for the administrator.
    pub id: i32,
    /// The administrator's login name.
    pub username: String,
}
