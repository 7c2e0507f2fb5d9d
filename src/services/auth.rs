use subtle::ConstantTimeEq;

use crate::crypto::field::FieldCodec;
use crate::crypto::mask;
use crate::crypto::token::{Claims, Role};
use crate::error::{AppError, Result};
use crate::models::staff::StaffRecord;
use crate::repositories::{admin as admin_repo, staff as staff_repo};
use crate::state::AppState;

/// The result of a successful login.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    /// The claims the issued token carries.
    pub claims: Claims,
    /// The masked identity number for the response payload. `None` for
    /// administrators.
    pub id_card_masked: Option<String>,
    /// The issued bearer token.
    pub token: String,
}

/// Verifies a login attempt and mints a session token.
///
/// Every failure path returns the same `InvalidCredentials` error, whether
/// the principal exists or not, so accounts cannot be enumerated through
/// login responses.
pub async fn verify_login(
    state: &AppState,
    principal: &str,
    password: &str,
    role: Role,
) -> Result<AuthenticatedUser> {
    match role {
        Role::Admin => verify_admin(state, principal, password).await,
        Role::Teacher => verify_teacher(state, principal, password).await,
    }
}

/// Admin login: exact username+password match against the stored plaintext.
async fn verify_admin(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<AuthenticatedUser> {
    let admin = admin_repo::find_by_credentials(&state.db, username, password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let claims = Claims::admin(admin.id, admin.username.clone());
    let token = state.tokens.issue(&claims)?;

    tracing::info!("✅ Admin authenticated: {}", admin.username);

    Ok(AuthenticatedUser {
        claims,
        id_card_masked: None,
        token,
    })
}

/// Teacher login by work id or identity number.
///
/// The identity-number lookup covers both storage generations: the submitted
/// principal is encrypted to match encrypted rows, and also tried raw to
/// match legacy plaintext rows.
async fn verify_teacher(
    state: &AppState,
    principal: &str,
    password: &str,
) -> Result<AuthenticatedUser> {
    let encrypted_principal = state.codec.encrypt(principal)?;

    let mut candidates = staff_repo::find_by_work_id(&state.db, principal).await?;
    if candidates.is_empty() {
        candidates =
            staff_repo::find_by_id_card(&state.db, &encrypted_principal, principal).await?;
    }

    if candidates.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let matched = select_candidate(&state.codec, &candidates, password)
        .ok_or(AppError::InvalidCredentials)?;

    tracing::info!("✅ Teacher authenticated: {}", matched.work_id);

    build_teacher_session(state, matched)
}

/// Picks the first candidate whose stored password matches, in storage
/// order. Every candidate is attempted whatever its storage shape, so mixed
/// legacy/encrypted rows behind one lookup key all get a chance.
fn select_candidate<'a>(
    codec: &FieldCodec,
    candidates: &'a [StaffRecord],
    submitted: &str,
) -> Option<&'a StaffRecord> {
    candidates
        .iter()
        .find(|record| password_matches(codec, &record.password, submitted))
}

/// Checks a submitted password against one stored representation.
///
/// Encrypted storage (contains `:`) is decrypted and the plaintexts compared;
/// ciphertexts are never compared directly since each encryption draws a
/// fresh IV. A stored value that looks encrypted but fails to decrypt is
/// skipped, not treated as legacy. Legacy storage is compared directly.
pub fn password_matches(codec: &FieldCodec, stored: &str, submitted: &str) -> bool {
    if stored.contains(':') {
        match codec.decrypt_strict(stored) {
            Ok(decrypted) => constant_time_eq(&decrypted, submitted),
            Err(e) => {
                tracing::warn!("⚠️  Stored password undecryptable, skipping candidate: {}", e);
                false
            }
        }
    } else {
        constant_time_eq(stored, submitted)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Builds the session for a matched staff record: decrypt the identity
/// number, mask it for the response, and mint a token of non-sensitive
/// claims only. The cleartext identity number never enters the token.
fn build_teacher_session(state: &AppState, record: &StaffRecord) -> Result<AuthenticatedUser> {
    let id_card = state.codec.decrypt(&record.id_card);
    let id_card_masked = mask::mask_id_number(&id_card);

    let claims = Claims::teacher(
        record.work_id.clone(),
        record.name.clone(),
        record.department.clone(),
        record.position_level.clone(),
    );
    let token = state.tokens.issue(&claims)?;

    Ok(AuthenticatedUser {
        claims,
        id_card_masked: Some(id_card_masked),
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn codec() -> FieldCodec {
        FieldCodec::from_secret("verifier-test-secret").unwrap()
    }

    fn staff(work_id: &str, stored_password: &str) -> StaffRecord {
        StaffRecord {
            work_id: work_id.to_string(),
            id_card: String::new(),
            password: stored_password.to_string(),
            name: "张三".to_string(),
            department: None,
            position_level: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn encrypted_password_matches_by_decrypted_comparison() {
        let c = codec();
        let stored = c.encrypt("s3cret").unwrap();
        assert!(password_matches(&c, &stored, "s3cret"));
        assert!(!password_matches(&c, &stored, "wrong"));
    }

    #[test]
    fn two_encryptions_of_the_same_password_both_match() {
        let c = codec();
        let a = c.encrypt("s3cret").unwrap();
        let b = c.encrypt("s3cret").unwrap();
        assert_ne!(a, b);
        assert!(password_matches(&c, &a, "s3cret"));
        assert!(password_matches(&c, &b, "s3cret"));
    }

    #[test]
    fn legacy_password_matches_by_direct_comparison() {
        let c = codec();
        assert!(password_matches(&c, "plain-pass", "plain-pass"));
        assert!(!password_matches(&c, "plain-pass", "other"));
    }

    #[test]
    fn undecryptable_stored_password_is_skipped_not_compared() {
        let c = codec();
        // Looks encrypted but is not; must not fall back to a raw comparison.
        let stored = "not-hex:deadbeef";
        assert!(!password_matches(&c, stored, stored));
        assert!(!password_matches(&c, stored, "deadbeef"));
    }

    #[test]
    fn mixed_legacy_and_encrypted_candidates_are_both_attempted() {
        let c = codec();
        let rows = vec![
            staff("T1", "old-pass"),
            staff("T2", &c.encrypt("s3cret").unwrap()),
        ];

        // The encrypted row matches even though a legacy row sits before it.
        let matched = select_candidate(&c, &rows, "s3cret").unwrap();
        assert_eq!(matched.work_id, "T2");

        // And the legacy row still matches directly.
        let matched = select_candidate(&c, &rows, "old-pass").unwrap();
        assert_eq!(matched.work_id, "T1");

        assert!(select_candidate(&c, &rows, "neither").is_none());
    }

    #[test]
    fn first_matching_candidate_wins_in_storage_order() {
        let c = codec();
        let legacy = staff("A", "same-pass");
        let encrypted = staff("B", &c.encrypt("same-pass").unwrap());

        let rows = vec![legacy.clone(), encrypted.clone()];
        assert_eq!(select_candidate(&c, &rows, "same-pass").unwrap().work_id, "A");

        let rows = vec![encrypted, legacy];
        assert_eq!(select_candidate(&c, &rows, "same-pass").unwrap().work_id, "B");
    }

    #[test]
    fn foreign_ciphertext_never_matches_its_own_text() {
        let ours = codec();
        let theirs = FieldCodec::from_secret("another-key").unwrap();
        let stored = theirs.encrypt("s3cret").unwrap();
        assert!(!password_matches(&ours, &stored, "s3cret"));
        assert!(!password_matches(&ours, &stored, &stored));
    }
}
