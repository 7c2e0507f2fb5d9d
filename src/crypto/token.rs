use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The issuer claim stamped into every token.
pub const ISSUER: &str = "user-system";
/// The audience claim stamped into every token.
pub const AUDIENCE: &str = "user-system-client";

/// Role carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Teacher,
    Admin,
}

/// The claim set carried by a session token.
///
/// Teacher tokens carry `workId`/`name`/`department`/`positionLevel`; admin
/// tokens carry `id`/`username`. The cleartext identity number is never a
/// claim. Time and issuer fields are stamped by [`TokenService::issue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "workId", default, skip_serializing_if = "Option::is_none")]
    pub work_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(
        rename = "positionLevel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub position_level: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
}

impl Claims {
    /// Claims for an authenticated teacher.
    pub fn teacher(
        work_id: String,
        name: String,
        department: Option<String>,
        position_level: Option<String>,
    ) -> Self {
        Self {
            id: None,
            username: None,
            work_id: Some(work_id),
            name: Some(name),
            department,
            position_level,
            role: Role::Teacher,
            iat: 0,
            exp: 0,
            iss: String::new(),
            aud: String::new(),
        }
    }

    /// Claims for an authenticated administrator.
    pub fn admin(id: i32, username: String) -> Self {
        Self {
            id: Some(id),
            username: Some(username),
            work_id: None,
            name: None,
            department: None,
            position_level: None,
            role: Role::Admin,
            iat: 0,
            exp: 0,
            iss: String::new(),
            aud: String::new(),
        }
    }
}

/// Issues and verifies signed, expiring session tokens.
///
/// The signing secret and default TTL are fixed at construction. `verify` is
/// the sole authority on a token; the [`peek`] helpers below exist for the
/// client side and must never gate an authorization decision.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Creates the service from the configured secret and TTL in days.
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Signs the claims with the default TTL.
    pub fn issue(&self, claims: &Claims) -> Result<String> {
        self.issue_with_ttl(claims, self.ttl)
    }

    /// Signs the claims, stamping `iat`, `exp`, issuer, and audience.
    ///
    /// Expiry is fixed at issuance and never extended afterwards.
    pub fn issue_with_ttl(&self, claims: &Claims, ttl: Duration) -> Result<String> {
        let now = Utc::now();

        let mut claims = claims.clone();
        claims.iat = now.timestamp();
        claims.exp = (now + ttl).timestamp();
        claims.iss = ISSUER.to_string();
        claims.aud = AUDIENCE.to_string();

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verifies signature, issuer, audience, and expiry.
    ///
    /// Any failure is an error; callers must treat all of them as
    /// unauthenticated. Expired and structurally-invalid tokens are
    /// distinguished only so logs can tell them apart.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_) => AppError::TokenInvalid,
                _ => AppError::TokenVerificationFailed,
            })
    }
}

/// Non-authoritative token inspection, mirroring what the SPA does locally.
///
/// Nothing here checks the signature. These helpers only parse the claim
/// segment and compare expiry against the local clock; server-side
/// [`TokenService::verify`] remains the sole authorization authority.
pub mod peek {
    use super::*;

    /// Parses the claim segment of a token without verifying the signature.
    ///
    /// Returns `None` unless the token has exactly three dot-separated
    /// segments and the middle one is base64url-encoded JSON claims.
    pub fn decode_claims(token: &str) -> Option<Claims> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
        sonic_rs::from_slice(&payload).ok()
    }

    /// Structure check plus a local expiry check. Never an auth decision.
    pub fn is_valid(token: &str) -> bool {
        match decode_claims(token) {
            Some(claims) => claims.exp == 0 || claims.exp > Utc::now().timestamp(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", 7)
    }

    #[test]
    fn issue_then_verify_returns_claims_with_role() {
        let svc = service();
        let claims = Claims::teacher(
            "T1001".to_string(),
            "张三".to_string(),
            Some("数学组".to_string()),
            Some("一级".to_string()),
        );

        let token = svc.issue(&claims).unwrap();
        let verified = svc.verify(&token).unwrap();

        assert_eq!(verified.role, Role::Teacher);
        assert_eq!(verified.work_id.as_deref(), Some("T1001"));
        assert_eq!(verified.name.as_deref(), Some("张三"));
        assert_eq!(verified.department.as_deref(), Some("数学组"));
        assert_eq!(verified.position_level.as_deref(), Some("一级"));
        assert_eq!(verified.iss, ISSUER);
        assert_eq!(verified.aud, AUDIENCE);
        assert!(verified.exp > verified.iat);
    }

    #[test]
    fn admin_claims_round_trip() {
        let svc = service();
        let token = svc.issue(&Claims::admin(3, "root".to_string())).unwrap();
        let verified = svc.verify(&token).unwrap();
        assert_eq!(verified.role, Role::Admin);
        assert_eq!(verified.id, Some(3));
        assert_eq!(verified.username.as_deref(), Some("root"));
        assert!(verified.work_id.is_none());
    }

    #[test]
    fn expired_token_fails_with_token_expired() {
        let svc = service();
        let claims = Claims::admin(1, "root".to_string());
        let token = svc.issue_with_ttl(&claims, Duration::seconds(-60)).unwrap();

        match svc.verify(&token) {
            Err(AppError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other),
        }
    }

    #[test]
    fn tampered_signature_fails_with_token_invalid() {
        let svc = service();
        let token = svc.issue(&Claims::admin(1, "root".to_string())).unwrap();

        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        match svc.verify(&tampered) {
            Err(AppError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other),
        }
    }

    #[test]
    fn wrong_secret_fails_with_token_invalid() {
        let token = service().issue(&Claims::admin(1, "root".to_string())).unwrap();
        let other = TokenService::new("different-secret", 7);

        match other.verify(&token) {
            Err(AppError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other),
        }
    }

    #[test]
    fn garbage_input_fails_with_token_invalid() {
        match service().verify("not-a-token") {
            Err(AppError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other),
        }
    }

    #[test]
    fn peek_decodes_claims_without_the_secret() {
        let svc = service();
        let token = svc
            .issue(&Claims::teacher(
                "T1001".to_string(),
                "张三".to_string(),
                None,
                None,
            ))
            .unwrap();

        let claims = peek::decode_claims(&token).unwrap();
        assert_eq!(claims.work_id.as_deref(), Some("T1001"));
        assert_eq!(claims.role, Role::Teacher);
        assert!(peek::is_valid(&token));
    }

    #[test]
    fn peek_rejects_malformed_and_expired_tokens() {
        assert!(peek::decode_claims("only.two").is_none());
        assert!(!peek::is_valid(""));
        assert!(!peek::is_valid("a.b"));

        let svc = service();
        let expired = svc
            .issue_with_ttl(&Claims::admin(1, "root".to_string()), Duration::seconds(-60))
            .unwrap();
        // Still structurally parseable, but locally expired.
        assert!(peek::decode_claims(&expired).is_some());
        assert!(!peek::is_valid(&expired));
    }
}
