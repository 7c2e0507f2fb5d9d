use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use http::header::AUTHORIZATION;

use crate::{
    crypto::token::{Claims, Role},
    error::{AppError, Result},
    state::AppState,
};

/// Extracts the bearer token from the `Authorization` header.
fn extract_bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// A middleware that requires a verified session token.
///
/// Verification is the authoritative server-side check: signature, issuer,
/// audience, and expiry. On success the token's claims are attached to the
/// request for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer_token(&request).ok_or_else(|| {
        tracing::warn!("❌ No bearer token on {}", request.uri().path());
        AppError::TokenInvalid
    })?;

    let claims = state.tokens.verify(&token)?;

    tracing::debug!("🔑 Authenticated request, role {:?}", claims.role);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// A middleware that requires the authenticated caller to be an admin.
///
/// Must be layered inside `require_auth`, which attaches the claims.
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::TokenInvalid)?;

    if claims.role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}
