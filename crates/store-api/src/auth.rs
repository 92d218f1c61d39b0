//! # Caller Identity
//!
//! Authentication itself lives in front of this service; requests arrive
//! with an `X-User-Id` header naming the already-authenticated caller. The
//! extractor parses the header; whether the id resolves to a known customer
//! is checked by the store on every operation.

use crate::handlers::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;

/// Header naming the authenticated caller
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the admin shared key
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// The authenticated caller's user id
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub u64);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Caller)
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("Missing or invalid X-User-Id header", 400)),
                )
            })
    }
}
