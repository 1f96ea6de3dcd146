//! Principal extraction from identity headers set by the gateway.
//!
//! The gateway authenticates the caller and forwards `X-User-Id` (a UUID)
//! plus `X-Superuser: true` for administrators.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Principal;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const SUPERUSER_HEADER: &str = "X-Superuser";

/// The caller, if the request carries a valid identity
#[derive(Debug, Clone, Copy)]
pub struct MaybePrincipal(pub Option<Principal>);

impl MaybePrincipal {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.map(|p| p.user_id)
    }
}

fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())?;

    let is_superuser = headers
        .get(SUPERUSER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    Some(Principal {
        user_id,
        is_superuser,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(principal_from_headers(&parts.headers)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers).ok_or(AppError::Unauthorized)
    }
}
