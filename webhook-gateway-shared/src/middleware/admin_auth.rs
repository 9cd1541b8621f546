use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorCode};

/// Implemented by the service's `AppState` so the extractor never reaches into
/// the environment directly — the admin secret flows through the one settings
/// loader like every other config value.
pub trait AdminSecretProvider {
    fn admin_secret(&self) -> &str;
}

impl<T: AdminSecretProvider> AdminSecretProvider for Arc<T> {
    fn admin_secret(&self) -> &str {
        (**self).admin_secret()
    }
}

/// Gate for every `/admin/*` route: a single shared bearer secret, compared in
/// constant time. Not an identity — there is no notion of "which admin" here,
/// only "is this caller allowed at all".
pub struct AdminUser;

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: AdminSecretProvider + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        if constant_time_eq(token.as_bytes(), state.admin_secret().as_bytes()) {
            Ok(AdminUser)
        } else {
            Err(AppError::new(ErrorCode::Unauthorized, "invalid admin credentials"))
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))
}

/// Hashes both sides to a fixed width before comparing so the comparison itself
/// leaks no timing information about the secret's length.
fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    let provided_hash = Sha256::digest(provided);
    let expected_hash = Sha256::digest(expected);
    provided_hash.ct_eq(&expected_hash).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secrets_compare_equal() {
        assert!(constant_time_eq(b"topsecret", b"topsecret"));
    }

    #[test]
    fn mismatched_secrets_compare_unequal() {
        assert!(!constant_time_eq(b"topsecret", b"wrongsecret"));
    }

    #[test]
    fn different_lengths_compare_unequal() {
        assert!(!constant_time_eq(b"short", b"a-much-longer-secret"));
    }
}
