pub mod admin_logs;
pub mod admin_providers;
pub mod admin_webhooks;
pub mod health;
pub mod ingest;

use uuid::Uuid;
use webhook_gateway_shared::errors::{AppError, AppResult, ErrorCode};

/// Path params arrive as `String`, not `Uuid`, so a malformed id is rejected
/// through the admin plane's `{success:false,error:{code,message}}` envelope
/// instead of Axum's default `PathRejection` body.
pub(crate) fn parse_id(raw: &str, code: ErrorCode, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::new(code, format!("invalid {what} id")))
}
