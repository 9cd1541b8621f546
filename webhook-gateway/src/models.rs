use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{providers, security_logs, webhook_events};

// --- Provider ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = providers)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    /// Never serialized — the admin API never echoes a provider's secret back.
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub forwarding_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = providers)]
pub struct NewProvider {
    pub name: String,
    pub secret_key: String,
    pub forwarding_url: String,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = providers)]
pub struct ProviderChangeset {
    pub secret_key: Option<String>,
    pub forwarding_url: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

// --- WebhookEvent ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = webhook_events)]
pub struct WebhookEvent {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub request_id: String,
    pub payload: serde_json::Value,
    pub headers: serde_json::Value,
    pub signature_valid: bool,
    pub forwarded: bool,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub received_at: DateTime<Utc>,
    pub forwarded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = webhook_events)]
pub struct NewWebhookEvent {
    pub provider_id: Uuid,
    pub request_id: String,
    pub payload: serde_json::Value,
    pub headers: serde_json::Value,
    pub signature_valid: bool,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = webhook_events)]
pub struct ForwardingStatusUpdate {
    pub forwarded: bool,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub forwarded_at: Option<DateTime<Utc>>,
}

// --- SecurityEvent ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = security_logs)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub provider_name: String,
    pub event_type: String,
    pub ip_address: String,
    pub request_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = security_logs)]
pub struct NewSecurityEvent {
    pub provider_name: String,
    pub event_type: String,
    pub ip_address: String,
    pub request_id: Option<String>,
    pub details: Option<serde_json::Value>,
}
