use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;
use webhook_gateway_shared::clients::DbPool;

use crate::models::{NewProvider, Provider, ProviderChangeset};
use crate::schema::{providers, webhook_events};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a provider named {0:?} already exists")]
    NameTaken(String),
    #[error("provider has webhook events and cannot be deleted")]
    HasEvents,
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

fn is_unique_violation(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Looked up by C7 on every ingestion request. Callers must treat
/// `is_active=false` the same as "absent" — the ingestion pipeline returns the
/// same 404 either way so it never discloses which.
pub fn lookup_by_name(pool: &DbPool, name: &str) -> Result<Option<Provider>, RegistryError> {
    let mut conn = pool.get()?;
    providers::table
        .filter(providers::name.eq(name))
        .first::<Provider>(&mut conn)
        .optional()
        .map_err(RegistryError::from)
}

pub fn create(
    pool: &DbPool,
    name: &str,
    secret_key: &str,
    forwarding_url: &str,
) -> Result<Provider, RegistryError> {
    let mut conn = pool.get()?;
    let new_provider = NewProvider {
        name: name.to_string(),
        secret_key: secret_key.to_string(),
        forwarding_url: forwarding_url.to_string(),
    };

    diesel::insert_into(providers::table)
        .values(&new_provider)
        .get_result(&mut conn)
        .map_err(|err| {
            if is_unique_violation(&err) {
                RegistryError::NameTaken(name.to_string())
            } else {
                RegistryError::Database(err)
            }
        })
}

pub fn get_by_name(pool: &DbPool, name: &str) -> Result<Option<Provider>, RegistryError> {
    lookup_by_name(pool, name)
}

pub fn get_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Provider>, RegistryError> {
    let mut conn = pool.get()?;
    providers::table
        .find(id)
        .first::<Provider>(&mut conn)
        .optional()
        .map_err(RegistryError::from)
}

pub fn list(pool: &DbPool, offset: i64, limit: i64) -> Result<(Vec<Provider>, i64), RegistryError> {
    let mut conn = pool.get()?;
    let items = providers::table
        .order(providers::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Provider>(&mut conn)?;
    let total = providers::table.count().get_result(&mut conn)?;
    Ok((items, total))
}

#[derive(Debug, Default)]
pub struct ProviderUpdate {
    pub secret_key: Option<String>,
    pub forwarding_url: Option<String>,
    pub is_active: Option<bool>,
}

pub fn update(pool: &DbPool, name: &str, update: ProviderUpdate) -> Result<Option<Provider>, RegistryError> {
    let mut conn = pool.get()?;
    let changeset = ProviderChangeset {
        secret_key: update.secret_key,
        forwarding_url: update.forwarding_url,
        is_active: update.is_active,
        updated_at: Some(Utc::now()),
    };

    diesel::update(providers::table.filter(providers::name.eq(name)))
        .set(&changeset)
        .get_result::<Provider>(&mut conn)
        .optional()
        .map_err(RegistryError::from)
}

/// Restrict semantics: refuses with `HasEvents` if any `WebhookEvent` still
/// references this provider, rather than cascading the delete.
pub fn delete(pool: &DbPool, name: &str) -> Result<bool, RegistryError> {
    let mut conn = pool.get()?;

    let provider = providers::table
        .filter(providers::name.eq(name))
        .first::<Provider>(&mut conn)
        .optional()?;

    let Some(provider) = provider else {
        return Ok(false);
    };

    let referenced: i64 = webhook_events::table
        .filter(webhook_events::provider_id.eq(provider.id))
        .count()
        .get_result(&mut conn)?;

    if referenced > 0 {
        return Err(RegistryError::HasEvents);
    }

    diesel::delete(providers::table.filter(providers::name.eq(name))).execute(&mut conn)?;
    Ok(true)
}
