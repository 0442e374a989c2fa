use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::errors::AppError;

#[derive(Clone)]
pub struct PgUserRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct PgProductRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct PgMediaRepo {
    pub pool: PgPool,
}

/// The stores are schemaless document collections: one jsonb `doc` column
/// keyed by id, secondary lookups through jsonb field filters. Runtime
/// queries only — there is no SQL schema to check against.
pub(crate) fn to_doc<T: Serialize>(entity: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(entity)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize document: {}", e)))
}

pub(crate) fn from_row<T: DeserializeOwned>(row: &PgRow) -> Result<T, AppError> {
    let doc: serde_json::Value = row.try_get("doc").map_err(AppError::from)?;
    serde_json::from_value(doc)
        .map_err(|e| AppError::InternalError(format!("Failed to decode document: {}", e)))
}
