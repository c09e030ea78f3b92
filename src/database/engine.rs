use std::collections::HashMap;

use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::api::envelope::{ListMetadata, ListResult};
use crate::config::EngineConfig;
use crate::database::descriptor::{EntityDef, EntityDescriptor};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::materialize::materialize_rows;
use crate::database::mutation;
use crate::database::query::{fetch_count, fetch_rows, QueryBuilder};
use crate::filter::ListParams;

/// Facade over the generic data-access engine. Owns the pool handle and the
/// engine configuration; descriptors are extracted fresh on every call.
pub struct Engine {
    pool: PgPool,
    config: EngineConfig,
}

impl Engine {
    pub fn new(pool: PgPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    /// Engine wired to the application pool and the configured translated-
    /// text table. One per request; the pool handle is cheap to clone.
    pub async fn connect() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self::new(pool, crate::config::config().engine.clone()))
    }

    /// The engine configuration this instance was constructed with.
    /// Resource descriptor tables take it to resolve join targets.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Listing: counts plus materialized rows in a result envelope. Count
    /// failures degrade the metadata and are recorded in `errors`; a
    /// row-fetch failure aborts.
    pub async fn select(
        &self,
        def: &EntityDef,
        raw_params: &HashMap<String, String>,
    ) -> Result<ListResult, DatabaseError> {
        let descriptor = EntityDescriptor::extract(def);
        let params = ListParams::parse(raw_params);
        let builder = QueryBuilder::new(def, &descriptor, &params);

        let mut errors = vec![];
        let total = match fetch_count(&self.pool, &builder.total_query()).await {
            Ok(total) => total,
            Err(e) => {
                tracing::error!(table = %descriptor.table, error = %e, "total count query failed");
                errors.push(e.to_string());
                0
            }
        };

        let mut total_filtered = total;
        if params.narrows() {
            let count_sql = builder.filtered_count_query()?;
            match fetch_count(&self.pool, &count_sql).await {
                Ok(count) => total_filtered = count,
                Err(e) => {
                    tracing::error!(table = %descriptor.table, error = %e, "filtered count query failed");
                    errors.push(e.to_string());
                }
            }
        }

        let metadata = ListMetadata {
            page: params.page,
            total,
            total_filtered,
            records_per_page: params.results,
            source: descriptor.table.clone(),
        };

        let mut data = vec![];
        if total_filtered > 0 {
            let row_sql = builder.row_query()?;
            let rows = fetch_rows(&self.pool, &row_sql).await?;
            data = materialize_rows(&rows, &descriptor.output_fields)?;
        }

        Ok(ListResult { metadata, data, errors })
    }

    /// Single-record lookup by root identifier.
    pub async fn query_one(&self, def: &EntityDef, id: &str) -> Result<Value, DatabaseError> {
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(DatabaseError::NotFound(format!("invalid id, record not found: {}", id)));
        }

        let raw_params = HashMap::from([("id".to_string(), id.to_string())]);
        let descriptor = EntityDescriptor::extract(def);
        let params = ListParams::parse(&raw_params);
        let builder = QueryBuilder::new(def, &descriptor, &params);

        let row_sql = builder.row_query()?;
        let rows = fetch_rows(&self.pool, &row_sql).await?;
        let mut data = materialize_rows(&rows, &descriptor.output_fields)?;
        if data.is_empty() {
            return Err(DatabaseError::NotFound(format!(
                "{} {} not found",
                descriptor.table, id
            )));
        }
        Ok(data.remove(0))
    }

    pub async fn insert(&self, def: &EntityDef, entity: &Value) -> Result<(), DatabaseError> {
        mutation::insert(&self.pool, &self.config, def, entity).await
    }

    pub async fn update(
        &self,
        def: &EntityDef,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<(), DatabaseError> {
        mutation::update(&self.pool, &self.config, def, id, changes).await
    }

    pub async fn delete(&self, def: &EntityDef, ids: &[String]) -> Result<(), DatabaseError> {
        mutation::delete(&self.pool, &self.config, def, ids).await
    }
}
