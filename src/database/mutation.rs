//! Transactional inserts, updates and deletes driven by entity definitions.
//!
//! Every mutation owns one transaction: the root row and the rows of any
//! `persisted` embedded sub-entity (the multi-language text rows) are written
//! together and the whole call rolls back unless every statement succeeds -
//! dropping an uncommitted `sqlx::Transaction` rolls it back.
//!
//! Updates take a sparse map of dotted output paths. Unknown keys are
//! rejected outright; write-once columns are silently excluded; embedded rows
//! are addressed by `(parent_id, field)` so callers never need the
//! sub-entity's own id.

use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::database::descriptor::EntityDef;
use crate::database::manager::DatabaseError;
use crate::database::query::bind_value;
use crate::filter::SqlResult;

pub async fn insert(
    pool: &PgPool,
    config: &EngineConfig,
    def: &EntityDef,
    entity: &Value,
) -> Result<(), DatabaseError> {
    let payload = entity
        .as_object()
        .ok_or_else(|| DatabaseError::Validation("entity payload must be an object".to_string()))?;

    let mut tx = pool.begin().await?;

    let statement = insert_statement(&def.table, def, payload);
    execute(&mut tx, &statement).await?;

    for embedded in def.persisted_embeds() {
        if let Some(Value::Object(child)) = payload.get(&embedded.alias) {
            let statement = insert_statement(&config.translation_table, &embedded.entity, child);
            execute(&mut tx, &statement).await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

pub async fn update(
    pool: &PgPool,
    config: &EngineConfig,
    def: &EntityDef,
    id: &str,
    changes: &Map<String, Value>,
) -> Result<(), DatabaseError> {
    let changes = flatten_changes(changes);
    validate_update_keys(def, &changes)?;

    let mut tx = pool.begin().await?;

    let root_map = update_map(def, "", &changes);
    if !root_map.is_empty() {
        let mut statement = update_statement(&def.table, &root_map);
        statement.query.push_str(&format!(" WHERE \"id\" = ${}", statement.params.len() + 1));
        statement.params.push(Value::String(id.to_string()));
        execute(&mut tx, &statement).await?;
    }

    for embedded in def.persisted_embeds() {
        let embed_map = update_map(&embedded.entity, &embedded.alias, &changes);
        if !embed_map.is_empty() {
            let mut statement = update_statement(&config.translation_table, &embed_map);
            let n = statement.params.len();
            statement
                .query
                .push_str(&format!(" WHERE \"parent_id\" = ${} AND \"field\" = ${}", n + 1, n + 2));
            statement.params.push(Value::String(id.to_string()));
            statement.params.push(Value::String(embedded.alias.clone()));
            execute(&mut tx, &statement).await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

pub async fn delete(
    pool: &PgPool,
    config: &EngineConfig,
    def: &EntityDef,
    ids: &[String],
) -> Result<(), DatabaseError> {
    let ids: Vec<Uuid> = ids
        .iter()
        .map(|id| {
            Uuid::parse_str(id)
                .map_err(|_| DatabaseError::Validation(format!("invalid id: {}", id)))
        })
        .collect::<Result<_, _>>()?;

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DELETE FROM {} WHERE \"id\" = ANY($1)", def.table))
        .bind(ids.clone())
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "DELETE FROM {} WHERE \"parent_id\" = ANY($1)",
        config.translation_table
    ))
    .bind(ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

async fn execute(
    tx: &mut Transaction<'_, Postgres>,
    statement: &SqlResult,
) -> Result<(), DatabaseError> {
    let mut query = sqlx::query(&statement.query);
    for value in &statement.params {
        query = bind_value(query, value)?;
    }
    query.execute(&mut **tx).await?;
    Ok(())
}

/// INSERT over the definition's full column list; columns absent from the
/// payload are bound as NULL.
fn insert_statement(table: &str, def: &EntityDef, payload: &Map<String, Value>) -> SqlResult {
    let mut columns = vec![];
    let mut placeholders = vec![];
    let mut params = vec![];
    for (i, column) in def.root_columns().enumerate() {
        columns.push(format!("\"{}\"", column.name));
        placeholders.push(format!("${}", i + 1));
        let value = column
            .output
            .as_ref()
            .and_then(|output| payload.get(output))
            .cloned()
            .unwrap_or(Value::Null);
        params.push(value);
    }
    SqlResult {
        query: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    }
}

/// Column-update pairs for one table scope: root columns match unprefixed
/// paths, embedded columns match `alias.`-prefixed paths. Write-once columns
/// never appear.
fn update_map(def: &EntityDef, alias: &str, changes: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut map = vec![];
    for column in def.root_columns() {
        if column.write_once {
            continue;
        }
        let Some(output) = &column.output else { continue };
        let path = if alias.is_empty() {
            output.clone()
        } else {
            format!("{}.{}", alias, output)
        };
        if let Some(value) = changes.get(&path) {
            map.push((column.name.clone(), value.clone()));
        }
    }
    map
}

fn update_statement(table: &str, set_map: &[(String, Value)]) -> SqlResult {
    let assignments: Vec<String> = set_map
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("\"{}\" = ${}", column, i + 1))
        .collect();
    SqlResult {
        query: format!("UPDATE {} SET {}", table, assignments.join(", ")),
        params: set_map.iter().map(|(_, value)| value.clone()).collect(),
    }
}

/// Every sparse-map key must name a known output path: a root column or a
/// `alias.column` path of a persisted embed. Write-once paths are known (and
/// later dropped); anything else is a validation error.
fn validate_update_keys(def: &EntityDef, changes: &Map<String, Value>) -> Result<(), DatabaseError> {
    for key in changes.keys() {
        let known = match key.split_once('.') {
            Some((alias, field)) => def
                .persisted_embeds()
                .find(|e| e.alias == alias)
                .map(|e| e.entity.root_columns().any(|c| c.output.as_deref() == Some(field)))
                .unwrap_or(false),
            None => def.root_columns().any(|c| c.output.as_deref() == Some(key)),
        };
        if !known {
            return Err(DatabaseError::Validation(format!("unknown field: {}", key)));
        }
    }
    Ok(())
}

/// Expand one level of nesting into dotted paths, so both
/// `{"title": {"en": "x"}}` and `{"title.en": "x"}` address the same field.
fn flatten_changes(changes: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    for (key, value) in changes {
        match value {
            Value::Object(nested) if !key.contains('.') => {
                for (sub_key, sub_value) in nested {
                    flat.insert(format!("{}.{}", key, sub_key), sub_value.clone());
                }
            }
            _ => {
                flat.insert(key.clone(), value.clone());
            }
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::descriptor::{col, embed, EntityDef};
    use serde_json::json;

    fn translated_text() -> EntityDef {
        EntityDef::new("translation")
            .column(col("id").write_once())
            .column(col("parent_id").write_once())
            .column(col("field").write_once())
            .column(col("en").searchable())
            .column(col("pt").searchable())
    }

    fn sample_def() -> EntityDef {
        EntityDef::new("place")
            .column(col("id").write_once())
            .column(col("active"))
            .column(col("created_by").write_once())
            .column(col("updated_by"))
            .embedded(
                embed("title", translated_text())
                    .join("translation", "title.parent_id = place.id and title.field = 'title'")
                    .persisted(),
            )
    }

    fn changes(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_covers_full_column_list_with_null_for_missing() {
        let payload = changes(json!({"id": "abc", "active": true}));
        let statement = insert_statement("place", &sample_def(), &payload);
        assert_eq!(
            statement.query,
            "INSERT INTO place (\"id\", \"active\", \"created_by\", \"updated_by\") VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(statement.params[1], json!(true));
        assert_eq!(statement.params[2], Value::Null);
    }

    #[test]
    fn update_map_excludes_write_once_columns() {
        let sparse = flatten_changes(&changes(json!({
            "active": false,
            "created_by": "intruder",
            "updated_by": "u-2"
        })));
        let map = update_map(&sample_def(), "", &sparse);
        let columns: Vec<&str> = map.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["active", "updated_by"]);
    }

    #[test]
    fn update_map_scopes_embedded_fields_by_alias() {
        let sparse = flatten_changes(&changes(json!({"title": {"en": "Beach", "id": "nope"}})));
        let def = sample_def();
        assert!(update_map(&def, "", &sparse).is_empty());

        let embedded = def.persisted_embeds().next().unwrap();
        let map = update_map(&embedded.entity, "title", &sparse);
        assert_eq!(map, vec![("en".to_string(), json!("Beach"))]);
    }

    #[test]
    fn unknown_update_keys_are_rejected() {
        let def = sample_def();
        let sparse = flatten_changes(&changes(json!({"nonexistent": 1})));
        assert!(matches!(
            validate_update_keys(&def, &sparse),
            Err(DatabaseError::Validation(_))
        ));

        let sparse = flatten_changes(&changes(json!({"title": {"de": "Strand"}})));
        assert!(matches!(
            validate_update_keys(&def, &sparse),
            Err(DatabaseError::Validation(_))
        ));

        // Write-once keys are known; they validate and are later dropped.
        let sparse = flatten_changes(&changes(json!({"created_by": "x"})));
        assert!(validate_update_keys(&def, &sparse).is_ok());
    }

    #[test]
    fn update_statement_numbers_placeholders() {
        let statement = update_statement(
            "place",
            &[("active".to_string(), json!(false)), ("updated_by".to_string(), json!("u-2"))],
        );
        assert_eq!(statement.query, "UPDATE place SET \"active\" = $1, \"updated_by\" = $2");
        assert_eq!(statement.params.len(), 2);
    }

    #[test]
    fn flatten_expands_one_level_of_nesting() {
        let flat = flatten_changes(&changes(json!({
            "active": false,
            "title": {"en": "Beach"},
            "description.pt": "Praia"
        })));
        assert_eq!(flat.get("active"), Some(&json!(false)));
        assert_eq!(flat.get("title.en"), Some(&json!("Beach")));
        assert_eq!(flat.get("description.pt"), Some(&json!("Praia")));
    }
}
