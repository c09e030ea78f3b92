//! Materializes heterogeneous result rows into nested JSON trees.
//!
//! Columns are decoded by their SQL alias (the descriptor aliases every
//! selected column to its dotted output path), so the row shape is keyed by
//! name rather than cursor position. Contiguous dotted paths sharing a parent
//! prefix are regrouped into one embedded object: a flat joined row like
//! `id, active, title.en, title.pt, created_user.id` comes back as
//! `{id, active, title: {en, pt}, created_user: {id}}`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

/// Materialize every fetched row. Rows are never skipped: the row query is
/// driven from the root table, so each row carries a root identifier even
/// when all of its outer-joined columns are NULL.
pub fn materialize_rows(rows: &[PgRow], output_fields: &[String]) -> Result<Vec<Value>, sqlx::Error> {
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(materialize_row(row, output_fields)?);
    }
    Ok(results)
}

pub fn materialize_row(row: &PgRow, output_fields: &[String]) -> Result<Value, sqlx::Error> {
    let mut values = Vec::with_capacity(output_fields.len());
    for field in output_fields {
        values.push(decode_column(row, field)?);
    }
    Ok(Value::Object(nest_fields(output_fields, values)))
}

/// Decode one column by alias. `Ok(None)` means the runtime type has no
/// recognized decoder and the field is omitted from the output - the
/// extension point for new column types.
fn decode_column(row: &PgRow, name: &str) -> Result<Option<Value>, sqlx::Error> {
    let column = match row.columns().iter().find(|c| c.name() == name) {
        Some(column) => column,
        None => return Ok(None),
    };

    let value = match column.type_info().name() {
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(name)?
            .map(Value::String),
        "BOOL" => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(name)?
            .map(|v| Value::Number(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(name)?
            .map(|v| Value::Number(v.into())),
        "INT8" => row
            .try_get::<Option<i64>, _>(name)?
            .map(|v| Value::Number(v.into())),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(name)?
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(Value::Number),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(name)?
            .and_then(Number::from_f64)
            .map(Value::Number),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(name)?
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(name)?
            .map(|v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(name)?
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(name)?
            .map(|v| Value::String(v.to_string())),
        other => {
            tracing::warn!(column = name, column_type = other, "no decoder for column type");
            return Ok(None);
        }
    };

    Ok(Some(value.unwrap_or(Value::Null)))
}

/// Regroup dotted output paths into embedded objects. A run of contiguous
/// fields sharing the same `parent.` prefix becomes one nested map under
/// `parent`; everything else attaches at the top level. `None` values
/// (unrecognized column types) are omitted.
fn nest_fields(fields: &[String], values: Vec<Option<Value>>) -> Map<String, Value> {
    let mut output = Map::new();
    let mut i = 0;
    while i < fields.len() {
        match fields[i].split_once('.') {
            Some((parent, _)) => {
                let mut embedded = Map::new();
                while i < fields.len() {
                    let Some((prefix, key)) = fields[i].split_once('.') else { break };
                    if prefix != parent {
                        break;
                    }
                    if let Some(value) = &values[i] {
                        embedded.insert(key.to_string(), value.clone());
                    }
                    i += 1;
                }
                output.insert(parent.to_string(), Value::Object(embedded));
            }
            None => {
                if let Some(value) = &values[i] {
                    output.insert(fields[i].clone(), value.clone());
                }
                i += 1;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn top_level_fields_attach_directly() {
        let nested = nest_fields(
            &fields(&["id", "active"]),
            vec![Some(json!("abc")), Some(json!(true))],
        );
        assert_eq!(Value::Object(nested), json!({"id": "abc", "active": true}));
    }

    #[test]
    fn contiguous_dotted_fields_regroup_under_parent() {
        let nested = nest_fields(
            &fields(&["id", "title.en", "title.pt", "created_user.id"]),
            vec![
                Some(json!("abc")),
                Some(json!("Beach")),
                Some(json!("Praia")),
                Some(json!("u-1")),
            ],
        );
        assert_eq!(
            Value::Object(nested),
            json!({
                "id": "abc",
                "title": {"en": "Beach", "pt": "Praia"},
                "created_user": {"id": "u-1"}
            })
        );
    }

    #[test]
    fn same_parent_interrupted_by_other_fields_starts_a_new_group() {
        // Field order is descriptor order; only contiguous runs merge.
        let nested = nest_fields(
            &fields(&["title.en", "id", "title.pt"]),
            vec![Some(json!("Beach")), Some(json!("abc")), Some(json!("Praia"))],
        );
        // The second run overwrites the first group under the same key.
        assert_eq!(
            Value::Object(nested),
            json!({"id": "abc", "title": {"pt": "Praia"}})
        );
    }

    #[test]
    fn nulls_are_kept_and_unrecognized_columns_omitted() {
        let nested = nest_fields(
            &fields(&["id", "region_id", "title.en"]),
            vec![Some(json!("abc")), None, Some(Value::Null)],
        );
        assert_eq!(
            Value::Object(nested),
            json!({"id": "abc", "title": {"en": null}})
        );
    }
}
