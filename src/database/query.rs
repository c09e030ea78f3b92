//! Builds the row-fetch and count queries for one listing request.
//!
//! All three queries share the descriptor's joins and the WHERE fragment
//! produced by the filter module; the builder itself is pure string
//! assembly over trusted descriptor identifiers plus bind placeholders, so
//! it is fully testable without a database.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::descriptor::{EntityDef, EntityDescriptor};
use crate::database::manager::DatabaseError;
use crate::filter::order::order_clause;
use crate::filter::where_clause::WhereClause;
use crate::filter::{FilterError, ListParams, SqlResult};

pub struct QueryBuilder<'a> {
    def: &'a EntityDef,
    descriptor: &'a EntityDescriptor,
    params: &'a ListParams,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(def: &'a EntityDef, descriptor: &'a EntityDescriptor, params: &'a ListParams) -> Self {
        Self { def, descriptor, params }
    }

    /// The row-fetch query: SELECT, joins, WHERE, grouping, ordering and
    /// pagination.
    pub fn row_query(&self) -> Result<SqlResult, FilterError> {
        let where_result = WhereClause::generate(self.params, self.def, self.descriptor)?;
        let order = order_clause(self.params, self.def, self.descriptor)?;

        let mut parts = vec![
            format!("SELECT {}", self.descriptor.select_exprs.join(", ")),
            format!("FROM {}", self.descriptor.table),
        ];
        parts.extend(self.join_clauses());
        if !where_result.query.is_empty() {
            parts.push(format!("WHERE {}", where_result.query));
        }
        if !self.descriptor.group_by.is_empty() {
            parts.push(format!("GROUP BY {}", self.descriptor.group_by.join(", ")));
        }
        parts.push(order);
        parts.push(format!("LIMIT {} OFFSET {}", self.params.results, self.params.offset()));

        Ok(SqlResult { query: parts.join(" "), params: where_result.params })
    }

    /// Unfiltered total over the root table.
    pub fn total_query(&self) -> SqlResult {
        SqlResult {
            query: format!("SELECT count(id) AS total FROM {}", self.descriptor.table),
            params: vec![],
        }
    }

    /// Filtered total: same joins and WHERE logic as the row query.
    pub fn filtered_count_query(&self) -> Result<SqlResult, FilterError> {
        let where_result = WhereClause::generate(self.params, self.def, self.descriptor)?;

        let mut parts = vec![
            format!(
                "SELECT count({}) AS total_filtered FROM {}",
                self.descriptor.id_column(),
                self.descriptor.table
            ),
        ];
        parts.extend(self.join_clauses());
        if !where_result.query.is_empty() {
            parts.push(format!("WHERE {}", where_result.query));
        }

        Ok(SqlResult { query: parts.join(" "), params: where_result.params })
    }

    fn join_clauses(&self) -> Vec<String> {
        self.descriptor
            .joins
            .iter()
            .map(|j| {
                if j.alias.is_empty() {
                    format!("LEFT JOIN {} ON {}", j.table, j.on)
                } else {
                    format!("LEFT JOIN {} AS {} ON {}", j.table, j.alias, j.on)
                }
            })
            .collect()
    }
}

/// Execute a row-fetch query.
pub async fn fetch_rows(pool: &PgPool, sql: &SqlResult) -> Result<Vec<PgRow>, DatabaseError> {
    let mut query = sqlx::query(&sql.query);
    for value in &sql.params {
        query = bind_value(query, value)?;
    }
    Ok(query.fetch_all(pool).await?)
}

/// Execute a count query, reading the single aggregate column.
pub async fn fetch_count(pool: &PgPool, sql: &SqlResult) -> Result<i64, DatabaseError> {
    use sqlx::Row;

    let mut query = sqlx::query(&sql.query);
    for value in &sql.params {
        query = bind_value(query, value)?;
    }
    let row = query.fetch_one(pool).await?;
    Ok(row.try_get::<i64, _>(0)?)
}

/// Bind a JSON value with its natural Postgres type. Strings are sniffed for
/// UUID / RFC3339-timestamp / boolean shapes so comparisons and inserts
/// against typed columns keep their native types.
pub fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: &'q Value,
) -> Result<sqlx::query::Query<'q, sqlx::Postgres, PgArguments>, DatabaseError> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                return Err(DatabaseError::QueryError(format!("unbindable number: {}", n)));
            }
        }
        Value::String(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                query.bind(id)
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                query.bind(ts.with_timezone(&Utc))
            } else if s == "true" {
                query.bind(true)
            } else if s == "false" {
                query.bind(false)
            } else {
                query.bind(s.as_str())
            }
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(DatabaseError::QueryError("cannot bind composite value".to_string()));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::descriptor::{col, embed, EntityDef, EntityDescriptor};
    use std::collections::HashMap;

    fn sample_def() -> EntityDef {
        let text = EntityDef::new("translation")
            .column(col("en").searchable())
            .column(col("pt").searchable());
        EntityDef::new("place")
            .column(col("id").write_once())
            .column(col("active"))
            .embedded(
                embed("title", text)
                    .join("translation", "title.parent_id = place.id and title.field = 'title'"),
            )
    }

    fn build(pairs: &[(&str, &str)]) -> (SqlResult, SqlResult, SqlResult) {
        let raw: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let def = sample_def();
        let descriptor = EntityDescriptor::extract(&def);
        let params = ListParams::parse(&raw);
        let builder = QueryBuilder::new(&def, &descriptor, &params);
        (
            builder.row_query().unwrap(),
            builder.total_query(),
            builder.filtered_count_query().unwrap(),
        )
    }

    #[test]
    fn row_query_defaults() {
        let (rows, _, _) = build(&[]);
        assert_eq!(
            rows.query,
            "SELECT place.\"id\" AS \"id\", place.\"active\" AS \"active\", \
             title.\"en\" AS \"title.en\", title.\"pt\" AS \"title.pt\" \
             FROM place \
             LEFT JOIN translation AS title ON title.parent_id = place.id and title.field = 'title' \
             ORDER BY place.\"id\" DESC LIMIT 50 OFFSET 0"
        );
        assert!(rows.params.is_empty());
    }

    #[test]
    fn row_query_with_filters_and_pagination() {
        let (rows, _, _) = build(&[("filter", "beach"), ("active", "true"), ("page", "2"), ("results", "10")]);
        assert!(rows.query.contains(
            "WHERE (LOWER(title.\"en\") LIKE LOWER($1) OR LOWER(title.\"pt\") LIKE LOWER($2)) AND place.\"active\" = $3"
        ));
        assert!(rows.query.ends_with("LIMIT 10 OFFSET 10"));
        assert_eq!(rows.params.len(), 3);
    }

    #[test]
    fn total_query_ignores_filters() {
        let (_, total, _) = build(&[("filter", "beach")]);
        assert_eq!(total.query, "SELECT count(id) AS total FROM place");
        assert!(total.params.is_empty());
    }

    #[test]
    fn filtered_count_carries_joins_and_where() {
        let (_, _, filtered) = build(&[("filter", "beach")]);
        assert_eq!(
            filtered.query,
            "SELECT count(place.\"id\") AS total_filtered FROM place \
             LEFT JOIN translation AS title ON title.parent_id = place.id and title.field = 'title' \
             WHERE (LOWER(title.\"en\") LIKE LOWER($1) OR LOWER(title.\"pt\") LIKE LOWER($2))"
        );
        assert_eq!(filtered.params.len(), 2);
    }

    #[test]
    fn id_lookup_short_circuits() {
        let (rows, _, _) = build(&[("id", "3fa0a6f8-5c1b-4f7e-9f59-0d6f8f8f6e01"), ("filter", "x")]);
        assert!(rows.query.contains("WHERE place.\"id\" = $1"));
        assert!(!rows.query.contains("LIKE"));
    }
}
