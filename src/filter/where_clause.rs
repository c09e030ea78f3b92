use serde_json::Value;

use crate::database::descriptor::{EntityDef, EntityDescriptor};

use super::error::FilterError;
use super::params::ListParams;
use super::types::SqlResult;

/// Builds the WHERE fragment for listing and count queries.
///
/// An `id` parameter short-circuits everything else into a single equality on
/// the root identifier. Otherwise the free-text `filter` value becomes an
/// OR-group of case-insensitive LIKE predicates over the searchable columns,
/// and the remaining `column=value` pairs become an AND-group, with the
/// `is_null` / `is_not_null` sentinels turning into null-or-empty checks.
/// Values are always bound; only descriptor-supplied identifiers reach the
/// SQL text. Request keys that do not name a root column are rejected.
pub struct WhereClause {
    params: Vec<Value>,
    next_index: usize,
}

impl WhereClause {
    /// Returns the WHERE fragment (without the `WHERE` keyword, empty when
    /// nothing filters) and its bind values, numbered from `$1`.
    pub fn generate(
        list: &ListParams,
        def: &EntityDef,
        descriptor: &EntityDescriptor,
    ) -> Result<SqlResult, FilterError> {
        let mut builder = Self { params: vec![], next_index: 0 };

        if let Some(id) = &list.id {
            let clause = format!("{} = {}", descriptor.id_column(), builder.param(Value::String(id.clone())));
            return Ok(SqlResult { query: clause, params: builder.params });
        }

        let mut filter_or = String::new();
        if let Some(value) = &list.filter {
            let pattern = format!("%{}%", value);
            let predicates: Vec<String> = descriptor
                .filter_columns
                .iter()
                .map(|column| {
                    format!("LOWER({}) LIKE LOWER({})", column, builder.param(Value::String(pattern.clone())))
                })
                .collect();
            if !predicates.is_empty() {
                filter_or = format!("({})", predicates.join(" OR "));
            }
        }

        let mut others: Vec<String> = vec![];
        for (key, value) in &list.equals {
            if !def.has_root_column(key) {
                return Err(FilterError::UnknownFilterColumn(key.clone()));
            }
            let column = format!("{}.\"{}\"", descriptor.table, key);
            // The empty-string check casts to text so the sentinels also work
            // on uuid and timestamp columns, which can never hold ''.
            let predicate = match value.as_str() {
                "is_not_null" => format!("({col} IS NOT NULL AND {col}::text != '')", col = column),
                "is_null" => format!("({col} IS NULL OR {col}::text = '')", col = column),
                _ => format!("{} = {}", column, builder.param(Value::String(value.clone()))),
            };
            others.push(predicate);
        }
        let others_and = others.join(" AND ");

        let query = match (filter_or.is_empty(), others_and.is_empty()) {
            (false, true) => filter_or,
            (true, false) => others_and,
            (false, false) => format!("{} AND {}", filter_or, others_and),
            (true, true) => String::new(),
        };

        Ok(SqlResult { query, params: builder.params })
    }

    fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        self.next_index += 1;
        format!("${}", self.next_index)
    }
}
