use crate::database::descriptor::{EntityDef, EntityDescriptor};

use super::error::FilterError;
use super::params::ListParams;

/// ORDER BY fragment for a listing. `sort` names a root-table column
/// (validated against the descriptor table); direction comes from `order`
/// and defaults to descending. Without `sort`, listings come back newest
/// first by root identifier.
pub fn order_clause(
    list: &ListParams,
    def: &EntityDef,
    descriptor: &EntityDescriptor,
) -> Result<String, FilterError> {
    match &list.sort {
        Some(column) => {
            if !def.has_root_column(column) {
                return Err(FilterError::UnknownSortColumn(column.clone()));
            }
            Ok(format!(
                "ORDER BY {}.\"{}\" {}",
                descriptor.table,
                column,
                list.order.to_sql()
            ))
        }
        None => Ok(format!("ORDER BY {} DESC", descriptor.id_column())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::descriptor::{col, EntityDef, EntityDescriptor};
    use std::collections::HashMap;

    fn build(pairs: &[(&str, &str)]) -> Result<String, FilterError> {
        let raw: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let def = EntityDef::new("event").column(col("id")).column(col("created_date"));
        let descriptor = EntityDescriptor::extract(&def);
        order_clause(&ListParams::parse(&raw), &def, &descriptor)
    }

    #[test]
    fn default_is_descending_by_id() {
        assert_eq!(build(&[]).unwrap(), "ORDER BY event.\"id\" DESC");
    }

    #[test]
    fn sort_defaults_to_descending() {
        assert_eq!(
            build(&[("sort", "created_date")]).unwrap(),
            "ORDER BY event.\"created_date\" DESC"
        );
    }

    #[test]
    fn explicit_ascending_order() {
        assert_eq!(
            build(&[("sort", "created_date"), ("order", "asc")]).unwrap(),
            "ORDER BY event.\"created_date\" ASC"
        );
    }

    #[test]
    fn non_asc_order_values_mean_descending() {
        assert_eq!(
            build(&[("sort", "created_date"), ("order", "upside")]).unwrap(),
            "ORDER BY event.\"created_date\" DESC"
        );
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        assert!(matches!(
            build(&[("sort", "nope")]).unwrap_err(),
            FilterError::UnknownSortColumn(_)
        ));
    }
}
