//! Drives the descriptor -> SQL pipeline through the public API for a
//! realistic resource, without touching a database.

use std::collections::HashMap;

use roamline::config::EngineConfig;
use roamline::database::descriptor::EntityDescriptor;
use roamline::database::query::QueryBuilder;
use roamline::filter::ListParams;
use roamline::resources::{category, trip};

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn category_descriptor_merges_all_embeds() {
    let def = category::entity(&EngineConfig::default());
    let descriptor = EntityDescriptor::extract(&def);

    // Root columns plus four embedded sub-entities, in declaration order.
    assert_eq!(descriptor.table, "category");
    assert_eq!(
        descriptor.joins.iter().map(|j| j.alias.as_str()).collect::<Vec<_>>(),
        vec!["parent_category", "title", "created_user", "updated_user"]
    );

    // Both translated embeds contribute their language columns to the
    // free-text search.
    assert_eq!(
        descriptor.filter_columns,
        vec![
            "parent_category.\"pt\"",
            "parent_category.\"es\"",
            "parent_category.\"en\"",
            "title.\"pt\"",
            "title.\"es\"",
            "title.\"en\"",
        ]
    );

    // Dotted output paths regroup into nested objects downstream.
    assert!(descriptor.output_fields.contains(&"title.en".to_string()));
    assert!(descriptor.output_fields.contains(&"created_user.first_name".to_string()));
    assert!(descriptor.output_fields.contains(&"parent_category.pt".to_string()));

    // No aggregates declared, so no grouping.
    assert!(!descriptor.has_aggregation);
    assert!(descriptor.group_by.is_empty());
}

#[test]
fn category_listing_query_shape() {
    let def = category::entity(&EngineConfig::default());
    let descriptor = EntityDescriptor::extract(&def);
    let list = ListParams::parse(&params(&[("filter", "transp")]));
    let builder = QueryBuilder::new(&def, &descriptor, &list);

    let rows = builder.row_query().expect("row query");
    assert!(rows.query.starts_with("SELECT category.\"id\" AS \"id\""));
    assert!(rows.query.contains(
        "LEFT JOIN translation AS title ON title.parent_id = category.id and title.field = 'title'"
    ));
    assert!(rows.query.contains("LEFT JOIN app_user AS created_user ON created_user.id = category.created_by"));
    assert!(rows.query.contains("LOWER(title.\"en\") LIKE LOWER($"));
    assert!(rows.query.ends_with("ORDER BY category.\"id\" DESC LIMIT 50 OFFSET 0"));

    // One bound pattern per searchable column, nothing interpolated.
    assert_eq!(rows.params.len(), descriptor.filter_columns.len());
    assert!(rows.params.iter().all(|p| p == &serde_json::json!("%transp%")));
}

#[test]
fn category_count_queries() {
    let def = category::entity(&EngineConfig::default());
    let descriptor = EntityDescriptor::extract(&def);
    let list = ListParams::parse(&params(&[("filter", "transp"), ("active", "true")]));
    let builder = QueryBuilder::new(&def, &descriptor, &list);

    let total = builder.total_query();
    assert_eq!(total.query, "SELECT count(id) AS total FROM category");

    let filtered = builder.filtered_count_query().expect("filtered count");
    assert!(filtered.query.starts_with("SELECT count(category.\"id\") AS total_filtered FROM category"));
    assert!(filtered.query.contains("LEFT JOIN translation AS title"));
    assert!(filtered.query.contains("AND category.\"active\" = $"));
}

#[test]
fn translation_table_override_is_threaded_through() {
    let config = EngineConfig { translation_table: "translation_test".to_string() };
    let def = trip::entity(&config);
    let descriptor = EntityDescriptor::extract(&def);

    assert!(descriptor.joins.iter().all(|j| j.table == "translation_test"));
}

#[test]
fn unknown_filter_key_is_a_validation_error() {
    let def = category::entity(&EngineConfig::default());
    let descriptor = EntityDescriptor::extract(&def);
    let list = ListParams::parse(&params(&[("favourite_color", "blue")]));
    let builder = QueryBuilder::new(&def, &descriptor, &list);

    assert!(builder.row_query().is_err());
    assert!(builder.filtered_count_query().is_err());
}

#[test]
fn id_lookup_short_circuits_all_other_filters() {
    let def = category::entity(&EngineConfig::default());
    let descriptor = EntityDescriptor::extract(&def);
    let list = ListParams::parse(&params(&[
        ("id", "7f1f9f6a-0f63-4a0f-9a4c-3f7a8f0b2a10"),
        ("filter", "transp"),
        ("active", "true"),
    ]));
    let builder = QueryBuilder::new(&def, &descriptor, &list);

    let rows = builder.row_query().expect("row query");
    assert!(rows.query.contains("WHERE category.\"id\" = $1"));
    assert!(!rows.query.contains("LIKE"));
    assert_eq!(rows.params.len(), 1);
}
