//! Sub-entity projections shared by every resource: translated text rows and
//! the minimal user reference used for attribution embeds.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::database::descriptor::{col, embed, EmbeddedDef, EntityDef};

/// Columns of a translated-text row. Everything except the language texts is
/// write-once bookkeeping; each language participates in the free-text search.
pub fn translated_text() -> EntityDef {
    EntityDef::new("translation")
        .column(col("id").write_once())
        .column(col("parent_id").write_once())
        .column(col("table").write_once())
        .column(col("field").write_once())
        .column(col("pt").searchable())
        .column(col("es").searchable())
        .column(col("en").searchable())
}

/// Minimal user projection for created-by / updated-by attribution.
/// The table is `app_user`: `user` is reserved in Postgres.
pub fn user_reference() -> EntityDef {
    EntityDef::new("app_user")
        .column(col("id").write_once())
        .column(col("first_name"))
        .column(col("last_name"))
        .column(col("image_path"))
}

/// A translated field owned by this entity: joined on the owner's id, written
/// alongside it (`field` = alias).
pub fn owned_text(config: &EngineConfig, owner_table: &str, alias: &str) -> EmbeddedDef {
    embed(alias, translated_text())
        .join(
            &config.translation_table,
            &format!("{a}.parent_id = {t}.id and {a}.field = '{a}'", a = alias, t = owner_table),
        )
        .persisted()
}

/// The title of another entity referenced through `via_column` (parent
/// category, country, region, city). Read-only from this entity's side.
pub fn linked_title(
    config: &EngineConfig,
    owner_table: &str,
    alias: &str,
    via_column: &str,
) -> EmbeddedDef {
    embed(alias, translated_text()).join(
        &config.translation_table,
        &format!(
            "{a}.parent_id = {t}.{via} and {a}.field = 'title'",
            a = alias,
            t = owner_table,
            via = via_column
        ),
    )
}

/// Attribution embed: the user row referenced through `via_column`.
pub fn user_embed(owner_table: &str, alias: &str, via_column: &str) -> EmbeddedDef {
    embed(alias, user_reference()).join(
        "app_user",
        &format!("{a}.id = {t}.{via}", a = alias, t = owner_table, via = via_column),
    )
}

/// True when the payload's translated field has no text in any language.
pub fn translation_is_empty(value: Option<&Value>) -> bool {
    let Some(Value::Object(map)) = value else { return true };
    !["pt", "es", "en"]
        .iter()
        .any(|lang| map.get(*lang).and_then(Value::as_str).map(|s| !s.is_empty()).unwrap_or(false))
}

/// Build a translated-text row owned by `(parent_id, field)`, copying any
/// language texts from the request payload.
pub fn new_translation(parent_id: &str, table: &str, field: &str, body: Option<&Value>) -> Value {
    let mut row = json!({
        "id": Uuid::new_v4().to_string(),
        "parent_id": parent_id,
        "table": table,
        "field": field,
    });
    if let (Some(Value::Object(source)), Some(target)) = (body, row.as_object_mut()) {
        for lang in ["pt", "es", "en"] {
            if let Some(text) = source.get(lang) {
                target.insert(lang.to_string(), text.clone());
            }
        }
    }
    row
}

/// Current timestamp in the wire format the engine binds natively.
pub fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_translation_detection() {
        assert!(translation_is_empty(None));
        assert!(translation_is_empty(Some(&json!({}))));
        assert!(translation_is_empty(Some(&json!({"en": ""}))));
        assert!(!translation_is_empty(Some(&json!({"en": "Transports"}))));
    }

    #[test]
    fn new_translation_stamps_ownership() {
        let row = new_translation("p-1", "category", "title", Some(&json!({"en": "Transports"})));
        assert_eq!(row["parent_id"], "p-1");
        assert_eq!(row["table"], "category");
        assert_eq!(row["field"], "title");
        assert_eq!(row["en"], "Transports");
        assert!(row["id"].as_str().is_some());
    }

    #[test]
    fn owned_text_join_targets_configured_table() {
        let config = EngineConfig { translation_table: "translation_test".to_string() };
        let embedded = owned_text(&config, "category", "title");
        let (table, on) = embedded.join.unwrap();
        assert_eq!(table, "translation_test");
        assert_eq!(on, "title.parent_id = category.id and title.field = 'title'");
        assert!(embedded.persisted);
    }
}
