//! Category: hierarchical classification for events and highlights.

use crate::config::EngineConfig;
use crate::database::descriptor::{col, EntityDef};
use crate::resources::shared::{linked_title, owned_text, user_embed};

pub const TABLE: &str = "category";

pub fn entity(config: &EngineConfig) -> EntityDef {
    EntityDef::new(TABLE)
        .column(col("id").write_once())
        .column(col("parent_id"))
        .column(col("active"))
        .embedded(linked_title(config, TABLE, "parent_category", "parent_id"))
        .embedded(owned_text(config, TABLE, "title"))
        .column(col("created_by").write_once())
        .column(col("created_date").write_once())
        .column(col("updated_by"))
        .column(col("updated_date"))
        .embedded(user_embed(TABLE, "created_user", "created_by"))
        .embedded(user_embed(TABLE, "updated_user", "updated_by"))
}
