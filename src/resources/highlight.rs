//! Highlight: a curated group of trips and events surfaced to users,
//! optionally scheduled and scoped to a location.

use crate::config::EngineConfig;
use crate::database::descriptor::{col, EntityDef};
use crate::resources::shared::{linked_title, owned_text, user_embed};

pub const TABLE: &str = "highlight";

pub fn entity(config: &EngineConfig) -> EntityDef {
    EntityDef::new(TABLE)
        .column(col("id").write_once())
        .column(col("active"))
        .embedded(owned_text(config, TABLE, "title"))
        .embedded(owned_text(config, TABLE, "description"))
        .column(col("schedule_date"))
        .column(col("filter"))
        .column(col("country_id"))
        .embedded(linked_title(config, TABLE, "country", "country_id"))
        .column(col("region_id"))
        .embedded(linked_title(config, TABLE, "region", "region_id"))
        .column(col("city_id"))
        .embedded(linked_title(config, TABLE, "city", "city_id"))
        .column(col("trips"))
        .column(col("events"))
        .column(col("created_by").write_once())
        .column(col("created_date").write_once())
        .column(col("updated_by"))
        .column(col("updated_date"))
        .embedded(user_embed(TABLE, "created_user", "created_by"))
        .embedded(user_embed(TABLE, "updated_user", "updated_by"))
}
