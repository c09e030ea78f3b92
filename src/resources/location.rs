//! Location: a country, region or city, named through a translated title.

use crate::config::EngineConfig;
use crate::database::descriptor::{col, EntityDef};
use crate::resources::shared::owned_text;

pub const TABLE: &str = "location";

pub fn entity(config: &EngineConfig) -> EntityDef {
    EntityDef::new(TABLE)
        .column(col("id").write_once())
        .column(col("country_id"))
        .column(col("region_id"))
        .embedded(owned_text(config, TABLE, "title"))
}
