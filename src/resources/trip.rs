//! Trip: a user-planned journey with translated title and description.
//! `scope` is fixed at creation: "system" for admin-created trips, "user"
//! otherwise.

use crate::config::EngineConfig;
use crate::database::descriptor::{col, EntityDef};
use crate::resources::shared::owned_text;

pub const TABLE: &str = "trip";

pub const SCOPE_SYSTEM: &str = "system";
pub const SCOPE_USER: &str = "user";

pub fn entity(config: &EngineConfig) -> EntityDef {
    EntityDef::new(TABLE)
        .column(col("id").write_once())
        .column(col("itinerary_id"))
        .embedded(owned_text(config, TABLE, "title"))
        .embedded(owned_text(config, TABLE, "description"))
        .column(col("scope").write_once())
        .column(col("created_by").write_once())
        .column(col("created_date").write_once())
        .column(col("updated_by"))
        .column(col("updated_date"))
}
