//! User profile. Identity columns are write-once (they mirror the identity
//! provider); only profile fields are updatable, and non-admins may touch
//! only their own row.

use crate::config::EngineConfig;
use crate::database::descriptor::{col, EntityDef};
use crate::resources::shared::{linked_title, user_embed};

pub const TABLE: &str = "app_user";

pub fn entity(config: &EngineConfig) -> EntityDef {
    EntityDef::new(TABLE)
        .column(col("id").write_once())
        .column(col("active").write_once())
        .column(col("first_name").write_once().searchable())
        .column(col("last_name").write_once().searchable())
        .column(col("group").write_once().searchable())
        .column(col("username").write_once().searchable())
        .column(col("email").write_once().searchable())
        .column(col("language_code").write_once())
        .column(col("principal_trip_id"))
        .column(col("image_path"))
        .column(col("country_id"))
        .embedded(linked_title(config, TABLE, "country", "country_id"))
        .column(col("region_id"))
        .embedded(linked_title(config, TABLE, "region", "region_id"))
        .column(col("city_id"))
        .embedded(linked_title(config, TABLE, "city", "city_id"))
        .column(col("about_me"))
        .column(col("created_by").write_once())
        .column(col("created_date").write_once())
        .column(col("updated_by"))
        .column(col("updated_date"))
        .embedded(user_embed(TABLE, "created_user", "created_by"))
        .embedded(user_embed(TABLE, "updated_user", "updated_by"))
}
