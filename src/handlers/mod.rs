//! REST glue: one module per resource, all persistence through the engine.

pub mod categories;
pub mod events;
pub mod highlights;
pub mod locations;
pub mod trips;
pub mod users;

use serde_json::{Map, Value};

use crate::database::descriptor::EntityDef;
use crate::error::ApiError;

/// Copy the request body's values for the definition's root columns into a
/// fresh entity map. Handlers then overwrite id, audit and ownership fields
/// before inserting; anything in the body that is not a root column is
/// dropped here.
pub(crate) fn entity_from_body(def: &EntityDef, body: &Map<String, Value>) -> Map<String, Value> {
    def.root_columns()
        .filter_map(|column| {
            let output = column.output.as_ref()?;
            body.get(output).map(|value| (output.clone(), value.clone()))
        })
        .collect()
}

/// The request body, required to be a JSON object.
pub(crate) fn body_object(payload: &Value) -> Result<Map<String, Value>, ApiError> {
    payload
        .as_object()
        .cloned()
        .ok_or_else(|| ApiError::bad_request("request body must be a JSON object"))
}
