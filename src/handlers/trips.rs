use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::Engine;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::resources::shared::{new_translation, now, translation_is_empty};
use crate::resources::trip;

use super::{body_object, entity_from_body};

/// GET /trips - admin only: regular users only ever see their own trips
/// through their profile's principal trip and invites.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden("only admin users can access all trips"));
    }

    let engine = Engine::connect().await?;
    let def = trip::entity(engine.config());
    let result = engine.select(&def, &params).await?;
    Ok(Json(result))
}

/// GET /trips/:id
pub async fn get(Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let engine = Engine::connect().await?;
    let def = trip::entity(engine.config());
    let record = engine.query_one(&def, &id).await?;
    Ok(Json(record))
}

/// POST /trips - any authenticated user; scope is fixed by the caller's role
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body_object(&payload)?;
    if translation_is_empty(body.get("title")) {
        return Err(ApiError::bad_request("invalid request empty title"));
    }

    let engine = Engine::connect().await?;
    let def = trip::entity(engine.config());

    let id = Uuid::new_v4().to_string();
    let scope = if user.is_admin { trip::SCOPE_SYSTEM } else { trip::SCOPE_USER };

    let mut entity = entity_from_body(&def, &body);
    entity.insert("id".to_string(), json!(id));
    entity.insert("scope".to_string(), json!(scope));
    entity.insert(
        "title".to_string(),
        new_translation(&id, trip::TABLE, "title", body.get("title")),
    );
    entity.insert(
        "description".to_string(),
        new_translation(&id, trip::TABLE, "description", body.get("description")),
    );
    entity.insert("created_by".to_string(), json!(user.user_id));
    entity.insert("created_date".to_string(), now());
    entity.insert("updated_by".to_string(), json!(user.user_id));
    entity.insert("updated_date".to_string(), now());

    engine.insert(&def, &Value::Object(entity)).await?;

    let record = engine.query_one(&def, &id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /trips/:id - the trip's creator or an admin
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = Engine::connect().await?;
    let def = trip::entity(engine.config());
    authorize_owner(&engine, &def, &id, &user).await?;

    let mut changes = body_object(&payload)?;
    changes.insert("updated_by".to_string(), json!(user.user_id));
    changes.insert("updated_date".to_string(), now());

    engine.update(&def, &id, &changes).await?;

    let record = engine.query_one(&def, &id).await?;
    Ok(Json(record))
}

/// DELETE /trips/:id - the trip's creator or an admin
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = Engine::connect().await?;
    let def = trip::entity(engine.config());
    authorize_owner(&engine, &def, &id, &user).await?;

    engine.delete(&def, &[id]).await?;
    Ok(Json(Value::Null))
}

async fn authorize_owner(
    engine: &Engine,
    def: &crate::database::descriptor::EntityDef,
    id: &str,
    user: &AuthUser,
) -> Result<(), ApiError> {
    if user.is_admin {
        return Ok(());
    }
    let record = engine.query_one(def, id).await?;
    let created_by = record.get("created_by").and_then(Value::as_str).unwrap_or_default();
    if created_by != user.user_id {
        return Err(ApiError::forbidden("only the trip owner can change this trip"));
    }
    Ok(())
}
