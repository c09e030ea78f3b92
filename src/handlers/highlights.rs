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
use crate::resources::highlight;
use crate::resources::shared::{new_translation, now, translation_is_empty};

use super::{body_object, entity_from_body};

/// GET /highlights
pub async fn list(
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = Engine::connect().await?;
    let def = highlight::entity(engine.config());
    let result = engine.select(&def, &params).await?;
    Ok(Json(result))
}

/// GET /highlights/:id
pub async fn get(Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let engine = Engine::connect().await?;
    let def = highlight::entity(engine.config());
    let record = engine.query_one(&def, &id).await?;
    Ok(Json(record))
}

/// POST /highlights - admin only
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden("only admin users can access this resource"));
    }

    let body = body_object(&payload)?;
    if translation_is_empty(body.get("title")) {
        return Err(ApiError::bad_request("empty title"));
    }

    let engine = Engine::connect().await?;
    let def = highlight::entity(engine.config());

    let id = Uuid::new_v4().to_string();
    let mut entity = entity_from_body(&def, &body);
    entity.insert("id".to_string(), json!(id));
    entity.insert("active".to_string(), json!(true));
    entity.insert(
        "title".to_string(),
        new_translation(&id, highlight::TABLE, "title", body.get("title")),
    );
    entity.insert(
        "description".to_string(),
        new_translation(&id, highlight::TABLE, "description", body.get("description")),
    );
    entity.insert("created_by".to_string(), json!(user.user_id));
    entity.insert("created_date".to_string(), now());
    entity.insert("updated_by".to_string(), json!(user.user_id));
    entity.insert("updated_date".to_string(), now());

    engine.insert(&def, &Value::Object(entity)).await?;

    let record = engine.query_one(&def, &id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /highlights/:id - admin only, sparse update
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden("only admin users can access this resource"));
    }

    let mut changes = body_object(&payload)?;
    changes.insert("updated_by".to_string(), json!(user.user_id));
    changes.insert("updated_date".to_string(), now());

    let engine = Engine::connect().await?;
    let def = highlight::entity(engine.config());
    engine.update(&def, &id, &changes).await?;

    let record = engine.query_one(&def, &id).await?;
    Ok(Json(record))
}

/// DELETE /highlights/:id - admin only
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden("only admin users can access this resource"));
    }

    let engine = Engine::connect().await?;
    let def = highlight::entity(engine.config());
    engine.delete(&def, &[id]).await?;
    Ok(Json(Value::Null))
}
