use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::Engine;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::resources::shared::now;
use crate::resources::user as user_resource;

use super::body_object;

/// GET /users - admin only
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin {
        return Err(ApiError::forbidden("only admin users can access this resource"));
    }

    let engine = Engine::connect().await?;
    let def = user_resource::entity(engine.config());
    let result = engine.select(&def, &params).await?;
    Ok(Json(result))
}

/// GET /users/:id - admins, or the user's own profile
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin && user.user_id != id {
        return Err(ApiError::forbidden("users can only access their own profile"));
    }

    let engine = Engine::connect().await?;
    let def = user_resource::entity(engine.config());
    let record = engine.query_one(&def, &id).await?;
    Ok(Json(record))
}

/// PATCH /users/:id - admins, or the user's own profile. Identity columns
/// are write-once and silently keep their values.
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin && user.user_id != id {
        return Err(ApiError::forbidden("users can only change their own profile"));
    }

    let mut changes = body_object(&payload)?;
    changes.insert("updated_by".to_string(), json!(user.user_id));
    changes.insert("updated_date".to_string(), now());

    let engine = Engine::connect().await?;
    let def = user_resource::entity(engine.config());
    engine.update(&def, &id, &changes).await?;

    let record = engine.query_one(&def, &id).await?;
    Ok(Json(record))
}
