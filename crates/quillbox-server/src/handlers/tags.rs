use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::handlers::auth::authenticate;
use crate::state::AppState;
use crate::util::{now_ts, ts_to_rfc3339, uuid_v4};

use entity::{note_tag, tag};

fn tag_json(t: &tag::Model, note_count: usize) -> Value {
    serde_json::json!({
        "id": t.id,
        "name": t.name,
        "noteCount": note_count,
        "createdAt": ts_to_rfc3339(t.created_at),
        "updatedAt": ts_to_rfc3339(t.updated_at),
    })
}

/// Surface the `(user_id, name)` unique index as a conflict; everything
/// else stays a database error.
fn map_name_collision(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A tag with this name already exists".to_string())
        }
        _ => AppError::Db(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagData {
    name: String,
}

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    let tags = tag::Entity::find()
        .filter(tag::Column::UserId.eq(&auth.user_id))
        .order_by_asc(tag::Column::Name)
        .all(&state.db)
        .await?;

    let ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    if !ids.is_empty() {
        let mappings = note_tag::Entity::find()
            .filter(note_tag::Column::TagId.is_in(ids))
            .all(&state.db)
            .await?;
        for m in mappings {
            *counts.entry(m.tag_id).or_default() += 1;
        }
    }

    let data: Vec<Value> = tags
        .iter()
        .map(|t| tag_json(t, counts.get(&t.id).copied().unwrap_or(0)))
        .collect();

    Ok(Json(serde_json::json!({ "data": data })))
}

pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TagData>,
) -> Result<impl IntoResponse, AppError> {
    let auth = authenticate(&state, &headers)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be blank".to_string()));
    }

    let now = now_ts();
    let active = tag::ActiveModel {
        id: Set(uuid_v4()),
        user_id: Set(auth.user_id.clone()),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = active.insert(&state.db).await.map_err(map_name_collision)?;

    Ok((StatusCode::CREATED, Json(tag_json(&created, 0))))
}

pub async fn update_tag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tag_id): Path<String>,
    Json(payload): Json<TagData>,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Tag name cannot be blank".to_string()));
    }

    let Some(t) = tag::Entity::find_by_id(tag_id.clone())
        .filter(tag::Column::UserId.eq(&auth.user_id))
        .one(&state.db)
        .await?
    else {
        return Err(AppError::NotFound);
    };

    let now = now_ts();
    let mut active: tag::ActiveModel = t.into();
    active.name = Set(name.to_string());
    active.updated_at = Set(now);

    let updated = active.update(&state.db).await.map_err(map_name_collision)?;

    let note_count = note_tag::Entity::find()
        .filter(note_tag::Column::TagId.eq(&tag_id))
        .all(&state.db)
        .await?
        .len();

    Ok(Json(tag_json(&updated, note_count)))
}

pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tag_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let auth = authenticate(&state, &headers)?;

    // Join rows cascade with the tag.
    let res = tag::Entity::delete_many()
        .filter(tag::Column::Id.eq(tag_id))
        .filter(tag::Column::UserId.eq(&auth.user_id))
        .exec(&state.db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
