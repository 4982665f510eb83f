use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::Value;

use crate::error::AppError;
use crate::handlers::auth::authenticate;
use crate::handlers::notes::{note_json, tag_map_for_notes};
use crate::state::AppState;

use entity::{note, tag};

const RECENT_NOTES: u64 = 5;

pub async fn overview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    let note_count = note::Entity::find()
        .filter(note::Column::UserId.eq(&auth.user_id))
        .count(&state.db)
        .await?;

    let tag_count = tag::Entity::find()
        .filter(tag::Column::UserId.eq(&auth.user_id))
        .count(&state.db)
        .await?;

    let recent = note::Entity::find()
        .filter(note::Column::UserId.eq(&auth.user_id))
        .order_by_desc(note::Column::UpdatedAt)
        .limit(RECENT_NOTES)
        .all(&state.db)
        .await?;

    let ids: Vec<String> = recent.iter().map(|n| n.id.clone()).collect();
    let tag_map = tag_map_for_notes(&state.db, &ids).await?;

    let recent_notes: Vec<Value> = recent
        .iter()
        .map(|n| note_json(n, tag_map.get(&n.id).map_or(&[], Vec::as_slice)))
        .collect();

    Ok(Json(serde_json::json!({
        "noteCount": note_count,
        "tagCount": tag_count,
        "recentNotes": recent_notes,
    })))
}
