use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::handlers::auth::authenticate;
use crate::state::AppState;
use crate::util::{now_ts, ts_to_rfc3339, uuid_v4};

use entity::{note, note_tag, tag};

pub(crate) fn note_json(n: &note::Model, tag_ids: &[String]) -> Value {
    serde_json::json!({
        "id": n.id,
        "title": n.title,
        "content": n.content,
        "tagIds": tag_ids,
        "createdAt": ts_to_rfc3339(n.created_at),
        "updatedAt": ts_to_rfc3339(n.updated_at),
    })
}

pub(crate) async fn tag_map_for_notes(
    db: &DatabaseConnection,
    note_ids: &[String],
) -> Result<HashMap<String, Vec<String>>, DbErr> {
    if note_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mappings = note_tag::Entity::find()
        .filter(note_tag::Column::NoteId.is_in(note_ids.to_vec()))
        .all(db)
        .await?;

    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for m in mappings {
        map.entry(m.note_id).or_default().push(m.tag_id);
    }

    Ok(map)
}

fn tag_ids_of<'a>(map: &'a HashMap<String, Vec<String>>, note_id: &str) -> &'a [String] {
    map.get(note_id).map_or(&[], Vec::as_slice)
}

/// Replace a note's tag set wholesale: clear the existing mappings, then
/// insert the new ones. An empty list therefore clears all associations.
async fn replace_note_tags(
    db: &DatabaseConnection,
    user_id: &str,
    note_id: &str,
    tag_ids: &[String],
) -> Result<(), AppError> {
    note_tag::Entity::delete_many()
        .filter(note_tag::Column::NoteId.eq(note_id))
        .exec(db)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let mut unique: Vec<String> = tag_ids.to_vec();
    unique.sort();
    unique.dedup();

    // Every referenced tag must exist and belong to the current user.
    let owned = tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Id.is_in(unique.clone()))
        .all(db)
        .await?;

    if owned.len() != unique.len() {
        return Err(AppError::Validation(
            "Tag does not exist or belongs to another user".to_string(),
        ));
    }

    for tag_id in unique {
        let active = note_tag::ActiveModel {
            id: NotSet,
            note_id: Set(note_id.to_string()),
            tag_id: Set(tag_id),
        };
        active.insert(db).await?;
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct NotesQuery {
    q: Option<String>,
    tag: Option<String>,
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<NotesQuery>,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    let mut find = note::Entity::find()
        .filter(note::Column::UserId.eq(&auth.user_id))
        .order_by_desc(note::Column::UpdatedAt);

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        find = find.filter(
            Condition::any()
                .add(note::Column::Title.contains(q))
                .add(note::Column::Content.contains(q)),
        );
    }

    if let Some(tag_id) = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let tagged: Vec<String> = note_tag::Entity::find()
            .filter(note_tag::Column::TagId.eq(tag_id))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|m| m.note_id)
            .collect();

        find = find.filter(note::Column::Id.is_in(tagged));
    }

    let notes = find.all(&state.db).await?;

    let ids: Vec<String> = notes.iter().map(|n| n.id.clone()).collect();
    let tag_map = tag_map_for_notes(&state.db, &ids).await?;

    let data: Vec<Value> = notes
        .iter()
        .map(|n| note_json(n, tag_ids_of(&tag_map, &n.id)))
        .collect();

    Ok(Json(serde_json::json!({ "data": data })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    title: String,
    content: Option<String>,
    tag_ids: Option<Vec<String>>,
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<NoteData>,
) -> Result<impl IntoResponse, AppError> {
    let auth = authenticate(&state, &headers)?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Note title cannot be blank".to_string()));
    }

    let now = now_ts();
    let id = uuid_v4();

    let active = note::ActiveModel {
        id: Set(id.clone()),
        // Ownership always comes from the verified identity, never the body.
        user_id: Set(auth.user_id.clone()),
        title: Set(title.to_string()),
        content: Set(payload.content.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = active.insert(&state.db).await?;

    if let Some(ref tag_ids) = payload.tag_ids {
        replace_note_tags(&state.db, &auth.user_id, &id, tag_ids).await?;
    }

    let tag_map = tag_map_for_notes(&state.db, &[id.clone()]).await?;

    Ok((
        StatusCode::CREATED,
        Json(note_json(&created, tag_ids_of(&tag_map, &id))),
    ))
}

pub async fn get_note(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(note_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    // A note owned by someone else looks exactly like a missing note.
    let Some(n) = note::Entity::find_by_id(note_id.clone())
        .filter(note::Column::UserId.eq(&auth.user_id))
        .one(&state.db)
        .await?
    else {
        return Err(AppError::NotFound);
    };

    let tag_map = tag_map_for_notes(&state.db, &[note_id.clone()]).await?;

    Ok(Json(note_json(&n, tag_ids_of(&tag_map, &note_id))))
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(note_id): Path<String>,
    Json(payload): Json<NoteData>,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Note title cannot be blank".to_string()));
    }

    let Some(existing) = note::Entity::find_by_id(note_id.clone())
        .filter(note::Column::UserId.eq(&auth.user_id))
        .one(&state.db)
        .await?
    else {
        return Err(AppError::NotFound);
    };

    let now = now_ts();
    let mut active: note::ActiveModel = existing.into();
    active.title = Set(title.to_string());
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    active.updated_at = Set(now);

    let updated = active.update(&state.db).await?;

    // When `tagIds` is absent the association set is left untouched.
    if let Some(ref tag_ids) = payload.tag_ids {
        replace_note_tags(&state.db, &auth.user_id, &note_id, tag_ids).await?;
    }

    let tag_map = tag_map_for_notes(&state.db, &[note_id.clone()]).await?;

    Ok(Json(note_json(&updated, tag_ids_of(&tag_map, &note_id))))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(note_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let auth = authenticate(&state, &headers)?;

    let res = note::Entity::delete_many()
        .filter(note::Column::Id.eq(note_id))
        .filter(note::Column::UserId.eq(&auth.user_id))
        .exec(&state.db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
