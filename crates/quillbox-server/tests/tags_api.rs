mod common;

use axum::http::StatusCode;

use common::{body_json, create_note, create_tag, request, signup_and_login, test_app};

#[tokio::test]
async fn duplicate_name_for_the_same_user_conflicts() {
    let (app, _db) = test_app().await;
    let cookie = signup_and_login(&app, "ada@example.com", "pw").await;

    create_tag(&app, &cookie, "Work").await;

    let resp = request(
        &app,
        "POST",
        "/api/tags",
        Some(&cookie),
        Some(serde_json::json!({ "name": "Work" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn same_name_under_different_users_is_allowed() {
    let (app, _db) = test_app().await;
    let ada = signup_and_login(&app, "ada@example.com", "pw").await;
    let bob = signup_and_login(&app, "bob@example.com", "pw").await;

    create_tag(&app, &ada, "Work").await;
    create_tag(&app, &bob, "Work").await;
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let (app, _db) = test_app().await;
    let cookie = signup_and_login(&app, "ada@example.com", "pw").await;

    let resp = request(
        &app,
        "POST",
        "/api/tags",
        Some(&cookie),
        Some(serde_json::json!({ "name": "  " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn renaming_onto_an_existing_name_conflicts() {
    let (app, _db) = test_app().await;
    let cookie = signup_and_login(&app, "ada@example.com", "pw").await;

    create_tag(&app, &cookie, "Work").await;
    let home = create_tag(&app, &cookie, "Home").await;
    let home_id = home["id"].as_str().unwrap();

    let resp = request(
        &app,
        "PUT",
        &format!("/api/tags/{home_id}"),
        Some(&cookie),
        Some(serde_json::json!({ "name": "Work" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rename_updates_the_listing() {
    let (app, _db) = test_app().await;
    let cookie = signup_and_login(&app, "ada@example.com", "pw").await;

    let tag = create_tag(&app, &cookie, "Wrok").await;
    let tag_id = tag["id"].as_str().unwrap();

    let resp = request(
        &app,
        "PUT",
        &format!("/api/tags/{tag_id}"),
        Some(&cookie),
        Some(serde_json::json!({ "name": "Work" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let list = body_json(request(&app, "GET", "/api/tags", Some(&cookie), None).await).await;
    assert_eq!(list["data"][0]["name"], "Work");
}

#[tokio::test]
async fn listing_carries_note_counts() {
    let (app, _db) = test_app().await;
    let cookie = signup_and_login(&app, "ada@example.com", "pw").await;

    let work = create_tag(&app, &cookie, "Work").await;
    let work_id = work["id"].as_str().unwrap();
    create_tag(&app, &cookie, "Home").await;

    create_note(&app, &cookie, "Standup", "", &[work_id]).await;
    create_note(&app, &cookie, "Planning", "", &[work_id]).await;

    let list = body_json(request(&app, "GET", "/api/tags", Some(&cookie), None).await).await;
    let data = list["data"].as_array().unwrap();

    // Listing is name-ordered.
    assert_eq!(data[0]["name"], "Home");
    assert_eq!(data[0]["noteCount"], 0);
    assert_eq!(data[1]["name"], "Work");
    assert_eq!(data[1]["noteCount"], 2);
}

#[tokio::test]
async fn deleting_a_tag_detaches_it_from_notes() {
    let (app, _db) = test_app().await;
    let cookie = signup_and_login(&app, "ada@example.com", "pw").await;

    let work = create_tag(&app, &cookie, "Work").await;
    let work_id = work["id"].as_str().unwrap();

    let note = create_note(&app, &cookie, "Standup", "", &[work_id]).await;
    let note_id = note["id"].as_str().unwrap();

    let resp = request(
        &app,
        "DELETE",
        &format!("/api/tags/{work_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let fetched = body_json(
        request(
            &app,
            "GET",
            &format!("/api/notes/{note_id}"),
            Some(&cookie),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(fetched["tagIds"], serde_json::json!([]));
}

#[tokio::test]
async fn another_users_tag_reads_as_not_found() {
    let (app, _db) = test_app().await;
    let ada = signup_and_login(&app, "ada@example.com", "pw").await;
    let bob = signup_and_login(&app, "bob@example.com", "pw").await;

    let tag = create_tag(&app, &ada, "Work").await;
    let tag_id = tag["id"].as_str().unwrap();

    let resp = request(
        &app,
        "PUT",
        &format!("/api/tags/{tag_id}"),
        Some(&bob),
        Some(serde_json::json!({ "name": "Stolen" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = request(
        &app,
        "DELETE",
        &format!("/api/tags/{tag_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attaching_a_foreign_tag_to_a_note_is_rejected() {
    let (app, _db) = test_app().await;
    let ada = signup_and_login(&app, "ada@example.com", "pw").await;
    let bob = signup_and_login(&app, "bob@example.com", "pw").await;

    let tag = create_tag(&app, &ada, "Work").await;
    let tag_id = tag["id"].as_str().unwrap();

    let resp = request(
        &app,
        "POST",
        "/api/notes",
        Some(&bob),
        Some(serde_json::json!({
            "title": "Sneaky",
            "content": "",
            "tagIds": [tag_id],
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
