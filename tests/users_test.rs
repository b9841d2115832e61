// ABOUTME: Integration tests for user accounts
// ABOUTME: Registration uniqueness, field validation, lookups, and avatar lifecycle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

#![allow(missing_docs, clippy::unwrap_used)]

use ladle::database::Database;
use ladle::errors::ErrorCode;
use ladle::models::CreateUserRequest;
use uuid::Uuid;

async fn create_test_db() -> Database {
    Database::new("sqlite::memory:").await.unwrap()
}

fn request(username: &str, email: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_owned(),
        email: email.to_owned(),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
    }
}

#[tokio::test]
async fn test_register_and_lookup() {
    let db = create_test_db().await;

    let user = db
        .create_user(&request("chef.anna", "anna@example.com"))
        .await
        .unwrap();
    assert!(user.avatar.is_none());

    let by_id = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "chef.anna");

    let by_email = db.get_user_by_email("anna@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let db = create_test_db().await;

    db.create_user(&request("anna", "anna@example.com"))
        .await
        .unwrap();
    let err = db
        .create_user(&request("anna", "other@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    assert!(err.message.contains("Username"));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let db = create_test_db().await;

    db.create_user(&request("anna", "anna@example.com"))
        .await
        .unwrap();
    let err = db
        .create_user(&request("other", "anna@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    assert!(err.message.contains("Email"));

    assert_eq!(db.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_username_rejected() {
    let db = create_test_db().await;

    let err = db
        .create_user(&request("not a username!", "anna@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(db.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_names_rejected() {
    let db = create_test_db().await;

    let mut req = request("anna", "anna@example.com");
    req.first_name = String::new();
    let err = db.create_user(&req).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
}

#[tokio::test]
async fn test_avatar_lifecycle() {
    let db = create_test_db().await;
    let user = db
        .create_user(&request("anna", "anna@example.com"))
        .await
        .unwrap();

    db.update_avatar(user.id, "avatars/anna.png").await.unwrap();
    let fetched = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.avatar.as_deref(), Some("avatars/anna.png"));

    db.clear_avatar(user.id).await.unwrap();
    let fetched = db.get_user(user.id).await.unwrap().unwrap();
    assert!(fetched.avatar.is_none());
}

#[tokio::test]
async fn test_avatar_update_for_unknown_user_not_found() {
    let db = create_test_db().await;

    let err = db
        .update_avatar(Uuid::new_v4(), "avatars/ghost.png")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = db.clear_avatar(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_get_user_required_not_found() {
    let db = create_test_db().await;

    let err = db.get_user_required(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
