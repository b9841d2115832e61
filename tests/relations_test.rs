// ABOUTME: Integration tests for the relation layer
// ABOUTME: Uniqueness, self-reference, removal semantics, and viewer projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

#![allow(missing_docs, clippy::unwrap_used)]

use ladle::database::Database;
use ladle::errors::ErrorCode;
use ladle::models::{
    CreateRecipeRequest, CreateUserRequest, IngredientLine, Relation, User,
};
use uuid::Uuid;

async fn create_test_db() -> Database {
    // Each in-memory connection is an isolated database instance
    Database::new("sqlite::memory:").await.unwrap()
}

async fn create_user(db: &Database, username: &str) -> User {
    db.create_user(&CreateUserRequest {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        first_name: "Test".to_owned(),
        last_name: "User".to_owned(),
    })
    .await
    .unwrap()
}

async fn create_recipe(db: &Database, author: Uuid, name: &str) -> i64 {
    let ingredient = db.create_ingredient(&format!("{name} base"), "g").await.unwrap();
    db.create_recipe(
        author,
        &CreateRecipeRequest {
            name: name.to_owned(),
            image: format!("recipes/{name}.png"),
            text: "Cook it.".to_owned(),
            cooking_time: 15,
            ingredients: vec![IngredientLine {
                ingredient_id: ingredient.id,
                amount: 100,
            }],
        },
    )
    .await
    .unwrap()
    .id
}

// ============================================================================
// Favorite and cart relations
// ============================================================================

#[tokio::test]
async fn test_favorite_add_twice_then_remove_twice() {
    let db = create_test_db().await;
    let user = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;
    let recipe_id = create_recipe(&db, author.id, "Pancakes").await;

    let relation = Relation::Favorite {
        user_id: user.id,
        recipe_id,
    };

    db.add_relation(&relation).await.unwrap();
    let err = db.add_relation(&relation).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    db.remove_relation(&relation).await.unwrap();
    let err = db.remove_relation(&relation).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_cart_add_twice_then_remove_twice() {
    let db = create_test_db().await;
    let user = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;
    let recipe_id = create_recipe(&db, author.id, "Soup").await;

    let relation = Relation::Cart {
        user_id: user.id,
        recipe_id,
    };

    db.add_relation(&relation).await.unwrap();
    let err = db.add_relation(&relation).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    db.remove_relation(&relation).await.unwrap();
    let err = db.remove_relation(&relation).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_favorite_and_cart_are_distinct_relations() {
    let db = create_test_db().await;
    let user = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;
    let recipe_id = create_recipe(&db, author.id, "Stew").await;

    db.add_relation(&Relation::Favorite {
        user_id: user.id,
        recipe_id,
    })
    .await
    .unwrap();

    // Favoriting does not put the recipe in the cart
    assert!(db.is_favorited(Some(user.id), recipe_id).await.unwrap());
    assert!(!db
        .is_in_shopping_cart(Some(user.id), recipe_id)
        .await
        .unwrap());

    db.add_relation(&Relation::Cart {
        user_id: user.id,
        recipe_id,
    })
    .await
    .unwrap();
    assert!(db
        .is_in_shopping_cart(Some(user.id), recipe_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_favorite_unknown_recipe_not_found() {
    let db = create_test_db().await;
    let user = create_user(&db, "alice").await;

    let err = db
        .add_relation(&Relation::Favorite {
            user_id: user.id,
            recipe_id: 9999,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

// ============================================================================
// Subscriptions
// ============================================================================

#[tokio::test]
async fn test_self_subscription_rejected() {
    let db = create_test_db().await;
    let user = create_user(&db, "alice").await;

    let err = db
        .add_relation(&Relation::Subscription {
            subscriber_id: user.id,
            author_id: user.id,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SelfReference);

    assert!(!db.is_subscribed(Some(user.id), user.id).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_subscription_rejected() {
    let db = create_test_db().await;
    let subscriber = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;

    let relation = Relation::Subscription {
        subscriber_id: subscriber.id,
        author_id: author.id,
    };

    db.add_relation(&relation).await.unwrap();
    let err = db.add_relation(&relation).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);

    // The reverse direction is a different pair and still allowed
    db.add_relation(&Relation::Subscription {
        subscriber_id: author.id,
        author_id: subscriber.id,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_subscription_to_unknown_author_not_found() {
    let db = create_test_db().await;
    let subscriber = create_user(&db, "alice").await;

    let err = db
        .add_relation(&Relation::Subscription {
            subscriber_id: subscriber.id,
            author_id: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_remove_missing_subscription_not_found() {
    let db = create_test_db().await;
    let subscriber = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;

    let err = db
        .remove_relation(&Relation::Subscription {
            subscriber_id: subscriber.id,
            author_id: author.id,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

// ============================================================================
// Viewer projections
// ============================================================================

#[tokio::test]
async fn test_anonymous_viewer_projections_are_false() {
    let db = create_test_db().await;
    let user = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;
    let recipe_id = create_recipe(&db, author.id, "Pie").await;

    db.add_relation(&Relation::Favorite {
        user_id: user.id,
        recipe_id,
    })
    .await
    .unwrap();

    assert!(!db.is_favorited(None, recipe_id).await.unwrap());
    assert!(!db.is_in_shopping_cart(None, recipe_id).await.unwrap());
    assert!(!db.is_subscribed(None, author.id).await.unwrap());
    assert!(db
        .favorited_recipe_ids(None, &[recipe_id])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_batched_projection_checks() {
    let db = create_test_db().await;
    let viewer = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;
    let other_author = create_user(&db, "carol").await;

    let first = create_recipe(&db, author.id, "First").await;
    let second = create_recipe(&db, author.id, "Second").await;
    let third = create_recipe(&db, other_author.id, "Third").await;

    db.add_relation(&Relation::Favorite {
        user_id: viewer.id,
        recipe_id: first,
    })
    .await
    .unwrap();
    db.add_relation(&Relation::Favorite {
        user_id: viewer.id,
        recipe_id: third,
    })
    .await
    .unwrap();
    db.add_relation(&Relation::Subscription {
        subscriber_id: viewer.id,
        author_id: author.id,
    })
    .await
    .unwrap();

    let favorited = db
        .favorited_recipe_ids(Some(viewer.id), &[first, second, third])
        .await
        .unwrap();
    assert!(favorited.contains(&first));
    assert!(!favorited.contains(&second));
    assert!(favorited.contains(&third));

    let subscribed = db
        .subscribed_author_ids(Some(viewer.id), &[author.id, other_author.id])
        .await
        .unwrap();
    assert!(subscribed.contains(&author.id));
    assert!(!subscribed.contains(&other_author.id));
}

// ============================================================================
// Subscription listing
// ============================================================================

#[tokio::test]
async fn test_list_subscriptions_with_preview() {
    let db = create_test_db().await;
    let viewer = create_user(&db, "alice").await;
    let author = create_user(&db, "bob").await;

    for i in 0..5 {
        create_recipe(&db, author.id, &format!("Recipe {i}")).await;
    }
    db.add_relation(&Relation::Subscription {
        subscriber_id: viewer.id,
        author_id: author.id,
    })
    .await
    .unwrap();

    let entries = db.list_subscriptions(viewer.id, Some(2)).await.unwrap();
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.author.username, "bob");
    assert!(entry.author.is_subscribed);
    assert_eq!(entry.recipes_count, 5);
    // Preview is bounded by the requested limit
    assert_eq!(entry.recipes.len(), 2);
}

#[tokio::test]
async fn test_list_subscriptions_empty() {
    let db = create_test_db().await;
    let viewer = create_user(&db, "alice").await;

    let entries = db.list_subscriptions(viewer.id, None).await.unwrap();
    assert!(entries.is_empty());
}
