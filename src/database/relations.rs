// ABOUTME: Relation database operations for favorites, shopping cart, and subscriptions
// ABOUTME: Uniqueness and self-reference enforcement plus batched viewer projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

use std::collections::HashSet;

use chrono::Utc;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::users::row_to_user;
use super::{
    bind_placeholders, is_check_violation, is_foreign_key_violation, is_unique_violation, Database,
};
use crate::constants::env_config;
use crate::errors::{AppError, AppResult};
use crate::models::{Relation, SubscriptionEntry, UserProfile};

impl Database {
    /// Create the favorites, shopping cart, and subscriptions tables
    ///
    /// Pair uniqueness and the self-subscription ban are storage
    /// constraints, so concurrent identical writes race safely: exactly one
    /// insert wins, the rest fail on the constraint.
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_relations(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS favorites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, recipe_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS shopping_cart_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, recipe_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subscriber_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(subscriber_id, author_id),
                CHECK (subscriber_id <> author_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_shopping_cart_items_user ON shopping_cart_items(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_subscriptions_subscriber ON subscriptions(subscriber_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a relation row
    ///
    /// Persists exactly one row on success and nothing on failure. There is
    /// no pre-check SELECT for duplicates: the insert itself races on the
    /// unique constraint, and the loser's error is translated so callers
    /// cannot distinguish a lost race from an ordinary duplicate.
    ///
    /// # Errors
    ///
    /// - `SelfReference` when subscribing to oneself
    /// - `ResourceAlreadyExists` when the pair is already present
    /// - `ResourceNotFound` when the target recipe or author is unknown
    pub async fn add_relation(&self, relation: &Relation) -> AppResult<Relation> {
        match *relation {
            Relation::Favorite { user_id, recipe_id } => {
                self.add_user_recipe_relation("favorites", "favorites", user_id, recipe_id)
                    .await?;
            }
            Relation::Cart { user_id, recipe_id } => {
                self.add_user_recipe_relation(
                    "shopping_cart_items",
                    "the shopping cart",
                    user_id,
                    recipe_id,
                )
                .await?;
            }
            Relation::Subscription {
                subscriber_id,
                author_id,
            } => {
                if subscriber_id == author_id {
                    return Err(AppError::self_reference("Cannot subscribe to yourself")
                        .with_user_id(subscriber_id));
                }
                self.get_user_required(author_id).await?;

                sqlx::query(
                    r"
                    INSERT INTO subscriptions (subscriber_id, author_id, created_at)
                    VALUES ($1, $2, $3)
                    ",
                )
                .bind(subscriber_id.to_string())
                .bind(author_id.to_string())
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::already_exists("Already subscribed to this user")
                            .with_resource_id(author_id.to_string())
                    } else if is_check_violation(&e) {
                        // Constraint backstop for concurrent writes; the
                        // pre-check above covers the sequential path.
                        AppError::self_reference("Cannot subscribe to yourself")
                    } else if is_foreign_key_violation(&e) {
                        AppError::not_found(format!("User {author_id}"))
                    } else {
                        AppError::database(format!("Failed to create subscription: {e}"))
                    }
                })?;
            }
        }

        debug!(kind = relation.kind().as_str(), "Relation added");
        Ok(*relation)
    }

    /// Remove a relation row
    ///
    /// Deletes exactly one row on success.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the pair does not exist.
    pub async fn remove_relation(&self, relation: &Relation) -> AppResult<()> {
        match *relation {
            Relation::Favorite { user_id, recipe_id } => {
                self.remove_user_recipe_relation("favorites", "favorites", user_id, recipe_id)
                    .await
            }
            Relation::Cart { user_id, recipe_id } => {
                self.remove_user_recipe_relation(
                    "shopping_cart_items",
                    "the shopping cart",
                    user_id,
                    recipe_id,
                )
                .await
            }
            Relation::Subscription {
                subscriber_id,
                author_id,
            } => {
                let result = sqlx::query(
                    "DELETE FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2",
                )
                .bind(subscriber_id.to_string())
                .bind(author_id.to_string())
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::not_found(format!(
                        "Subscription to user {author_id}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Whether the viewer has favorited the recipe; false for anonymous
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_favorited(&self, viewer: Option<Uuid>, recipe_id: i64) -> AppResult<bool> {
        self.user_recipe_relation_exists("favorites", viewer, recipe_id)
            .await
    }

    /// Whether the viewer has the recipe in the cart; false for anonymous
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_in_shopping_cart(
        &self,
        viewer: Option<Uuid>,
        recipe_id: i64,
    ) -> AppResult<bool> {
        self.user_recipe_relation_exists("shopping_cart_items", viewer, recipe_id)
            .await
    }

    /// Whether the viewer is subscribed to the author; false for anonymous
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_subscribed(&self, viewer: Option<Uuid>, author_id: Uuid) -> AppResult<bool> {
        let Some(viewer_id) = viewer else {
            return Ok(false);
        };

        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2)",
        )
        .bind(viewer_id.to_string())
        .bind(author_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// The subset of `recipe_ids` the viewer has favorited, in one query
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn favorited_recipe_ids(
        &self,
        viewer: Option<Uuid>,
        recipe_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        self.user_recipe_ids_in("favorites", viewer, recipe_ids)
            .await
    }

    /// The subset of `recipe_ids` in the viewer's cart, in one query
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn shopping_cart_recipe_ids(
        &self,
        viewer: Option<Uuid>,
        recipe_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        self.user_recipe_ids_in("shopping_cart_items", viewer, recipe_ids)
            .await
    }

    /// The subset of `author_ids` the viewer is subscribed to, in one query
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn subscribed_author_ids(
        &self,
        viewer: Option<Uuid>,
        author_ids: &[Uuid],
    ) -> AppResult<HashSet<Uuid>> {
        let Some(viewer_id) = viewer else {
            return Ok(HashSet::new());
        };
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let sql = format!(
            "SELECT author_id FROM subscriptions WHERE subscriber_id = $1 AND author_id IN ({})",
            bind_placeholders(2, author_ids.len())
        );
        let mut query = sqlx::query(&sql).bind(viewer_id.to_string());
        for id in author_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut subscribed = HashSet::with_capacity(rows.len());
        for row in rows {
            let author_id: String = row.get("author_id");
            subscribed.insert(Uuid::parse_str(&author_id).map_err(|e| {
                AppError::database(format!("Malformed author id in storage: {e}"))
            })?);
        }
        Ok(subscribed)
    }

    /// List the authors a user is subscribed to, with recipe previews
    ///
    /// Entries are ordered by author username. Each carries the author
    /// profile, the total recipe count, and a preview of the author's
    /// latest recipes bounded by `recipes_limit` (or the configured
    /// default).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_subscriptions(
        &self,
        subscriber_id: Uuid,
        recipes_limit: Option<i64>,
    ) -> AppResult<Vec<SubscriptionEntry>> {
        let rows = sqlx::query(
            r"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.avatar, u.created_at
            FROM subscriptions s
            JOIN users u ON u.id = s.author_id
            WHERE s.subscriber_id = $1
            ORDER BY u.username ASC
            ",
        )
        .bind(subscriber_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let limit = recipes_limit.unwrap_or(env_config::DEFAULT_RECIPES_PREVIEW_LIMIT);

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let author = row_to_user(row)?;
            let recipes = self.recipes_by_author(author.id, Some(limit)).await?;
            let recipes_count = self.recipe_count_by_author(author.id).await?;
            entries.push(SubscriptionEntry {
                // Rows come from the viewer's own subscription set
                author: UserProfile::from_user(author, true),
                recipes,
                recipes_count,
            });
        }
        Ok(entries)
    }

    /// Insert one (user, recipe) relation row with conflict translation
    async fn add_user_recipe_relation(
        &self,
        table: &'static str,
        label: &'static str,
        user_id: Uuid,
        recipe_id: i64,
    ) -> AppResult<()> {
        let recipe_exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM recipes WHERE id = $1)")
                .bind(recipe_id)
                .fetch_one(&self.pool)
                .await?;
        if recipe_exists == 0 {
            return Err(AppError::not_found(format!("Recipe {recipe_id}")));
        }

        let sql =
            format!("INSERT INTO {table} (user_id, recipe_id, created_at) VALUES ($1, $2, $3)");
        sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(recipe_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::already_exists(format!("Recipe {recipe_id} is already in {label}"))
                        .with_resource_id(recipe_id.to_string())
                } else if is_foreign_key_violation(&e) {
                    AppError::not_found(format!("User {user_id}"))
                } else {
                    AppError::database(format!("Failed to add recipe to {label}: {e}"))
                }
            })?;

        Ok(())
    }

    /// Delete one (user, recipe) relation row
    async fn remove_user_recipe_relation(
        &self,
        table: &'static str,
        label: &'static str,
        user_id: Uuid,
        recipe_id: i64,
    ) -> AppResult<()> {
        let sql = format!("DELETE FROM {table} WHERE user_id = $1 AND recipe_id = $2");
        let result = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Recipe {recipe_id} is not in {label}"
            )));
        }
        Ok(())
    }

    /// Single (user, recipe) existence check; false for anonymous viewers
    async fn user_recipe_relation_exists(
        &self,
        table: &'static str,
        viewer: Option<Uuid>,
        recipe_id: i64,
    ) -> AppResult<bool> {
        let Some(viewer_id) = viewer else {
            return Ok(false);
        };

        let sql =
            format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE user_id = $1 AND recipe_id = $2)");
        let exists: i64 = sqlx::query_scalar(&sql)
            .bind(viewer_id.to_string())
            .bind(recipe_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists != 0)
    }

    /// Batched (user, recipe) existence check over a set of recipe ids
    async fn user_recipe_ids_in(
        &self,
        table: &'static str,
        viewer: Option<Uuid>,
        recipe_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        let Some(viewer_id) = viewer else {
            return Ok(HashSet::new());
        };
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let sql = format!(
            "SELECT recipe_id FROM {table} WHERE user_id = $1 AND recipe_id IN ({})",
            bind_placeholders(2, recipe_ids.len())
        );
        let mut query = sqlx::query(&sql).bind(viewer_id.to_string());
        for id in recipe_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(|row| row.get("recipe_id")).collect())
    }
}
