// ABOUTME: Recipe database operations with atomic composition writes
// ABOUTME: Create/update/delete with ownership checks, viewer-relative reads, filtering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

use super::users::row_to_user;
use super::{bind_placeholders, is_foreign_key_violation, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    CreateRecipeRequest, IngredientLine, Recipe, RecipeDetail, RecipeFilter,
    RecipeIngredientDetail, RecipeSummary, UpdateRecipeRequest, User, UserProfile,
};

impl Database {
    /// Create the recipes and recipe_ingredients tables
    ///
    /// The (recipe, ingredient) pair is unique at the storage level, and
    /// both join columns cascade on delete so removing a recipe or an
    /// ingredient cleans up its composition rows.
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_recipes(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                image TEXT NOT NULL,
                text TEXT NOT NULL,
                cooking_time INTEGER NOT NULL,
                publication_date DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS recipe_ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                amount INTEGER NOT NULL,
                UNIQUE(recipe_id, ingredient_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_recipes_author ON recipes(author_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Publish a new recipe with its ingredient composition
    ///
    /// The validator runs before any row is written. The recipe row and all
    /// composition rows are committed as one transaction, so a partial
    /// composition is never visible to concurrent readers.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed fields or composition,
    /// `ResourceNotFound` for an unknown author or ingredient id, or a
    /// database error. Nothing is persisted on failure.
    pub async fn create_recipe(
        &self,
        author_id: Uuid,
        request: &CreateRecipeRequest,
    ) -> AppResult<RecipeDetail> {
        request.validate()?;
        self.get_user_required(author_id).await?;

        let mut tx = self.pool.begin().await?;

        verify_ingredients_exist(&mut tx, &request.ingredients).await?;

        let publication_date = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO recipes (author_id, name, image, text, cooking_time, publication_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(author_id.to_string())
        .bind(&request.name)
        .bind(&request.image)
        .bind(&request.text)
        .bind(request.cooking_time)
        .bind(publication_date)
        .execute(&mut *tx)
        .await?;

        let recipe_id = result.last_insert_rowid();
        insert_composition(&mut tx, recipe_id, &request.ingredients).await?;

        tx.commit().await?;

        self.get_recipe_required(recipe_id, Some(author_id)).await
    }

    /// Update a recipe, fully replacing its composition
    ///
    /// Only the author may update a recipe. The ingredient list is
    /// mandatory; all prior composition rows are deleted and the new set
    /// inserted within one transaction.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown recipe,
    /// `PermissionDenied` when the acting user is not the author, a
    /// validation error for malformed input, or a database error. Nothing
    /// is changed on failure.
    pub async fn update_recipe(
        &self,
        recipe_id: i64,
        acting_user: Uuid,
        request: &UpdateRecipeRequest,
    ) -> AppResult<RecipeDetail> {
        request.validate()?;

        let recipe = self
            .get_recipe_row(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))?;
        if recipe.author_id != acting_user {
            return Err(
                AppError::forbidden("Only the author can edit this recipe")
                    .with_user_id(acting_user)
                    .with_resource_id(recipe_id.to_string()),
            );
        }

        // validate() rejected an absent list already
        let lines = request.ingredients.as_deref().unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        verify_ingredients_exist(&mut tx, lines).await?;

        sqlx::query(
            r"
            UPDATE recipes SET name = $2, image = $3, text = $4, cooking_time = $5
            WHERE id = $1
            ",
        )
        .bind(recipe_id)
        .bind(&request.name)
        .bind(&request.image)
        .bind(&request.text)
        .bind(request.cooking_time)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        insert_composition(&mut tx, recipe_id, lines).await?;

        tx.commit().await?;

        self.get_recipe_required(recipe_id, Some(acting_user)).await
    }

    /// Delete a recipe
    ///
    /// Only the author may delete a recipe. Composition rows, favorites and
    /// cart items referencing the recipe are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown recipe or
    /// `PermissionDenied` when the acting user is not the author.
    pub async fn delete_recipe(&self, recipe_id: i64, acting_user: Uuid) -> AppResult<()> {
        let recipe = self
            .get_recipe_row(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))?;
        if recipe.author_id != acting_user {
            return Err(
                AppError::forbidden("Only the author can delete this recipe")
                    .with_user_id(acting_user)
                    .with_resource_id(recipe_id.to_string()),
            );
        }

        sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get a recipe with viewer-relative projections
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_recipe(
        &self,
        recipe_id: i64,
        viewer: Option<Uuid>,
    ) -> AppResult<Option<RecipeDetail>> {
        let Some(recipe) = self.get_recipe_row(recipe_id).await? else {
            return Ok(None);
        };
        let mut details = self.build_recipe_details(vec![recipe], viewer).await?;
        Ok(details.pop())
    }

    /// Get a recipe with viewer-relative projections, erroring if missing
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no such recipe exists.
    pub async fn get_recipe_required(
        &self,
        recipe_id: i64,
        viewer: Option<Uuid>,
    ) -> AppResult<RecipeDetail> {
        self.get_recipe(recipe_id, viewer)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))
    }

    /// List recipes for a viewer, newest first
    ///
    /// The favorited/cart filter flags only apply for an authenticated
    /// viewer; for an anonymous viewer they pass through regardless of
    /// their value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
    ) -> AppResult<Vec<RecipeDetail>> {
        let mut conditions = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(author_id) = filter.author_id {
            binds.push(author_id.to_string());
            conditions.push(format!("r.author_id = ${}", binds.len()));
        }
        if let Some(viewer_id) = viewer {
            if filter.favorited_by_viewer {
                binds.push(viewer_id.to_string());
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ${})",
                    binds.len()
                ));
            }
            if filter.in_cart_of_viewer {
                binds.push(viewer_id.to_string());
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM shopping_cart_items c WHERE c.recipe_id = r.id AND c.user_id = ${})",
                    binds.len()
                ));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            r"
            SELECT r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, r.publication_date
            FROM recipes r
            {where_clause}
            ORDER BY r.publication_date DESC, r.id DESC
            "
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let recipes = rows
            .iter()
            .map(row_to_recipe)
            .collect::<AppResult<Vec<_>>>()?;

        self.build_recipe_details(recipes, viewer).await
    }

    /// Count the recipes published by an author
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recipe_count_by_author(&self, author_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// A bounded preview of an author's latest recipes
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recipes_by_author(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> AppResult<Vec<RecipeSummary>> {
        let sql = match limit {
            Some(_) => {
                r"
                SELECT id, name, image, cooking_time FROM recipes
                WHERE author_id = $1
                ORDER BY publication_date DESC, id DESC
                LIMIT $2
                "
            }
            None => {
                r"
                SELECT id, name, image, cooking_time FROM recipes
                WHERE author_id = $1
                ORDER BY publication_date DESC, id DESC
                "
            }
        };

        let mut query = sqlx::query(sql).bind(author_id.to_string());
        if let Some(limit) = limit {
            query = query.bind(limit);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| RecipeSummary {
                id: row.get("id"),
                name: row.get("name"),
                image: row.get("image"),
                cooking_time: row.get("cooking_time"),
            })
            .collect())
    }

    /// Fetch a bare recipe row without projections
    async fn get_recipe_row(&self, recipe_id: i64) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(
            r"
            SELECT id, author_id, name, image, text, cooking_time, publication_date
            FROM recipes WHERE id = $1
            ",
        )
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_recipe).transpose()
    }

    /// Assemble viewer-relative details for a batch of recipes
    ///
    /// All relation lookups are batched: one query per relation kind for
    /// the whole batch, never one per recipe.
    async fn build_recipe_details(
        &self,
        recipes: Vec<Recipe>,
        viewer: Option<Uuid>,
    ) -> AppResult<Vec<RecipeDetail>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut compositions = self.compositions_for(&recipe_ids).await?;
        let authors = self.users_by_ids(&author_ids).await?;
        let favorited = self.favorited_recipe_ids(viewer, &recipe_ids).await?;
        let in_cart = self.shopping_cart_recipe_ids(viewer, &recipe_ids).await?;
        let subscribed = self.subscribed_author_ids(viewer, &author_ids).await?;

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    AppError::database(format!(
                        "Recipe {} references missing author {}",
                        recipe.id, recipe.author_id
                    ))
                })?;
                Ok(RecipeDetail {
                    id: recipe.id,
                    author: UserProfile::from_user(
                        author,
                        subscribed.contains(&recipe.author_id),
                    ),
                    ingredients: compositions.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    name: recipe.name,
                    image: recipe.image,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                    publication_date: recipe.publication_date,
                })
            })
            .collect()
    }

    /// Load the composition rows for a batch of recipes in insertion order
    async fn compositions_for(
        &self,
        recipe_ids: &[i64],
    ) -> AppResult<HashMap<i64, Vec<RecipeIngredientDetail>>> {
        let sql = format!(
            r"
            SELECT ri.recipe_id, ri.ingredient_id, ri.amount, i.name, i.measurement_unit
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id IN ({})
            ORDER BY ri.id ASC
            ",
            bind_placeholders(1, recipe_ids.len())
        );

        let mut query = sqlx::query(&sql);
        for id in recipe_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut compositions: HashMap<i64, Vec<RecipeIngredientDetail>> = HashMap::new();
        for row in rows {
            let recipe_id: i64 = row.get("recipe_id");
            compositions
                .entry(recipe_id)
                .or_default()
                .push(RecipeIngredientDetail {
                    id: row.get("ingredient_id"),
                    name: row.get("name"),
                    measurement_unit: row.get("measurement_unit"),
                    amount: row.get("amount"),
                });
        }
        Ok(compositions)
    }

    /// Load a batch of users keyed by id
    async fn users_by_ids(&self, user_ids: &[Uuid]) -> AppResult<HashMap<Uuid, User>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            r"
            SELECT id, username, email, first_name, last_name, avatar, created_at
            FROM users WHERE id IN ({})
            ",
            bind_placeholders(1, user_ids.len())
        );

        let mut query = sqlx::query(&sql);
        for id in user_ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut users = HashMap::with_capacity(rows.len());
        for row in &rows {
            let user = row_to_user(row)?;
            users.insert(user.id, user);
        }
        Ok(users)
    }
}

/// Check that every referenced ingredient exists, naming the first missing id
async fn verify_ingredients_exist(
    tx: &mut Transaction<'_, Sqlite>,
    lines: &[IngredientLine],
) -> AppResult<()> {
    if lines.is_empty() {
        return Ok(());
    }

    let sql = format!(
        "SELECT id FROM ingredients WHERE id IN ({})",
        bind_placeholders(1, lines.len())
    );
    let mut query = sqlx::query(&sql);
    for line in lines {
        query = query.bind(line.ingredient_id);
    }
    let rows = query.fetch_all(&mut **tx).await?;

    let found: std::collections::HashSet<i64> =
        rows.into_iter().map(|row| row.get("id")).collect();
    for line in lines {
        if !found.contains(&line.ingredient_id) {
            return Err(AppError::not_found(format!(
                "Ingredient {}",
                line.ingredient_id
            )));
        }
    }
    Ok(())
}

/// Insert the composition rows for a recipe inside an open transaction
async fn insert_composition(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: i64,
    lines: &[IngredientLine],
) -> AppResult<()> {
    for line in lines {
        sqlx::query(
            r"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(recipe_id)
        .bind(line.ingredient_id)
        .bind(line.amount)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found(format!("Ingredient {}", line.ingredient_id))
            } else {
                AppError::database(format!("Failed to store recipe composition: {e}"))
            }
        })?;
    }
    Ok(())
}

/// Convert a database row to a Recipe struct
fn row_to_recipe(row: &sqlx::sqlite::SqliteRow) -> AppResult<Recipe> {
    let author_id: String = row.get("author_id");
    Ok(Recipe {
        id: row.get("id"),
        author_id: Uuid::parse_str(&author_id)
            .map_err(|e| AppError::database(format!("Malformed author id in storage: {e}")))?,
        name: row.get("name"),
        image: row.get("image"),
        text: row.get("text"),
        cooking_time: row.get("cooking_time"),
        publication_date: row.get("publication_date"),
    })
}
