// ABOUTME: Ingredient reference data operations
// ABOUTME: Lookups, prefix search, and idempotent bulk import with dedup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

use sqlx::Row;
use tracing::warn;

use super::{is_unique_violation, Database};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{Ingredient, IngredientImportEntry, IngredientImportReport};

impl Database {
    /// Create the ingredients table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_ingredients(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                measurement_unit TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients(name)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a single ingredient
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or oversized fields, or
    /// `ResourceAlreadyExists` when the name is taken.
    pub async fn create_ingredient(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> AppResult<Ingredient> {
        validate_ingredient_fields(name, measurement_unit)?;

        let result = sqlx::query(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2)",
        )
        .bind(name)
        .bind(measurement_unit)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists(format!("Ingredient '{name}' already exists"))
            } else {
                AppError::database(format!("Failed to create ingredient: {e}"))
            }
        })?;

        Ok(Ingredient {
            id: result.last_insert_rowid(),
            name: name.to_owned(),
            measurement_unit: measurement_unit.to_owned(),
        })
    }

    /// Get an ingredient by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_ingredient(&self, ingredient_id: i64) -> AppResult<Option<Ingredient>> {
        let row = sqlx::query(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(ingredient_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Ingredient {
            id: row.get("id"),
            name: row.get("name"),
            measurement_unit: row.get("measurement_unit"),
        }))
    }

    /// List ingredients, optionally narrowed to a case-insensitive name prefix
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_ingredients(&self, name_prefix: Option<&str>) -> AppResult<Vec<Ingredient>> {
        let rows = match name_prefix {
            Some(prefix) => {
                sqlx::query(
                    r"
                    SELECT id, name, measurement_unit FROM ingredients
                    WHERE name LIKE $1
                    ORDER BY name ASC
                    ",
                )
                .bind(format!("{prefix}%"))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, name, measurement_unit FROM ingredients ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| Ingredient {
                id: row.get("id"),
                name: row.get("name"),
                measurement_unit: row.get("measurement_unit"),
            })
            .collect())
    }

    /// Bulk-import ingredient reference data
    ///
    /// For each entry, inserts an ingredient only if the (name, unit) pair
    /// is not already present. Malformed entries (blank name or unit) and
    /// name collisions are skipped with a warning; the import itself never
    /// partially fails.
    ///
    /// # Errors
    ///
    /// Returns an error only when a storage operation fails for reasons
    /// other than a constraint conflict.
    pub async fn import_ingredients(
        &self,
        entries: &[IngredientImportEntry],
    ) -> AppResult<IngredientImportReport> {
        let mut report = IngredientImportReport::default();

        for entry in entries {
            let name = entry.name.trim();
            let unit = entry.measurement_unit.trim();

            if name.is_empty() || unit.is_empty() {
                warn!(
                    name = %entry.name,
                    measurement_unit = %entry.measurement_unit,
                    "Skipping malformed ingredient entry"
                );
                report.skipped += 1;
                continue;
            }

            let exists: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM ingredients WHERE name = $1 AND measurement_unit = $2",
            )
            .bind(name)
            .bind(unit)
            .fetch_one(&self.pool)
            .await?;

            if exists > 0 {
                report.skipped += 1;
                continue;
            }

            let inserted = sqlx::query(
                "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2)",
            )
            .bind(name)
            .bind(unit)
            .execute(&self.pool)
            .await;

            match inserted {
                Ok(_) => report.inserted += 1,
                // Same name under a different unit, or a concurrent import
                // got there first. Either way the entry is skipped.
                Err(e) if is_unique_violation(&e) => {
                    warn!(name = %name, measurement_unit = %unit,
                        "Skipping ingredient with conflicting name");
                    report.skipped += 1;
                }
                Err(e) => {
                    return Err(AppError::database(format!(
                        "Failed to import ingredient '{name}': {e}"
                    )));
                }
            }
        }

        Ok(report)
    }
}

fn validate_ingredient_fields(name: &str, measurement_unit: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::missing_field("name"));
    }
    if measurement_unit.trim().is_empty() {
        return Err(AppError::missing_field("measurement_unit"));
    }
    if name.len() > limits::INGREDIENT_NAME_MAX_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Ingredient name must be at most {} characters",
            limits::INGREDIENT_NAME_MAX_LENGTH
        )));
    }
    if measurement_unit.len() > limits::MEASUREMENT_UNIT_MAX_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Measurement unit must be at most {} characters",
            limits::MEASUREMENT_UNIT_MAX_LENGTH
        )));
    }
    Ok(())
}
