// ABOUTME: Shopping list aggregation over a user's cart
// ABOUTME: Joins cart recipes to their compositions, groups and sums by ingredient
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::errors::AppResult;
use crate::models::ShoppingListLine;

impl Database {
    /// Aggregate the shopping list for a user's cart
    ///
    /// Collects every composition row of every recipe in the user's cart,
    /// groups by (ingredient name, measurement unit), sums the amounts, and
    /// orders ascending by name then unit. Identical cart contents always
    /// produce identical output regardless of insertion order. Sums are
    /// 64-bit so worst-case carts cannot overflow them.
    ///
    /// An empty cart yields an empty list, not an error; the rendering sink
    /// decides how to present the empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn aggregate_shopping_list(
        &self,
        user_id: Uuid,
    ) -> AppResult<Vec<ShoppingListLine>> {
        let rows = sqlx::query(
            r"
            SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total_amount
            FROM shopping_cart_items sc
            JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE sc.user_id = $1
            GROUP BY i.name, i.measurement_unit
            ORDER BY i.name ASC, i.measurement_unit ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ShoppingListLine {
                name: row.get("name"),
                measurement_unit: row.get("measurement_unit"),
                total_amount: row.get("total_amount"),
            })
            .collect())
    }
}
