// ABOUTME: Recipe composition validation for create and update operations
// ABOUTME: Enforces non-empty compositions, unique ingredient ids, and quantity bounds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! # Recipe Composition Validator
//!
//! Pure validation of the (ingredient, amount) lines attached to a recipe.
//! The validator runs before any row is written; on success the database
//! layer persists the recipe and all of its lines as one atomic unit.

use std::collections::HashSet;

use crate::constants::limits;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::IngredientLine;

/// Validate an ordered ingredient composition
///
/// # Errors
///
/// - `EmptyComposition` when the sequence is empty
/// - `DuplicateIngredient` when any ingredient id repeats, in any order
/// - `ValueOutOfRange` when an amount falls outside the allowed bounds
pub fn validate_composition(lines: &[IngredientLine]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::new(
            ErrorCode::EmptyComposition,
            "A recipe needs at least one ingredient",
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.ingredient_id) {
            return Err(AppError::new(
                ErrorCode::DuplicateIngredient,
                format!(
                    "Ingredient {} appears more than once in the composition",
                    line.ingredient_id
                ),
            )
            .with_resource_id(line.ingredient_id.to_string()));
        }
        if line.amount < limits::MIN_INGREDIENT_AMOUNT || line.amount > limits::MAX_INGREDIENT_AMOUNT
        {
            return Err(AppError::value_out_of_range(
                "amount",
                line.amount,
                limits::MIN_INGREDIENT_AMOUNT,
                limits::MAX_INGREDIENT_AMOUNT,
            )
            .with_resource_id(line.ingredient_id.to_string()));
        }
    }

    Ok(())
}

/// Validate a cooking time in minutes against the policy bounds
///
/// # Errors
///
/// Returns `ValueOutOfRange` when the value is outside the allowed bounds.
pub fn validate_cooking_time(minutes: i64) -> AppResult<()> {
    if minutes < limits::MIN_COOKING_TIME || minutes > limits::MAX_COOKING_TIME {
        return Err(AppError::value_out_of_range(
            "cooking_time",
            minutes,
            limits::MIN_COOKING_TIME,
            limits::MAX_COOKING_TIME,
        ));
    }
    Ok(())
}
