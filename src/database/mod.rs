// ABOUTME: Database management for the Ladle backend
// ABOUTME: Connection handling, per-concern schema migrations, and constraint helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! # Database Management
//!
//! This module provides the storage layer for the Ladle backend. It wraps a
//! SQLite pool, owns the schema, and splits operations into one file per
//! concern: users, ingredients, recipes, relations, and the shopping list
//! aggregation.
//!
//! Every uniqueness and self-reference invariant is enforced as a storage
//! constraint, not just a pre-check, so concurrent identical writes race
//! safely: exactly one succeeds, the rest get a translated conflict error.

mod ingredients;
mod recipes;
mod relations;
mod shopping_list;
mod users;

use sqlx::{Pool, Sqlite, SqlitePool};

use crate::errors::AppResult;

/// Database manager for all persistent state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// schema migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table or index creation fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_ingredients().await?;
        self.migrate_recipes().await?;
        self.migrate_relations().await?;
        Ok(())
    }
}

/// Whether a storage error is a unique-constraint violation
///
/// SQLite reports these in the error message; the caller translates them
/// into `ResourceAlreadyExists` so a lost constraint race is
/// indistinguishable from an ordinary duplicate.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error.to_string().contains("UNIQUE constraint failed")
}

/// Whether a storage error is a CHECK-constraint violation
pub(crate) fn is_check_violation(error: &sqlx::Error) -> bool {
    error.to_string().contains("CHECK constraint failed")
}

/// Whether a storage error is a foreign-key violation
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    error.to_string().contains("FOREIGN KEY constraint failed")
}

/// Build a `$n, $n+1, ...` placeholder list for dynamic `IN (...)` clauses
pub(crate) fn bind_placeholders(start: usize, count: usize) -> String {
    (0..count)
        .map(|i| format!("${}", start + i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn create_test_db() -> AppResult<Database> {
        // Use a simple in-memory database - each connection gets its own isolated instance
        Database::new("sqlite::memory:").await
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = create_test_db().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }
}
