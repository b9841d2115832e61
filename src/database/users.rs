// ABOUTME: User account database operations
// ABOUTME: Registration with uniqueness enforcement, lookups, and avatar management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{is_unique_violation, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{CreateUserRequest, User};

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                avatar TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed fields, or
    /// `ResourceAlreadyExists` when the username or email is taken. The
    /// uniqueness check is the storage constraint itself, so two concurrent
    /// registrations of the same name cannot both succeed.
    pub async fn create_user(&self, request: &CreateUserRequest) -> AppResult<User> {
        request.validate()?;

        let user = User {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            avatar: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO users (id, username, email, first_name, last_name, avatar, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                let field = if e.to_string().contains("users.username") {
                    "Username"
                } else {
                    "Email"
                };
                AppError::already_exists(format!("{field} is already taken"))
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        Ok(user)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_impl("email", email).await
    }

    /// Get a user by ID, returning an error if not found
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no such user exists.
    pub async fn get_user_required(&self, user_id: Uuid) -> AppResult<User> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))
    }

    /// Internal implementation for getting a user
    async fn get_user_impl(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!(
            r"
            SELECT id, username, email, first_name, last_name, avatar, created_at
            FROM users WHERE {field} = $1
            "
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Set or replace a user's avatar reference
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no such user exists.
    pub async fn update_avatar(&self, user_id: Uuid, avatar: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
            .bind(avatar)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        Ok(())
    }

    /// Remove a user's avatar reference
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no such user exists.
    pub async fn clear_avatar(&self, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET avatar = NULL WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        Ok(())
    }

    /// Get total user count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Convert a database row to a User struct
pub(super) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Malformed user id in storage: {e}")))?,
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
    })
}
