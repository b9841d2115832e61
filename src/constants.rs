// ABOUTME: System-wide constants and policy bounds for the Ladle backend
// ABOUTME: Quantity and cooking-time limits, field length caps, environment defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! # Constants Module
//!
//! Policy constants and environment-based defaults. Validation bounds live
//! here so the composition validator, the storage layer, and the tests all
//! agree on a single source of truth.

use std::env;

/// Validation bounds for recipe data
pub mod limits {
    /// Smallest accepted ingredient amount in a composition line
    pub const MIN_INGREDIENT_AMOUNT: i64 = 1;

    /// Largest accepted ingredient amount in a composition line
    pub const MAX_INGREDIENT_AMOUNT: i64 = 32_000;

    /// Smallest accepted cooking time in minutes
    pub const MIN_COOKING_TIME: i64 = 1;

    /// Largest accepted cooking time in minutes
    pub const MAX_COOKING_TIME: i64 = 32_000;

    /// Maximum username length
    pub const USERNAME_MAX_LENGTH: usize = 150;

    /// Maximum first/last name length
    pub const PERSON_NAME_MAX_LENGTH: usize = 150;

    /// Maximum email length
    pub const EMAIL_MAX_LENGTH: usize = 254;

    /// Maximum recipe name length
    pub const RECIPE_NAME_MAX_LENGTH: usize = 256;

    /// Maximum ingredient name length
    pub const INGREDIENT_NAME_MAX_LENGTH: usize = 128;

    /// Maximum measurement unit length
    pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 64;
}

/// Environment-based configuration defaults
pub mod env_config {
    use std::env;

    /// Default database URL when `DATABASE_URL` is not set
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/ladle.db";

    /// Default number of recipes shown per author in subscription listings
    pub const DEFAULT_RECIPES_PREVIEW_LIMIT: i64 = 3;

    /// Get the database URL from environment or default
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into())
    }
}

/// Service identity for structured logging
pub mod service {
    /// Service name used in log output
    pub const SERVICE_NAME: &str = "ladle";

    /// Service version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Get the current environment name (development, staging, production)
#[must_use]
pub fn environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
}
