// ABOUTME: Environment-based configuration for the Ladle backend
// ABOUTME: Database URL, preview limits, and logging level with sane defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! # Configuration Management
//!
//! Environment-only configuration, read once at startup. Every value has a
//! default so a bare development environment works without any setup.

use std::env;

use crate::constants::env_config;
use crate::errors::{AppError, AppResult};

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Database connection URL
    pub database_url: String,
    /// Recipes shown per author in subscription listings
    pub recipes_preview_limit: i64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: env_config::DEFAULT_DATABASE_URL.into(),
            recipes_preview_limit: env_config::DEFAULT_RECIPES_PREVIEW_LIMIT,
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a numeric variable is set but
    /// cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        let database_url = env_config::database_url();

        let recipes_preview_limit = match env::var("RECIPES_PREVIEW_LIMIT") {
            Ok(value) => value.parse::<i64>().map_err(|e| {
                AppError::config(format!("Invalid RECIPES_PREVIEW_LIMIT '{value}': {e}"))
            })?,
            Err(_) => env_config::DEFAULT_RECIPES_PREVIEW_LIMIT,
        };
        if recipes_preview_limit < 0 {
            return Err(AppError::config(
                "RECIPES_PREVIEW_LIMIT must not be negative",
            ));
        }

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        Ok(Self {
            database_url,
            recipes_preview_limit,
            log_level,
        })
    }
}
