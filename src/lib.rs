// ABOUTME: Main library entry point for the Ladle recipe platform backend
// ABOUTME: Exposes the relational core: entities, relations, composition, and shopping lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

#![deny(unsafe_code)]

//! # Ladle
//!
//! The relational core of a recipe-sharing platform. Users publish recipes
//! composed of ingredients with quantities, mark recipes as favorites, fill
//! a shopping cart, subscribe to other authors, and export a consolidated
//! shopping list.
//!
//! This crate owns the storage schema and every consistency rule around it:
//! pair uniqueness for favorites, cart items and subscriptions, the ban on
//! self-subscription, atomic replacement of a recipe's ingredient
//! composition, and cascade cleanup when a recipe or user goes away. HTTP
//! routing, authentication, image storage and PDF rendering live in
//! collaborating services and talk to this crate through typed operations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ladle::database::Database;
//! use ladle::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let db = Database::new("sqlite:ladle.db").await?;
//!     let list = db.aggregate_shopping_list(uuid::Uuid::new_v4()).await?;
//!     println!("{} aggregated lines", list.len());
//!     Ok(())
//! }
//! ```

/// Recipe composition validation (ingredient lines, quantity bounds)
pub mod composition;

/// Environment-based configuration
pub mod config;

/// Application constants and policy bounds
pub mod constants;

/// Database layer: schema, entities, relations, aggregation
pub mod database;

/// Unified error handling system with standard error codes and HTTP statuses
pub mod errors;

/// Logging configuration and structured output
pub mod logging;

/// Common data models for users, recipes, ingredients and relations
pub mod models;

/// Shopping list document assembly and the rendering sink boundary
pub mod shopping_list;
