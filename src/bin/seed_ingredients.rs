// ABOUTME: Ingredient reference data loader for the Ladle backend
// ABOUTME: Reads a JSON file of name/unit pairs and bulk-imports missing entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! Ingredient seeder for Ladle.
//!
//! This binary loads ingredient reference data from a JSON file into the
//! database. Entries already present (same name and unit) are skipped, as
//! are malformed entries, so repeated runs are idempotent.
//!
//! Usage:
//! ```bash
//! # Load with the configured DATABASE_URL
//! cargo run --bin seed-ingredients -- data/ingredients.json
//!
//! # Load into a specific database
//! cargo run --bin seed-ingredients -- data/ingredients.json --database-url sqlite:dev.db
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ladle::config::ServerConfig;
use ladle::database::Database;
use ladle::models::IngredientImportEntry;

#[derive(Parser)]
#[command(
    name = "seed-ingredients",
    about = "Ladle ingredient reference data loader",
    long_about = "Load ingredient name/unit pairs from a JSON file into the database"
)]
struct SeedArgs {
    /// Path to the JSON file with ingredient entries
    json_file: PathBuf,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    ladle::logging::init_from_env()?;

    let args = SeedArgs::parse();
    let config = ServerConfig::from_env()?;
    let database_url = args
        .database_url
        .unwrap_or_else(|| config.database_url.clone());

    let raw = tokio::fs::read_to_string(&args.json_file)
        .await
        .with_context(|| format!("Failed to read {}", args.json_file.display()))?;
    let entries: Vec<IngredientImportEntry> =
        serde_json::from_str(&raw).context("Ingredient file is not a valid JSON array")?;

    info!(
        file = %args.json_file.display(),
        entries = entries.len(),
        "Importing ingredient reference data"
    );

    let db = Database::new(&database_url).await?;
    let report = db.import_ingredients(&entries).await?;

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Ingredient import finished"
    );

    Ok(())
}
