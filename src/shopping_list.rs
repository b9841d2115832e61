// ABOUTME: Shopping list document assembly and the rendering sink boundary
// ABOUTME: Numbered line output consumed by an external PDF or text renderer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! # Shopping List Rendering Boundary
//!
//! The aggregation itself lives in the database layer; this module turns
//! the aggregated lines into an ordered document and hands it to a
//! pluggable renderer. The PDF renderer is an external collaborator that
//! implements [`ShoppingListRenderer`]; [`PlainTextRenderer`] is the
//! built-in reference implementation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::ShoppingListLine;

/// One numbered output line of a shopping list document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedLine {
    /// 1-based position in the document
    pub index: usize,
    /// Ingredient name
    pub name: String,
    /// Summed amount across the cart
    pub total_amount: i64,
    /// Measurement unit
    pub measurement_unit: String,
}

/// A shopping list ready for rendering
///
/// The empty state is explicit rather than an empty line vector so a
/// renderer cannot forget to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShoppingListDocument {
    /// The cart was empty
    Empty,
    /// Ordered, numbered lines
    Lines(Vec<NumberedLine>),
}

impl ShoppingListDocument {
    /// Number a sequence of aggregated lines, preserving their order
    #[must_use]
    pub fn from_lines(lines: Vec<ShoppingListLine>) -> Self {
        if lines.is_empty() {
            return Self::Empty;
        }
        Self::Lines(
            lines
                .into_iter()
                .enumerate()
                .map(|(i, line)| NumberedLine {
                    index: i + 1,
                    name: line.name,
                    total_amount: line.total_amount,
                    measurement_unit: line.measurement_unit,
                })
                .collect(),
        )
    }
}

/// Rendering sink for shopping list documents
///
/// The PDF implementation lives in a collaborating service; this crate
/// only defines the seam and a plain-text reference renderer.
pub trait ShoppingListRenderer {
    /// Render a document into its final byte representation
    ///
    /// # Errors
    ///
    /// Returns an error if the renderer fails to produce output.
    fn render(&self, document: &ShoppingListDocument) -> AppResult<Vec<u8>>;
}

/// Line-per-ingredient text renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl ShoppingListRenderer for PlainTextRenderer {
    fn render(&self, document: &ShoppingListDocument) -> AppResult<Vec<u8>> {
        let text = match document {
            ShoppingListDocument::Empty => "The shopping cart is empty.\n".to_owned(),
            ShoppingListDocument::Lines(lines) => {
                let mut out = String::with_capacity(lines.len() * 32);
                for line in lines {
                    out.push_str(&format!(
                        "{}. {} ({}): {}\n",
                        line.index, line.name, line.measurement_unit, line.total_amount
                    ));
                }
                out
            }
        };
        Ok(text.into_bytes())
    }
}

/// Aggregate a user's cart and render it through the given sink
///
/// # Errors
///
/// Returns an error if the aggregation query or the renderer fails.
pub async fn export_shopping_list(
    db: &Database,
    user_id: Uuid,
    renderer: &dyn ShoppingListRenderer,
) -> AppResult<Vec<u8>> {
    let lines = db.aggregate_shopping_list(user_id).await?;
    let document = ShoppingListDocument::from_lines(lines);
    renderer.render(&document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, total: i64) -> ShoppingListLine {
        ShoppingListLine {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            total_amount: total,
        }
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            ShoppingListDocument::from_lines(Vec::new()),
            ShoppingListDocument::Empty
        );
    }

    #[test]
    fn test_lines_are_numbered_from_one() {
        let document = ShoppingListDocument::from_lines(vec![
            line("Egg", "pcs", 2),
            line("Flour", "g", 300),
        ]);
        let ShoppingListDocument::Lines(lines) = document else {
            panic!("expected lines");
        };
        assert_eq!(lines[0].index, 1);
        assert_eq!(lines[0].name, "Egg");
        assert_eq!(lines[1].index, 2);
        assert_eq!(lines[1].name, "Flour");
    }

    #[test]
    fn test_plain_text_renderer() {
        let document = ShoppingListDocument::from_lines(vec![line("Flour", "g", 300)]);
        let bytes = PlainTextRenderer.render(&document).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "1. Flour (g): 300\n");
    }

    #[test]
    fn test_plain_text_renderer_empty_state() {
        let bytes = PlainTextRenderer.render(&ShoppingListDocument::Empty).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("empty"));
    }
}
