// ABOUTME: Common data models for the Ladle recipe platform
// ABOUTME: Users, ingredients, recipes, relations, and viewer-relative projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ladle Recipes

//! # Data Models
//!
//! Entity types stored by the database layer, the request types accepted by
//! write operations, and the projection types produced by read operations.
//!
//! Projections are viewer-relative: fields like `is_favorited` and
//! `is_subscribed` are computed at read time against an explicit viewer
//! parameter and never stored.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::constants::limits;
use crate::errors::{AppError, AppResult};

/// Allowed username characters: letters, digits, underscore, dot, @, +, -
static USERNAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").ok());

// ============================================================================
// Users
// ============================================================================

/// A registered user account
///
/// Authentication and password storage are handled by the surrounding
/// service; this core only tracks identity and profile data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Unique, pattern-restricted nickname
    pub username: String,
    /// Unique email address, used as the login identifier
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Opaque reference to the stored avatar image, if any
    pub avatar: Option<String>,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Request payload for user registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Desired unique username
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl CreateUserRequest {
    /// Validate field contents before any row is written
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field when the
    /// username is empty, too long, or contains disallowed characters, or
    /// when the email or either name is empty or too long.
    pub fn validate(&self) -> AppResult<()> {
        if self.username.is_empty() {
            return Err(AppError::missing_field("username"));
        }
        if self.username.len() > limits::USERNAME_MAX_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Username must be at most {} characters",
                limits::USERNAME_MAX_LENGTH
            )));
        }
        if let Some(pattern) = USERNAME_PATTERN.as_ref() {
            if !pattern.is_match(&self.username) {
                return Err(AppError::invalid_input(
                    "Username may only contain letters, digits and .@+-_ characters",
                ));
            }
        }
        if self.email.is_empty() {
            return Err(AppError::missing_field("email"));
        }
        if self.email.len() > limits::EMAIL_MAX_LENGTH
            || !self.email.contains('@')
            || self.email.contains(char::is_whitespace)
        {
            return Err(AppError::invalid_input("Email address is not valid"));
        }
        if self.first_name.is_empty() {
            return Err(AppError::missing_field("first_name"));
        }
        if self.last_name.is_empty() {
            return Err(AppError::missing_field("last_name"));
        }
        if self.first_name.len() > limits::PERSON_NAME_MAX_LENGTH
            || self.last_name.len() > limits::PERSON_NAME_MAX_LENGTH
        {
            return Err(AppError::invalid_input(format!(
                "Names must be at most {} characters",
                limits::PERSON_NAME_MAX_LENGTH
            )));
        }
        Ok(())
    }
}

/// A user as seen by a specific viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: Uuid,
    /// Email address
    pub email: String,
    /// Username
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Avatar reference, if set
    pub avatar: Option<String>,
    /// Whether the viewer is subscribed to this user (false for anonymous)
    pub is_subscribed: bool,
}

impl UserProfile {
    /// Build a profile from a stored user and a precomputed subscription flag
    #[must_use]
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
            is_subscribed,
        }
    }
}

// ============================================================================
// Ingredients
// ============================================================================

/// Immutable reference data describing a purchasable ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique identifier
    pub id: i64,
    /// Unique ingredient name
    pub name: String,
    /// Free-text measurement unit, e.g. "g" or "ml"
    pub measurement_unit: String,
}

/// One entry of a bulk ingredient import file
///
/// Fields default to empty strings so a malformed entry is skipped with a
/// warning instead of failing the whole import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientImportEntry {
    /// Ingredient name
    #[serde(default)]
    pub name: String,
    /// Measurement unit
    #[serde(default)]
    pub measurement_unit: String,
}

/// Outcome of a bulk ingredient import
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngredientImportReport {
    /// Number of rows inserted
    pub inserted: u64,
    /// Number of entries skipped (malformed or already present)
    pub skipped: u64,
}

// ============================================================================
// Recipes
// ============================================================================

/// A published recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier
    pub id: i64,
    /// Owning author
    pub author_id: Uuid,
    /// Recipe title
    pub name: String,
    /// Opaque reference to the stored recipe image
    pub image: String,
    /// Free-text description and preparation steps
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i64,
    /// Set once at creation, never updated
    pub publication_date: DateTime<Utc>,
}

/// One (ingredient, amount) line of a recipe composition, write side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    /// Referenced ingredient id
    pub ingredient_id: i64,
    /// Quantity in the ingredient's measurement unit
    pub amount: i64,
}

/// One composition line joined with its ingredient, read side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    /// Ingredient id
    pub id: i64,
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub measurement_unit: String,
    /// Quantity used by the recipe
    pub amount: i64,
}

/// Request payload for recipe creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipeRequest {
    /// Recipe title
    pub name: String,
    /// Image reference, required
    pub image: String,
    /// Description text
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i64,
    /// Ordered ingredient composition
    pub ingredients: Vec<IngredientLine>,
}

impl CreateRecipeRequest {
    /// Validate all fields and the ingredient composition
    ///
    /// # Errors
    ///
    /// Returns a validation error when a required field is empty, the
    /// cooking time is out of bounds, or the composition is invalid.
    pub fn validate(&self) -> AppResult<()> {
        validate_recipe_fields(&self.name, &self.image, &self.text)?;
        crate::composition::validate_cooking_time(self.cooking_time)?;
        crate::composition::validate_composition(&self.ingredients)
    }
}

/// Request payload for recipe update
///
/// The ingredient list is optional in the wire format but mandatory in
/// meaning: an absent list is a validation error, not "leave unchanged".
/// A present list fully replaces the stored composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecipeRequest {
    /// New recipe title
    pub name: String,
    /// New image reference
    pub image: String,
    /// New description text
    pub text: String,
    /// New cooking time in minutes
    pub cooking_time: i64,
    /// Replacement composition; `None` is rejected
    pub ingredients: Option<Vec<IngredientLine>>,
}

impl UpdateRecipeRequest {
    /// Validate all fields and the replacement composition
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` when `ingredients` is absent, and the
    /// same validation errors as creation otherwise.
    pub fn validate(&self) -> AppResult<()> {
        validate_recipe_fields(&self.name, &self.image, &self.text)?;
        crate::composition::validate_cooking_time(self.cooking_time)?;
        let Some(lines) = self.ingredients.as_deref() else {
            return Err(AppError::missing_field("ingredients"));
        };
        crate::composition::validate_composition(lines)
    }
}

fn validate_recipe_fields(name: &str, image: &str, text: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::missing_field("name"));
    }
    if name.len() > limits::RECIPE_NAME_MAX_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Recipe name must be at most {} characters",
            limits::RECIPE_NAME_MAX_LENGTH
        )));
    }
    if image.trim().is_empty() {
        return Err(AppError::missing_field("image"));
    }
    if text.trim().is_empty() {
        return Err(AppError::missing_field("text"));
    }
    Ok(())
}

/// Compact recipe representation for previews and relation responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    /// Recipe id
    pub id: i64,
    /// Recipe title
    pub name: String,
    /// Image reference
    pub image: String,
    /// Cooking time in minutes
    pub cooking_time: i64,
}

/// A recipe as seen by a specific viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    /// Recipe id
    pub id: i64,
    /// Author profile with the viewer's subscription flag
    pub author: UserProfile,
    /// Full ingredient composition
    pub ingredients: Vec<RecipeIngredientDetail>,
    /// Whether the viewer has marked this recipe as favorite
    pub is_favorited: bool,
    /// Whether the viewer has this recipe in the shopping cart
    pub is_in_shopping_cart: bool,
    /// Recipe title
    pub name: String,
    /// Image reference
    pub image: String,
    /// Description text
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i64,
    /// Publication timestamp
    pub publication_date: DateTime<Utc>,
}

/// Read-side recipe filter
///
/// The viewer-relative flags are pass-through when the viewer is anonymous,
/// regardless of their value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipeFilter {
    /// Keep only recipes by this author
    pub author_id: Option<Uuid>,
    /// Keep only recipes the viewer has favorited
    pub favorited_by_viewer: bool,
    /// Keep only recipes in the viewer's shopping cart
    pub in_cart_of_viewer: bool,
}

// ============================================================================
// Relations
// ============================================================================

/// The closed set of per-user relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// User marked a recipe as favorite
    Favorite,
    /// User put a recipe in the shopping cart
    Cart,
    /// User subscribed to an author's publications
    Subscription,
}

impl RelationKind {
    /// Convert to a stable string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Cart => "cart",
            Self::Subscription => "subscription",
        }
    }

    /// Parse from the string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "favorite" => Some(Self::Favorite),
            "cart" => Some(Self::Cart),
            "subscription" => Some(Self::Subscription),
            _ => None,
        }
    }
}

/// A (subject, object) relation row
///
/// Favorites and cart items pair a user with a recipe; subscriptions pair a
/// subscriber with an author. One tagged type keeps the add/remove surface
/// generic over the kind while each variant stays fully typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    /// User marked a recipe as favorite
    Favorite {
        /// Acting user
        user_id: Uuid,
        /// Target recipe
        recipe_id: i64,
    },
    /// User put a recipe in the shopping cart
    Cart {
        /// Acting user
        user_id: Uuid,
        /// Target recipe
        recipe_id: i64,
    },
    /// User subscribed to an author
    Subscription {
        /// Acting user
        subscriber_id: Uuid,
        /// Followed author
        author_id: Uuid,
    },
}

impl Relation {
    /// The kind tag of this relation
    #[must_use]
    pub const fn kind(&self) -> RelationKind {
        match self {
            Self::Favorite { .. } => RelationKind::Favorite,
            Self::Cart { .. } => RelationKind::Cart,
            Self::Subscription { .. } => RelationKind::Subscription,
        }
    }
}

// ============================================================================
// Subscriptions and shopping list read models
// ============================================================================

/// One entry of a user's subscription listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    /// The followed author
    pub author: UserProfile,
    /// Bounded preview of the author's latest recipes
    pub recipes: Vec<RecipeSummary>,
    /// Total number of recipes the author has published
    pub recipes_count: i64,
}

/// One aggregated shopping list row
///
/// Amounts are summed across every recipe in the cart; the total is 64-bit
/// so worst-case carts cannot overflow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListLine {
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub measurement_unit: String,
    /// Summed amount across the cart
    pub total_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user_request() -> CreateUserRequest {
        CreateUserRequest {
            username: "chef.anna".to_owned(),
            email: "anna@example.com".to_owned(),
            first_name: "Anna".to_owned(),
            last_name: "Keller".to_owned(),
        }
    }

    #[test]
    fn test_valid_user_request_passes() {
        assert!(valid_user_request().validate().is_ok());
    }

    #[test]
    fn test_username_pattern_rejected() {
        let mut request = valid_user_request();
        request.username = "not a username!".to_owned();
        let err = request.validate().unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn test_email_without_at_rejected() {
        let mut request = valid_user_request();
        request.email = "anna.example.com".to_owned();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_relation_kind_round_trip() {
        for kind in [
            RelationKind::Favorite,
            RelationKind::Cart,
            RelationKind::Subscription,
        ] {
            assert_eq!(RelationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationKind::parse("unknown"), None);
    }

    #[test]
    fn test_relation_kind_tag() {
        let relation = Relation::Subscription {
            subscriber_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
        };
        assert_eq!(relation.kind(), RelationKind::Subscription);
    }

    #[test]
    fn test_update_request_requires_ingredients() {
        let request = UpdateRecipeRequest {
            name: "Pancakes".to_owned(),
            image: "recipes/pancakes.png".to_owned(),
            text: "Mix and fry.".to_owned(),
            cooking_time: 20,
            ingredients: None,
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::MissingRequiredField);
    }
}
