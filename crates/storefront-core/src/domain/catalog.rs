//! Catalog entities: products, categories, reviews.

use crate::{CategoryId, ProductId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product offered by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier for the product.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Price in minor currency units.
    pub price: i64,
    /// Units in stock.
    pub stock: u32,
    /// Owning category, if any.
    pub category_id: Option<CategoryId>,
    /// Average review rating (0-5), if reviewed.
    pub rating: Option<f32>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with no category and no reviews.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            price,
            stock: 0,
            category_id: None,
            rating: None,
            updated_at: Utc::now(),
        }
    }

    /// Checks if the product can be ordered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields accepted when creating or updating a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: u32,
    pub category_id: Option<CategoryId>,
}

/// A product category. Categories form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<CategoryId>,
}

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Rating from 1 to 5.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A search-as-you-type suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub product_id: ProductId,
    pub label: String,
}

/// Site-wide search results spanning products and categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub total: u64,
}
