use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DishCategory, DishSorting};

/// Core dish model
///
/// Identity is immutable once created; the only field the service itself
/// mutates is the aggregate `rating` (guarded by `rating_version`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub vegetarian: bool,
    pub category: DishCategory,
    /// Arithmetic mean of all active rating submissions, one decimal place.
    /// `None` until the first rating arrives.
    pub rating: Option<Decimal>,
    /// Optimistic-concurrency counter for aggregate rating writes.
    #[serde(default)]
    pub rating_version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for adding a dish to the catalog (seeding and tests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDishRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub vegetarian: bool,
    pub category: DishCategory,
}

/// Filters applied to menu listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuFilters {
    /// Empty set means no category filter
    pub categories: Vec<DishCategory>,
    pub vegetarian_only: bool,
}

/// One page of the menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishPage {
    pub dishes: Vec<Dish>,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_count: usize,
}

impl Dish {
    /// Create a new Dish with generated ID and timestamps
    pub fn new(request: CreateDishRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            price: request.price,
            image: request.image,
            vegetarian: request.vegetarian,
            category: request.category,
            rating: None,
            rating_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the dish passes the given menu filters
    pub fn matches_filters(&self, filters: &MenuFilters) -> bool {
        if !filters.categories.is_empty() && !filters.categories.contains(&self.category) {
            return false;
        }

        if filters.vegetarian_only && !self.vegetarian {
            return false;
        }

        true
    }

    /// Compare two dishes under a caller-requested sort order.
    ///
    /// Unrated dishes order below every rated dish, so they come first under
    /// ascending rating sorts and last under descending ones.
    pub fn cmp_by(&self, other: &Self, sorting: DishSorting) -> Ordering {
        match sorting {
            DishSorting::NameAsc => self.name.cmp(&other.name),
            DishSorting::NameDesc => other.name.cmp(&self.name),
            DishSorting::PriceAsc => self.price.cmp(&other.price),
            DishSorting::PriceDesc => other.price.cmp(&self.price),
            DishSorting::RatingAsc => self.rating.cmp(&other.rating),
            DishSorting::RatingDesc => other.rating.cmp(&self.rating),
        }
    }
}
