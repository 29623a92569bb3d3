use uuid::Uuid;

use crate::models::{Dish, DishPage, DishSorting, MenuFilters, RatingScore, ServiceResult};
use crate::services::{CatalogService, RatingService};

/// Facade over the catalog and the rating gate.
///
/// Exposes exactly the four menu use cases and nothing else; all invariants
/// live in the composed services.
pub struct MenuService {
    catalog: CatalogService,
    ratings: RatingService,
}

impl MenuService {
    pub fn new(catalog: CatalogService, ratings: RatingService) -> Self {
        Self { catalog, ratings }
    }

    /// Browse one page of the menu
    pub async fn list_menu(
        &self,
        filters: MenuFilters,
        sorting: Option<DishSorting>,
        page: u32,
    ) -> ServiceResult<DishPage> {
        self.catalog.list_page(filters, sorting, page).await
    }

    /// Inspect a single dish
    pub async fn get_dish(&self, id: Uuid) -> ServiceResult<Dish> {
        self.catalog.get_dish(id).await
    }

    /// Check whether a user may rate a dish
    pub async fn check_rating_eligibility(
        &self,
        user_id: Uuid,
        dish_id: Uuid,
    ) -> ServiceResult<bool> {
        self.ratings.can_rate(user_id, dish_id).await
    }

    /// Submit a rating for a dish
    pub async fn submit_rating(
        &self,
        user_id: Uuid,
        dish_id: Uuid,
        score: RatingScore,
    ) -> ServiceResult<()> {
        self.ratings.submit(user_id, dish_id, score).await
    }
}
