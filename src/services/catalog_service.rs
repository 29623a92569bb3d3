use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    Dish, DishPage, DishSorting, MenuFilters, ServiceError, ServiceResult,
};
use crate::repositories::DishRepository;

/// Compute the page count for a result set. An empty result still has one
/// (empty) page, so page 1 is always addressable.
pub fn total_pages(total_count: usize, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(page_size as usize);
    pages.max(1) as u32
}

/// Service answering catalog lookups and filtered, sorted, paged menu queries
pub struct CatalogService {
    repository: Arc<dyn DishRepository>,
    page_size: u32,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn DishRepository>, page_size: u32) -> Self {
        Self {
            repository,
            page_size,
        }
    }

    /// One page of the menu, filtered and sorted.
    ///
    /// Pages are 1-based. A page outside [1, total_pages] is an error; with
    /// an empty filtered result, total_pages is 1 and page 1 returns an
    /// empty page. When no sorting is requested the catalog's natural order
    /// (creation time) applies.
    #[instrument(skip(self), fields(filters = ?filters, sorting = ?sorting, page = page))]
    pub async fn list_page(
        &self,
        filters: MenuFilters,
        sorting: Option<DishSorting>,
        page: u32,
    ) -> ServiceResult<DishPage> {
        crate::info_with_trace!("Listing menu page");

        let dishes = self.repository.find_all(filters.clone()).await?;

        // The repository pushes filters down where it can; re-check here so
        // the invariant holds regardless of backend capabilities.
        let mut filtered: Vec<Dish> = dishes
            .into_iter()
            .filter(|dish| dish.matches_filters(&filters))
            .collect();

        match sorting {
            Some(order) => filtered.sort_by(|a, b| a.cmp_by(b, order)),
            None => filtered.sort_by_key(|dish| dish.created_at),
        }

        let total_count = filtered.len();
        let total_pages = total_pages(total_count, self.page_size);

        if page < 1 || page > total_pages {
            crate::warn_with_trace!(
                "Page {} out of range, total pages {}",
                page,
                total_pages
            );
            return Err(ServiceError::InvalidPage { page, total_pages });
        }

        let start = ((page - 1) * self.page_size) as usize;
        let dishes: Vec<Dish> = filtered
            .into_iter()
            .skip(start)
            .take(self.page_size as usize)
            .collect();

        crate::info_with_trace!(
            "Menu page {} of {} with {} dishes",
            page,
            total_pages,
            dishes.len()
        );

        Ok(DishPage {
            dishes,
            page,
            total_pages,
            page_size: self.page_size,
            total_count,
        })
    }

    /// Get a specific dish by ID
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_dish(&self, id: Uuid) -> ServiceResult<Dish> {
        crate::info_with_trace!("Retrieving dish details");

        match self.repository.find_by_id(id).await? {
            Some(dish) => Ok(dish),
            None => {
                crate::warn_with_trace!("Dish not found");
                Err(ServiceError::DishNotFound { id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateDishRequest, DishCategory, RepositoryError};
    use async_trait::async_trait;
    use mockall::mock;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    mock! {
        TestDishRepository {}

        #[async_trait]
        impl DishRepository for TestDishRepository {
            async fn find_all(&self, filters: MenuFilters) -> Result<Vec<Dish>, RepositoryError>;
            async fn find_by_id(&self, id: Uuid) -> Result<Option<Dish>, RepositoryError>;
            async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError>;
            async fn create(&self, dish: Dish) -> Result<Dish, RepositoryError>;
            async fn set_aggregate_rating(
                &self,
                id: Uuid,
                rating: Decimal,
                expected_version: u64,
            ) -> Result<(), RepositoryError>;
        }
    }

    fn test_dish(name: &str, category: DishCategory, vegetarian: bool, price: Decimal) -> Dish {
        Dish::new(CreateDishRequest {
            name: name.to_string(),
            description: format!("{} description", name),
            price,
            image: None,
            vegetarian,
            category,
        })
    }

    fn sample_menu() -> Vec<Dish> {
        vec![
            test_dish("Pad Thai", DishCategory::Wok, false, dec!(11.50)),
            test_dish("Margherita", DishCategory::Pizza, true, dec!(9.50)),
            test_dish("Borscht", DishCategory::Soup, false, dec!(6.00)),
            test_dish("Tiramisu", DishCategory::Dessert, true, dec!(5.50)),
            test_dish("Lemonade", DishCategory::Drink, true, dec!(2.50)),
            test_dish("Udon", DishCategory::Wok, true, dec!(10.00)),
            test_dish("Pepperoni", DishCategory::Pizza, false, dec!(10.50)),
        ]
    }

    fn service_with_menu(menu: Vec<Dish>, page_size: u32) -> CatalogService {
        let mut mock_repo = MockTestDishRepository::new();
        mock_repo
            .expect_find_all()
            .returning(move |_| Ok(menu.clone()));
        CatalogService::new(Arc::new(mock_repo), page_size)
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 5), 1);
        assert_eq!(total_pages(1, 5), 1);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(6, 5), 2);
        assert_eq!(total_pages(11, 5), 3);
    }

    #[tokio::test]
    async fn test_list_page_paginates() {
        let service = service_with_menu(sample_menu(), 5);

        let first = service
            .list_page(MenuFilters::default(), None, 1)
            .await
            .unwrap();
        assert_eq!(first.dishes.len(), 5);
        assert_eq!(first.page, 1);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_count, 7);

        let second = service
            .list_page(MenuFilters::default(), None, 2)
            .await
            .unwrap();
        assert_eq!(second.dishes.len(), 2);
        assert_eq!(second.page, 2);
    }

    #[tokio::test]
    async fn test_list_page_rejects_out_of_range_pages() {
        let service = service_with_menu(sample_menu(), 5);

        match service.list_page(MenuFilters::default(), None, 0).await {
            Err(ServiceError::InvalidPage { page, .. }) => assert_eq!(page, 0),
            other => panic!("Expected InvalidPage, got {:?}", other),
        }

        match service.list_page(MenuFilters::default(), None, 3).await {
            Err(ServiceError::InvalidPage { page, total_pages }) => {
                assert_eq!(page, 3);
                assert_eq!(total_pages, 2);
            }
            other => panic!("Expected InvalidPage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_page_empty_result_page_one_is_valid() {
        let service = service_with_menu(vec![], 5);

        let page = service
            .list_page(MenuFilters::default(), None, 1)
            .await
            .unwrap();

        assert!(page.dishes.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_count, 0);

        // ...but page 2 of an empty result is still out of range
        assert!(matches!(
            service.list_page(MenuFilters::default(), None, 2).await,
            Err(ServiceError::InvalidPage { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_page_filters_by_category_and_vegetarian() {
        let service = service_with_menu(sample_menu(), 5);

        let filters = MenuFilters {
            categories: vec![DishCategory::Wok, DishCategory::Pizza],
            vegetarian_only: true,
        };
        let page = service.list_page(filters, None, 1).await.unwrap();

        let names: Vec<&str> = page.dishes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(page.total_count, 2);
        assert!(names.contains(&"Margherita"));
        assert!(names.contains(&"Udon"));
    }

    #[tokio::test]
    async fn test_list_page_applies_sorting() {
        let service = service_with_menu(sample_menu(), 10);

        let page = service
            .list_page(MenuFilters::default(), Some(DishSorting::PriceAsc), 1)
            .await
            .unwrap();

        let prices: Vec<_> = page.dishes.iter().map(|d| d.price).collect();
        let mut sorted = prices.clone();
        sorted.sort();
        assert_eq!(prices, sorted);

        let page = service
            .list_page(MenuFilters::default(), Some(DishSorting::NameDesc), 1)
            .await
            .unwrap();
        assert_eq!(page.dishes.first().unwrap().name, "Udon");
    }

    #[tokio::test]
    async fn test_get_dish_success() {
        let dish = test_dish("Margherita", DishCategory::Pizza, true, dec!(9.50));
        let id = dish.id;

        let mut mock_repo = MockTestDishRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(id))
            .times(1)
            .returning(move |_| Ok(Some(dish.clone())));

        let service = CatalogService::new(Arc::new(mock_repo), 5);

        let found = service.get_dish(id).await.unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn test_get_dish_not_found() {
        let id = Uuid::new_v4();

        let mut mock_repo = MockTestDishRepository::new();
        mock_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = CatalogService::new(Arc::new(mock_repo), 5);

        match service.get_dish(id).await {
            Err(ServiceError::DishNotFound { id: missing }) => assert_eq!(missing, id),
            other => panic!("Expected DishNotFound, got {:?}", other),
        }
    }
}
