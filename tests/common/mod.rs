use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{middleware, routing::get, Router};
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use uuid::Uuid;

use dishmenu_rs::handlers::{
    api, cors_middleware, health_check, request_validation_middleware,
    security_headers_middleware,
};
use dishmenu_rs::models::{
    CreateDishRequest, Dish, DishCategory, MenuFilters, RatingSubmission, RepositoryError,
    RepositoryResult,
};
use dishmenu_rs::repositories::{DishRepository, OrderHistory, RatingRepository};
use dishmenu_rs::services::{CatalogService, MenuService, RatingService};

/// In-memory dish store with the same conditional-write semantics as the
/// production table
#[derive(Default)]
pub struct InMemoryDishRepository {
    dishes: Mutex<HashMap<Uuid, Dish>>,
}

#[async_trait]
impl DishRepository for InMemoryDishRepository {
    async fn find_all(&self, filters: MenuFilters) -> RepositoryResult<Vec<Dish>> {
        let dishes = self.dishes.lock().unwrap();
        Ok(dishes
            .values()
            .filter(|dish| dish.matches_filters(&filters))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Dish>> {
        let dishes = self.dishes.lock().unwrap();
        Ok(dishes.get(&id).cloned())
    }

    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        let dishes = self.dishes.lock().unwrap();
        Ok(dishes.contains_key(&id))
    }

    async fn create(&self, dish: Dish) -> RepositoryResult<Dish> {
        let mut dishes = self.dishes.lock().unwrap();
        dishes.insert(dish.id, dish.clone());
        Ok(dish)
    }

    async fn set_aggregate_rating(
        &self,
        id: Uuid,
        rating: Decimal,
        expected_version: u64,
    ) -> RepositoryResult<()> {
        let mut dishes = self.dishes.lock().unwrap();
        let dish = dishes.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        // Version check and write happen under one lock, like the
        // conditional UpdateItem they stand in for
        if dish.rating_version != expected_version {
            return Err(RepositoryError::ConditionFailed {
                message: format!(
                    "rating_version is {}, expected {}",
                    dish.rating_version, expected_version
                ),
            });
        }

        dish.rating = Some(rating);
        dish.rating_version += 1;
        dish.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory rating store keyed by (dish, user)
#[derive(Default)]
pub struct InMemoryRatingRepository {
    submissions: Mutex<HashMap<(Uuid, Uuid), RatingSubmission>>,
}

impl InMemoryRatingRepository {
    pub fn submission_count(&self, dish_id: Uuid) -> usize {
        let submissions = self.submissions.lock().unwrap();
        submissions
            .keys()
            .filter(|(stored_dish, _)| *stored_dish == dish_id)
            .count()
    }
}

#[async_trait]
impl RatingRepository for InMemoryRatingRepository {
    async fn upsert(&self, submission: RatingSubmission) -> RepositoryResult<()> {
        let mut submissions = self.submissions.lock().unwrap();
        submissions.insert((submission.dish_id, submission.user_id), submission);
        Ok(())
    }

    async fn find_by_dish(&self, dish_id: Uuid) -> RepositoryResult<Vec<RatingSubmission>> {
        let submissions = self.submissions.lock().unwrap();
        Ok(submissions
            .iter()
            .filter(|((stored_dish, _), _)| *stored_dish == dish_id)
            .map(|(_, submission)| submission.clone())
            .collect())
    }

    async fn find_by_user_and_dish(
        &self,
        user_id: Uuid,
        dish_id: Uuid,
    ) -> RepositoryResult<Option<RatingSubmission>> {
        let submissions = self.submissions.lock().unwrap();
        Ok(submissions.get(&(dish_id, user_id)).cloned())
    }
}

/// In-memory order history; tests record orders to grant rating eligibility
#[derive(Default)]
pub struct InMemoryOrderHistory {
    orders: Mutex<HashSet<(Uuid, Uuid)>>,
}

impl InMemoryOrderHistory {
    pub fn record_order(&self, user_id: Uuid, dish_id: Uuid) {
        let mut orders = self.orders.lock().unwrap();
        orders.insert((user_id, dish_id));
    }
}

#[async_trait]
impl OrderHistory for InMemoryOrderHistory {
    async fn has_ordered(&self, user_id: Uuid, dish_id: Uuid) -> RepositoryResult<bool> {
        let orders = self.orders.lock().unwrap();
        Ok(orders.contains(&(user_id, dish_id)))
    }
}

/// A running service instance backed by in-memory stores
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub dishes: Arc<InMemoryDishRepository>,
    pub ratings: Arc<InMemoryRatingRepository>,
    pub orders: Arc<InMemoryOrderHistory>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_page_size(5).await
    }

    pub async fn with_page_size(page_size: u32) -> Self {
        let dishes = Arc::new(InMemoryDishRepository::default());
        let ratings = Arc::new(InMemoryRatingRepository::default());
        let orders = Arc::new(InMemoryOrderHistory::default());

        let catalog_service = CatalogService::new(dishes.clone(), page_size);
        let rating_service =
            RatingService::new(dishes.clone(), ratings.clone(), orders.clone());
        let menu_service = Arc::new(MenuService::new(catalog_service, rating_service));

        let app = Router::new()
            .route("/health/status", get(health_check))
            .merge(api::create_api_router(menu_service))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(cors_middleware))
            .layer(middleware::from_fn(request_validation_middleware));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self {
            client,
            base_url,
            dishes,
            ratings,
            orders,
        }
    }

    /// Insert a dish directly into the backing store
    pub async fn seed_dish(&self, name: &str, price: Decimal, category: DishCategory) -> Dish {
        self.seed_dish_with(name, price, category, false).await
    }

    pub async fn seed_dish_with(
        &self,
        name: &str,
        price: Decimal,
        category: DishCategory,
        vegetarian: bool,
    ) -> Dish {
        let dish = Dish::new(CreateDishRequest {
            name: name.to_string(),
            description: format!("{} from the test kitchen", name),
            price,
            image: None,
            vegetarian,
            category,
        });

        self.dishes
            .create(dish)
            .await
            .expect("Failed to seed dish")
    }
}
