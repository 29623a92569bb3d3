// Repositories module - data access layer

pub mod dish_repository;
pub mod order_history;
pub mod rating_repository;

pub use dish_repository::{DishRepository, DynamoDbDishRepository};
pub use order_history::{DynamoDbOrderHistory, OrderHistory};
pub use rating_repository::{DynamoDbRatingRepository, RatingRepository};
