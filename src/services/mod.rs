// Services module - business logic layer

pub mod catalog_service;
pub mod menu_service;
pub mod rating_service;

pub use catalog_service::CatalogService;
pub use menu_service::MenuService;
pub use rating_service::RatingService;
