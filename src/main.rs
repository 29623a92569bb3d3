use axum::{middleware, routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use dishmenu_rs::{
    handlers::{
        api, cors_middleware, health_check, metrics_handler, request_validation_middleware,
        security_headers_middleware,
    },
    init_observability,
    observability::{observability_middleware, Metrics},
    repositories::{DynamoDbDishRepository, DynamoDbOrderHistory, DynamoDbRatingRepository},
    services::{CatalogService, MenuService, RatingService},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;
    println!("Configuration loaded successfully");

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        &config.observability.otlp_endpoint,
        config.observability.enable_json_logging,
    )?;

    info!("Starting dishmenu-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB Tables: dishes={}, ratings={}, orders={}",
        config.database.dishes_table_name,
        config.database.ratings_table_name,
        config.database.orders_table_name
    );

    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    // AWS clients come from config, already configured with region and credentials
    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());
    info!("AWS clients initialized successfully");

    let dish_repository = Arc::new(DynamoDbDishRepository::new(
        dynamodb_client.clone(),
        config.database.dishes_table_name.clone(),
        config.database.region.clone(),
    ));
    let rating_repository = Arc::new(DynamoDbRatingRepository::new(
        dynamodb_client.clone(),
        config.database.ratings_table_name.clone(),
        config.database.region.clone(),
    ));
    let order_history = Arc::new(DynamoDbOrderHistory::new(
        dynamodb_client.clone(),
        config.database.orders_table_name.clone(),
        config.database.region.clone(),
    ));
    info!("Repositories initialized successfully");

    let catalog_service = CatalogService::new(dish_repository.clone(), config.menu.page_size);
    let rating_service = RatingService::new_with_metrics(
        dish_repository,
        rating_repository,
        order_history,
        metrics.clone(),
    );
    let menu_service = Arc::new(MenuService::new(catalog_service, rating_service));
    info!("Services initialized successfully");

    let app = create_app(metrics, menu_service);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(metrics: Arc<Metrics>, menu_service: Arc<MenuService>) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        // Menu API endpoints (with API state)
        .merge(api::create_api_router(menu_service))
        // Middleware layers (order matters - outer to inner)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
