use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::models::{Dish, DishPage, MenuFilters, RatingScore, ServiceError};
use crate::services::MenuService;

/// Shared application state for the menu API
#[derive(Clone)]
pub struct ApiState {
    pub menu_service: Arc<MenuService>,
}

/// Query parameters for listing the menu
#[derive(Debug, Deserialize)]
pub struct ListMenuQuery {
    /// Comma-separated category names, e.g. `wok,pizza`
    pub categories: Option<String>,
    pub vegetarian: Option<bool>,
    pub sorting: Option<String>,
    pub page: Option<u32>,
}

/// Query parameters for the rating eligibility check
#[derive(Debug, Deserialize)]
pub struct RatingCheckQuery {
    pub user_id: Uuid,
}

/// Request body for rating submission
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub user_id: Uuid,
    pub score: u8,
}

/// Create the menu API router
pub fn create_api_router(menu_service: Arc<MenuService>) -> Router {
    let state = ApiState { menu_service };

    Router::new()
        .route("/api/dish", get(list_menu))
        .route("/api/dish/:dish_id", get(get_dish))
        .route("/api/dish/:dish_id/rating/check", get(check_rating_eligibility))
        .route("/api/dish/:dish_id/rating", post(submit_rating))
        .with_state(state)
}

/// List one page of the menu with optional filters and sorting
#[instrument(name = "list_menu", skip(state), fields(
    categories = query.categories.as_deref(),
    vegetarian = query.vegetarian,
    sorting = query.sorting.as_deref(),
    page = query.page,
))]
pub async fn list_menu(
    State(state): State<ApiState>,
    Query(query): Query<ListMenuQuery>,
) -> Result<Json<DishPage>, (StatusCode, Json<Value>)> {
    info!("Listing menu");

    let page = query.page.unwrap_or(1);

    let (filters, sorting) = match parse_menu_query(query) {
        Ok(parsed) => parsed,
        Err(err) => {
            error!("Invalid query parameters: {}", err);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid query parameters",
                    "message": err,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            ));
        }
    };

    match state.menu_service.list_menu(filters, sorting, page).await {
        Ok(dish_page) => {
            info!(
                "Successfully listed menu page {} of {}",
                dish_page.page, dish_page.total_pages
            );
            Ok(Json(dish_page))
        }
        Err(err) => {
            error!("Failed to list menu: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a specific dish by ID
#[instrument(name = "get_dish", skip(state), fields(dish_id = %dish_id))]
pub async fn get_dish(
    State(state): State<ApiState>,
    Path(dish_id): Path<Uuid>,
) -> Result<Json<Dish>, (StatusCode, Json<Value>)> {
    info!("Getting dish");

    match state.menu_service.get_dish(dish_id).await {
        Ok(dish) => {
            info!("Successfully retrieved dish: {}", dish.name);
            Ok(Json(dish))
        }
        Err(err) => {
            error!("Failed to get dish {}: {}", dish_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Check whether the user may rate the dish
#[instrument(name = "check_rating_eligibility", skip(state), fields(
    dish_id = %dish_id,
    user_id = %query.user_id,
))]
pub async fn check_rating_eligibility(
    State(state): State<ApiState>,
    Path(dish_id): Path<Uuid>,
    Query(query): Query<RatingCheckQuery>,
) -> Result<Json<bool>, (StatusCode, Json<Value>)> {
    crate::info_with_trace!(
        "Checking rating eligibility for user: {}, dish: {}",
        query.user_id,
        dish_id
    );

    match state
        .menu_service
        .check_rating_eligibility(query.user_id, dish_id)
        .await
    {
        Ok(eligible) => Ok(Json(eligible)),
        Err(err) => {
            crate::error_with_trace!("Failed to check rating eligibility: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Submit a rating for a dish
#[instrument(name = "submit_rating", skip(state, request), fields(
    dish_id = %dish_id,
    user_id = %request.user_id,
    score = request.score,
))]
pub async fn submit_rating(
    State(state): State<ApiState>,
    Path(dish_id): Path<Uuid>,
    Json(request): Json<SubmitRatingRequest>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    crate::info_with_trace!(
        "Submitting rating for user: {}, dish: {}, score: {}",
        request.user_id,
        dish_id,
        request.score
    );

    // Score range is a caller contract; reject here before the rating gate
    let score = match RatingScore::new(request.score) {
        Ok(score) => score,
        Err(err) => {
            crate::error_with_trace!("Rejected rating submission: {}", err);
            return Err(service_error_to_response(err));
        }
    };

    match state
        .menu_service
        .submit_rating(request.user_id, dish_id, score)
        .await
    {
        Ok(()) => {
            crate::info_with_trace!("Successfully submitted rating");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            crate::error_with_trace!("Failed to submit rating: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Parse the raw menu query into typed filters and sorting
fn parse_menu_query(
    query: ListMenuQuery,
) -> Result<(MenuFilters, Option<crate::models::DishSorting>), String> {
    let mut filters = MenuFilters::default();

    if let Some(categories_str) = query.categories {
        for part in categories_str.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            filters.categories.push(
                part.parse()
                    .map_err(|e| format!("Invalid category: {}", e))?,
            );
        }
    }

    filters.vegetarian_only = query.vegetarian.unwrap_or(false);

    let sorting = match query.sorting {
        Some(sorting_str) => Some(
            sorting_str
                .parse()
                .map_err(|e| format!("Invalid sorting: {}", e))?,
        ),
        None => None,
    };

    Ok((filters, sorting))
}

/// Convert ServiceError to HTTP response
fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match err {
        ServiceError::DishNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::InvalidPage { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::NotOrdered { .. } => (StatusCode::FORBIDDEN, err.to_string()),
        ServiceError::Repository { source } => match source {
            crate::models::RepositoryError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            crate::models::RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            crate::models::RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            crate::models::RepositoryError::ConditionFailed { .. } => (
                StatusCode::CONFLICT,
                "Concurrent update conflict".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
