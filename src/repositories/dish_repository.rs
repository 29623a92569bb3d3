use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::{Dish, DishCategory, MenuFilters, RepositoryError, RepositoryResult};

/// Trait defining the interface for dish catalog storage
#[async_trait]
pub trait DishRepository: Send + Sync {
    /// Find all dishes matching the menu filters
    async fn find_all(&self, filters: MenuFilters) -> RepositoryResult<Vec<Dish>>;

    /// Find a dish by its ID
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Dish>>;

    /// Check if a dish exists
    async fn exists(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Insert a new dish (seeding and tests; catalog management lives elsewhere)
    async fn create(&self, dish: Dish) -> RepositoryResult<Dish>;

    /// Write the aggregate rating for a dish, conditioned on the stored
    /// `rating_version` matching `expected_version`. Fails with
    /// `ConditionFailed` when a concurrent writer got there first.
    async fn set_aggregate_rating(
        &self,
        id: Uuid,
        rating: Decimal,
        expected_version: u64,
    ) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the DishRepository trait
pub struct DynamoDbDishRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbDishRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Create a DynamoDB subsegment span with tracing attributes
    fn create_dynamodb_span(&self, operation: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %self.table_name,
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,
            "db.system" = "dynamodb",
            "db.name" = %self.table_name,
            "db.operation" = operation,
        )
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert a Dish struct to DynamoDB attribute values
    pub fn dish_to_item(&self, dish: &Dish) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), AttributeValue::S(dish.id.to_string()));
        item.insert("name".to_string(), AttributeValue::S(dish.name.clone()));
        item.insert(
            "description".to_string(),
            AttributeValue::S(dish.description.clone()),
        );
        item.insert(
            "price".to_string(),
            AttributeValue::N(dish.price.to_string()),
        );
        if let Some(ref image) = dish.image {
            item.insert("image".to_string(), AttributeValue::S(image.clone()));
        }
        item.insert(
            "vegetarian".to_string(),
            AttributeValue::Bool(dish.vegetarian),
        );
        item.insert(
            "category".to_string(),
            AttributeValue::S(dish.category.to_string()),
        );
        if let Some(rating) = dish.rating {
            item.insert("rating".to_string(), AttributeValue::N(rating.to_string()));
        }
        item.insert(
            "rating_version".to_string(),
            AttributeValue::N(dish.rating_version.to_string()),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(dish.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(dish.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert a DynamoDB item to a Dish struct
    pub fn item_to_dish(&self, item: HashMap<String, AttributeValue>) -> RepositoryResult<Dish> {
        let id = item
            .get("id")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing or invalid id".to_string(),
            })?;

        let name = item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing name".to_string(),
            })?
            .clone();

        let description = item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let price = item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| Decimal::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid price".to_string(),
            })?;

        let image = item.get("image").and_then(|v| v.as_s().ok()).cloned();

        let vegetarian = item
            .get("vegetarian")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false);

        let category = item
            .get("category")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DishCategory::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid category".to_string(),
            })?;

        // Rating is optional - absent until the first submission
        let rating = item
            .get("rating")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| Decimal::from_str(s).ok());

        let rating_version = item
            .get("rating_version")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid created_at".to_string(),
            })?;

        let updated_at = item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(created_at);

        Ok(Dish {
            id,
            name,
            description,
            price,
            image,
            vegetarian,
            category,
            rating,
            rating_version,
            created_at,
            updated_at,
        })
    }

    /// Convert a DynamoDB error to a RepositoryError
    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);

        match error {
            DynamoDbError::ConditionalCheckFailedException(_) => {
                RepositoryError::ConditionFailed {
                    message: "rating_version mismatch".to_string(),
                }
            }
            DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
                table_name: self.table_name.clone(),
            },
            other => RepositoryError::AwsSdk {
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl DishRepository for DynamoDbDishRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self, filters: MenuFilters) -> RepositoryResult<Vec<Dish>> {
        info!("Finding all dishes with filters");

        let mut scan_builder = self
            .client
            .scan()
            .table_name(&self.table_name)
            .select(Select::AllAttributes);

        let mut filter_expressions = Vec::new();
        let mut expression_attribute_values = HashMap::new();

        if filters.vegetarian_only {
            filter_expressions.push("vegetarian = :veg".to_string());
            expression_attribute_values
                .insert(":veg".to_string(), AttributeValue::Bool(true));
        }

        if !filters.categories.is_empty() {
            let mut placeholders = Vec::new();
            for (i, category) in filters.categories.iter().enumerate() {
                let placeholder = format!(":cat{}", i);
                expression_attribute_values.insert(
                    placeholder.clone(),
                    AttributeValue::S(category.to_string()),
                );
                placeholders.push(placeholder);
            }
            filter_expressions.push(format!("category IN ({})", placeholders.join(", ")));
        }

        if !filter_expressions.is_empty() {
            scan_builder = scan_builder.filter_expression(filter_expressions.join(" AND "));
            scan_builder =
                scan_builder.set_expression_attribute_values(Some(expression_attribute_values));
        }

        let response = scan_builder
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        let mut dishes = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_dish(item) {
                    Ok(dish) => dishes.push(dish),
                    Err(e) => {
                        warn!("Failed to parse dish item: {}", e);
                        continue;
                    }
                }
            }
        }

        info!("Found {} dishes", dishes.len());
        Ok(dishes)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Dish>> {
        info!("Finding dish by ID");

        let _get_span = self.create_dynamodb_span("GetItem");

        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_dish(item)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn exists(&self, id: Uuid) -> RepositoryResult<bool> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .projection_expression("id")
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        Ok(response.item.is_some())
    }

    #[instrument(skip(self, dish), fields(table = %self.table_name, id = %dish.id))]
    async fn create(&self, dish: Dish) -> RepositoryResult<Dish> {
        info!("Creating dish");

        let _put_span = self.create_dynamodb_span("PutItem");

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(self.dish_to_item(&dish)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        Ok(dish)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id, expected_version = expected_version))]
    async fn set_aggregate_rating(
        &self,
        id: Uuid,
        rating: Decimal,
        expected_version: u64,
    ) -> RepositoryResult<()> {
        info!("Writing aggregate rating");

        let _update_span = self.create_dynamodb_span("UpdateItem");

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(
                "SET rating = :rating, rating_version = :next_version, updated_at = :now",
            )
            .condition_expression("rating_version = :expected_version")
            .expression_attribute_values(":rating", AttributeValue::N(rating.to_string()))
            .expression_attribute_values(
                ":next_version",
                AttributeValue::N((expected_version + 1).to_string()),
            )
            .expression_attribute_values(
                ":expected_version",
                AttributeValue::N(expected_version.to_string()),
            )
            .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        Ok(())
    }
}
