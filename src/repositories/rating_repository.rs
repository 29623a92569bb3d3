use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::{RatingScore, RatingSubmission, RepositoryError, RepositoryResult};

/// Trait defining the interface for rating submission storage
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert or replace the submission for (user, dish). A user's previous
    /// score for the same dish is overwritten, never duplicated.
    async fn upsert(&self, submission: RatingSubmission) -> RepositoryResult<()>;

    /// All active submissions for one dish
    async fn find_by_dish(&self, dish_id: Uuid) -> RepositoryResult<Vec<RatingSubmission>>;

    /// The active submission of one user for one dish, if any
    async fn find_by_user_and_dish(
        &self,
        user_id: Uuid,
        dish_id: Uuid,
    ) -> RepositoryResult<Option<RatingSubmission>>;
}

/// DynamoDB implementation of the RatingRepository trait
///
/// Table layout: partition key `dish_id`, sort key `user_id`. PutItem on the
/// composite key gives the upsert semantics directly.
pub struct DynamoDbRatingRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbRatingRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

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

    /// Convert a RatingSubmission to DynamoDB attribute values
    pub fn submission_to_item(
        &self,
        submission: &RatingSubmission,
    ) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();

        item.insert(
            "dish_id".to_string(),
            AttributeValue::S(submission.dish_id.to_string()),
        );
        item.insert(
            "user_id".to_string(),
            AttributeValue::S(submission.user_id.to_string()),
        );
        item.insert(
            "score".to_string(),
            AttributeValue::N(submission.score.value().to_string()),
        );
        item.insert(
            "submitted_at".to_string(),
            AttributeValue::S(submission.submitted_at.to_rfc3339()),
        );

        item
    }

    /// Convert a DynamoDB item to a RatingSubmission
    pub fn item_to_submission(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> RepositoryResult<RatingSubmission> {
        let dish_id = item
            .get("dish_id")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing or invalid dish_id".to_string(),
            })?;

        let user_id = item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Missing or invalid user_id".to_string(),
            })?;

        let score = item
            .get("score")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse::<u8>().ok())
            .and_then(|value| RatingScore::new(value).ok())
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid score".to_string(),
            })?;

        let submitted_at = item
            .get("submitted_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: "Invalid submitted_at".to_string(),
            })?;

        Ok(RatingSubmission {
            user_id,
            dish_id,
            score,
            submitted_at,
        })
    }

    fn map_dynamodb_error(&self, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);

        match error {
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
impl RatingRepository for DynamoDbRatingRepository {
    #[instrument(skip(self, submission), fields(table = %self.table_name, dish_id = %submission.dish_id, user_id = %submission.user_id))]
    async fn upsert(&self, submission: RatingSubmission) -> RepositoryResult<()> {
        info!("Upserting rating submission");

        let _put_span = self.create_dynamodb_span("PutItem");

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(self.submission_to_item(&submission)))
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name, dish_id = %dish_id))]
    async fn find_by_dish(&self, dish_id: Uuid) -> RepositoryResult<Vec<RatingSubmission>> {
        info!("Querying rating submissions for dish");

        let _query_span = self.create_dynamodb_span("Query");

        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("dish_id = :dish_id")
            .expression_attribute_values(":dish_id", AttributeValue::S(dish_id.to_string()))
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        let mut submissions = Vec::new();
        if let Some(items) = response.items {
            for item in items {
                match self.item_to_submission(item) {
                    Ok(submission) => submissions.push(submission),
                    Err(e) => {
                        warn!("Failed to parse rating item: {}", e);
                        continue;
                    }
                }
            }
        }

        Ok(submissions)
    }

    #[instrument(skip(self), fields(table = %self.table_name, dish_id = %dish_id, user_id = %user_id))]
    async fn find_by_user_and_dish(
        &self,
        user_id: Uuid,
        dish_id: Uuid,
    ) -> RepositoryResult<Option<RatingSubmission>> {
        let _get_span = self.create_dynamodb_span("GetItem");

        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("dish_id", AttributeValue::S(dish_id.to_string()))
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_submission(item)?)),
            None => Ok(None),
        }
    }
}
