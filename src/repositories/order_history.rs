use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::models::{RepositoryError, RepositoryResult};

/// External collaborator: the source of truth for "did user U order dish D".
///
/// This service only consults order history, it never writes it.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    async fn has_ordered(&self, user_id: Uuid, dish_id: Uuid) -> RepositoryResult<bool>;
}

/// DynamoDB-backed order history lookup
///
/// Table layout: partition key `user_id`, sort key `dish_id`. Existence of
/// the item is the fact we need; attributes beyond the key are ignored.
pub struct DynamoDbOrderHistory {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbOrderHistory {
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
impl OrderHistory for DynamoDbOrderHistory {
    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id, dish_id = %dish_id))]
    async fn has_ordered(&self, user_id: Uuid, dish_id: Uuid) -> RepositoryResult<bool> {
        let _get_span = self.create_dynamodb_span("GetItem");

        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .key("dish_id", AttributeValue::S(dish_id.to_string()))
            .projection_expression("user_id")
            .send()
            .await
            .map_err(|e| self.map_dynamodb_error(e.into()))?;

        Ok(response.item.is_some())
    }
}
