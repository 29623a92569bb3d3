use thiserror::Error;
use uuid::Uuid;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Dish not found: {id}")]
    DishNotFound { id: Uuid },

    #[error("Invalid page: requested {page}, total pages {total_pages}")]
    InvalidPage { page: u32, total_pages: u32 },

    #[error("User {user_id} has not ordered dish {dish_id}")]
    NotOrdered { user_id: Uuid, dish_id: Uuid },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Conditional write failed: {message}")]
    ConditionFailed { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Invalid stored item: {message}")]
    InvalidItem { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Uuid::nil();
        let error = ServiceError::DishNotFound { id };
        assert_eq!(
            error.to_string(),
            format!("Dish not found: {}", id)
        );

        let error = ServiceError::InvalidPage {
            page: 4,
            total_pages: 2,
        };
        assert_eq!(
            error.to_string(),
            "Invalid page: requested 4, total pages 2"
        );
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_error = RepositoryError::ConditionFailed {
            message: "rating_version mismatch".to_string(),
        };

        let service_error: ServiceError = repo_error.into();
        match service_error {
            ServiceError::Repository { source } => {
                assert!(source.to_string().contains("rating_version mismatch"));
            }
            _ => panic!("Expected Repository error"),
        }
    }

    #[test]
    fn test_repository_error_from_serde() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json");
        assert!(json_error.is_err());

        let repo_error: RepositoryError = json_error.unwrap_err().into();
        match repo_error {
            RepositoryError::Serialization { .. } => {}
            _ => panic!("Expected Serialization error"),
        }
    }
}
