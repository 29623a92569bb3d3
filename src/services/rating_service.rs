use std::sync::Arc;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    RatingScore, RatingSubmission, RepositoryError, ServiceError, ServiceResult,
};
use crate::observability::Metrics;
use crate::repositories::{DishRepository, OrderHistory, RatingRepository};

/// Upper bound on CAS retries for one submission. Every conflict means a
/// concurrent submission committed, so a submitter retries at most once per
/// competitor; hitting this bound indicates pathological contention.
const MAX_RECOMPUTE_ATTEMPTS: u32 = 32;

/// Arithmetic mean of the submitted scores, rounded to one decimal place
pub fn aggregate_rating(submissions: &[RatingSubmission]) -> Option<Decimal> {
    if submissions.is_empty() {
        return None;
    }

    let sum: u32 = submissions
        .iter()
        .map(|s| u32::from(s.score.value()))
        .sum();

    let mean = Decimal::from(sum) / Decimal::from(submissions.len() as u32);
    Some(mean.round_dp(1))
}

/// Gate deciding whether a user may rate a dish, and recording submissions
///
/// Eligibility rule: the user must have ordered the dish at least once.
/// Resubmission replaces the previous score, so prior ratings never block.
pub struct RatingService {
    dishes: Arc<dyn DishRepository>,
    ratings: Arc<dyn RatingRepository>,
    orders: Arc<dyn OrderHistory>,
    metrics: Option<Arc<Metrics>>,
}

impl RatingService {
    pub fn new(
        dishes: Arc<dyn DishRepository>,
        ratings: Arc<dyn RatingRepository>,
        orders: Arc<dyn OrderHistory>,
    ) -> Self {
        Self {
            dishes,
            ratings,
            orders,
            metrics: None,
        }
    }

    pub fn new_with_metrics(
        dishes: Arc<dyn DishRepository>,
        ratings: Arc<dyn RatingRepository>,
        orders: Arc<dyn OrderHistory>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            dishes,
            ratings,
            orders,
            metrics: Some(metrics),
        }
    }

    /// Check whether the user may rate the dish
    #[instrument(skip(self), fields(user_id = %user_id, dish_id = %dish_id))]
    pub async fn can_rate(&self, user_id: Uuid, dish_id: Uuid) -> ServiceResult<bool> {
        crate::info_with_trace!("Checking rating eligibility");

        if !self.dishes.exists(dish_id).await? {
            crate::warn_with_trace!("Dish not found");
            return Err(ServiceError::DishNotFound { id: dish_id });
        }

        let ordered = self.orders.has_ordered(user_id, dish_id).await?;
        Ok(ordered)
    }

    /// Record a rating submission and refresh the dish's aggregate rating.
    ///
    /// The aggregate is recomputed from a snapshot of all active submissions
    /// and committed with a compare-and-swap on the dish's rating version;
    /// a conflict means a concurrent submission landed, so the snapshot is
    /// taken again. Submissions for different dishes never contend.
    #[instrument(skip(self), fields(user_id = %user_id, dish_id = %dish_id, score = score.value()))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        dish_id: Uuid,
        score: RatingScore,
    ) -> ServiceResult<()> {
        crate::info_with_trace!("Submitting rating");

        let dish = match self.dishes.find_by_id(dish_id).await? {
            Some(dish) => dish,
            None => {
                crate::warn_with_trace!("Dish not found");
                self.record_submission_metric(false);
                return Err(ServiceError::DishNotFound { id: dish_id });
            }
        };

        if !self.orders.has_ordered(user_id, dish_id).await? {
            crate::warn_with_trace!("User has not ordered this dish");
            self.record_submission_metric(false);
            return Err(ServiceError::NotOrdered { user_id, dish_id });
        }

        // The version must be read before our own upsert: any aggregate
        // committed after that point either includes our submission or
        // bumps the version and forces us to retry.
        let mut expected_version = dish.rating_version;

        self.ratings
            .upsert(RatingSubmission::new(user_id, dish_id, score))
            .await?;

        for attempt in 1..=MAX_RECOMPUTE_ATTEMPTS {
            let snapshot = self.ratings.find_by_dish(dish_id).await?;
            let rating = aggregate_rating(&snapshot).unwrap_or_else(|| {
                // Our own upsert precedes the snapshot, so it is never empty
                Decimal::from(score.value())
            });

            match self
                .dishes
                .set_aggregate_rating(dish_id, rating, expected_version)
                .await
            {
                Ok(()) => {
                    crate::info_with_trace!(
                        "Aggregate rating updated to {} after {} attempt(s)",
                        rating,
                        attempt
                    );
                    self.record_submission_metric(true);
                    return Ok(());
                }
                Err(RepositoryError::ConditionFailed { .. }) => {
                    if let Some(ref metrics) = self.metrics {
                        metrics.record_rating_recompute_conflict();
                    }
                    crate::warn_with_trace!(
                        "Aggregate rating conflict on attempt {}, retrying",
                        attempt
                    );

                    let current = self.dishes.find_by_id(dish_id).await?.ok_or(
                        ServiceError::DishNotFound { id: dish_id },
                    )?;
                    expected_version = current.rating_version;
                }
                Err(e) => {
                    self.record_submission_metric(false);
                    return Err(e.into());
                }
            }
        }

        self.record_submission_metric(false);
        Err(ServiceError::Repository {
            source: RepositoryError::ConditionFailed {
                message: format!(
                    "Aggregate rating for dish {} not committed after {} attempts",
                    dish_id, MAX_RECOMPUTE_ATTEMPTS
                ),
            },
        })
    }

    fn record_submission_metric(&self, success: bool) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_rating_submission(success);
        }
    }
}
