use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};

/// A rating score, guaranteed to be within [1, 10]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RatingScore(u8);

impl RatingScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Construct a score, rejecting values outside [1, 10].
    ///
    /// Range enforcement happens here, at the caller boundary; the rating
    /// gate itself only ever sees valid scores.
    pub fn new(value: u8) -> ServiceResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ServiceError::ValidationError {
                message: format!(
                    "Rating score must be between {} and {}, got {}",
                    Self::MIN,
                    Self::MAX,
                    value
                ),
            });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for RatingScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        RatingScore::new(value).map_err(serde::de::Error::custom)
    }
}

/// One user's active rating of one dish
///
/// Exactly one submission is active per (user, dish); a resubmission
/// replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSubmission {
    pub user_id: Uuid,
    pub dish_id: Uuid,
    pub score: RatingScore,
    pub submitted_at: DateTime<Utc>,
}

impl RatingSubmission {
    pub fn new(user_id: Uuid, dish_id: Uuid, score: RatingScore) -> Self {
        Self {
            user_id,
            dish_id,
            score,
            submitted_at: Utc::now(),
        }
    }
}
