//! DTOs for variant management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Variant, VariantPatch};
use crate::domain::probability::Probability;
use crate::error::AppError;

/// Request to add a variant to a short URL.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1, max = 2048, message = "Target URL must not be empty"))]
    pub target_url: String,

    /// Share of traffic in `[0, 1]`, kept at parts-per-million precision.
    #[validate(range(min = 0.0, max = 1.0, message = "Probability must be between 0 and 1"))]
    pub probability: f64,

    /// Defaults to `true`.
    pub is_active: Option<bool>,
}

impl CreateVariantRequest {
    pub fn probability(&self) -> Result<Probability, AppError> {
        Ok(Probability::from_f64(self.probability)?)
    }
}

/// Partial update of a variant. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVariantRequest {
    #[validate(length(min = 1, max = 2048, message = "Target URL must not be empty"))]
    pub target_url: Option<String>,

    #[validate(range(min = 0.0, max = 1.0, message = "Probability must be between 0 and 1"))]
    pub probability: Option<f64>,

    pub is_active: Option<bool>,
}

impl TryFrom<UpdateVariantRequest> for VariantPatch {
    type Error = AppError;

    fn try_from(req: UpdateVariantRequest) -> Result<Self, Self::Error> {
        Ok(VariantPatch {
            target_url: req.target_url,
            probability: req.probability.map(Probability::from_f64).transpose()?,
            is_active: req.is_active,
        })
    }
}

/// A single variant as returned by the admin API.
#[derive(Debug, Serialize)]
pub struct VariantResponse {
    pub id: i64,
    pub short_url_id: i64,
    pub target_url: String,
    pub probability: Probability,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Variant> for VariantResponse {
    fn from(v: Variant) -> Self {
        Self {
            id: v.id,
            short_url_id: v.short_url_id,
            target_url: v.target_url,
            probability: v.probability,
            is_active: v.is_active,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// All variants of one short URL with its budget usage.
#[derive(Debug, Serialize)]
pub struct VariantListResponse {
    pub short_url_id: i64,
    pub variants: Vec<VariantResponse>,
    /// Sum of the active probabilities.
    pub allocated: Probability,
    pub remaining: Probability,
}
