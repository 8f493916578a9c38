//! Variant entity: a weighted alternative destination for a short URL.

use chrono::{DateTime, Utc};

use crate::domain::probability::Probability;

/// A weighted redirect variant belonging to one short URL.
///
/// Active variants of the same short URL share a probability budget of `1.0`;
/// whatever is left unallocated goes to the short URL's primary destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub id: i64,
    pub short_url_id: i64,
    pub target_url: String,
    pub probability: Probability,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    /// Creates a new Variant instance.
    pub fn new(
        id: i64,
        short_url_id: i64,
        target_url: String,
        probability: Probability,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            short_url_id,
            target_url,
            probability,
            is_active,
            created_at,
            updated_at,
        }
    }

    /// Probability this variant contributes to its short URL's budget.
    ///
    /// Inactive variants contribute nothing.
    pub fn allocated(&self) -> Probability {
        if self.is_active {
            self.probability
        } else {
            Probability::ZERO
        }
    }
}

/// Input data for creating a new variant.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVariant {
    pub short_url_id: i64,
    pub target_url: String,
    pub probability: Probability,
    pub is_active: bool,
}

/// Partial update for an existing variant.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantPatch {
    pub target_url: Option<String>,
    pub probability: Option<Probability>,
    pub is_active: Option<bool>,
}

impl VariantPatch {
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none() && self.probability.is_none() && self.is_active.is_none()
    }
}
