//! Probability budget rules for variant mutations.
//!
//! These functions are pure: storage backends call them while holding the
//! per-short-URL lock, after reading the current sibling set, and only write
//! when they succeed. A rejected proposal is never partially applied.

use chrono::{DateTime, Utc};

use crate::domain::entities::{NewVariant, Variant, VariantPatch};
use crate::domain::probability::Probability;

/// Reasons a variant mutation is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Probability {value} is outside the range [0.0, 1.0]")]
    OutOfRange { value: f64 },

    #[error("Target URL must not be empty")]
    EmptyTarget,

    #[error(
        "Total probability would be {total} (max 1.0). Currently allocated: {allocated}, requested: {requested}"
    )]
    BudgetExceeded {
        allocated: Probability,
        requested: Probability,
        total: Probability,
    },
}

/// Sum of the active probabilities in `variants`, skipping `exclude_id`.
pub fn allocated<'a>(
    variants: impl IntoIterator<Item = &'a Variant>,
    exclude_id: Option<i64>,
) -> Probability {
    variants
        .into_iter()
        .filter(|v| Some(v.id) != exclude_id)
        .map(Variant::allocated)
        .sum()
}

/// Checks that adding `requested` to the active siblings stays within `1.0`.
///
/// # Errors
///
/// Returns [`LedgerError::BudgetExceeded`] if the new total would exceed `1.0`.
pub fn ensure_within_budget(
    siblings: &[Variant],
    exclude_id: Option<i64>,
    requested: Probability,
) -> Result<(), LedgerError> {
    let allocated = allocated(siblings, exclude_id);
    let total = allocated + requested;

    if total > Probability::ONE {
        return Err(LedgerError::BudgetExceeded {
            allocated,
            requested,
            total,
        });
    }

    Ok(())
}

fn ensure_target(target_url: &str) -> Result<(), LedgerError> {
    if target_url.trim().is_empty() {
        return Err(LedgerError::EmptyTarget);
    }
    Ok(())
}

fn ensure_range(probability: Probability) -> Result<(), LedgerError> {
    if !probability.is_valid() {
        return Err(LedgerError::OutOfRange {
            value: probability.as_f64(),
        });
    }
    Ok(())
}

/// Validates a new variant against the current variants of its short URL.
///
/// The budget is only checked when the new variant is active.
///
/// # Errors
///
/// See [`LedgerError`].
pub fn validate_new(new_variant: &NewVariant, siblings: &[Variant]) -> Result<(), LedgerError> {
    ensure_range(new_variant.probability)?;
    ensure_target(&new_variant.target_url)?;

    if new_variant.is_active {
        ensure_within_budget(siblings, None, new_variant.probability)?;
    }

    Ok(())
}

/// Applies `patch` to `current` and validates the result against its siblings.
///
/// `siblings` may include `current` itself; it is excluded from the existing
/// sum and re-included at its proposed values. Deactivating never needs a
/// budget check.
///
/// # Errors
///
/// See [`LedgerError`].
pub fn apply_patch(
    current: &Variant,
    patch: &VariantPatch,
    siblings: &[Variant],
    now: DateTime<Utc>,
) -> Result<Variant, LedgerError> {
    let mut updated = current.clone();

    if let Some(target_url) = &patch.target_url {
        ensure_target(target_url)?;
        updated.target_url = target_url.clone();
    }
    if let Some(probability) = patch.probability {
        ensure_range(probability)?;
        updated.probability = probability;
    }
    if let Some(is_active) = patch.is_active {
        updated.is_active = is_active;
    }

    if updated.is_active {
        ensure_within_budget(siblings, Some(current.id), updated.probability)?;
    }

    updated.updated_at = now;
    Ok(updated)
}
