//! Deterministic variant selection.
//!
//! A visitor key is hashed to a fixed-point bucket point in `[0, 1)` at ppm
//! resolution. Active variants are laid out back to back in the order they are
//! given; variant `i` owns the half-open range `[acc_i, acc_i + p_i)`. A point
//! that lands past the last cut-point belongs to the primary destination.
//!
//! The order of `variants` is part of the routing contract: reordering them,
//! or editing a probability, moves the cut-points and reassigns the visitors
//! that fall between the old and new boundaries.

use sha2::{Digest, Sha256};

use crate::domain::entities::Variant;
use crate::domain::probability::{Probability, SCALE};

/// Hash input identifying one visitor for one short URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorKey(Vec<u8>);

impl VisitorKey {
    /// Builds the key from the primary destination and the client address.
    ///
    /// Folding in the primary destination buckets the same visitor
    /// independently for every short URL.
    pub fn new(primary_target: &str, client_addr: &str) -> Self {
        let mut bytes = Vec::with_capacity(primary_target.len() + client_addr.len());
        bytes.extend_from_slice(primary_target.as_bytes());
        bytes.extend_from_slice(client_addr.as_bytes());
        Self(bytes)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A point in `[0, 1)` expressed in parts-per-million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BucketPoint(u32);

impl BucketPoint {
    /// Hashes a visitor key to its bucket point.
    ///
    /// The leading 32 bits of the SHA-256 digest are scaled onto `[0, SCALE)`.
    pub fn from_key(key: &VisitorKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let leading = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        let ppm = (u64::from(leading) * u64::from(SCALE)) >> 32;
        Self(ppm as u32)
    }

    /// Builds a point directly from ppm. Returns `None` unless `ppm < SCALE`.
    pub fn from_ppm(ppm: u32) -> Option<Self> {
        (ppm < SCALE).then_some(Self(ppm))
    }

    pub fn ppm(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(SCALE)
    }
}

/// Outcome of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub target: &'a str,
    /// The chosen variant, or `None` for the primary destination.
    pub variant_id: Option<i64>,
    pub point: BucketPoint,
}

impl Selection<'_> {
    pub fn is_primary(&self) -> bool {
        self.variant_id.is_none()
    }
}

/// Selects the destination for a visitor.
///
/// `variants` must be the active variants of one short URL, in their stored
/// order, summing to at most `1.0`. The result depends only on the inputs.
pub fn select<'a>(key: &VisitorKey, variants: &'a [Variant], primary: &'a str) -> Selection<'a> {
    select_at(BucketPoint::from_key(key), variants, primary)
}

/// Selects the destination owning `point`.
///
/// # Panics
///
/// In debug builds, panics if an inactive variant is passed or the variants
/// sum above `1.0`. Release builds log the violation and route as given.
pub fn select_at<'a>(point: BucketPoint, variants: &'a [Variant], primary: &'a str) -> Selection<'a> {
    let total: Probability = variants.iter().map(|v| v.probability).sum();
    if total > Probability::ONE || variants.iter().any(|v| !v.is_active) {
        tracing::error!(
            total = %total,
            variants = variants.len(),
            "Variant selector received a set violating the probability budget contract"
        );
        debug_assert!(
            total <= Probability::ONE,
            "active variants sum to {total}, above 1.0"
        );
        debug_assert!(
            variants.iter().all(|v| v.is_active),
            "inactive variant passed to selector"
        );
    }

    let mut acc = Probability::ZERO;
    for variant in variants {
        let upper = acc + variant.probability;
        if point.ppm() < upper.ppm() {
            return Selection {
                target: &variant.target_url,
                variant_id: Some(variant.id),
                point,
            };
        }
        acc = upper;
    }

    Selection {
        target: primary,
        variant_id: None,
        point,
    }
}
