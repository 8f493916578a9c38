//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures. Short URLs and upstream visits are owned
//! by the external shortener and only ever read; variants and redirect visits
//! are owned by this service.
//!
//! # Entity Types
//!
//! - [`Variant`] - A weighted alternative destination for a short URL
//! - [`ShortUrl`] - A short URL from the upstream catalog
//! - [`UpstreamVisit`] / [`RedirectVisit`] - Visit records
//! - [`FormFields`] - Google Forms entry ids used for prefilling
//!
//! # Design Pattern
//!
//! Owned entities come with separate input structs:
//! - `NewVariant`, `NewRedirectVisit` - For creating new records
//! - `VariantPatch` - For partial updates

pub mod form;
pub mod short_url;
pub mod variant;
pub mod visit;

pub use form::FormFields;
pub use short_url::ShortUrl;
pub use variant::{NewVariant, Variant, VariantPatch};
pub use visit::{NewRedirectVisit, RedirectVisit, UpstreamVisit};
