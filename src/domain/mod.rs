//! Domain layer containing business entities and logic.
//!
//! This module implements the core domain logic following Clean Architecture principles.
//! It defines entities, repository interfaces, and the pure routing and budget rules,
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`probability`] - Fixed-point probability values
//! - [`ledger`] - Probability budget rules for variant mutations
//! - [`selector`] - Deterministic variant selection
//! - [`visit_event`] - Redirect visit event model
//! - [`visit_worker`] - Asynchronous visit processing worker
//!
//! # Visit Processing Flow
//!
//! 1. HTTP handler serves a redirect
//! 2. [`visit_event::VisitEvent`] is sent to an async channel
//! 3. [`visit_worker::run_visit_worker`] processes events with retry logic
//! 4. Visit data is persisted via [`repositories::VisitRepository`]

pub mod entities;
pub mod ledger;
pub mod probability;
pub mod repositories;
pub mod selector;
pub mod visit_event;
pub mod visit_worker;
