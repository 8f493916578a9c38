//! Utility functions for request handling and URL processing.
//!
//! - [`client_ip`] - Visitor address extraction
//! - [`url_normalizer`] - Variant target normalization
//! - [`url_builder`] - Query forwarding and Google Forms prefill

pub mod client_ip;
pub mod url_builder;
pub mod url_normalizer;
