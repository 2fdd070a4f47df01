//! Listwell Content - Listing content generator abstraction
//!
//! New listings need a title, a summary and tags. This crate defines the
//! [`ContentGenerator`] seam the top-up controller calls, plus the
//! [`TemplateGenerator`] that works with no external service.
//!
//! Generator output is validated before use; a failed or invalid generation
//! skips that one listing and never aborts a top-up batch.

pub mod generator;
pub mod types;

pub use generator::*;
pub use types::*;
