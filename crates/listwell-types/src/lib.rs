//! Listwell Types - Canonical domain types for the listing lifecycle engine
//!
//! This crate contains the foundational types shared by every Listwell crate,
//! with zero dependencies on other listwell crates:
//!
//! - Identity types (`ListingId`, `CycleId`)
//! - Listings, their status, category and price range
//! - The per-cycle run summary
//!
//! # Lifecycle Invariants
//!
//! 1. `intros_granted <= capacity`, always
//! 2. A listing is closed exactly when `filled_at` is set
//! 3. Only closed listings carry `visible_until`
//! 4. Visible iff open, or closed with `visible_until` still in the future

pub mod identity;
pub mod listing;
pub mod report;
pub mod error;

pub use identity::*;
pub use listing::*;
pub use report::*;
pub use error::*;
