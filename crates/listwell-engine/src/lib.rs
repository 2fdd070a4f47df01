//! Listwell Engine - Listing lifecycle and pacing controllers
//!
//! One maintenance cycle runs four stages in a fixed order against a single
//! `now`:
//!
//! 1. [`TopUpController`]: keep open inventory at or above the floor
//! 2. [`PacingAdmissionController`]: grant at most one intro, system-wide
//! 3. [`ClosureManager`]: close full listings, start the visibility window
//! 4. [`ActivitySimulator`]: bump views on the newest visible listings
//!
//! [`MaintenanceOrchestrator`] wires the stages to a [`ListingStore`] and a
//! [`Clock`], and produces a [`CycleReport`] per run.
//!
//! ## Key Design Principles
//!
//! 1. The store is the only shared state; the engine holds no listing cache
//! 2. Every store mutation is conditional, so overlapping runs stay safe
//! 3. One failing listing never aborts the cycle
//!
//! [`ListingStore`]: listwell_store::ListingStore
//! [`CycleReport`]: listwell_types::CycleReport

pub mod activity;
pub mod admission;
pub mod clock;
pub mod closure;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod ramp;
pub mod topup;

pub use activity::{ActivityOutcome, ActivitySimulator};
pub use admission::{Admission, AdmissionOutcome, PacingAdmissionController};
pub use clock::{Clock, ManualClock, SystemClock};
pub use closure::{ClosureManager, ClosureOutcome};
pub use config::{ActivityConfig, ClosureConfig, EngineConfig, PacingConfig, TopUpConfig};
pub use error::{EngineError, EngineResult};
pub use orchestrator::{MaintenanceOrchestrator, MaintenanceOrchestratorBuilder};
pub use ramp::{PacingRamp, RampStep};
pub use topup::{TopUpController, TopUpOutcome};
