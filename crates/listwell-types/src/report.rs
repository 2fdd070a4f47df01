//! Run summary emitted by every maintenance cycle

use crate::CycleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts produced by one maintenance cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    /// The instant every stage of the cycle evaluated against
    pub started_at: DateTime<Utc>,
    /// Listings opened by the top-up controller
    pub created: u32,
    /// Intros granted; zero or one
    pub admitted: u32,
    /// Listings transitioned to closed
    pub closed: u32,
    /// View counters incremented
    pub views_bumped: u32,
    /// Items or stages that failed and were skipped
    pub failures: u32,
    pub elapsed_ms: u64,
}

impl CycleReport {
    pub fn new(cycle_id: CycleId, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle_id,
            started_at,
            created: 0,
            admitted: 0,
            closed: 0,
            views_bumped: 0,
            failures: 0,
            elapsed_ms: 0,
        }
    }

    /// Whether the cycle changed anything in the store
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.admitted == 0 && self.closed == 0 && self.views_bumped == 0
    }
}
