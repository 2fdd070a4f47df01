//! Pacing ramp
//!
//! Bounds how many intros a listing may have accumulated given its age. A
//! brand-new listing can not fill up instantly, and any untouched listing may
//! reach full capacity once it is old enough.
//!
//! Default ramp:
//!
//! ```text
//! age <  1h   -> 0
//! age <  8h   -> 1
//! age < 24h   -> 2
//! age < 48h   -> 3
//! age >= 48h  -> capacity
//! ```

use chrono::{DateTime, Duration, Utc};
use listwell_types::Listing;
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// From `from_hours` of age onwards, up to `allowed` intros
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampStep {
    pub from_hours: u32,
    pub allowed: u32,
}

/// Age-indexed limit on accumulated intros
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingRamp {
    /// Steps in ascending `from_hours` order; younger listings get zero
    pub steps: Vec<RampStep>,
    /// From this age on, the full capacity is allowed
    pub full_after_hours: u32,
}

impl Default for PacingRamp {
    fn default() -> Self {
        Self {
            steps: vec![
                RampStep { from_hours: 1, allowed: 1 },
                RampStep { from_hours: 8, allowed: 2 },
                RampStep { from_hours: 24, allowed: 3 },
            ],
            full_after_hours: 48,
        }
    }
}

impl PacingRamp {
    /// Maximum accumulated intros for a listing of `age` and `capacity`
    pub fn max_allowed(&self, age: Duration, capacity: u32) -> u32 {
        if age >= Duration::hours(i64::from(self.full_after_hours)) {
            return capacity;
        }
        self.steps
            .iter()
            .take_while(|step| age >= Duration::hours(i64::from(step.from_hours)))
            .last()
            .map_or(0, |step| step.allowed)
            .min(capacity)
    }

    /// The allowance under which `listing` may receive one more intro at `now`,
    /// or `None` if it is not eligible
    pub fn admissible(&self, listing: &Listing, now: DateTime<Utc>) -> Option<u32> {
        if !listing.status.is_open() || listing.is_full() {
            return None;
        }
        let allowed = self.max_allowed(listing.age_at(now), listing.capacity);
        (listing.intros_granted < allowed).then_some(allowed)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let mut previous: Option<RampStep> = None;
        for step in &self.steps {
            if let Some(prev) = previous {
                if step.from_hours <= prev.from_hours {
                    return Err(EngineError::config(
                        "pacing ramp steps must have strictly ascending from_hours",
                    ));
                }
                if step.allowed < prev.allowed {
                    return Err(EngineError::config(
                        "pacing ramp allowances must not decrease with age",
                    ));
                }
            }
            if step.from_hours >= self.full_after_hours {
                return Err(EngineError::config(format!(
                    "pacing ramp step at {}h is not before full_after_hours {}h",
                    step.from_hours, self.full_after_hours
                )));
            }
            previous = Some(*step);
        }
        Ok(())
    }
}
