//! Pacing admission controller
//!
//! Grants at most one intro per cycle, system-wide, to the oldest open
//! listing the pacing ramp allows to grow. This makes the controller a
//! global rate limiter rather than a per-listing cap.

use chrono::{DateTime, Utc};
use listwell_store::ListingStore;
use listwell_types::ListingId;
use tracing::{debug, info, warn};

use crate::config::PacingConfig;
use crate::EngineResult;

/// The single intro granted in a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub listing_id: ListingId,
    /// Intros granted after this admission
    pub intros_granted: u32,
    pub capacity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionOutcome {
    /// Candidates looked at before stopping
    pub examined: usize,
    pub admitted: Option<Admission>,
    pub failed: u32,
}

pub struct PacingAdmissionController {
    config: PacingConfig,
}

impl PacingAdmissionController {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        store: &dyn ListingStore,
        now: DateTime<Utc>,
    ) -> EngineResult<AdmissionOutcome> {
        let candidates = store.open_oldest_first(self.config.window).await?;
        let mut outcome = AdmissionOutcome::default();

        for listing in candidates {
            outcome.examined += 1;
            let Some(allowed) = self.config.ramp.admissible(&listing, now) else {
                continue;
            };

            match store.grant_intro(&listing.id, allowed).await {
                Ok(true) => {
                    let admission = Admission {
                        listing_id: listing.id,
                        intros_granted: listing.intros_granted + 1,
                        capacity: listing.capacity,
                    };
                    info!(
                        listing_id = %listing.id,
                        intros_granted = admission.intros_granted,
                        capacity = listing.capacity,
                        age_hours = listing.age_at(now).num_hours(),
                        "Granted intro"
                    );
                    outcome.admitted = Some(admission);
                    return Ok(outcome);
                }
                Ok(false) => {
                    debug!(listing_id = %listing.id, "Listing changed underneath admission, skipping");
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        listing_id = %listing.id,
                        error = %e,
                        transient = e.is_transient(),
                        "Intro grant failed, trying next candidate"
                    );
                }
            }
        }

        debug!(examined = outcome.examined, "No listing eligible for an intro");
        Ok(outcome)
    }
}
