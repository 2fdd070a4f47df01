//! Maintenance orchestrator
//!
//! Runs one maintenance cycle: top-up, admission, closure, then activity,
//! all evaluated against a single `now` read at the start of the cycle. A
//! failing stage is logged and counted; the stages after it still run.

use std::sync::Arc;
use std::time::Instant;

use listwell_content::{ContentGenerator, TemplateGenerator};
use listwell_store::ListingStore;
use listwell_types::{CycleId, CycleReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use crate::activity::ActivitySimulator;
use crate::admission::PacingAdmissionController;
use crate::clock::{Clock, SystemClock};
use crate::closure::ClosureManager;
use crate::config::EngineConfig;
use crate::topup::TopUpController;
use crate::EngineResult;

pub struct MaintenanceOrchestrator {
    store: Arc<dyn ListingStore>,
    clock: Arc<dyn Clock>,
    topup: TopUpController,
    admission: PacingAdmissionController,
    closure: ClosureManager,
    activity: ActivitySimulator,
}

impl MaintenanceOrchestrator {
    pub fn builder(store: Arc<dyn ListingStore>) -> MaintenanceOrchestratorBuilder {
        MaintenanceOrchestratorBuilder::new(store)
    }

    pub fn store(&self) -> &Arc<dyn ListingStore> {
        &self.store
    }

    /// Run every stage once and summarize what changed
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        let now = self.clock.now();
        let mut report = CycleReport::new(CycleId::new(), now);
        let store = self.store.as_ref();

        match self.topup.run(store, now).await {
            Ok(outcome) => {
                report.created = outcome.created;
                report.failures += outcome.failed;
            }
            Err(e) => {
                report.failures += 1;
                error!(
                    cycle_id = %report.cycle_id,
                    stage = "topup",
                    error = %e,
                    transient = e.is_transient(),
                    "Stage failed"
                );
            }
        }

        match self.admission.run(store, now).await {
            Ok(outcome) => {
                report.admitted = u32::from(outcome.admitted.is_some());
                report.failures += outcome.failed;
            }
            Err(e) => {
                report.failures += 1;
                error!(
                    cycle_id = %report.cycle_id,
                    stage = "admission",
                    error = %e,
                    transient = e.is_transient(),
                    "Stage failed"
                );
            }
        }

        match self.closure.run(store, now).await {
            Ok(outcome) => {
                report.closed = outcome.closed.len() as u32;
                report.failures += outcome.failed;
            }
            Err(e) => {
                report.failures += 1;
                error!(
                    cycle_id = %report.cycle_id,
                    stage = "closure",
                    error = %e,
                    transient = e.is_transient(),
                    "Stage failed"
                );
            }
        }

        match self.activity.run(store, now).await {
            Ok(outcome) => {
                report.views_bumped = outcome.bumped;
                report.failures += outcome.failed;
            }
            Err(e) => {
                report.failures += 1;
                error!(
                    cycle_id = %report.cycle_id,
                    stage = "activity",
                    error = %e,
                    transient = e.is_transient(),
                    "Stage failed"
                );
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        if report.is_noop() && report.failures == 0 {
            debug!(
                cycle_id = %report.cycle_id,
                elapsed_ms = report.elapsed_ms,
                "Maintenance cycle found nothing to do"
            );
            return report;
        }
        info!(
            cycle_id = %report.cycle_id,
            created = report.created,
            admitted = report.admitted,
            closed = report.closed,
            views_bumped = report.views_bumped,
            failures = report.failures,
            elapsed_ms = report.elapsed_ms,
            "Maintenance cycle complete"
        );
        report
    }
}

/// Builder for [`MaintenanceOrchestrator`]
///
/// Defaults: [`EngineConfig::default`], the template generator, the system
/// clock and an entropy-seeded RNG.
pub struct MaintenanceOrchestratorBuilder {
    store: Arc<dyn ListingStore>,
    config: EngineConfig,
    generator: Option<Arc<dyn ContentGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    seed: Option<u64>,
}

impl MaintenanceOrchestratorBuilder {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            generator: None,
            clock: None,
            seed: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Seed every random draw for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> EngineResult<MaintenanceOrchestrator> {
        self.config.validate()?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let generator: Arc<dyn ContentGenerator> = match (self.generator, self.seed) {
            (Some(generator), _) => generator,
            (None, Some(seed)) => Arc::new(TemplateGenerator::seeded(seed)),
            (None, None) => Arc::new(TemplateGenerator::new()),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        info!(
            generator = generator.name(),
            min_open = self.config.topup.min_open,
            seeded = self.seed.is_some(),
            "Building maintenance orchestrator"
        );

        Ok(MaintenanceOrchestrator {
            store: self.store,
            clock,
            topup: TopUpController::new(self.config.topup, generator, rng),
            admission: PacingAdmissionController::new(self.config.pacing),
            closure: ClosureManager::new(self.config.closure),
            activity: ActivitySimulator::new(self.config.activity),
        })
    }
}
