//! Engine configuration
//!
//! Every window and bound the controllers use is configurable. The defaults
//! are the production values.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::ramp::PacingRamp;
use crate::{EngineError, EngineResult};

/// Configuration for all lifecycle controllers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub topup: TopUpConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub closure: ClosureConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.topup.validate()?;
        self.pacing.validate()?;
        if self.closure.window == 0 {
            return Err(EngineError::config("closure.window must be positive"));
        }
        Ok(())
    }
}

/// Inventory top-up settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUpConfig {
    /// Floor on the number of open listings
    #[serde(default = "default_min_open")]
    pub min_open: u32,
    /// When set above the floor, each top-up aims for a random count in
    /// `[min_open, max_open]` instead of exactly `min_open`
    #[serde(default)]
    pub max_open: Option<u32>,
    /// Capacities new listings are drawn from
    #[serde(default = "default_capacity_choices")]
    pub capacity_choices: Vec<u32>,
    /// New listings are back-dated by up to this many hours
    #[serde(default = "default_max_backdate_hours")]
    pub max_backdate_hours: u32,
    #[serde(default = "default_price_min_floor")]
    pub price_min_floor: u32,
    #[serde(default = "default_price_min_ceiling")]
    pub price_min_ceiling: u32,
    /// `price.max = price.min + extra`, extra drawn from this range
    #[serde(default = "default_price_extra_min")]
    pub price_extra_min: u32,
    #[serde(default = "default_price_extra_max")]
    pub price_extra_max: u32,
}

impl Default for TopUpConfig {
    fn default() -> Self {
        Self {
            min_open: default_min_open(),
            max_open: None,
            capacity_choices: default_capacity_choices(),
            max_backdate_hours: default_max_backdate_hours(),
            price_min_floor: default_price_min_floor(),
            price_min_ceiling: default_price_min_ceiling(),
            price_extra_min: default_price_extra_min(),
            price_extra_max: default_price_extra_max(),
        }
    }
}

impl TopUpConfig {
    pub fn max_backdate(&self) -> Duration {
        Duration::hours(i64::from(self.max_backdate_hours))
    }

    fn validate(&self) -> EngineResult<()> {
        if self.capacity_choices.is_empty() {
            return Err(EngineError::config("topup.capacity_choices must not be empty"));
        }
        if self.capacity_choices.contains(&0) {
            return Err(EngineError::config("topup.capacity_choices must be positive"));
        }
        if self.price_min_floor > self.price_min_ceiling {
            return Err(EngineError::config(
                "topup.price_min_floor is above topup.price_min_ceiling",
            ));
        }
        if self.price_extra_min > self.price_extra_max {
            return Err(EngineError::config(
                "topup.price_extra_min is above topup.price_extra_max",
            ));
        }
        if self
            .price_min_ceiling
            .checked_add(self.price_extra_max)
            .is_none()
        {
            return Err(EngineError::config("topup price bounds overflow"));
        }
        if let Some(max_open) = self.max_open {
            if max_open < self.min_open {
                return Err(EngineError::config("topup.max_open is below topup.min_open"));
            }
        }
        Ok(())
    }
}

/// Pacing admission settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Oldest open listings examined per cycle
    pub window: usize,
    pub ramp: PacingRamp,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            window: 100,
            ramp: PacingRamp::default(),
        }
    }
}

impl PacingConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.window == 0 {
            return Err(EngineError::config("pacing.window must be positive"));
        }
        self.ramp.validate()
    }
}

/// Closure settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    /// Open listings with intros examined per cycle
    pub window: usize,
    /// How long a closed listing stays visible
    pub visibility_window_hours: u32,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            window: 100,
            visibility_window_hours: 72,
        }
    }
}

impl ClosureConfig {
    pub fn visibility_window(&self) -> Duration {
        Duration::hours(i64::from(self.visibility_window_hours))
    }
}

/// Activity simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Most recently created visible listings touched per cycle; zero disables
    pub sample_size: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self { sample_size: 15 }
    }
}

fn default_min_open() -> u32 {
    50
}

fn default_capacity_choices() -> Vec<u32> {
    vec![3, 4, 5]
}

fn default_max_backdate_hours() -> u32 {
    36
}

fn default_price_min_floor() -> u32 {
    500
}

fn default_price_min_ceiling() -> u32 {
    5000
}

fn default_price_extra_min() -> u32 {
    250
}

fn default_price_extra_max() -> u32 {
    2500
}
