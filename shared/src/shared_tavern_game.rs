use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fmt;

use crate::constants::{
    LOSS_CHANCE, LOSS_PERCENTAGE, MAX_EXTRA_SPINS, MAX_PROFIT_PERCENT, MIN_EXTRA_SPINS,
    MIN_PROFIT_PERCENT, POINTER_ANGLE_DEGREES, SECTOR_MARGIN_DEGREES,
};
use crate::shared_settlement::SettlementResult;

/// The two outcome regimes of the fortune wheel
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCategory {
    Loss,
    Profit,
}

/// Represents the result of one wheel draw: which regime it landed in,
/// the drawn percentage, and where on the disc the pointer must rest.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct SpinOutcome {
    pub category: OutcomeCategory,
    pub percentage: f64,
    pub dial_angle_degrees: f64,
}

/// Probability model of the wheel. The loss sector's angular width equals its
/// probability mass, so the resting pointer is always visually consistent
/// with the drawn category.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct WheelConfig {
    pub loss_chance: f64,
    pub loss_percentage: f64,
    pub min_profit_percent: f64,
    pub max_profit_percent: f64,
    pub sector_margin_degrees: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            loss_chance: LOSS_CHANCE,
            loss_percentage: LOSS_PERCENTAGE,
            min_profit_percent: MIN_PROFIT_PERCENT,
            max_profit_percent: MAX_PROFIT_PERCENT,
            sector_margin_degrees: SECTOR_MARGIN_DEGREES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WheelConfigError {
    LossChanceOutOfRange(f64),
    InvertedProfitBounds { min: f64, max: f64 },
    MarginTooWide { margin: f64, arc: f64 },
}

impl fmt::Display for WheelConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LossChanceOutOfRange(chance) => {
                write!(f, "loss chance {} must be strictly between 0 and 1", chance)
            }
            Self::InvertedProfitBounds { min, max } => {
                write!(f, "profit range [{}, {}] is inverted", min, max)
            }
            Self::MarginTooWide { margin, arc } => {
                write!(
                    f,
                    "sector margin {}\u{b0} does not fit twice inside the {}\u{b0} loss arc",
                    margin, arc
                )
            }
        }
    }
}

impl std::error::Error for WheelConfigError {}

impl WheelConfig {
    pub fn loss_arc_degrees(&self) -> f64 {
        360.0 * self.loss_chance
    }

    pub fn profit_arc_degrees(&self) -> f64 {
        360.0 - self.loss_arc_degrees()
    }

    /// A loss chance of exactly 0 or 1 would collapse one arc to zero width
    /// and break the margin inset, so both are rejected outright.
    pub fn validate(&self) -> Result<(), WheelConfigError> {
        if !self.loss_chance.is_finite() || self.loss_chance <= 0.0 || self.loss_chance >= 1.0 {
            return Err(WheelConfigError::LossChanceOutOfRange(self.loss_chance));
        }
        if self.min_profit_percent > self.max_profit_percent {
            return Err(WheelConfigError::InvertedProfitBounds {
                min: self.min_profit_percent,
                max: self.max_profit_percent,
            });
        }
        let arc = self.loss_arc_degrees();
        if self.sector_margin_degrees < 0.0 || 2.0 * self.sector_margin_degrees >= arc {
            return Err(WheelConfigError::MarginTooWide {
                margin: self.sector_margin_degrees,
                arc,
            });
        }
        Ok(())
    }
}

/// Draws one SpinOutcome per call. Stateless apart from its validated
/// configuration; the randomness source is passed in by the caller.
#[derive(Debug, Clone)]
pub struct OutcomeGenerator {
    config: WheelConfig,
}

impl OutcomeGenerator {
    pub fn new(config: WheelConfig) -> Result<Self, WheelConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// One spin: the first uniform draw picks the regime, a second
    /// independent draw places the result within it.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> SpinOutcome {
        if rng.gen::<f64>() < self.config.loss_chance {
            self.loss_outcome(rng.gen::<f64>())
        } else {
            self.profit_outcome(rng.gen::<f64>())
        }
    }

    /// Maps a unit draw onto the loss sector, inset by the margin so the
    /// pointer never rests exactly on a sector boundary.
    pub fn loss_outcome(&self, v: f64) -> SpinOutcome {
        let arc = self.config.loss_arc_degrees();
        let margin = self.config.sector_margin_degrees;
        SpinOutcome {
            category: OutcomeCategory::Loss,
            percentage: self.config.loss_percentage,
            dial_angle_degrees: margin + v * (arc - 2.0 * margin),
        }
    }

    /// Maps a unit draw onto the profit continuum. The same draw drives both
    /// the percentage and the angle, so sectors further around the arc always
    /// pay out more.
    pub fn profit_outcome(&self, u: f64) -> SpinOutcome {
        let config = &self.config;
        SpinOutcome {
            category: OutcomeCategory::Profit,
            percentage: config.min_profit_percent
                + u * (config.max_profit_percent - config.min_profit_percent),
            dial_angle_degrees: config.loss_arc_degrees() + u * config.profit_arc_degrees(),
        }
    }
}

/// Absolute rotation handed to the animation layer. Never wraps; the CSS
/// transition interpolates from the previous total to this one.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct RotationCommand {
    pub total_rotation_degrees: f64,
}

/// Accumulates the wheel's total rotation across the spins of one session.
/// Single writer per session; the resting position depends only on the
/// current draw, while the number of turns taken to get there is flourish.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RotationAccumulator {
    total_degrees: f64,
}

impl RotationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_degrees(&self) -> f64 {
        self.total_degrees
    }

    /// Adds 4 to 7 full turns plus the forward correction that parks the
    /// drawn angle under the pointer mounted at 90 degrees. The correction is
    /// taken relative to the wheel's current orientation, so the resting
    /// position never inherits drift from earlier spins.
    pub fn advance<R: Rng>(&mut self, rng: &mut R, dial_angle_degrees: f64) -> RotationCommand {
        let extra_spins = rng.gen_range(MIN_EXTRA_SPINS..=MAX_EXTRA_SPINS);
        let correction = (POINTER_ANGLE_DEGREES - dial_angle_degrees - self.total_degrees)
            .rem_euclid(360.0);
        self.total_degrees += 360.0 * f64::from(extra_spins) + correction;
        RotationCommand {
            total_rotation_degrees: self.total_degrees,
        }
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct NewTavernSessionResponse {
    pub session_id: String,
    pub ledger_entries: usize,
    pub wheel: WheelConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TavernSpinRequest {
    pub session_id: String,
    #[serde(default)]
    pub investment: Option<f64>,
    #[serde(default)]
    pub flair_pct: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TavernSpinResponse {
    pub outcome: SpinOutcome,
    pub rotation: RotationCommand,
    pub settlement: SettlementResult,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TavernLedgerResponse {
    pub entries: Vec<SettlementResult>,
    pub count: usize,
}
