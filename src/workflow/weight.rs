use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale weight in tenths of a pound.
///
/// Field scales report one fractional digit. Storing whole tenths keeps
/// increment arithmetic and comparisons exact, with no float drift between
/// the displayed value and the persisted one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Weight(u32);

impl Weight {
    pub const ZERO: Weight = Weight(0);

    pub fn from_tenths(tenths: u32) -> Self {
        Weight(tenths)
    }

    /// Convert from pounds, rounding to the nearest tenth. Negative inputs
    /// clamp to zero.
    pub fn from_lbs(lbs: f64) -> Self {
        Weight((lbs * 10.0).round().max(0.0) as u32)
    }

    pub fn tenths(self) -> u32 {
        self.0
    }

    pub fn as_lbs(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Apply an increment step, clamping at zero. Decrementing past zero
    /// yields exactly zero, never a negative weight.
    pub fn apply(self, step: WeightStep) -> Self {
        Weight(self.0.saturating_add_signed(step.delta_tenths()))
    }

    /// Difference between two weights, clamped at zero.
    pub fn saturating_sub(self, other: Weight) -> Self {
        Weight(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.as_lbs())
    }
}

/// Fixed increments offered by the capture keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightStep {
    PlusTen,
    PlusOne,
    PlusTenth,
    MinusTen,
    MinusOne,
    MinusTenth,
}

impl WeightStep {
    pub fn delta_tenths(self) -> i32 {
        match self {
            WeightStep::PlusTen => 100,
            WeightStep::PlusOne => 10,
            WeightStep::PlusTenth => 1,
            WeightStep::MinusTen => -100,
            WeightStep::MinusOne => -10,
            WeightStep::MinusTenth => -1,
        }
    }
}

impl fmt::Display for WeightStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WeightStep::PlusTen => "+10.0",
            WeightStep::PlusOne => "+1.0",
            WeightStep::PlusTenth => "+0.1",
            WeightStep::MinusTen => "-10.0",
            WeightStep::MinusOne => "-1.0",
            WeightStep::MinusTenth => "-0.1",
        };
        f.write_str(label)
    }
}
