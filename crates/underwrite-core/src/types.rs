use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentage points.
pub type Rate = Decimal;

/// Multiples (e.g., 2.8x SDE)
pub type Multiple = Decimal;

/// A ratio that may be unbounded. DSCR with no debt service and break-even
/// revenue with non-positive gross margin are "impossible to exceed", not
/// errors; `Infinite` carries that sentinel through comparisons and
/// formatting. Decimal has no IEEE infinity, so the unbounded value is a
/// variant rather than a bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extended {
    Finite(Decimal),
    Infinite,
}

impl Extended {
    pub const ZERO: Extended = Extended::Finite(Decimal::ZERO);

    /// Ratio with the unbounded-denominator convention: a non-positive
    /// denominator means the ratio cannot be exhausted.
    pub fn ratio(numerator: Decimal, denominator: Decimal) -> Extended {
        if denominator <= Decimal::ZERO {
            Extended::Infinite
        } else {
            Extended::Finite(numerator / denominator)
        }
    }

    pub fn finite(self) -> Option<Decimal> {
        match self {
            Extended::Finite(d) => Some(d),
            Extended::Infinite => None,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Extended::Infinite)
    }

    /// True only for a finite value strictly below the threshold.
    /// `Infinite` is never below anything.
    pub fn is_below(self, threshold: Decimal) -> bool {
        match self {
            Extended::Finite(d) => d < threshold,
            Extended::Infinite => false,
        }
    }

    /// Finite value, or `fallback` when unbounded. Used where a bounded
    /// stand-in is needed (e.g. scoring an unleveraged deal at the top
    /// of the coverage band).
    pub fn unwrap_or(self, fallback: Decimal) -> Decimal {
        match self {
            Extended::Finite(d) => d,
            Extended::Infinite => fallback,
        }
    }
}

impl From<Decimal> for Extended {
    fn from(d: Decimal) -> Self {
        Extended::Finite(d)
    }
}

impl Ord for Extended {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Extended::Infinite, Extended::Infinite) => Ordering::Equal,
            (Extended::Infinite, Extended::Finite(_)) => Ordering::Greater,
            (Extended::Finite(_), Extended::Infinite) => Ordering::Less,
            (Extended::Finite(a), Extended::Finite(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Extended {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extended::Finite(d) => write!(f, "{d}"),
            Extended::Infinite => write!(f, "∞"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_extended_ordering() {
        assert!(Extended::Infinite > Extended::Finite(dec!(1000000)));
        assert!(Extended::Finite(dec!(1.5)) > Extended::Finite(dec!(1.25)));
        assert_eq!(Extended::Infinite, Extended::Infinite);
    }

    #[test]
    fn test_extended_ratio_zero_denominator() {
        assert_eq!(Extended::ratio(dec!(21600), Decimal::ZERO), Extended::Infinite);
        assert_eq!(
            Extended::ratio(dec!(10), dec!(4)),
            Extended::Finite(dec!(2.5))
        );
    }

    #[test]
    fn test_extended_is_below() {
        assert!(Extended::Finite(dec!(1.1)).is_below(dec!(1.25)));
        assert!(!Extended::Infinite.is_below(dec!(1.25)));
        assert!(!Extended::Finite(dec!(1.25)).is_below(dec!(1.25)));
    }

    #[test]
    fn test_extended_display() {
        assert_eq!(Extended::Infinite.to_string(), "∞");
        assert_eq!(Extended::Finite(dec!(1.42)).to_string(), "1.42");
    }

    #[test]
    fn test_extended_serde_round_trip() {
        let json = serde_json::to_string(&Extended::Infinite).unwrap();
        assert_eq!(json, "null");
        let back: Extended = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Extended::Infinite);
    }
}
