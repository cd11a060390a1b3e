mod analysis;
mod valuation;

pub use analysis::{
    analyze_negotiation, Impact, NegotiationAnalysis, NegotiationPoint, PointCategory, PriceGap,
    PriceLadderRung, StressComparison,
};
pub use valuation::{fair_value, ValuationRange};
