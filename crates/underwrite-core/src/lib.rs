pub mod deal;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "stress")]
pub mod stress;

#[cfg(feature = "scoring")]
pub mod scoring;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

#[cfg(feature = "negotiation")]
pub mod negotiation;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use deal::{Deal, DealKind, FinancingTerms};
pub use error::UnderwriteError;
pub use types::*;

/// Standard result type for all underwriting operations
pub type UnderwriteResult<T> = Result<T, UnderwriteError>;
