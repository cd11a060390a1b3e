mod aggregate;

pub use aggregate::{analyze_portfolio, DealSummary, PortfolioMetrics};
