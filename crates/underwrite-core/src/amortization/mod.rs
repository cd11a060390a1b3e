mod reverse;
mod schedule;

pub use reverse::{max_supportable_loan, max_supportable_price};
pub use schedule::{annual_rollup, build_schedule, loan_summary, AnnualRow, LoanSummary, PaymentRow};
