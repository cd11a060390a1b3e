use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::deal::FinancingTerms;
use crate::time_value::monthly_payment;
use crate::types::{Money, Rate};

/// One month of a fully amortizing schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    /// 1-based month number
    pub period: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
}

/// Twelve-month roll-up of the monthly schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualRow {
    pub year: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub ending_balance: Money,
    /// Share of the year's payments that went to principal
    pub principal_share: Rate,
}

/// Lifetime totals for a loan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub periods: u32,
    pub total_paid: Money,
    pub total_principal: Money,
    pub total_interest: Money,
}

/// Generate the full monthly schedule. The fixed payment is re-derived
/// from the terms so principal + interest reconciles to it every period;
/// the final balance is clamped to exactly zero. Empty when there is no
/// loan or no amortization period.
pub fn build_schedule(financing: &FinancingTerms) -> Vec<PaymentRow> {
    let principal = financing.loan_amount;
    let total_months = financing.amortization_years * 12;
    if principal <= Decimal::ZERO || total_months == 0 {
        return Vec::new();
    }

    let monthly_rate = financing.interest_rate / dec!(12);
    let payment = monthly_payment(principal, financing.interest_rate, financing.amortization_years);

    let mut rows = Vec::with_capacity(total_months as usize);
    let mut balance = principal;
    let mut cumulative_principal = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;

    for period in 1..=total_months {
        let interest = balance * monthly_rate;
        let mut principal_paid = payment - interest;
        // The closing period retires whatever remains.
        if principal_paid > balance || period == total_months {
            principal_paid = balance;
        }
        balance = (balance - principal_paid).max(Decimal::ZERO);

        cumulative_principal += principal_paid;
        cumulative_interest += interest;

        rows.push(PaymentRow {
            period,
            payment: principal_paid + interest,
            principal: principal_paid,
            interest,
            balance,
            cumulative_principal,
            cumulative_interest,
        });

        if balance.is_zero() {
            break;
        }
    }

    rows
}

/// Sum the monthly schedule into 12-month blocks. A trailing partial
/// year rolls up the remaining months.
pub fn annual_rollup(schedule: &[PaymentRow]) -> Vec<AnnualRow> {
    schedule
        .chunks(12)
        .enumerate()
        .map(|(i, months)| {
            let payment: Money = months.iter().map(|m| m.payment).sum();
            let principal: Money = months.iter().map(|m| m.principal).sum();
            let interest: Money = months.iter().map(|m| m.interest).sum();
            let ending_balance = months.last().map(|m| m.balance).unwrap_or_default();
            let principal_share = if payment.is_zero() {
                Decimal::ZERO
            } else {
                principal / payment
            };
            AnnualRow {
                year: (i as u32) + 1,
                payment,
                principal,
                interest,
                ending_balance,
                principal_share,
            }
        })
        .collect()
}

/// Lifetime totals, re-deriving the schedule. All-zero when unleveraged.
pub fn loan_summary(financing: &FinancingTerms) -> LoanSummary {
    let schedule = build_schedule(financing);
    if schedule.is_empty() {
        return LoanSummary::default();
    }

    let total_paid: Money = schedule.iter().map(|r| r.payment).sum();
    let total_principal: Money = schedule.iter().map(|r| r.principal).sum();
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();

    LoanSummary {
        loan_amount: financing.loan_amount,
        monthly_payment: monthly_payment(
            financing.loan_amount,
            financing.interest_rate,
            financing.amortization_years,
        ),
        periods: schedule.len() as u32,
        total_paid,
        total_principal,
        total_interest,
    }
}
