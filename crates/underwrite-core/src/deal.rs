use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::UnderwriteError;
use crate::types::{Money, Multiple, Rate};
use crate::UnderwriteResult;

// ---------------------------------------------------------------------------
// Deal model
// ---------------------------------------------------------------------------

/// The root entity under analysis. Never persisted by the engine; every
/// calculation is re-derived from the snapshot passed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub name: String,
    pub kind: DealKind,
    pub financing: FinancingTerms,
    /// Named partial overrides of the payload, applied through the same
    /// field paths the sensitivity engine sweeps.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

/// Deal-kind discriminant with its type-specific payload. Exhaustive
/// matching at every dispatch site; a new kind forces a compile-time
/// check of all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DealKind {
    RealEstate(RealEstateTerms),
    Business(BusinessTerms),
    Hybrid(HybridTerms),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingTerms {
    pub loan_type: LoanType,
    pub loan_amount: Money,
    /// Down payment as a fraction of price (0.25 = 25%)
    pub down_payment_rate: Rate,
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    /// Amortization may exceed term for balloon structures. Zero with a
    /// positive loan amount degrades debt-service math to zero.
    pub amortization_years: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanType {
    Conventional,
    Commercial,
    Sba7a,
    Sba504,
    SellerFinancing,
    Cash,
}

/// Per-category monthly operating expenses for a property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatingExpenses {
    pub taxes: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub utilities: Money,
    pub hoa: Money,
    pub other: Money,
}

impl OperatingExpenses {
    pub fn monthly_total(&self) -> Money {
        self.taxes + self.insurance + self.maintenance + self.utilities + self.hoa + self.other
    }
}

/// Non-cash and one-time add-backs for a business P&L.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddBacks {
    pub depreciation: Money,
    pub amortization: Money,
    pub interest: Money,
    pub taxes: Money,
    pub other: Money,
}

impl AddBacks {
    /// The non-discretionary add-backs (D+A+I+T) that reconstruct EBITDA.
    pub fn ebitda_total(&self) -> Money {
        self.depreciation + self.amortization + self.interest + self.taxes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateTerms {
    pub purchase_price: Money,
    pub closing_costs: Money,
    pub rehab_costs: Money,
    pub monthly_rent: Money,
    pub other_monthly_income: Money,
    /// Vacancy and collection loss (0.05 = 5%)
    pub vacancy_rate: Rate,
    pub expenses: OperatingExpenses,
    /// Management fee as a fraction of effective gross income
    pub management_rate: Rate,
    pub rent_growth: Rate,
    pub expense_growth: Rate,
    pub appreciation_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTerms {
    pub asking_price: Money,
    pub closing_costs: Money,
    pub annual_revenue: Money,
    pub cost_of_goods: Money,
    pub operating_expenses: Money,
    pub owner_salary: Money,
    pub add_backs: AddBacks,
    pub revenue_growth: Rate,
    pub expense_growth: Rate,
}

/// Property plus operating business in one transaction. The
/// property/business allocation is advisory: a mismatch against the
/// purchase price surfaces as a warning and a risk flag, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridTerms {
    pub purchase_price: Money,
    pub closing_costs: Money,
    pub property_value: Money,
    pub business_value: Money,

    // Property side
    pub monthly_rent: Money,
    pub other_monthly_income: Money,
    pub vacancy_rate: Rate,
    pub property_expenses: OperatingExpenses,
    pub management_rate: Rate,
    pub rent_growth: Rate,
    pub property_expense_growth: Rate,
    pub appreciation_rate: Rate,

    // Business side
    pub annual_revenue: Money,
    pub cost_of_goods: Money,
    pub operating_expenses: Money,
    pub owner_salary: Money,
    pub add_backs: AddBacks,
    pub revenue_growth: Rate,
    pub business_expense_growth: Rate,
}

impl Deal {
    pub fn purchase_price(&self) -> Money {
        match &self.kind {
            DealKind::RealEstate(t) => t.purchase_price,
            DealKind::Business(t) => t.asking_price,
            DealKind::Hybrid(t) => t.purchase_price,
        }
    }

    /// Down payment plus acquisition costs. The down payment is derived
    /// from price minus loan so that loan-amount overrides flow through.
    pub fn total_cash_invested(&self) -> Money {
        let price = self.purchase_price();
        let down = (price - self.financing.loan_amount).max(Decimal::ZERO);
        let costs = match &self.kind {
            DealKind::RealEstate(t) => t.closing_costs + t.rehab_costs,
            DealKind::Business(t) => t.closing_costs,
            DealKind::Hybrid(t) => t.closing_costs,
        };
        down + costs
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            DealKind::RealEstate(_) => "real-estate",
            DealKind::Business(_) => "business",
            DealKind::Hybrid(_) => "hybrid",
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// A named partial override of the deal payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub overrides: BTreeMap<String, Decimal>,
}

/// Clone the deal and apply every override through the field-path setter.
/// The input deal is never mutated.
pub fn apply_scenario(deal: &Deal, scenario: &Scenario) -> UnderwriteResult<Deal> {
    let mut out = deal.clone();
    for (path, value) in &scenario.overrides {
        set_field(&mut out, path, *value)?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Field paths
// ---------------------------------------------------------------------------
//
// Dot-addressed numeric fields shared by scenarios and the sensitivity
// sweep. An unknown path is a contract violation, not a degenerate input.

pub fn get_field(deal: &Deal, path: &str) -> UnderwriteResult<Decimal> {
    if let Some(field) = path.strip_prefix("financing.") {
        let f = &deal.financing;
        return match field {
            "loan_amount" => Ok(f.loan_amount),
            "down_payment_rate" => Ok(f.down_payment_rate),
            "interest_rate" => Ok(f.interest_rate),
            _ => Err(UnderwriteError::UnknownField(path.to_string())),
        };
    }

    match &deal.kind {
        DealKind::RealEstate(t) => match path {
            "purchase_price" => Ok(t.purchase_price),
            "monthly_rent" => Ok(t.monthly_rent),
            "other_monthly_income" => Ok(t.other_monthly_income),
            "vacancy_rate" => Ok(t.vacancy_rate),
            "management_rate" => Ok(t.management_rate),
            "rent_growth" => Ok(t.rent_growth),
            "expense_growth" => Ok(t.expense_growth),
            "appreciation_rate" => Ok(t.appreciation_rate),
            "expenses.taxes" => Ok(t.expenses.taxes),
            "expenses.insurance" => Ok(t.expenses.insurance),
            "expenses.maintenance" => Ok(t.expenses.maintenance),
            "expenses.utilities" => Ok(t.expenses.utilities),
            "expenses.hoa" => Ok(t.expenses.hoa),
            "expenses.other" => Ok(t.expenses.other),
            _ => Err(UnderwriteError::UnknownField(path.to_string())),
        },
        DealKind::Business(t) => match path {
            "asking_price" => Ok(t.asking_price),
            "annual_revenue" => Ok(t.annual_revenue),
            "cost_of_goods" => Ok(t.cost_of_goods),
            "operating_expenses" => Ok(t.operating_expenses),
            "owner_salary" => Ok(t.owner_salary),
            "revenue_growth" => Ok(t.revenue_growth),
            "expense_growth" => Ok(t.expense_growth),
            _ => Err(UnderwriteError::UnknownField(path.to_string())),
        },
        DealKind::Hybrid(t) => match path {
            "purchase_price" => Ok(t.purchase_price),
            "property_value" => Ok(t.property_value),
            "business_value" => Ok(t.business_value),
            "monthly_rent" => Ok(t.monthly_rent),
            "other_monthly_income" => Ok(t.other_monthly_income),
            "vacancy_rate" => Ok(t.vacancy_rate),
            "management_rate" => Ok(t.management_rate),
            "rent_growth" => Ok(t.rent_growth),
            "property_expense_growth" => Ok(t.property_expense_growth),
            "appreciation_rate" => Ok(t.appreciation_rate),
            "annual_revenue" => Ok(t.annual_revenue),
            "cost_of_goods" => Ok(t.cost_of_goods),
            "operating_expenses" => Ok(t.operating_expenses),
            "owner_salary" => Ok(t.owner_salary),
            "revenue_growth" => Ok(t.revenue_growth),
            "business_expense_growth" => Ok(t.business_expense_growth),
            _ => Err(UnderwriteError::UnknownField(path.to_string())),
        },
    }
}

pub fn set_field(deal: &mut Deal, path: &str, value: Decimal) -> UnderwriteResult<()> {
    if let Some(field) = path.strip_prefix("financing.") {
        let f = &mut deal.financing;
        match field {
            "loan_amount" => f.loan_amount = value,
            "down_payment_rate" => f.down_payment_rate = value,
            "interest_rate" => f.interest_rate = value,
            _ => return Err(UnderwriteError::UnknownField(path.to_string())),
        }
        return Ok(());
    }

    match &mut deal.kind {
        DealKind::RealEstate(t) => match path {
            "purchase_price" => t.purchase_price = value,
            "monthly_rent" => t.monthly_rent = value,
            "other_monthly_income" => t.other_monthly_income = value,
            "vacancy_rate" => t.vacancy_rate = value,
            "management_rate" => t.management_rate = value,
            "rent_growth" => t.rent_growth = value,
            "expense_growth" => t.expense_growth = value,
            "appreciation_rate" => t.appreciation_rate = value,
            "expenses.taxes" => t.expenses.taxes = value,
            "expenses.insurance" => t.expenses.insurance = value,
            "expenses.maintenance" => t.expenses.maintenance = value,
            "expenses.utilities" => t.expenses.utilities = value,
            "expenses.hoa" => t.expenses.hoa = value,
            "expenses.other" => t.expenses.other = value,
            _ => return Err(UnderwriteError::UnknownField(path.to_string())),
        },
        DealKind::Business(t) => match path {
            "asking_price" => t.asking_price = value,
            "annual_revenue" => t.annual_revenue = value,
            "cost_of_goods" => t.cost_of_goods = value,
            "operating_expenses" => t.operating_expenses = value,
            "owner_salary" => t.owner_salary = value,
            "revenue_growth" => t.revenue_growth = value,
            "expense_growth" => t.expense_growth = value,
            _ => return Err(UnderwriteError::UnknownField(path.to_string())),
        },
        DealKind::Hybrid(t) => match path {
            "purchase_price" => t.purchase_price = value,
            "property_value" => t.property_value = value,
            "business_value" => t.business_value = value,
            "monthly_rent" => t.monthly_rent = value,
            "other_monthly_income" => t.other_monthly_income = value,
            "vacancy_rate" => t.vacancy_rate = value,
            "management_rate" => t.management_rate = value,
            "rent_growth" => t.rent_growth = value,
            "property_expense_growth" => t.property_expense_growth = value,
            "appreciation_rate" => t.appreciation_rate = value,
            "annual_revenue" => t.annual_revenue = value,
            "cost_of_goods" => t.cost_of_goods = value,
            "operating_expenses" => t.operating_expenses = value,
            "owner_salary" => t.owner_salary = value,
            "revenue_growth" => t.revenue_growth = value,
            "business_expense_growth" => t.business_expense_growth = value,
            _ => return Err(UnderwriteError::UnknownField(path.to_string())),
        },
    }
    Ok(())
}

/// Growth-rate fields are the only ones allowed to sweep below zero.
pub fn is_growth_field(path: &str) -> bool {
    path.contains("growth") || path.contains("appreciation")
}

/// Rate-like fields take absolute-point steps; everything else is
/// treated as a currency magnitude.
pub fn is_rate_field(path: &str) -> bool {
    path.ends_with("rate") || is_growth_field(path)
}

// ---------------------------------------------------------------------------
// Caller-owned configuration tables
// ---------------------------------------------------------------------------

/// Default financing terms for a loan type. Static configuration owned by
/// the caller; the engine never consults a global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProfile {
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    pub amortization_years: u32,
    pub min_down_payment: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDefaults {
    profiles: Vec<(LoanType, LoanProfile)>,
}

impl LoanDefaults {
    /// The standard rate table. Callers may build their own instead.
    pub fn builtin() -> Self {
        let p = |rate, term, amort, down| LoanProfile {
            interest_rate: rate,
            loan_term_years: term,
            amortization_years: amort,
            min_down_payment: down,
        };
        LoanDefaults {
            profiles: vec![
                (LoanType::Conventional, p(dec!(0.070), 30, 30, dec!(0.20))),
                (LoanType::Commercial, p(dec!(0.0775), 10, 25, dec!(0.25))),
                (LoanType::Sba7a, p(dec!(0.105), 10, 10, dec!(0.10))),
                (LoanType::Sba504, p(dec!(0.0675), 25, 25, dec!(0.10))),
                (LoanType::SellerFinancing, p(dec!(0.06), 7, 20, dec!(0.10))),
                (LoanType::Cash, p(Decimal::ZERO, 0, 0, Decimal::ONE)),
            ],
        }
    }

    pub fn profile(&self, loan_type: &LoanType) -> Option<&LoanProfile> {
        self.profiles.iter().find(|(t, _)| t == loan_type).map(|(_, p)| p)
    }
}

/// Market bands used by valuation and negotiation. Injected by the
/// caller; `Default` carries the standard small-deal calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAssumptions {
    pub cap_rate_low: Rate,
    pub cap_rate_high: Rate,
    pub sde_multiple_low: Multiple,
    pub sde_multiple_high: Multiple,
    pub target_dscr: Decimal,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        MarketAssumptions {
            cap_rate_low: dec!(0.06),
            cap_rate_high: dec!(0.09),
            sde_multiple_low: dec!(2.0),
            sde_multiple_high: dec!(3.0),
            target_dscr: dec!(1.25),
        }
    }
}
