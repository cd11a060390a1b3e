use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::deal::{Deal, DealKind};
use crate::types::Rate;

/// Deltas applied to a deal to produce its recession case. Defaults
/// model a moderate downturn; every field can be overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecessionOverrides {
    /// Added to vacancy, capped at `vacancy_cap`
    pub vacancy_delta: Rate,
    pub vacancy_cap: Rate,
    /// Fractional haircut on rents and revenue
    pub income_haircut: Rate,
    /// Added to the borrowing rate (refinance risk)
    pub interest_rate_delta: Rate,
    /// Added to every expense-growth assumption
    pub expense_growth_delta: Rate,
    /// Subtracted from income-growth and appreciation assumptions
    pub growth_delta: Rate,
    /// Floors keep stressed growth from collapsing past plausible lows
    pub rent_growth_floor: Rate,
    pub revenue_growth_floor: Rate,
    pub appreciation_floor: Rate,
}

impl Default for RecessionOverrides {
    fn default() -> Self {
        RecessionOverrides {
            vacancy_delta: dec!(0.07),
            vacancy_cap: dec!(0.50),
            income_haircut: dec!(0.10),
            interest_rate_delta: dec!(0.015),
            expense_growth_delta: dec!(0.01),
            growth_delta: dec!(0.03),
            rent_growth_floor: dec!(-0.05),
            revenue_growth_floor: dec!(-0.10),
            appreciation_floor: dec!(-0.05),
        }
    }
}

/// Return a stressed copy of the deal. The input is never mutated, so a
/// base/stressed comparison can run both sides from the same deal.
pub fn apply_recession(deal: &Deal, overrides: &RecessionOverrides) -> Deal {
    let mut stressed = deal.clone();
    let haircut = Decimal::ONE - overrides.income_haircut;

    stressed.financing.interest_rate += overrides.interest_rate_delta;

    match &mut stressed.kind {
        DealKind::RealEstate(t) => {
            t.vacancy_rate = (t.vacancy_rate + overrides.vacancy_delta).min(overrides.vacancy_cap);
            t.monthly_rent *= haircut;
            t.other_monthly_income *= haircut;
            t.expense_growth += overrides.expense_growth_delta;
            t.rent_growth = (t.rent_growth - overrides.growth_delta).max(overrides.rent_growth_floor);
            t.appreciation_rate =
                (t.appreciation_rate - overrides.growth_delta).max(overrides.appreciation_floor);
        }
        DealKind::Business(t) => {
            t.annual_revenue *= haircut;
            t.expense_growth += overrides.expense_growth_delta;
            t.revenue_growth =
                (t.revenue_growth - overrides.growth_delta).max(overrides.revenue_growth_floor);
        }
        DealKind::Hybrid(t) => {
            t.vacancy_rate = (t.vacancy_rate + overrides.vacancy_delta).min(overrides.vacancy_cap);
            t.monthly_rent *= haircut;
            t.other_monthly_income *= haircut;
            t.annual_revenue *= haircut;
            t.property_expense_growth += overrides.expense_growth_delta;
            t.business_expense_growth += overrides.expense_growth_delta;
            t.rent_growth = (t.rent_growth - overrides.growth_delta).max(overrides.rent_growth_floor);
            t.revenue_growth =
                (t.revenue_growth - overrides.growth_delta).max(overrides.revenue_growth_floor);
            t.appreciation_rate =
                (t.appreciation_rate - overrides.growth_delta).max(overrides.appreciation_floor);
        }
    }

    stressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{
        AddBacks, BusinessTerms, FinancingTerms, HybridTerms, LoanType, OperatingExpenses,
        RealEstateTerms,
    };
    use pretty_assertions::assert_eq;

    fn rental() -> Deal {
        Deal {
            id: "r-1".into(),
            name: "Elm Fourplex".into(),
            kind: DealKind::RealEstate(RealEstateTerms {
                purchase_price: dec!(400000),
                closing_costs: dec!(8000),
                rehab_costs: Decimal::ZERO,
                monthly_rent: dec!(4000),
                other_monthly_income: dec!(200),
                vacancy_rate: dec!(0.05),
                expenses: OperatingExpenses::default(),
                management_rate: dec!(0.08),
                rent_growth: dec!(0.03),
                expense_growth: dec!(0.02),
                appreciation_rate: dec!(0.03),
            }),
            financing: FinancingTerms {
                loan_type: LoanType::Conventional,
                loan_amount: dec!(300000),
                down_payment_rate: dec!(0.25),
                interest_rate: dec!(0.07),
                loan_term_years: 30,
                amortization_years: 30,
            },
            scenarios: Vec::new(),
        }
    }

    #[test]
    fn test_default_recession_on_rental() {
        let deal = rental();
        let stressed = apply_recession(&deal, &RecessionOverrides::default());

        let DealKind::RealEstate(t) = &stressed.kind else {
            panic!("kind changed")
        };
        assert_eq!(t.vacancy_rate, dec!(0.12));
        assert_eq!(t.monthly_rent, dec!(3600.0));
        assert_eq!(t.other_monthly_income, dec!(180.0));
        assert_eq!(t.rent_growth, dec!(0.00));
        assert_eq!(t.expense_growth, dec!(0.03));
        assert_eq!(t.appreciation_rate, dec!(0.00));
        assert_eq!(stressed.financing.interest_rate, dec!(0.085));
    }

    #[test]
    fn test_vacancy_is_capped() {
        let mut deal = rental();
        if let DealKind::RealEstate(t) = &mut deal.kind {
            t.vacancy_rate = dec!(0.48);
        }
        let stressed = apply_recession(&deal, &RecessionOverrides::default());
        let DealKind::RealEstate(t) = &stressed.kind else {
            panic!()
        };
        assert_eq!(t.vacancy_rate, dec!(0.50));
    }

    #[test]
    fn test_growth_floors_bind() {
        let mut deal = rental();
        if let DealKind::RealEstate(t) = &mut deal.kind {
            t.rent_growth = dec!(-0.04);
            t.appreciation_rate = dec!(-0.04);
        }
        let stressed = apply_recession(&deal, &RecessionOverrides::default());
        let DealKind::RealEstate(t) = &stressed.kind else {
            panic!()
        };
        assert_eq!(t.rent_growth, dec!(-0.05));
        assert_eq!(t.appreciation_rate, dec!(-0.05));
    }

    #[test]
    fn test_base_deal_untouched() {
        let deal = rental();
        let _ = apply_recession(&deal, &RecessionOverrides::default());
        let DealKind::RealEstate(t) = &deal.kind else {
            panic!()
        };
        assert_eq!(t.monthly_rent, dec!(4000));
        assert_eq!(deal.financing.interest_rate, dec!(0.07));
    }

    #[test]
    fn test_business_recession() {
        let deal = Deal {
            id: "b-1".into(),
            name: "Print Shop".into(),
            kind: DealKind::Business(BusinessTerms {
                asking_price: dec!(300000),
                closing_costs: dec!(10000),
                annual_revenue: dec!(500000),
                cost_of_goods: dec!(200000),
                operating_expenses: dec!(180000),
                owner_salary: dec!(55000),
                add_backs: AddBacks::default(),
                revenue_growth: dec!(0.02),
                expense_growth: dec!(0.02),
            }),
            financing: FinancingTerms {
                loan_type: LoanType::Sba7a,
                loan_amount: dec!(240000),
                down_payment_rate: dec!(0.20),
                interest_rate: dec!(0.105),
                loan_term_years: 10,
                amortization_years: 10,
            },
            scenarios: Vec::new(),
        };

        let stressed = apply_recession(&deal, &RecessionOverrides::default());
        let DealKind::Business(t) = &stressed.kind else {
            panic!()
        };
        assert_eq!(t.annual_revenue, dec!(450000.0));
        assert_eq!(t.revenue_growth, dec!(-0.01));
        assert_eq!(t.expense_growth, dec!(0.03));
        // Costs are not haircut; only the top line falls.
        assert_eq!(t.cost_of_goods, dec!(200000));
    }

    #[test]
    fn test_hybrid_stresses_both_sides() {
        let deal = Deal {
            id: "h-1".into(),
            name: "Motel + Diner".into(),
            kind: DealKind::Hybrid(HybridTerms {
                purchase_price: dec!(1200000),
                closing_costs: dec!(30000),
                property_value: dec!(800000),
                business_value: dec!(400000),
                monthly_rent: dec!(9000),
                other_monthly_income: dec!(500),
                vacancy_rate: dec!(0.10),
                property_expenses: OperatingExpenses::default(),
                management_rate: dec!(0.05),
                rent_growth: dec!(0.03),
                property_expense_growth: dec!(0.02),
                appreciation_rate: dec!(0.025),
                annual_revenue: dec!(420000),
                cost_of_goods: dec!(150000),
                operating_expenses: dec!(190000),
                owner_salary: dec!(55000),
                add_backs: AddBacks::default(),
                revenue_growth: dec!(0.03),
                business_expense_growth: dec!(0.02),
            }),
            financing: FinancingTerms {
                loan_type: LoanType::Commercial,
                loan_amount: dec!(900000),
                down_payment_rate: dec!(0.25),
                interest_rate: dec!(0.0775),
                loan_term_years: 10,
                amortization_years: 25,
            },
            scenarios: Vec::new(),
        };

        let stressed = apply_recession(&deal, &RecessionOverrides::default());
        let DealKind::Hybrid(t) = &stressed.kind else {
            panic!()
        };
        assert_eq!(t.vacancy_rate, dec!(0.17));
        assert_eq!(t.monthly_rent, dec!(8100.0));
        assert_eq!(t.annual_revenue, dec!(378000.0));
        assert_eq!(t.property_expense_growth, dec!(0.03));
        assert_eq!(t.business_expense_growth, dec!(0.03));
        assert_eq!(t.revenue_growth, dec!(0.00));
    }
}
