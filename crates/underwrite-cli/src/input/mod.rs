pub mod file;
pub mod stdin;

use underwrite_core::deal::{apply_scenario, Deal, LoanDefaults};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load one deal from `--input` or piped stdin, fill financing gaps
/// from the loan-type defaults, and optionally apply a named scenario.
pub fn load_deal(path: Option<&str>, scenario: Option<&str>) -> CliResult<Deal> {
    let mut deal: Deal = if let Some(path) = path {
        file::read_json(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide a deal via --input <file> or pipe JSON on stdin".into());
    };

    normalize_financing(&mut deal);

    if let Some(name) = scenario {
        let found = deal
            .scenarios
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| format!("Deal has no scenario named '{name}'"))?;
        deal = apply_scenario(&deal, &found)?;
    }

    Ok(deal)
}

/// Load a list of deals for the portfolio command.
pub fn load_deals(path: Option<&str>) -> CliResult<Vec<Deal>> {
    let mut deals: Vec<Deal> = if let Some(path) = path {
        file::read_json(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide deals via --input <file> or pipe a JSON array on stdin".into());
    };

    for deal in &mut deals {
        normalize_financing(deal);
    }
    Ok(deals)
}

/// Fill zeroed financing fields from the builtin profile for the deal's
/// loan type, so a minimal JSON payload underwrites with market-normal
/// terms.
fn normalize_financing(deal: &mut Deal) {
    let defaults = LoanDefaults::builtin();
    let Some(profile) = defaults.profile(&deal.financing.loan_type) else {
        return;
    };

    if deal.financing.interest_rate.is_zero() {
        deal.financing.interest_rate = profile.interest_rate;
    }
    if deal.financing.loan_term_years == 0 {
        deal.financing.loan_term_years = profile.loan_term_years;
    }
    if deal.financing.amortization_years == 0 {
        deal.financing.amortization_years = profile.amortization_years;
    }
    if deal.financing.down_payment_rate.is_zero() {
        deal.financing.down_payment_rate = profile.min_down_payment;
    }
}
