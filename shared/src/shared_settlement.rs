use serde::{Serialize, Deserialize};
use std::fmt;

/// One settled spin. Field order matches the canonical ledger columns, so a
/// persisted row serializes in the exact column order the ledger expects.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SettlementResult {
    pub date: String,
    pub investment: f64,
    pub wheel_pct: f64,
    pub flair_pct: f64,
    pub base_outcome: f64,
    pub flair_bonus_gp: f64,
    pub net_profit: f64,
    pub final_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementError {
    NegativeInvestment(f64),
    NonFiniteInput,
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeInvestment(investment) => {
                write!(f, "investment {} gp cannot be negative", investment)
            }
            Self::NonFiniteInput => write!(f, "settlement inputs must be finite numbers"),
        }
    }
}

impl std::error::Error for SettlementError {}

/// Earnings maths for one spin. Pure arithmetic with no intermediate
/// rounding; any rounding for display is the renderer's business.
///
/// The flair bonus applies on top of the wheel-adjusted outcome, not the raw
/// investment, so a generous wheel also inflates the flair reward.
pub fn settle(
    investment: f64,
    wheel_pct: f64,
    flair_pct: f64,
    date: String,
) -> Result<SettlementResult, SettlementError> {
    if !investment.is_finite() || !wheel_pct.is_finite() || !flair_pct.is_finite() {
        return Err(SettlementError::NonFiniteInput);
    }
    if investment < 0.0 {
        return Err(SettlementError::NegativeInvestment(investment));
    }

    let base_profit = investment * (wheel_pct / 100.0);
    let base_outcome = investment + base_profit;
    let flair_bonus_gp = base_outcome * (flair_pct / 100.0);
    let final_amount = base_outcome + flair_bonus_gp;
    let net_profit = final_amount - investment;

    Ok(SettlementResult {
        date,
        investment,
        wheel_pct,
        flair_pct,
        base_outcome,
        flair_bonus_gp,
        net_profit,
        final_amount,
    })
}
