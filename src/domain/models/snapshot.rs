use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Revenue/expense totals as served by the transaction aggregate.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub profit: f64,
}

/// Read-only projection of the user's current financial metrics, sent
/// alongside each chat request to ground the assistant. Never mutated by
/// the chat subsystem.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub cash_balance: f64,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

impl FinancialSnapshot {
    pub fn from_summary(summary: &TransactionSummary) -> FinancialSnapshot {
        let profit_margin = if summary.revenue > 0.0 {
            (summary.profit / summary.revenue) * 100.0
        } else {
            0.0
        };

        return FinancialSnapshot {
            // The backend exposes no dedicated cash figure. Profit stands in.
            cash_balance: summary.profit,
            revenue: summary.revenue,
            expenses: summary.expenses,
            profit: summary.profit,
            profit_margin,
        };
    }
}
