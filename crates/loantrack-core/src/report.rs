//! Report payloads and the dashboard roll-up.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coerce::{self, saturating_sum};

/// Number of due collections shown on the dashboard.
pub const DASHBOARD_COLLECTIONS: usize = 5;

/// Portfolio totals for one loan type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    #[serde(default, deserialize_with = "coerce::string")]
    pub loan_type: String,
    #[serde(default, deserialize_with = "coerce::count")]
    pub total_loans: i64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub active_loans: i64,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub total_disbursed: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub total_outstanding: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub total_interest_earned: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub total_penalty_earned: Decimal,
}

/// A single collection due (today, or overdue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCollection {
    #[serde(default, deserialize_with = "coerce::string")]
    pub loan_id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub loan_number: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub borrower_name: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub borrower_phone: String,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub due_amount: Decimal,
    #[serde(default, deserialize_with = "coerce::date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::count")]
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "coerce::string")]
    pub status: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub uptime: Decimal,
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_outstanding: Decimal,
    /// Interest plus penalty earned across all loan types.
    pub total_profit: Decimal,
    pub overdue_count: usize,
    /// Sum of everything due for collection today.
    pub today_target: Decimal,
}

impl DashboardMetrics {
    pub fn compute(
        portfolio: &[PortfolioSummary],
        today_collections: &[DueCollection],
        overdue: &[DueCollection],
    ) -> Self {
        Self {
            total_outstanding: saturating_sum(portfolio.iter().map(|p| p.total_outstanding)),
            total_profit: saturating_sum(
                portfolio
                    .iter()
                    .map(|p| p.total_interest_earned.saturating_add(p.total_penalty_earned)),
            ),
            overdue_count: overdue.len(),
            today_target: saturating_sum(today_collections.iter().map(|c| c.due_amount)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio() -> Vec<PortfolioSummary> {
        serde_json::from_str(
            r#"[
                {"loanType":"TYPE_A_MONTHLY","totalLoans":12,"activeLoans":9,"totalDisbursed":"600000",
                 "totalOutstanding":"410000.00","totalInterestEarned":"54000","totalPenaltyEarned":"1500"},
                {"loanType":"TYPE_B_DAILY","totalLoans":30,"activeLoans":22,"totalDisbursed":300000,
                 "totalOutstanding":185000,"totalInterestEarned":36000,"totalPenaltyEarned":0}
            ]"#,
        )
        .unwrap()
    }

    fn due(amount: &str) -> DueCollection {
        serde_json::from_value(serde_json::json!({
            "loanId": "l", "loanNumber": "LN", "borrowerName": "x", "borrowerPhone": "1",
            "dueAmount": amount, "dueDate": "2026-10-19", "daysOverdue": 0
        }))
        .unwrap()
    }

    #[test]
    fn dashboard_rollup() {
        let metrics = DashboardMetrics::compute(
            &portfolio(),
            &[due("120"), due("250.50")],
            &[due("90"), due("90"), due("90")],
        );
        assert_eq!(metrics.total_outstanding, Decimal::from(595000));
        assert_eq!(metrics.total_profit, Decimal::from(91500));
        assert_eq!(metrics.overdue_count, 3);
        assert_eq!(metrics.today_target, Decimal::new(37050, 2));
    }

    #[test]
    fn empty_dashboard() {
        let metrics = DashboardMetrics::compute(&[], &[], &[]);
        assert_eq!(metrics.total_outstanding, Decimal::ZERO);
        assert_eq!(metrics.overdue_count, 0);
    }

    #[test]
    fn oversized_totals_saturate() {
        let max = "79228162514264337593543950335";
        let portfolio: Vec<PortfolioSummary> = serde_json::from_value(serde_json::json!([
            {"loanType":"A","totalOutstanding":max,"totalInterestEarned":max,"totalPenaltyEarned":max},
            {"loanType":"B","totalOutstanding":max,"totalInterestEarned":max,"totalPenaltyEarned":max}
        ]))
        .unwrap();
        let metrics = DashboardMetrics::compute(&portfolio, &[due(max), due(max)], &[]);
        assert_eq!(metrics.total_outstanding, Decimal::MAX);
        assert_eq!(metrics.total_profit, Decimal::MAX);
        assert_eq!(metrics.today_target, Decimal::MAX);
    }

    #[test]
    fn due_collection_date() {
        assert_eq!(due("1").due_date, NaiveDate::from_ymd_opt(2026, 10, 19));
    }
}
