//! Defaulted-loan tracking.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::borrower::Borrower;
use crate::card::penalty_months_for;
use crate::coerce::saturating_sum;
use crate::loan::Loan;

/// Borrower name and phone, from whichever source had them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Contact {
    /// Contact details embedded in the loan itself, if any.
    pub fn from_loan(loan: &Loan) -> Option<Self> {
        loan.borrower.as_ref().map(|b| Self {
            name: Some(b.full_name.clone()).filter(|n| !n.is_empty()),
            phone: b.phone.clone(),
        })
    }
}

impl From<&Borrower> for Contact {
    fn from(b: &Borrower) -> Self {
        Self {
            name: Some(b.full_name.clone()).filter(|n| !n.is_empty()),
            phone: Some(b.phone.clone()).filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaulterInfo {
    pub loan: Loan,
    pub borrower_name: Option<String>,
    pub borrower_phone: Option<String>,
    pub days_overdue: i64,
    /// Principal still owed plus accrued-but-unpaid interest.
    pub outstanding_total: Decimal,
    pub penalty_months: u32,
}

impl DefaulterInfo {
    /// Build the defaulter row for `loan`.
    ///
    /// Days overdue come from the backend's `daysPastDue` when it is
    /// positive; otherwise they are counted from the maturity date.
    pub fn from_loan(loan: Loan, contact: Contact, today: NaiveDate) -> Self {
        let days_overdue = if loan.days_past_due > 0 {
            loan.days_past_due
        } else {
            loan.maturity_date
                .map(|m| today.signed_duration_since(m).num_days().max(0))
                .unwrap_or(0)
        };
        let outstanding_interest = loan
            .total_interest_accrued
            .saturating_sub(loan.total_interest_paid);
        let outstanding_total = loan.current_principal.saturating_add(outstanding_interest);

        Self {
            borrower_name: contact.name,
            borrower_phone: contact.phone,
            days_overdue,
            outstanding_total,
            penalty_months: penalty_months_for(days_overdue),
            loan,
        }
    }

    /// Search on borrower name or loan number (case-insensitive), or phone.
    pub fn matches(&self, query: &str) -> bool {
        let raw = query.trim();
        if raw.is_empty() {
            return true;
        }
        let q = raw.to_lowercase();
        self.borrower_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&q))
            || self.loan.loan_number.to_lowercase().contains(&q)
            || self.borrower_phone.as_deref().is_some_and(|p| p.contains(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaulterSummary {
    pub count: usize,
    pub total_outstanding: Decimal,
    pub average_days_overdue: i64,
}

impl DefaulterSummary {
    pub fn of(defaulters: &[DefaulterInfo]) -> Self {
        let count = defaulters.len();
        let total_days = defaulters
            .iter()
            .fold(0i64, |acc, d| acc.saturating_add(d.days_overdue));
        let average_days_overdue = if count == 0 {
            0
        } else {
            (Decimal::from(total_days) / Decimal::from(count))
                .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(0)
        };
        Self {
            count,
            total_outstanding: saturating_sum(defaulters.iter().map(|d| d.outstanding_total)),
            average_days_overdue,
        }
    }
}

/// Up to two uppercase initials, `??` when there is no name.
pub fn initials(name: Option<&str>) -> String {
    let initials: String = name
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if initials.is_empty() {
        "??".to_string()
    } else {
        initials
    }
}
