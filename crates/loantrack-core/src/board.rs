//! Loan list pages: the daily collection board and the monthly loan board.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::card::{DailyCollectionCard, derive_card};
use crate::coerce::saturating_sum;
use crate::error::CardError;
use crate::loan::{Loan, LoanStatus};

/// Daily-card loans with a card derived for every active one.
#[derive(Debug, Clone)]
pub struct DailyBoard {
    loans: Vec<Loan>,
    /// `(index into loans, card)` for each active loan.
    cards: Vec<(usize, DailyCollectionCard)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBoardSummary {
    pub pending: usize,
    pub active_cards: usize,
    pub late_today: usize,
    pub with_penalties: usize,
}

impl DailyBoard {
    /// Keep the daily loans from `loans` and derive cards for the active ones.
    pub fn build(loans: Vec<Loan>, today: NaiveDate) -> Result<Self, CardError> {
        let loans: Vec<Loan> = loans.into_iter().filter(Loan::has_daily_card).collect();
        let mut cards = Vec::new();
        for (idx, loan) in loans.iter().enumerate() {
            if loan.status == LoanStatus::Active {
                cards.push((idx, derive_card(loan, today)?));
            }
        }
        debug!(loans = loans.len(), cards = cards.len(), "built daily board");
        Ok(Self { loans, cards })
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn cards(&self) -> impl Iterator<Item = (&Loan, &DailyCollectionCard)> {
        self.cards.iter().map(|(idx, card)| (&self.loans[*idx], card))
    }

    pub fn pending(&self) -> impl Iterator<Item = &Loan> {
        self.loans
            .iter()
            .filter(|l| l.status == LoanStatus::Pending)
    }

    pub fn closed_or_defaulted(&self) -> impl Iterator<Item = &Loan> {
        self.loans
            .iter()
            .filter(|l| matches!(l.status, LoanStatus::Closed | LoanStatus::Defaulted))
    }

    pub fn summary(&self) -> DailyBoardSummary {
        DailyBoardSummary {
            pending: self.pending().count(),
            active_cards: self.cards.len(),
            late_today: self.cards.iter().filter(|(_, c)| c.is_late_today).count(),
            with_penalties: self.cards.iter().filter(|(_, c)| c.penalty_months > 0).count(),
        }
    }
}

/// Monthly-interest ("Type A") loans.
#[derive(Debug, Clone)]
pub struct MonthlyBoard {
    loans: Vec<Loan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBoardSummary {
    pub pending: usize,
    pub active: usize,
    pub active_outstanding_principal: Decimal,
    pub interest_due: usize,
}

impl MonthlyBoard {
    pub fn build(loans: Vec<Loan>) -> Self {
        Self {
            loans: loans.into_iter().filter(Loan::is_monthly).collect(),
        }
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn summary(&self) -> MonthlyBoardSummary {
        let active = || self.loans.iter().filter(|l| l.status == LoanStatus::Active);
        MonthlyBoardSummary {
            pending: self
                .loans
                .iter()
                .filter(|l| l.status == LoanStatus::Pending)
                .count(),
            active: active().count(),
            active_outstanding_principal: saturating_sum(active().map(|l| l.outstanding_principal)),
            interest_due: active().filter(|l| l.is_interest_due()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn loan(value: serde_json::Value) -> Loan {
        serde_json::from_value(value).unwrap()
    }

    fn daily_loans() -> Vec<Loan> {
        vec![
            // On track: 10 days in, 11 boxes paid.
            loan(json!({"id":"1","loanNumber":"D-1","status":"ACTIVE","termDays":100,
                "dailyInstallmentAmount":100,"totalPrincipalPaid":1100,"startDate":"2026-10-09"})),
            // Late: 5 days in, nothing paid.
            loan(json!({"id":"2","loanNumber":"D-2","status":"ACTIVE","termDays":50,
                "dailyInstallmentAmount":100,"startDate":"2026-10-14"})),
            // Past term by 40 days.
            loan(json!({"id":"3","loanNumber":"D-3","status":"ACTIVE","termDays":30,
                "dailyInstallmentAmount":100,"totalPrincipalPaid":3000,"startDate":"2026-08-10"})),
            loan(json!({"id":"4","loanNumber":"D-4","status":"PENDING","termDays":60})),
            loan(json!({"id":"5","loanNumber":"D-5","status":"CLOSED","termDays":60})),
            loan(json!({"id":"6","loanNumber":"D-6","status":"DEFAULTED","termDays":60})),
            // Monthly loan: not on the daily board.
            loan(json!({"id":"7","loanNumber":"M-1","status":"ACTIVE","termMonths":6})),
        ]
    }

    #[test]
    fn daily_board_summary() {
        let board = DailyBoard::build(daily_loans(), today()).unwrap();
        assert_eq!(board.loans().len(), 6);
        assert_eq!(
            board.summary(),
            DailyBoardSummary {
                pending: 1,
                active_cards: 3,
                late_today: 1,
                with_penalties: 1,
            }
        );
        assert_eq!(board.closed_or_defaulted().count(), 2);
    }

    #[test]
    fn daily_board_pairs_cards_with_loans() {
        let board = DailyBoard::build(daily_loans(), today()).unwrap();
        let numbers: Vec<&str> = board.cards().map(|(l, _)| l.loan_number.as_str()).collect();
        assert_eq!(numbers, ["D-1", "D-2", "D-3"]);
        let (_, overdue) = board.cards().nth(2).unwrap();
        assert_eq!(overdue.days_overdue, 40);
        assert_eq!(overdue.penalty_months, 2);
    }

    #[test]
    fn monthly_board_summary() {
        let loans = vec![
            loan(json!({"status":"ACTIVE","termMonths":12,"outstandingPrincipal":"40000","outstandingInterest":"1200"})),
            loan(json!({"status":"ACTIVE","termMonths":6,"outstandingPrincipal":25000,"outstandingInterest":0})),
            loan(json!({"status":"PENDING","termMonths":6,"outstandingPrincipal":10000})),
            loan(json!({"status":"ACTIVE","termDays":100,"outstandingPrincipal":9999})),
        ];
        let board = MonthlyBoard::build(loans);
        assert_eq!(board.loans().len(), 3);
        assert_eq!(
            board.summary(),
            MonthlyBoardSummary {
                pending: 1,
                active: 2,
                active_outstanding_principal: Decimal::from(65000),
                interest_due: 1,
            }
        );
    }

    #[test]
    fn monthly_outstanding_saturates() {
        let max = "79228162514264337593543950335";
        let loans = vec![
            loan(json!({"status":"ACTIVE","termMonths":12,"outstandingPrincipal":max})),
            loan(json!({"status":"ACTIVE","termMonths":12,"outstandingPrincipal":max})),
        ];
        let board = MonthlyBoard::build(loans);
        assert_eq!(board.summary().active_outstanding_principal, Decimal::MAX);
    }

    #[test]
    fn oversized_term_does_not_abort_board() {
        let mut loans = daily_loans();
        loans.push(loan(json!({"id":"8","loanNumber":"D-8","status":"ACTIVE","termDays":5000000000u64})));
        loans.push(loan(json!({"id":"9","loanNumber":"M-9","status":"ACTIVE","termDays":30,
            "loanType":{"code":"TYPE_A_MONTHLY"}})));
        let board = DailyBoard::build(loans, today()).unwrap();
        assert_eq!(board.loans().len(), 6);
        assert_eq!(board.summary().active_cards, 3);
    }
}
