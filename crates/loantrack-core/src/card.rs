//! Daily collection card derivation.
//!
//! A daily-card loan is repaid in `termDays` fixed installments, one per
//! calendar day. The card is drawn as a grid of boxes; a box counts as
//! filled once cumulative payments cover it. Everything on the card is a
//! pure function of the loan record and "today", recomputed on every read.
//!
//! # Rules
//!
//! 1. `totalBoxes = termDays` (must be positive, see [`CardError`])
//! 2. `dailyAmount` = the first positive of: the installment amount,
//!    `totalExpectedRepayment / totalBoxes`, `principalAmount / totalBoxes`
//! 3. `filledBoxes = floor(totalPaid / dailyAmount)` clamped to
//!    `[0, totalBoxes]`, or 0 when there is no daily amount
//! 4. `expectedBoxes = clamp(daysSinceStart + 1, 0, totalBoxes)`
//! 5. late today ⇔ `filledBoxes < expectedBoxes`
//! 6. `daysOverdue = max(0, daysSinceStart − totalBoxes)`, and every started
//!    30-day block of that is one penalty month

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::error::CardError;
use crate::loan::Loan;

/// Days per penalty-interest block once a loan runs past its term.
pub const PENALTY_BLOCK_DAYS: i64 = 30;

/// Derived view of a daily-card loan. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCollectionCard {
    pub total_boxes: u32,
    pub daily_amount: Decimal,
    pub filled_boxes: u32,
    /// Whole days from disbursement to today; negative for a future
    /// disbursement, `None` if the loan has not been disbursed.
    pub days_since_start: Option<i64>,
    pub expected_boxes: u32,
    pub is_late_today: bool,
    pub days_overdue: u32,
    pub penalty_months: u32,
}

/// State of a single box on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxState {
    /// Covered by cumulative payments.
    Filled,
    /// Should have been covered by the end of today but is not.
    Missed,
    Upcoming,
}

/// Derive the daily collection card for `loan` as of `today`.
///
/// Fails only when the loan has no positive `termDays`; such loans are not
/// daily-card loans and callers must filter them out first.
pub fn derive_card(loan: &Loan, today: NaiveDate) -> Result<DailyCollectionCard, CardError> {
    let total_boxes = loan
        .term_days
        .filter(|d| *d > 0)
        .and_then(|d| u32::try_from(d).ok())
        .ok_or_else(|| CardError::InvalidLoanShape {
            loan_number: loan.loan_number.clone(),
            term_days: loan.term_days,
        })?;

    let daily_amount = resolve_daily_amount(loan, total_boxes);
    let filled_boxes = filled_boxes(loan.total_paid(), daily_amount, total_boxes);

    let days_since_start = loan
        .disbursement_date
        .map(|start| today.signed_duration_since(start).num_days());

    let (expected_boxes, days_overdue) = match days_since_start {
        Some(days) => {
            let expected = (days + 1).clamp(0, i64::from(total_boxes));
            let overdue = (days - i64::from(total_boxes)).max(0);
            (expected as u32, u32::try_from(overdue).unwrap_or(u32::MAX))
        }
        None => (0, 0),
    };

    Ok(DailyCollectionCard {
        total_boxes,
        daily_amount,
        filled_boxes,
        days_since_start,
        expected_boxes,
        is_late_today: filled_boxes < expected_boxes,
        days_overdue,
        penalty_months: penalty_months_for(i64::from(days_overdue)),
    })
}

/// Number of penalty months for `days_overdue` days past term.
///
/// Each started 30-day block counts as a full month; zero or negative
/// overdue days carry no penalty.
pub fn penalty_months_for(days_overdue: i64) -> u32 {
    if days_overdue <= 0 {
        return 0;
    }
    let months = (days_overdue - 1) / PENALTY_BLOCK_DAYS + 1;
    u32::try_from(months).unwrap_or(u32::MAX)
}

fn resolve_daily_amount(loan: &Loan, total_boxes: u32) -> Decimal {
    if loan.daily_installment_amount > Decimal::ZERO {
        return loan.daily_installment_amount;
    }
    let boxes = Decimal::from(total_boxes);
    let spread = |total: Decimal| total.checked_div(boxes).unwrap_or(Decimal::ZERO);
    if loan.total_expected_repayment > Decimal::ZERO {
        return spread(loan.total_expected_repayment);
    }
    if loan.principal_amount > Decimal::ZERO {
        return spread(loan.principal_amount);
    }
    Decimal::ZERO
}

fn filled_boxes(total_paid: Decimal, daily_amount: Decimal, total_boxes: u32) -> u32 {
    if daily_amount <= Decimal::ZERO || total_paid <= Decimal::ZERO {
        return 0;
    }
    match total_paid.checked_div(daily_amount) {
        Some(ratio) => ratio
            .floor()
            .to_u64()
            .map_or(total_boxes, |n| n.min(u64::from(total_boxes)) as u32),
        // Quotient too large to represent: every box is covered.
        None => total_boxes,
    }
}

impl DailyCollectionCard {
    pub fn remaining_boxes(&self) -> u32 {
        self.total_boxes - self.filled_boxes
    }

    /// Day number the next collection fills, or `None` when the card is full.
    pub fn next_box(&self) -> Option<u32> {
        (self.filled_boxes < self.total_boxes).then_some(self.filled_boxes + 1)
    }

    pub fn is_complete(&self) -> bool {
        self.filled_boxes == self.total_boxes
    }

    pub fn progress_percent(&self) -> Decimal {
        if self.total_boxes == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.filled_boxes) * Decimal::ONE_HUNDRED / Decimal::from(self.total_boxes)
    }

    /// State of the zero-based box `index`.
    pub fn box_state(&self, index: u32) -> BoxState {
        if index < self.filled_boxes {
            BoxState::Filled
        } else if index < self.expected_boxes {
            BoxState::Missed
        } else {
            BoxState::Upcoming
        }
    }

    pub fn boxes(&self) -> impl Iterator<Item = BoxState> + '_ {
        (0..self.total_boxes).map(|i| self.box_state(i))
    }

    /// Boxes that should be filled by today but are not.
    pub fn missed_boxes(&self) -> u32 {
        self.expected_boxes.saturating_sub(self.filled_boxes)
    }
}
