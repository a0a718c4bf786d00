//! Plain-text rendering for each page.
//!
//! Amounts are shown in rupees with Indian digit grouping and no paise;
//! daily cards are drawn as a grid of ten boxes per row, at most twenty rows.

use chrono::NaiveDate;
use loantrack_core::{
    Borrower, BoxState, DailyBoard, DailyCollectionCard, DefaulterInfo, DefaulterSummary,
    HealthStatus, Loan, MonthlyBoard, initials,
};
use loantrack_sync::views::{BorrowerDetail, Dashboard, LoanDetail};
use rust_decimal::{Decimal, RoundingStrategy};

const GRID_WIDTH: u32 = 10;
/// Boxes drawn before the grid is cut short.
const GRID_MAX_BOXES: u32 = 200;

// ── Formatting ──

/// `₹1,23,456` style: whole rupees, last three digits grouped, then pairs.
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = rounded.abs().trunc().to_string();
    format!("{sign}₹{}", group_indian(&digits))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn borrower_name(loan: &Loan) -> &str {
    loan.borrower
        .as_ref()
        .map(|b| b.full_name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown")
}

/// Card grid, one character per box: `#` filled, `x` missed, `.` upcoming.
/// Terms longer than [`GRID_MAX_BOXES`] end with a `+N more` line.
pub fn card_grid(card: &DailyCollectionCard) -> String {
    let cells: Vec<char> = card
        .boxes()
        .take(GRID_MAX_BOXES as usize)
        .map(|state| match state {
            BoxState::Filled => '#',
            BoxState::Missed => 'x',
            BoxState::Upcoming => '.',
        })
        .collect();
    let mut rows = cells
        .chunks(GRID_WIDTH as usize)
        .enumerate()
        .map(|(row, chunk)| {
            let first = row as u32 * GRID_WIDTH + 1;
            let line: String = chunk
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            format!("  {first:>4}  {line}")
        })
        .collect::<Vec<_>>();
    if card.total_boxes > GRID_MAX_BOXES {
        rows.push(format!("        +{} more", card.total_boxes - GRID_MAX_BOXES));
    }
    rows.join("\n")
}

// ── Pages ──

pub fn print_dashboard(view: &Dashboard) {
    let m = &view.metrics;
    println!("=== Dashboard ===");
    println!("  {:<26} {}", "Total outstanding", format_inr(m.total_outstanding));
    println!("  {:<26} {}", "Total profit", format_inr(m.total_profit));
    println!("  {:<26} {}", "Overdue loans", m.overdue_count);
    println!("  {:<26} {}", "Today's target", format_inr(m.today_target));
    println!();

    if !view.portfolio.is_empty() {
        println!("Portfolio");
        for p in &view.portfolio {
            println!(
                "  {:<18} {:>4} loans  {:>4} active  outstanding {}",
                p.loan_type,
                p.total_loans,
                p.active_loans,
                format_inr(p.total_outstanding)
            );
        }
        println!();
    }

    println!("Due today");
    if view.today_collections.is_empty() {
        println!("  (nothing due)");
    }
    for c in &view.today_collections {
        println!(
            "  {:<12} {:<24} {}",
            c.loan_number,
            c.borrower_name,
            format_inr(c.due_amount)
        );
    }
}

pub fn print_card(loan: &Loan, card: &DailyCollectionCard) {
    println!("=== {} ({}) ===", loan.loan_number, borrower_name(loan));
    println!(
        "  {:<26} {} / {}",
        "Boxes filled", card.filled_boxes, card.total_boxes
    );
    println!(
        "  {:<26} {}%, {} to go",
        "Progress",
        card.progress_percent().round_dp(0),
        card.remaining_boxes()
    );
    println!("  {:<26} {}", "Expected by today", card.expected_boxes);
    println!("  {:<26} {}", "Daily amount", format_inr(card.daily_amount));
    println!("  {:<26} {}", "Started", format_date(loan.disbursement_date));
    if card.is_complete() {
        println!("  {:<26} every box filled", "COMPLETE");
    } else if card.is_late_today {
        println!("  {:<26} {} box(es) behind", "LATE", card.missed_boxes());
    }
    if card.days_overdue > 0 {
        println!(
            "  {:<26} {} day(s), {} penalty month(s)",
            "Past term", card.days_overdue, card.penalty_months
        );
    }
    println!("{}", card_grid(card));
    println!();
}

pub fn print_daily_board(board: &DailyBoard) {
    let s = board.summary();
    println!("=== Daily collections ===");
    println!(
        "  {} active, {} late today, {} with penalties, {} pending",
        s.active_cards, s.late_today, s.with_penalties, s.pending
    );
    println!();

    for (loan, card) in board.cards() {
        let flag = if card.is_late_today { "LATE" } else { "" };
        println!(
            "  {:<12} {:<24} {:>3}/{:<3} {:>10} {}",
            loan.loan_number,
            borrower_name(loan),
            card.filled_boxes,
            card.total_boxes,
            format_inr(card.daily_amount),
            flag
        );
    }
    let pending: Vec<&Loan> = board.pending().collect();
    if !pending.is_empty() {
        println!();
        println!("Pending disbursement");
        for loan in pending {
            println!(
                "  {:<12} {:<24} {}",
                loan.loan_number,
                borrower_name(loan),
                format_inr(loan.principal_amount)
            );
        }
    }
    let done: Vec<&Loan> = board.closed_or_defaulted().collect();
    if !done.is_empty() {
        println!();
        println!("Closed / defaulted");
        for loan in done {
            println!(
                "  {:<12} {:<24} {}",
                loan.loan_number,
                borrower_name(loan),
                loan.status
            );
        }
    }
}

pub fn print_monthly_board(board: &MonthlyBoard) {
    let s = board.summary();
    println!("=== Monthly loans ===");
    println!(
        "  {} active ({} outstanding), {} with interest due, {} pending",
        s.active,
        format_inr(s.active_outstanding_principal),
        s.interest_due,
        s.pending
    );
    println!();
    for loan in board.loans() {
        println!(
            "  {:<12} {:<24} {:<10} principal {:>12}  interest/mo {:>10}",
            loan.loan_number,
            borrower_name(loan),
            loan.status,
            format_inr(loan.outstanding_principal),
            format_inr(loan.monthly_interest())
        );
    }
}

pub fn print_loan_detail(detail: &LoanDetail) {
    let loan = &detail.loan;
    println!("=== {} ===", loan.loan_number);
    println!("  {:<26} {}", "Status", loan.status);
    if let Some(t) = &loan.loan_type {
        println!("  {:<26} {}", "Type", t.name);
    }
    println!("  {:<26} {}", "Principal", format_inr(loan.principal_amount));
    println!("  {:<26} {}%", "Interest rate", loan.interest_rate);
    println!("  {:<26} {}", "Disbursed", format_date(loan.disbursement_date));
    println!("  {:<26} {}", "Matures", format_date(loan.maturity_date));
    println!("  {:<26} {}", "Total paid", format_inr(loan.total_paid()));
    println!(
        "  {:<26} {}",
        "Outstanding principal",
        format_inr(loan.outstanding_principal)
    );
    if loan.days_past_due > 0 {
        println!("  {:<26} {}", "Days past due", loan.days_past_due);
    }
    println!();

    if let Some(b) = &detail.borrower {
        println!("Borrower");
        println!("  {:<26} {}", b.full_name, b.phone);
        for g in &detail.guarantors {
            println!("  guarantor {:<16} {} ({})", g.full_name, g.phone, g.relationship);
        }
        println!();
    }

    if let Some(card) = &detail.card {
        print_card(loan, card);
    }

    if !detail.collateral.is_empty() {
        println!("Collateral");
        for c in &detail.collateral {
            println!(
                "  {:<16} {:<30} {}",
                c.item_type,
                c.description,
                format_inr(c.estimated_value)
            );
        }
        println!();
    }

    println!("Transactions");
    if detail.transactions.is_empty() {
        println!("  (none)");
    }
    for tx in &detail.transactions {
        println!(
            "  {:<12} {:<14} {}",
            format_date(tx.payment_date),
            format!("{:?}", tx.kind),
            format_inr(tx.amount)
        );
    }
}

pub fn print_defaulters(rows: &[DefaulterInfo], summary: &DefaulterSummary) {
    println!("=== Defaulters ===");
    println!(
        "  {} loans, {} outstanding, {} days overdue on average",
        summary.count,
        format_inr(summary.total_outstanding),
        summary.average_days_overdue
    );
    println!();
    for d in rows {
        let name = d.borrower_name.as_deref();
        println!(
            "  [{:<2}] {:<24} {:<12} {:>5}d  {:>12}  {} penalty mo  {}",
            initials(name),
            name.unwrap_or("Unknown"),
            d.loan.loan_number,
            d.days_overdue,
            format_inr(d.outstanding_total),
            d.penalty_months,
            d.borrower_phone.as_deref().unwrap_or("-")
        );
    }
}

pub fn print_borrowers(borrowers: &[Borrower]) {
    println!("=== Borrowers ({}) ===", borrowers.len());
    for b in borrowers {
        let flag = if b.is_blacklisted { "BLACKLISTED" } else { "" };
        println!("  {:<24} {:<14} {:<16} {}", b.full_name, b.phone, b.city, flag);
    }
}

pub fn print_borrower_detail(detail: &BorrowerDetail) {
    let b = &detail.borrower;
    println!("=== {} ===", b.full_name);
    println!("  {:<26} {}", "Phone", b.phone);
    if let Some(alt) = &b.alt_phone {
        println!("  {:<26} {}", "Alternate phone", alt);
    }
    println!("  {:<26} {}, {}", "Address", b.address, b.city);
    if let Some(job) = &b.occupation {
        println!("  {:<26} {}", "Occupation", job);
    }
    if b.is_blacklisted {
        println!(
            "  {:<26} {}",
            "BLACKLISTED",
            b.blacklist_reason.as_deref().unwrap_or("")
        );
    }
    println!();

    let s = &detail.stats;
    println!("Loans");
    println!(
        "  {} total, {} active, {} closed; borrowed {}, repaid {}",
        s.total_loans,
        s.active_loans,
        s.closed_loans,
        format_inr(s.total_borrowed),
        format_inr(s.total_repaid)
    );
    for loan in &detail.loans {
        println!(
            "  {:<12} {:<10} {}",
            loan.loan_number,
            loan.status,
            format_inr(loan.principal_amount)
        );
    }
}

pub fn print_health(health: &HealthStatus) {
    println!("  {:<26} {}", "Status", health.status);
    println!("  {:<26} {}", "Timestamp", health.timestamp);
    println!("  {:<26} {}s", "Uptime", health.uptime.trunc());
}
