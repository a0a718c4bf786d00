//! Composite reads, one per page.
//!
//! Each fetch fans its independent requests out concurrently and owns
//! everything it returns; nothing is shared between fetches.

use chrono::NaiveDate;
use futures::future::join_all;
use loantrack_core::report::DASHBOARD_COLLECTIONS;
use loantrack_core::{
    Borrower, BorrowerStats, CardError, Collateral, Contact, DailyBoard, DailyCollectionCard,
    DashboardMetrics, DefaulterInfo, DueCollection, Guarantor, Loan, LoanStatus, MonthlyBoard,
    PortfolioSummary, Transaction, derive_card,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::http::{ApiClient, ApiError, LoanQuery};

#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Card(#[from] CardError),
}

// ── Dashboard ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub portfolio: Vec<PortfolioSummary>,
    /// First few collections due today.
    pub today_collections: Vec<DueCollection>,
}

pub async fn dashboard(client: &ApiClient) -> Result<Dashboard, ViewError> {
    let (portfolio, mut today_collections, overdue) = tokio::try_join!(
        client.portfolio_summary(),
        client.daily_collection(None),
        client.overdue_loans(None),
    )?;
    let metrics = DashboardMetrics::compute(&portfolio, &today_collections, &overdue);
    today_collections.truncate(DASHBOARD_COLLECTIONS);
    Ok(Dashboard {
        metrics,
        portfolio,
        today_collections,
    })
}

// ── Loan boards ──

pub async fn daily_board(
    client: &ApiClient,
    status: Option<LoanStatus>,
    today: NaiveDate,
) -> Result<DailyBoard, ViewError> {
    let page = client.list_loans(&LoanQuery::with_status(status)).await?;
    Ok(DailyBoard::build(page.items, today)?)
}

pub async fn monthly_board(
    client: &ApiClient,
    status: Option<LoanStatus>,
) -> Result<MonthlyBoard, ViewError> {
    let page = client.list_loans(&LoanQuery::with_status(status)).await?;
    Ok(MonthlyBoard::build(page.items))
}

// ── Defaulters ──

/// Defaulted loans with borrower contact details filled in.
///
/// Loans that do not embed their borrower are looked up concurrently. A
/// failed lookup leaves the contact unknown rather than failing the page.
pub async fn defaulters(
    client: &ApiClient,
    today: NaiveDate,
) -> Result<Vec<DefaulterInfo>, ViewError> {
    let page = client
        .list_loans(&LoanQuery::with_status(Some(LoanStatus::Defaulted)))
        .await?;

    let rows = join_all(page.items.into_iter().map(|loan| async move {
        let contact = match Contact::from_loan(&loan) {
            Some(contact) => contact,
            None => lookup_contact(client, &loan).await,
        };
        DefaulterInfo::from_loan(loan, contact, today)
    }))
    .await;

    info!(count = rows.len(), "loaded defaulters");
    Ok(rows)
}

async fn lookup_contact(client: &ApiClient, loan: &Loan) -> Contact {
    let Some(borrower_id) = loan.borrower_id() else {
        return Contact::default();
    };
    match client.get_borrower(borrower_id).await {
        Ok(borrower) => Contact::from(&borrower),
        Err(e) => {
            warn!(loan = %loan.loan_number, borrower_id, error = %e, "borrower lookup failed");
            Contact::default()
        }
    }
}

// ── Loan detail ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetail {
    pub loan: Loan,
    pub transactions: Vec<Transaction>,
    pub collateral: Vec<Collateral>,
    pub borrower: Option<Borrower>,
    pub guarantors: Vec<Guarantor>,
    /// Present for daily-card loans.
    pub card: Option<DailyCollectionCard>,
}

pub async fn loan_detail(
    client: &ApiClient,
    id: &str,
    today: NaiveDate,
) -> Result<LoanDetail, ViewError> {
    let (loan, transactions, collateral) = tokio::try_join!(
        client.get_loan(id),
        client.loan_transactions(id),
        client.collateral_for_loan(id),
    )?;

    let (borrower, guarantors) = match loan.borrower_id() {
        Some(borrower_id) => {
            let (b, g) = tokio::try_join!(
                client.get_borrower(borrower_id),
                client.guarantors_for(borrower_id),
            )?;
            (Some(b), g)
        }
        None => (None, Vec::new()),
    };

    let card = if loan.has_daily_card() {
        Some(derive_card(&loan, today)?)
    } else {
        if loan.is_daily_product() {
            warn!(loan = %loan.loan_number, "daily loan has no day term; no card shown");
        }
        None
    };

    Ok(LoanDetail {
        loan,
        transactions,
        collateral,
        borrower,
        guarantors,
        card,
    })
}

// ── Borrower detail ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerDetail {
    pub borrower: Borrower,
    pub stats: BorrowerStats,
    pub loans: Vec<Loan>,
}

pub async fn borrower_detail(client: &ApiClient, id: &str) -> Result<BorrowerDetail, ViewError> {
    let query = LoanQuery::for_borrower(id);
    let (borrower, stats, page) = tokio::try_join!(
        client.get_borrower(id),
        client.borrower_stats(id),
        client.list_loans(&query),
    )?;
    Ok(BorrowerDetail {
        borrower,
        stats,
        loans: page.items,
    })
}
