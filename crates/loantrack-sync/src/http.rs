//! HTTP client for the LoanTrack REST backend.
//!
//! Every endpoint answers with the same envelope:
//! `{"success": true, "data": ..., "pagination": ...}` on success and
//! `{"success": false, "error": {"code", "message", "details"}}` on failure.
//! Non-2xx responses and `success: false` bodies both surface as
//! [`ApiError::Server`].
//!
//! Nothing here retries. In particular the collection endpoints are not
//! idempotent on the backend, so a failed payment is reported back to the
//! caller and never resubmitted.

use chrono::NaiveDate;
use loantrack_core::{
    Borrower, BorrowerStats, CardError, Collateral, DueCollection, Guarantor, HealthStatus, Loan,
    LoanStatus, PenaltyCalculation, PortfolioSummary, Transaction, derive_card,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} {code}: {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
        details: Vec<ErrorDetail>,
    },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response from {path} carried no data")]
    MissingData { path: String },
    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),
    #[error("loan {loan_number} has no daily collection card")]
    NotDailyCard { loan_number: String },
    #[error("every box on loan {loan_number}'s card is already filled")]
    CardComplete { loan_number: String },
    #[error(transparent)]
    Card(#[from] CardError),
    /// The payment was recorded but the follow-up read of the loan failed.
    /// The payment must not be resubmitted.
    #[error("payment {transaction_id} recorded, but refreshing the loan failed: {source}")]
    RefreshAfterPayment {
        transaction_id: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Backend error code, when the backend supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub field: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// One page of a list endpoint.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: Option<bool>,
    data: Option<T>,
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<Vec<ErrorDetail>>,
}

// ── Query parameters ──

/// Filters for `GET /loans`.
#[derive(Debug, Clone, Default)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<String>,
    pub loan_type_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl LoanQuery {
    pub fn with_status(status: Option<LoanStatus>) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn for_borrower(borrower_id: &str) -> Self {
        Self {
            borrower_id: Some(borrower_id.to_string()),
            ..Self::default()
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(id) = &self.borrower_id {
            pairs.push(("borrowerId", id.clone()));
        }
        if let Some(id) = &self.loan_type_id {
            pairs.push(("loanTypeId", id.clone()));
        }
        push_paging(&mut pairs, self.page, self.limit);
        pairs
    }
}

/// Filters for `GET /borrowers`.
#[derive(Debug, Clone, Default)]
pub struct BorrowerQuery {
    pub search: Option<String>,
    pub is_blacklisted: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BorrowerQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(flag) = self.is_blacklisted {
            pairs.push(("isBlacklisted", flag.to_string()));
        }
        push_paging(&mut pairs, self.page, self.limit);
        pairs
    }
}

fn push_paging(pairs: &mut Vec<(&'static str, String)>, page: Option<u32>, limit: Option<u32>) {
    if let Some(page) = page {
        pairs.push(("page", page.to_string()));
    }
    if let Some(limit) = limit {
        pairs.push(("limit", limit.to_string()));
    }
}

// ── Request bodies ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectDailyPaymentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_number: Option<u32>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body for interest, principal and penalty collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectAmountRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CollectAmountRequest {
    pub fn amount(amount: Decimal) -> Self {
        Self {
            amount,
            payment_date: None,
            schedule_id: None,
            notes: None,
        }
    }
}

#[derive(Serialize)]
struct StatusUpdate {
    status: LoanStatus,
}

fn ensure_positive(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::InvalidAmount(amount));
    }
    Ok(())
}

fn server_error(status: u16, body: &str) -> ApiError {
    let error = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error);
    let (code, message, details) = match error {
        Some(e) => (e.code, e.message, e.details.unwrap_or_default()),
        None => (None, None, Vec::new()),
    };
    ApiError::Server {
        status,
        code: code.unwrap_or_else(|| "UNKNOWN_ERROR".to_string()),
        message: message.unwrap_or_else(|| "An unknown error occurred".to_string()),
        details,
    }
}

/// Typed client for the LoanTrack backend.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the given API root.
    ///
    /// `base_url` should include the version prefix, like
    /// `http://localhost:3000/api/v1`. A trailing slash is ignored.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Envelope<T>, ApiError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            // The error body is best effort; a missing one maps to UNKNOWN_ERROR.
            let body = resp.text().await.unwrap_or_default();
            debug!(path, status = status.as_u16(), "request failed");
            return Err(server_error(status.as_u16(), &body));
        }

        let body = resp.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if envelope.success == Some(false) {
            return Err(server_error(status.as_u16(), &body));
        }
        Ok(envelope)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path);
        info!(url = %url, "GET");
        self.send(self.client.get(&url).query(query), path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path);
        info!(url = %url, "POST");
        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, path).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path);
        info!(url = %url, "PUT");
        self.send(self.client.put(&url).json(body), path).await
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let envelope = self.get(path, query).await?;
        envelope.data.ok_or_else(|| ApiError::MissingData {
            path: path.to_string(),
        })
    }

    async fn post_data<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let envelope = self.post(path, body).await?;
        envelope.data.ok_or_else(|| ApiError::MissingData {
            path: path.to_string(),
        })
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Page<T>, ApiError> {
        let envelope: Envelope<Vec<T>> = self.get(path, query).await?;
        let items = envelope.data.unwrap_or_default();
        info!(path, count = items.len(), "fetched page");
        Ok(Page {
            items,
            pagination: envelope.pagination,
        })
    }

    // ── Loans ──

    pub async fn list_loans(&self, query: &LoanQuery) -> Result<Page<Loan>, ApiError> {
        self.get_page("/loans", &query.pairs()).await
    }

    pub async fn get_loan(&self, id: &str) -> Result<Loan, ApiError> {
        self.get_data(&format!("/loans/{id}"), &[]).await
    }

    pub async fn get_loan_by_number(&self, loan_number: &str) -> Result<Loan, ApiError> {
        self.get_data(&format!("/loans/by-number/{loan_number}"), &[])
            .await
    }

    pub async fn loan_transactions(&self, id: &str) -> Result<Vec<Transaction>, ApiError> {
        self.get_data(&format!("/loans/{id}/transactions"), &[])
            .await
    }

    /// Move a PENDING loan to ACTIVE, starting its term clock.
    pub async fn disburse_loan(&self, id: &str) -> Result<Loan, ApiError> {
        let loan: Loan = self
            .post_data::<Loan, ()>(&format!("/loans/{id}/disburse"), None)
            .await?;
        info!(loan = %loan.loan_number, status = %loan.status, "loan disbursed");
        Ok(loan)
    }

    pub async fn update_loan_status(&self, id: &str, status: LoanStatus) -> Result<Loan, ApiError> {
        let path = format!("/loans/{id}/status");
        let envelope = self.put(&path, &StatusUpdate { status }).await?;
        envelope.data.ok_or(ApiError::MissingData { path })
    }

    pub async fn collect_daily_payment(
        &self,
        id: &str,
        request: &CollectDailyPaymentRequest,
    ) -> Result<Transaction, ApiError> {
        ensure_positive(request.amount)?;
        self.post_data(&format!("/loans/{id}/collect-daily"), Some(request))
            .await
    }

    pub async fn collect_interest(
        &self,
        id: &str,
        request: &CollectAmountRequest,
    ) -> Result<Transaction, ApiError> {
        ensure_positive(request.amount)?;
        self.post_data(&format!("/loans/{id}/collect-interest"), Some(request))
            .await
    }

    pub async fn collect_principal(
        &self,
        id: &str,
        request: &CollectAmountRequest,
    ) -> Result<Transaction, ApiError> {
        ensure_positive(request.amount)?;
        self.post_data(&format!("/loans/{id}/collect-principal"), Some(request))
            .await
    }

    pub async fn collect_penalty(
        &self,
        id: &str,
        request: &CollectAmountRequest,
    ) -> Result<Transaction, ApiError> {
        ensure_positive(request.amount)?;
        self.post_data(&format!("/loans/{id}/collect-penalty"), Some(request))
            .await
    }

    pub async fn calculate_penalty(&self, id: &str) -> Result<PenaltyCalculation, ApiError> {
        self.post_data::<_, ()>(&format!("/loans/{id}/calculate-penalty"), None)
            .await
    }

    /// Record one daily installment and return the refreshed loan.
    ///
    /// Rejects non-positive amounts before touching the network. The
    /// payment is posted exactly once; if the follow-up read fails the
    /// error says so, so the caller knows not to resubmit.
    pub async fn submit_daily_payment(
        &self,
        loan_id: &str,
        amount: Decimal,
        method: PaymentMethod,
        day_number: Option<u32>,
    ) -> Result<Loan, ApiError> {
        ensure_positive(amount)?;
        let request = CollectDailyPaymentRequest {
            day_number,
            amount,
            payment_method: method,
            payment_date: None,
            notes: None,
        };
        let tx = self.collect_daily_payment(loan_id, &request).await?;
        info!(loan_id, transaction = %tx.id, amount = %amount, "daily payment recorded");

        self.get_loan(loan_id)
            .await
            .map_err(|e| ApiError::RefreshAfterPayment {
                transaction_id: tx.id.clone(),
                source: Box::new(e),
            })
    }

    /// Record one installment against the next unfilled day of the card.
    ///
    /// The day number is derived from the loan as it stands now, so the
    /// loan is read before anything is posted. A full card is refused
    /// without posting.
    pub async fn collect_next_day(
        &self,
        loan_id: &str,
        amount: Decimal,
        method: PaymentMethod,
        today: NaiveDate,
    ) -> Result<Loan, ApiError> {
        ensure_positive(amount)?;
        let loan = self.get_loan(loan_id).await?;
        if !loan.has_daily_card() {
            return Err(ApiError::NotDailyCard {
                loan_number: loan.loan_number,
            });
        }
        let card = derive_card(&loan, today)?;
        let day = card.next_box().ok_or_else(|| ApiError::CardComplete {
            loan_number: loan.loan_number.clone(),
        })?;
        debug!(loan_id, day, filled = card.filled_boxes, "collecting next day");
        self.submit_daily_payment(loan_id, amount, method, Some(day))
            .await
    }

    // ── Borrowers ──

    pub async fn list_borrowers(&self, query: &BorrowerQuery) -> Result<Page<Borrower>, ApiError> {
        self.get_page("/borrowers", &query.pairs()).await
    }

    pub async fn search_borrowers(&self, phone: &str) -> Result<Vec<Borrower>, ApiError> {
        self.get_data("/borrowers/search", &[("phone", phone.to_string())])
            .await
    }

    pub async fn get_borrower(&self, id: &str) -> Result<Borrower, ApiError> {
        self.get_data(&format!("/borrowers/{id}"), &[]).await
    }

    pub async fn borrower_stats(&self, id: &str) -> Result<BorrowerStats, ApiError> {
        self.get_data(&format!("/borrowers/{id}/stats"), &[]).await
    }

    pub async fn guarantors_for(&self, borrower_id: &str) -> Result<Vec<Guarantor>, ApiError> {
        self.get_data("/guarantors", &[("borrowerId", borrower_id.to_string())])
            .await
    }

    pub async fn collateral_for_loan(&self, loan_id: &str) -> Result<Vec<Collateral>, ApiError> {
        self.get_data(&format!("/collateral/loan/{loan_id}"), &[])
            .await
    }

    // ── Reports ──

    pub async fn portfolio_summary(&self) -> Result<Vec<PortfolioSummary>, ApiError> {
        self.get_data("/reports/portfolio-summary", &[]).await
    }

    /// Collections due on `date` (the backend's today when `None`).
    pub async fn daily_collection(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DueCollection>, ApiError> {
        let query: Vec<_> = date.map(|d| ("date", d.to_string())).into_iter().collect();
        self.get_data("/reports/daily-collection", &query).await
    }

    pub async fn overdue_loans(
        &self,
        days_overdue: Option<u32>,
    ) -> Result<Vec<DueCollection>, ApiError> {
        let query: Vec<_> = days_overdue
            .map(|d| ("daysOverdue", d.to_string()))
            .into_iter()
            .collect();
        self.get_data("/reports/overdue", &query).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_data("/health", &[]).await
    }
}
