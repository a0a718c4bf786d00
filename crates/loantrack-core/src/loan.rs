//! Loan, transaction and collateral records as served by the LoanTrack backend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{self, coerce_date, coerce_decimal, coerce_opt_int, coerce_string};

/// Loan type code for the daily-collection ("Type B") product.
pub const DAILY_LOAN_TYPE_CODE: &str = "TYPE_B_DAILY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum LoanStatus {
    Pending,
    Active,
    Closed,
    Defaulted,
    Unknown,
}

impl LoanStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "ACTIVE" => Self::Active,
            "CLOSED" => Self::Closed,
            "DEFAULTED" => Self::Defaulted,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
            Self::Defaulted => "DEFAULTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanType {
    #[serde(default, deserialize_with = "coerce::string")]
    pub code: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub name: String,
}

/// Borrower summary embedded in some loan responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerRef {
    #[serde(default, deserialize_with = "coerce::string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub phone: Option<String>,
}

/// A loan record.
///
/// Monetary fields are always finite decimals: whatever the backend sent
/// (number, decimal string, null, garbage) was coerced on the way in.
/// Deserialisation goes through [`LoanWire`], which also coalesces the
/// field names that differ between endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LoanWire")]
pub struct Loan {
    pub id: String,
    pub loan_number: String,
    pub borrower_id: Option<String>,
    pub loan_type: Option<LoanType>,
    pub borrower: Option<BorrowerRef>,
    pub status: LoanStatus,
    pub principal_amount: Decimal,
    pub interest_rate: Decimal,
    pub term_months: Option<i64>,
    pub term_days: Option<i64>,
    pub daily_installment_amount: Decimal,
    pub total_expected_repayment: Decimal,
    pub total_expected_interest: Decimal,
    /// Start of the term clock. `None` until the loan is disbursed.
    pub disbursement_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub total_principal_paid: Decimal,
    pub total_interest_paid: Decimal,
    pub total_penalty_paid: Decimal,
    pub outstanding_principal: Decimal,
    pub outstanding_interest: Decimal,
    pub current_principal: Decimal,
    pub total_interest_accrued: Decimal,
    pub days_past_due: i64,
}

impl Loan {
    /// Daily-card loans carry a positive day term that fits a card.
    pub fn is_daily(&self) -> bool {
        self.term_days
            .is_some_and(|d| d > 0 && u32::try_from(d).is_ok())
    }

    pub fn is_monthly(&self) -> bool {
        self.term_months.is_some_and(|m| m > 0)
    }

    /// Whether the loan's product type is the daily-collection product,
    /// regardless of whether its term is populated.
    pub fn is_daily_product(&self) -> bool {
        self.loan_type
            .as_ref()
            .is_some_and(|t| t.code == DAILY_LOAN_TYPE_CODE)
    }

    /// Whether a collection card should be drawn for this loan: it has a
    /// day term, and its product type (when the backend sent one) is the
    /// daily product.
    pub fn has_daily_card(&self) -> bool {
        self.is_daily() && (self.loan_type.is_none() || self.is_daily_product())
    }

    /// Cumulative principal and interest collected so far, clamped at
    /// [`Decimal::MAX`].
    pub fn total_paid(&self) -> Decimal {
        self.total_principal_paid
            .saturating_add(self.total_interest_paid)
    }

    /// Flat monthly interest for a Type A loan: `principal × rate / 100`.
    pub fn monthly_interest(&self) -> Decimal {
        self.principal_amount.saturating_mul(self.interest_rate) / Decimal::ONE_HUNDRED
    }

    pub fn is_interest_due(&self) -> bool {
        self.outstanding_interest > Decimal::ZERO
    }

    /// Borrower id from the flat field, or from the embedded borrower.
    pub fn borrower_id(&self) -> Option<&str> {
        self.borrower_id
            .as_deref()
            .or_else(|| self.borrower.as_ref().map(|b| b.id.as_str()))
            .filter(|id| !id.is_empty())
    }
}

/// Raw loan as it appears on the wire. Every field is taken verbatim and
/// coerced in [`From<LoanWire> for Loan`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoanWire {
    id: Option<Value>,
    loan_number: Option<Value>,
    borrower_id: Option<Value>,
    loan_type: Option<Value>,
    borrower: Option<Value>,
    status: Option<Value>,
    principal_amount: Option<Value>,
    interest_rate: Option<Value>,
    term_months: Option<Value>,
    term_days: Option<Value>,
    daily_installment_amount: Option<Value>,
    daily_installment: Option<Value>,
    total_expected_repayment: Option<Value>,
    total_expected_amount: Option<Value>,
    total_expected_interest: Option<Value>,
    disbursement_date: Option<Value>,
    start_date: Option<Value>,
    maturity_date: Option<Value>,
    total_principal_paid: Option<Value>,
    total_interest_paid: Option<Value>,
    total_penalty_paid: Option<Value>,
    outstanding_principal: Option<Value>,
    outstanding_interest: Option<Value>,
    current_principal: Option<Value>,
    total_interest_accrued: Option<Value>,
    days_past_due: Option<Value>,
}

/// First positive amount among `candidates`, else zero.
fn first_positive(candidates: &[Option<&Value>]) -> Decimal {
    candidates
        .iter()
        .map(|v| coerce_decimal(*v))
        .find(|d| *d > Decimal::ZERO)
        .unwrap_or(Decimal::ZERO)
}

impl From<LoanWire> for Loan {
    fn from(w: LoanWire) -> Self {
        let outstanding_principal = coerce_decimal(w.outstanding_principal.as_ref());
        let current_principal = match w.current_principal.as_ref() {
            Some(v) if !v.is_null() => coerce_decimal(Some(v)),
            _ => outstanding_principal,
        };

        Self {
            id: coerce_string(w.id.as_ref()).unwrap_or_default(),
            loan_number: coerce_string(w.loan_number.as_ref()).unwrap_or_default(),
            borrower_id: coerce_string(w.borrower_id.as_ref()),
            loan_type: w.loan_type.and_then(|v| serde_json::from_value(v).ok()),
            borrower: w.borrower.and_then(|v| serde_json::from_value(v).ok()),
            status: coerce_string(w.status.as_ref())
                .map(|s| LoanStatus::parse(&s))
                .unwrap_or(LoanStatus::Unknown),
            principal_amount: coerce_decimal(w.principal_amount.as_ref()),
            interest_rate: coerce_decimal(w.interest_rate.as_ref()),
            term_months: coerce_opt_int(w.term_months.as_ref()),
            term_days: coerce_opt_int(w.term_days.as_ref()),
            daily_installment_amount: first_positive(&[
                w.daily_installment_amount.as_ref(),
                w.daily_installment.as_ref(),
            ]),
            total_expected_repayment: first_positive(&[
                w.total_expected_repayment.as_ref(),
                w.total_expected_amount.as_ref(),
            ]),
            total_expected_interest: coerce_decimal(w.total_expected_interest.as_ref()),
            disbursement_date: coerce_date(w.disbursement_date.as_ref())
                .or_else(|| coerce_date(w.start_date.as_ref())),
            maturity_date: coerce_date(w.maturity_date.as_ref()),
            total_principal_paid: coerce_decimal(w.total_principal_paid.as_ref()),
            total_interest_paid: coerce_decimal(w.total_interest_paid.as_ref()),
            total_penalty_paid: coerce_decimal(w.total_penalty_paid.as_ref()),
            outstanding_principal,
            outstanding_interest: coerce_decimal(w.outstanding_interest.as_ref()),
            current_principal,
            total_interest_accrued: coerce_decimal(w.total_interest_accrued.as_ref()),
            days_past_due: coerce::coerce_count(w.days_past_due.as_ref()),
        }
    }
}

// ── Transactions ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum TransactionType {
    Principal,
    Interest,
    Penalty,
    DailyPayment,
    #[default]
    Unknown,
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRINCIPAL" => Self::Principal,
            "INTEREST" => Self::Interest,
            "PENALTY" => Self::Penalty,
            "DAILY_PAYMENT" => Self::DailyPayment,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "coerce::string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub loan_id: String,
    #[serde(rename = "type", default, deserialize_with = "coerce::label")]
    pub kind: TransactionType,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "coerce::date")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub notes: Option<String>,
}

// ── Collateral ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum CollateralStatus {
    Held,
    Released,
    Forfeited,
    #[default]
    Unknown,
}

impl From<String> for CollateralStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "HELD" => Self::Held,
            "RELEASED" => Self::Released,
            "FORFEITED" => Self::Forfeited,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collateral {
    #[serde(default, deserialize_with = "coerce::string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub loan_id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub item_type: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub description: String,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub estimated_value: Decimal,
    #[serde(default, deserialize_with = "coerce::label")]
    pub status: CollateralStatus,
    #[serde(default, deserialize_with = "coerce::strings")]
    pub photo_urls: Vec<String>,
}

/// Backend penalty quote for an overdue loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyCalculation {
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub penalty_amount: Decimal,
    #[serde(default, deserialize_with = "coerce::count")]
    pub days_overdue: i64,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub penalty_rate: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_from_mixed_encodings() {
        let json = r#"{
            "id": "c1f0",
            "loanNumber": "LN-2026-0007",
            "borrowerId": "b-9",
            "status": "ACTIVE",
            "principalAmount": "10000.00",
            "interestRate": 2,
            "termDays": 100,
            "dailyInstallment": "120",
            "totalExpectedAmount": 12000,
            "startDate": "2026-09-01T00:00:00.000Z",
            "totalPrincipalPaid": "1800.00",
            "totalInterestPaid": null,
            "outstandingPrincipal": 8200
        }"#;
        let loan: Loan = serde_json::from_str(json).unwrap();
        assert_eq!(loan.loan_number, "LN-2026-0007");
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.principal_amount, Decimal::from(10000));
        assert_eq!(loan.term_days, Some(100));
        assert_eq!(loan.daily_installment_amount, Decimal::from(120));
        assert_eq!(loan.total_expected_repayment, Decimal::from(12000));
        assert_eq!(loan.disbursement_date, NaiveDate::from_ymd_opt(2026, 9, 1));
        assert_eq!(loan.total_interest_paid, Decimal::ZERO);
        assert_eq!(loan.total_paid(), Decimal::from(1800));
        // currentPrincipal absent: falls back to outstandingPrincipal.
        assert_eq!(loan.current_principal, Decimal::from(8200));
        assert!(loan.is_daily());
        assert!(!loan.is_monthly());
    }

    #[test]
    fn canonical_names_win_over_aliases() {
        let json = r#"{
            "dailyInstallmentAmount": 150,
            "dailyInstallment": 120,
            "totalExpectedRepayment": "15000",
            "totalExpectedAmount": "12000",
            "disbursementDate": "2026-09-05",
            "startDate": "2026-09-01"
        }"#;
        let loan: Loan = serde_json::from_str(json).unwrap();
        assert_eq!(loan.daily_installment_amount, Decimal::from(150));
        assert_eq!(loan.total_expected_repayment, Decimal::from(15000));
        assert_eq!(loan.disbursement_date, NaiveDate::from_ymd_opt(2026, 9, 5));
    }

    #[test]
    fn zero_canonical_falls_through_to_alias() {
        let loan: Loan =
            serde_json::from_str(r#"{"dailyInstallmentAmount": "0", "dailyInstallment": 75}"#)
                .unwrap();
        assert_eq!(loan.daily_installment_amount, Decimal::from(75));
    }

    #[test]
    fn empty_object_is_a_blank_loan() {
        let loan: Loan = serde_json::from_str("{}").unwrap();
        assert_eq!(loan.status, LoanStatus::Unknown);
        assert_eq!(loan.term_days, None);
        assert_eq!(loan.disbursement_date, None);
        assert!(!loan.is_daily());
        assert_eq!(loan.borrower_id(), None);
    }

    #[test]
    fn unknown_status_tolerated() {
        let loan: Loan = serde_json::from_str(r#"{"status": "WRITTEN_OFF"}"#).unwrap();
        assert_eq!(loan.status, LoanStatus::Unknown);
    }

    #[test]
    fn serialised_loan_reads_back() {
        let loan: Loan = serde_json::from_str(
            r#"{"id":"a","loanNumber":"LN-1","status":"DEFAULTED","principalAmount":5000,
                "termMonths":6,"maturityDate":"2026-01-31","currentPrincipal":"4100.50"}"#,
        )
        .unwrap();
        let json = serde_json::to_string(&loan).unwrap();
        let again: Loan = serde_json::from_str(&json).unwrap();
        assert_eq!(again, loan);
    }

    #[test]
    fn nested_borrower_and_type() {
        let loan: Loan = serde_json::from_str(
            r#"{"loanType":{"code":"TYPE_B_DAILY","name":"Daily"},
                "borrower":{"id":"b-1","fullName":"Asha Patel","phone":"9876543210"}}"#,
        )
        .unwrap();
        assert!(loan.is_daily_product());
        assert_eq!(loan.borrower_id(), Some("b-1"));
        assert_eq!(loan.borrower.unwrap().full_name, "Asha Patel");
    }

    #[test]
    fn monthly_interest_and_due() {
        let loan: Loan = serde_json::from_str(
            r#"{"principalAmount":"50000","interestRate":"3","termMonths":12,"outstandingInterest":"1500"}"#,
        )
        .unwrap();
        assert_eq!(loan.monthly_interest(), Decimal::from(1500));
        assert!(loan.is_interest_due());
        assert!(loan.is_monthly());
    }

    #[test]
    fn transaction_types() {
        let txs: Vec<Transaction> = serde_json::from_str(
            r#"[{"id":"t1","loanId":"l1","type":"DAILY_PAYMENT","amount":"120.00","paymentDate":"2026-10-01"},
                {"id":"t2","loanId":"l1","type":"REFUND","amount":5}]"#,
        )
        .unwrap();
        assert_eq!(txs[0].kind, TransactionType::DailyPayment);
        assert_eq!(txs[0].amount, Decimal::from(120));
        assert_eq!(txs[1].kind, TransactionType::Unknown);
        assert_eq!(txs[1].payment_date, None);
    }

    #[test]
    fn total_paid_saturates() {
        let loan: Loan = serde_json::from_str(
            r#"{"totalPrincipalPaid":"79228162514264337593543950335",
                "totalInterestPaid":"79228162514264337593543950335"}"#,
        )
        .unwrap();
        assert_eq!(loan.total_paid(), Decimal::MAX);

        let loan: Loan = serde_json::from_str(
            r#"{"principalAmount":"79228162514264337593543950335","interestRate":"50"}"#,
        )
        .unwrap();
        assert_eq!(loan.monthly_interest(), Decimal::MAX / Decimal::ONE_HUNDRED);
    }

    #[test]
    fn oversized_term_is_not_daily() {
        let loan: Loan = serde_json::from_str(r#"{"termDays":"9999999999"}"#).unwrap();
        assert_eq!(loan.term_days, Some(9_999_999_999));
        assert!(!loan.is_daily());
        assert!(!loan.has_daily_card());
    }

    #[test]
    fn daily_card_follows_product_type() {
        let bare: Loan = serde_json::from_str(r#"{"termDays":100}"#).unwrap();
        assert!(bare.has_daily_card());

        let daily: Loan = serde_json::from_str(
            r#"{"termDays":100,"loanType":{"code":"TYPE_B_DAILY","name":"Daily"}}"#,
        )
        .unwrap();
        assert!(daily.has_daily_card());

        let monthly: Loan = serde_json::from_str(
            r#"{"termDays":100,"loanType":{"code":"TYPE_A_MONTHLY","name":"Monthly"}}"#,
        )
        .unwrap();
        assert!(!monthly.has_daily_card());

        let no_term: Loan =
            serde_json::from_str(r#"{"loanType":{"code":"TYPE_B_DAILY","name":"Daily"}}"#)
                .unwrap();
        assert!(no_term.is_daily_product());
        assert!(!no_term.has_daily_card());
    }

    #[test]
    fn numeric_phone_keeps_embedded_borrower() {
        let loan: Loan = serde_json::from_str(
            r#"{"borrower":{"id":"b-1","fullName":"Asha Patel","phone":9876543210}}"#,
        )
        .unwrap();
        let borrower = loan.borrower.unwrap();
        assert_eq!(borrower.phone.as_deref(), Some("9876543210"));
    }

    #[test]
    fn null_labels_do_not_fail_lists() {
        let txs: Vec<Transaction> = serde_json::from_str(
            r#"[{"id":"t1","type":null,"notes":null},{"id":"t2","type":7,"notes":42}]"#,
        )
        .unwrap();
        assert_eq!(txs[0].kind, TransactionType::Unknown);
        assert_eq!(txs[0].notes, None);
        assert_eq!(txs[1].kind, TransactionType::Unknown);
        assert_eq!(txs[1].notes.as_deref(), Some("42"));

        let items: Vec<Collateral> = serde_json::from_str(
            r#"[{"id":"c","status":null,"photoUrls":null},
                {"id":"d","status":"released","photoUrls":["a.jpg",null]}]"#,
        )
        .unwrap();
        assert_eq!(items[0].status, CollateralStatus::Unknown);
        assert!(items[0].photo_urls.is_empty());
        assert_eq!(items[1].status, CollateralStatus::Released);
        assert_eq!(items[1].photo_urls, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn collateral_status() {
        let c: Collateral = serde_json::from_str(
            r#"{"id":"c","loanId":"l","itemType":"GOLD","description":"chain","estimatedValue":"32000","status":"HELD"}"#,
        )
        .unwrap();
        assert_eq!(c.status, CollateralStatus::Held);
        assert!(c.photo_urls.is_empty());
    }
}
