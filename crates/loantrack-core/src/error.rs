use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    /// The loan has no positive `termDays`, so it has no daily card.
    /// Callers are expected to filter these out before deriving.
    #[error("loan {loan_number} has no daily term (termDays = {term_days:?})")]
    InvalidLoanShape {
        loan_number: String,
        term_days: Option<i64>,
    },
}
