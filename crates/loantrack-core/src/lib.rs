pub mod board;
pub mod borrower;
pub mod card;
pub mod coerce;
pub mod defaulter;
pub mod error;
pub mod loan;
pub mod report;

pub use board::{DailyBoard, DailyBoardSummary, MonthlyBoard, MonthlyBoardSummary};
pub use borrower::{Borrower, BorrowerStats, Guarantor};
pub use card::{BoxState, DailyCollectionCard, derive_card, penalty_months_for};
pub use defaulter::{Contact, DefaulterInfo, DefaulterSummary, initials};
pub use error::CardError;
pub use loan::{
    BorrowerRef, Collateral, CollateralStatus, Loan, LoanStatus, LoanType, PenaltyCalculation,
    Transaction, TransactionType,
};
pub use report::{DashboardMetrics, DueCollection, HealthStatus, PortfolioSummary};
