//! Client side of the LoanTrack REST backend: typed endpoints and page fetches.

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub mod views;

#[cfg(all(test, feature = "http"))]
mod mock;

#[cfg(feature = "http")]
pub use http::{ApiClient, ApiError, BorrowerQuery, LoanQuery, Page, PaymentMethod};
#[cfg(feature = "http")]
pub use views::ViewError;
