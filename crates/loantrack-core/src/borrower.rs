//! Borrower and guarantor records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coerce;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrower {
    #[serde(default, deserialize_with = "coerce::string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub alt_phone: Option<String>,
    #[serde(default, deserialize_with = "coerce::string")]
    pub address: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub city: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub id_document_type: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub id_document_number: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_decimal")]
    pub monthly_income: Option<Decimal>,
    #[serde(default, deserialize_with = "coerce::flag")]
    pub is_blacklisted: bool,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub blacklist_reason: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub notes: Option<String>,
}

/// Per-borrower loan totals computed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerStats {
    #[serde(default, deserialize_with = "coerce::count")]
    pub total_loans: i64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub active_loans: i64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub closed_loans: i64,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub total_borrowed: Decimal,
    #[serde(default, deserialize_with = "coerce::decimal")]
    pub total_repaid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guarantor {
    #[serde(default, deserialize_with = "coerce::string")]
    pub id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub borrower_id: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "coerce::string")]
    pub relationship: String,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_string")]
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_decimal")]
    pub monthly_income: Option<Decimal>,
}

impl Borrower {
    /// Case-insensitive match on name or city, substring match on phone.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        q.is_empty()
            || self.full_name.to_lowercase().contains(&q)
            || self.city.to_lowercase().contains(&q)
            || self.phone.contains(query.trim())
    }
}
