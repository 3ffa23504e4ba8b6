//! Raw filing wire types.
//!
//! Every field is optional: validation happens in the normalizer so that a
//! malformed entry can be reported with its context instead of failing
//! deserialization of the whole page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of filings as returned by the filing service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingPage {
    #[serde(default)]
    pub transactions: Option<Vec<RawFiling>>,
}

impl FilingPage {
    /// Parse a page from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Filings in page order.
    pub fn into_filings(self) -> Vec<RawFiling> {
        self.transactions.unwrap_or_default()
    }
}

/// One ownership-change filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFiling {
    #[serde(default)]
    pub accession_no: Option<String>,
    #[serde(default)]
    pub filed_at: Option<String>,
    #[serde(default)]
    pub period_of_report: Option<String>,
    #[serde(default)]
    pub reporting_owner: Option<RawOwner>,
    #[serde(default)]
    pub non_derivative_table: Option<RawTable>,
    #[serde(default)]
    pub derivative_table: Option<RawTable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOwner {
    #[serde(default)]
    pub name: Option<String>,
}

/// Direct or derivative table. `holdings` is not modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub transactions: Option<Vec<RawTransaction>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub security_title: Option<String>,
    #[serde(default)]
    pub ownership_nature: Option<RawOwnershipNature>,
    #[serde(default)]
    pub post_transaction_amounts: Option<RawPostAmounts>,
    #[serde(default)]
    pub underlying_security: Option<RawUnderlying>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOwnershipNature {
    /// `"D"` for direct, anything else for indirect.
    #[serde(default)]
    pub direct_or_indirect_ownership: Option<String>,
    #[serde(default)]
    pub nature_of_ownership: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPostAmounts {
    /// Number or numeric string.
    #[serde(default)]
    pub shares_owned_following_transaction: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUnderlying {
    #[serde(default)]
    pub title: Option<String>,
}
