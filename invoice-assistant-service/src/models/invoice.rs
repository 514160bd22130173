//! Invoice shapes the model is asked to produce.
//!
//! The conversation endpoint returns the model's text untouched; these types
//! are used to check that text at the boundary and to parse one-shot drafts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Invoice state accumulated over a conversation. Unknown fields are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub client_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl InvoiceDraft {
    /// Parse a model reply. The reply must be exactly one JSON object;
    /// surrounding whitespace is tolerated, surrounding prose is not.
    pub fn from_reply(reply: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(reply.trim())
    }
}

/// Result of a one-shot draft from a free-text description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickInvoice {
    pub client_name: Option<String>,
    #[serde(default)]
    pub line_items: Vec<QuickLineItem>,
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLineItem {
    pub description: String,
    pub quantity: f64,
    pub price: f64,
}

impl QuickInvoice {
    pub fn from_reply(reply: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(reply.trim())
    }
}
