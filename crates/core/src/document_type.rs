//! Kinds of commercial documents in the sales workflow.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Quotation,
    SalesOrder,
    PurchaseOrder,
    Invoice,
    Delivery,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Quotation,
        DocumentType::SalesOrder,
        DocumentType::PurchaseOrder,
        DocumentType::Invoice,
        DocumentType::Delivery,
    ];

    /// Prefix of human-readable document numbers (`PREFIX-YYYYMMDD-NNNN`).
    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentType::Quotation => "QUO",
            DocumentType::SalesOrder => "SO",
            DocumentType::PurchaseOrder => "PO",
            DocumentType::Invoice => "INV",
            DocumentType::Delivery => "DEL",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Quotation => "quotation",
            DocumentType::SalesOrder => "sales_order",
            DocumentType::PurchaseOrder => "purchase_order",
            DocumentType::Invoice => "invoice",
            DocumentType::Delivery => "delivery",
        }
    }
}

impl core::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            DocumentType::Quotation => "quotation",
            DocumentType::SalesOrder => "sales order",
            DocumentType::PurchaseOrder => "purchase order",
            DocumentType::Invoice => "invoice",
            DocumentType::Delivery => "delivery",
        };
        f.write_str(label)
    }
}

impl FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown document type: {s}")))
    }
}
