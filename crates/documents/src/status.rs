//! Per-document status state machines.
//!
//! Each status enum declares its outgoing edges in `allowed_next`. Staying in
//! the same status is always legal (a no-op); terminal statuses have no edges.

use core::fmt::{Debug, Display};
use core::hash::Hash;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tradeflow_core::{DocumentType, DomainError, DomainResult};

pub trait DocumentStatus:
    Copy + Eq + Hash + Debug + Display + FromStr<Err = DomainError> + Send + Sync + 'static
{
    const DOCUMENT_TYPE: DocumentType;
    const ALL: &'static [Self];
    const INITIAL: Self;

    fn as_str(self) -> &'static str;

    fn allowed_next(self) -> &'static [Self];

    /// Label for a transition reason appended to the notes, if this status records one.
    fn reason_label(self) -> Option<&'static str> {
        None
    }

    /// Items may only be added, changed or removed in the initial status.
    fn is_editable(self) -> bool {
        self == Self::INITIAL
    }

    fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    fn can_transition_to(self, next: Self) -> bool {
        self == next || self.allowed_next().contains(&next)
    }

    fn ensure_transition(self, next: Self) -> DomainResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::StateTransition {
                document_type: Self::DOCUMENT_TYPE,
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|st| st.as_str() == s)
    }
}

/// Move `status` to `to`, appending `reason` to `notes` for cancel/reject edges.
///
/// Returns `false` for a same-status no-op. Nothing is modified on error.
pub fn apply_transition<S: DocumentStatus>(
    status: &mut S,
    to: S,
    reason: Option<&str>,
    notes: &mut String,
) -> DomainResult<bool> {
    status.ensure_transition(to)?;
    if *status == to {
        return Ok(false);
    }

    if let (Some(label), Some(reason)) = (to.reason_label(), reason) {
        let reason = reason.trim();
        if !reason.is_empty() {
            if !notes.is_empty() {
                notes.push('\n');
            }
            notes.push_str(label);
            notes.push_str(": ");
            notes.push_str(reason);
        }
    }

    *status = to;
    Ok(true)
}

pub fn is_valid_transition<S: DocumentStatus>(from: S, to: S) -> bool {
    from.can_transition_to(to)
}

/// String form for collaborator input; unknown status names are never valid.
pub fn is_valid_transition_named(document_type: DocumentType, from: &str, to: &str) -> bool {
    fn check<S: DocumentStatus>(from: &str, to: &str) -> bool {
        match (S::parse(from), S::parse(to)) {
            (Some(from), Some(to)) => from.can_transition_to(to),
            _ => false,
        }
    }

    match document_type {
        DocumentType::Quotation => check::<QuotationStatus>(from, to),
        DocumentType::SalesOrder => check::<SalesOrderStatus>(from, to),
        DocumentType::PurchaseOrder => check::<PurchaseOrderStatus>(from, to),
        DocumentType::Invoice => check::<InvoiceStatus>(from, to),
        DocumentType::Delivery => check::<DeliveryStatus>(from, to),
    }
}

macro_rules! impl_status_text {
    ($t:ty) => {
        impl Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(DocumentStatus::as_str(*self))
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$t as DocumentStatus>::parse(s.trim()).ok_or_else(|| {
                    DomainError::validation(format!(
                        "unknown {} status: {}",
                        <$t as DocumentStatus>::DOCUMENT_TYPE,
                        s
                    ))
                })
            }
        }
    };
}

/// Quotation status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
    Cancelled,
}

impl DocumentStatus for QuotationStatus {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Quotation;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Sent,
        Self::Accepted,
        Self::Rejected,
        Self::Expired,
        Self::Cancelled,
    ];
    const INITIAL: Self = Self::Draft;

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Sent, Self::Cancelled],
            Self::Sent => &[Self::Accepted, Self::Rejected, Self::Expired, Self::Cancelled],
            Self::Expired | Self::Rejected | Self::Accepted => &[Self::Cancelled],
            Self::Cancelled => &[],
        }
    }

    fn reason_label(self) -> Option<&'static str> {
        match self {
            Self::Cancelled => Some("Cancellation reason"),
            Self::Rejected => Some("Rejection reason"),
            _ => None,
        }
    }
}

impl_status_text!(QuotationStatus);

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
    Processing,
    Completed,
    Cancelled,
}

impl SalesOrderStatus {
    pub fn allows_purchasing(self) -> bool {
        matches!(self, Self::Confirmed | Self::Processing)
    }

    pub fn allows_invoicing(self) -> bool {
        matches!(self, Self::Confirmed | Self::Processing | Self::Completed)
    }

    pub fn allows_delivery(self) -> bool {
        matches!(self, Self::Confirmed | Self::Processing)
    }
}

impl DocumentStatus for SalesOrderStatus {
    const DOCUMENT_TYPE: DocumentType = DocumentType::SalesOrder;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Confirmed,
        Self::Processing,
        Self::Completed,
        Self::Cancelled,
    ];
    const INITIAL: Self = Self::Draft;

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    fn reason_label(self) -> Option<&'static str> {
        (self == Self::Cancelled).then_some("Cancellation reason")
    }
}

impl_status_text!(SalesOrderStatus);

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Sent,
    Confirmed,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn allows_receiving(self) -> bool {
        matches!(self, Self::Confirmed | Self::PartiallyReceived)
    }
}

impl DocumentStatus for PurchaseOrderStatus {
    const DOCUMENT_TYPE: DocumentType = DocumentType::PurchaseOrder;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Sent,
        Self::Confirmed,
        Self::PartiallyReceived,
        Self::Received,
        Self::Cancelled,
    ];
    const INITIAL: Self = Self::Draft;

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Confirmed => "confirmed",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Sent, Self::Cancelled],
            Self::Sent => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::PartiallyReceived, Self::Received, Self::Cancelled],
            Self::PartiallyReceived => &[Self::Received, Self::Cancelled],
            Self::Received | Self::Cancelled => &[],
        }
    }

    fn reason_label(self) -> Option<&'static str> {
        (self == Self::Cancelled).then_some("Cancellation reason")
    }
}

impl_status_text!(PurchaseOrderStatus);

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Overdue,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn accepts_payment(self) -> bool {
        matches!(self, Self::Sent | Self::PartiallyPaid | Self::Overdue)
    }
}

impl DocumentStatus for InvoiceStatus {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Invoice;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Sent,
        Self::PartiallyPaid,
        Self::Overdue,
        Self::Paid,
        Self::Cancelled,
    ];
    const INITIAL: Self = Self::Draft;

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::PartiallyPaid => "partially_paid",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Sent, Self::Cancelled],
            Self::Sent => &[Self::PartiallyPaid, Self::Paid, Self::Overdue, Self::Cancelled],
            Self::PartiallyPaid => &[Self::Paid, Self::Overdue, Self::Cancelled],
            Self::Overdue => &[Self::PartiallyPaid, Self::Paid, Self::Cancelled],
            Self::Paid | Self::Cancelled => &[],
        }
    }

    fn reason_label(self) -> Option<&'static str> {
        (self == Self::Cancelled).then_some("Cancellation reason")
    }
}

impl_status_text!(InvoiceStatus);

/// Delivery status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Draft,
    InTransit,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl DeliveryStatus {
    pub fn accepts_receipts(self) -> bool {
        matches!(self, Self::InTransit | Self::PartiallyReceived)
    }
}

impl DocumentStatus for DeliveryStatus {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Delivery;
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::InTransit,
        Self::PartiallyReceived,
        Self::Received,
        Self::Cancelled,
    ];
    const INITIAL: Self = Self::Draft;

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InTransit => "in_transit",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::InTransit, Self::Cancelled],
            Self::InTransit => &[Self::PartiallyReceived, Self::Received, Self::Cancelled],
            Self::PartiallyReceived => &[Self::Received, Self::Cancelled],
            Self::Received | Self::Cancelled => &[],
        }
    }

    fn reason_label(self) -> Option<&'static str> {
        (self == Self::Cancelled).then_some("Cancellation reason")
    }
}

impl_status_text!(DeliveryStatus);
