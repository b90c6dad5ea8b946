//! Commercial document building blocks.
//!
//! Shared by every document crate: the totals calculator, the line-item model,
//! the per-document status machines, the [`Document`] trait the workflow and
//! reporting layers program against, and document numbering.

pub mod document;
pub mod item;
pub mod numbering;
pub mod status;
pub mod totals;

pub use document::{CloneOptions, Document, Duplicate, ItemEditable};
pub use item::{CommonItemFields, ItemSelection, LineInput, LineItem, Lines};
pub use numbering::{AtomicSequence, DocumentNumberer, SequenceSource, TimeSequence};
pub use status::{
    DeliveryStatus, DocumentStatus, InvoiceStatus, PurchaseOrderStatus, QuotationStatus,
    SalesOrderStatus, apply_transition, is_valid_transition, is_valid_transition_named,
};
pub use totals::{DocumentTotals, ItemAmounts, compute_item_amounts, compute_item_total};
