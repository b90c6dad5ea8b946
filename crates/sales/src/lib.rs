//! Sales documents: quotations and sales orders.
//!
//! This crate contains business rules for the customer-facing side of the
//! workflow, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod order;
pub mod quotation;

pub use order::{SalesOrder, SalesOrderId, SalesOrderItem, SalesOrderTerms};
pub use quotation::{NewQuotation, Quotation, QuotationId, QuotationItem};
