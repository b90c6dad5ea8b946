//! Invoicing: invoices and the payments received against them.
//!
//! This crate contains business rules for accounts receivable, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod invoice;
pub mod payment;

pub use invoice::{Invoice, InvoiceDates, InvoiceId, InvoiceItem};
pub use payment::{NewPayment, Payment, PaymentMethod};
