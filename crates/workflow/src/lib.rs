//! Application layer of the document workflow.
//!
//! Composes the document crates with injected persistence
//! ([`DocumentRepository`], [`PaymentRepository`], [`UnitOfWork`]) and a
//! [`Clock`](tradeflow_core::Clock) into the [`DocumentWorkflow`] service.
//! This crate contains no IO itself; the in-memory repositories are for tests
//! and development.

pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod fulfillment;
pub mod in_memory;
pub mod payments;
pub mod repository;

pub use config::{ConfigError, WorkflowConfig};
pub use conversion::{ConvertQuotation, CreateDelivery, CreateInvoice, CreatePurchaseOrder};
pub use engine::{DocumentWorkflow, Repositories, RepositoryFor};
pub use error::{RepositoryError, RepositoryResult, WorkflowError, WorkflowResult};
pub use in_memory::{InMemoryPaymentRepository, InMemoryRepository};
pub use payments::RecordedPayment;
pub use repository::{DocumentRepository, NoopUnitOfWork, PaymentRepository, UnitOfWork};
