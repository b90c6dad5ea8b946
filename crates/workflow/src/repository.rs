//! Persistence seams consumed by the workflow.
//!
//! The engine never talks to storage directly: every document type is loaded
//! and saved through a [`DocumentRepository`], payments through a
//! [`PaymentRepository`], and multi-document operations are bracketed by a
//! [`UnitOfWork`]. In-memory implementations live in [`crate::in_memory`].

use tradeflow_core::{AggregateId, ContactId, PagedResult, PaginationParams, PaymentId};
use tradeflow_documents::Document;
use tradeflow_invoicing::{InvoiceId, Payment};

use crate::error::RepositoryResult;

/// Storage for one document type.
///
/// Versioning contract: `create` stores the document at version 1; `update`
/// succeeds only when the document's version equals the stored one and
/// returns the bumped version.
pub trait DocumentRepository<D: Document>: Send + Sync {
    fn get_by_id(&self, id: &D::Id) -> RepositoryResult<Option<D>>;

    fn create(&self, document: &D) -> RepositoryResult<D::Id>;

    fn update(&self, document: &D) -> RepositoryResult<u64>;

    fn delete(&self, id: &D::Id) -> RepositoryResult<()>;

    fn get_by_status(
        &self,
        status: D::Status,
        page: PaginationParams,
    ) -> RepositoryResult<PagedResult<D>>;

    fn get_by_contact(
        &self,
        contact_id: ContactId,
        page: PaginationParams,
    ) -> RepositoryResult<PagedResult<D>>;

    /// The document derived from `origin`, if any.
    fn get_by_origin_document(&self, origin: AggregateId) -> RepositoryResult<Option<D>>;

    fn list_all(&self) -> RepositoryResult<Vec<D>>;
}

pub trait PaymentRepository: Send + Sync {
    fn create(&self, payment: &Payment) -> RepositoryResult<PaymentId>;

    fn list_by_invoice(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<Payment>>;

    fn delete(&self, id: PaymentId) -> RepositoryResult<()>;
}

/// Transaction bracket supplied by the persistence layer.
pub trait UnitOfWork: Send + Sync {
    fn begin(&self) -> RepositoryResult<()>;

    fn commit(&self) -> RepositoryResult<()>;

    fn rollback(&self) -> RepositoryResult<()>;
}

/// For stores without transactions; the workflow's compensating actions
/// still apply.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUnitOfWork;

impl UnitOfWork for NoopUnitOfWork {
    fn begin(&self) -> RepositoryResult<()> {
        Ok(())
    }

    fn commit(&self) -> RepositoryResult<()> {
        Ok(())
    }

    fn rollback(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
