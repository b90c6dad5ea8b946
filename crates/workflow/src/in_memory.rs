use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, ExpectedVersion, PagedResult, PaginationParams,
    PaymentId,
};
use tradeflow_documents::Document;
use tradeflow_invoicing::{InvoiceId, Payment};

use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::{DocumentRepository, PaymentRepository};

fn poisoned() -> RepositoryError {
    RepositoryError::Storage("lock poisoned".to_string())
}

/// In-memory document store with optimistic versioning.
///
/// Intended for tests/dev. Not optimized for performance: queries scan every
/// document and return them ordered by creation time.
pub struct InMemoryRepository<D: Document> {
    documents: RwLock<HashMap<D::Id, D>>,
}

impl<D: Document> Default for InMemoryRepository<D> {
    fn default() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl<D: Document> InMemoryRepository<D> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, HashMap<D::Id, D>>> {
        self.documents.read().map_err(|_| poisoned())
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, HashMap<D::Id, D>>> {
        self.documents.write().map_err(|_| poisoned())
    }

    fn scan(&self, keep: impl Fn(&D) -> bool) -> RepositoryResult<Vec<D>> {
        let mut found: Vec<D> = self.read()?.values().filter(|d| keep(d)).cloned().collect();
        found.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.number().cmp(b.number()))
        });
        Ok(found)
    }

    fn not_found(id: &D::Id) -> RepositoryError {
        RepositoryError::NotFound {
            entity: D::DOCUMENT_TYPE.as_str(),
            id: id.to_string(),
        }
    }
}

impl<D: Document> DocumentRepository<D> for InMemoryRepository<D> {
    fn get_by_id(&self, id: &D::Id) -> RepositoryResult<Option<D>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn create(&self, document: &D) -> RepositoryResult<D::Id> {
        let mut documents = self.write()?;
        let id = document.id().clone();
        if documents.contains_key(&id) {
            return Err(RepositoryError::AlreadyExists {
                entity: D::DOCUMENT_TYPE.as_str(),
                id: id.to_string(),
            });
        }

        let mut stored = document.clone();
        stored.set_version(1);
        documents.insert(id.clone(), stored);
        Ok(id)
    }

    fn update(&self, document: &D) -> RepositoryResult<u64> {
        let mut documents = self.write()?;
        let id = document.id();
        let current = documents
            .get(id)
            .map(|d| d.version())
            .ok_or_else(|| Self::not_found(id))?;

        if !ExpectedVersion::Exact(document.version()).matches(current) {
            return Err(RepositoryError::Conflict {
                entity: D::DOCUMENT_TYPE.as_str(),
                id: id.to_string(),
                expected: document.version(),
                actual: current,
            });
        }

        let next = current + 1;
        let mut stored = document.clone();
        stored.set_version(next);
        documents.insert(id.clone(), stored);
        Ok(next)
    }

    fn delete(&self, id: &D::Id) -> RepositoryResult<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    fn get_by_status(
        &self,
        status: D::Status,
        page: PaginationParams,
    ) -> RepositoryResult<PagedResult<D>> {
        let all = self.scan(|d| d.status() == status)?;
        Ok(PagedResult::paginate(all, page))
    }

    fn get_by_contact(
        &self,
        contact_id: ContactId,
        page: PaginationParams,
    ) -> RepositoryResult<PagedResult<D>> {
        let all = self.scan(|d| d.contact_id() == Some(contact_id))?;
        Ok(PagedResult::paginate(all, page))
    }

    fn get_by_origin_document(&self, origin: AggregateId) -> RepositoryResult<Option<D>> {
        Ok(self
            .scan(|d| d.origin_id() == Some(origin))?
            .into_iter()
            .next())
    }

    fn list_all(&self) -> RepositoryResult<Vec<D>> {
        self.scan(|_| true)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentRepository for InMemoryPaymentRepository {
    fn create(&self, payment: &Payment) -> RepositoryResult<PaymentId> {
        let mut payments = self.payments.write().map_err(|_| poisoned())?;
        if payments.contains_key(&payment.id) {
            return Err(RepositoryError::AlreadyExists {
                entity: "payment",
                id: payment.id.to_string(),
            });
        }
        payments.insert(payment.id, payment.clone());
        Ok(payment.id)
    }

    fn list_by_invoice(&self, invoice_id: InvoiceId) -> RepositoryResult<Vec<Payment>> {
        let payments = self.payments.read().map_err(|_| poisoned())?;
        let mut found: Vec<Payment> = payments
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(found)
    }

    fn delete(&self, id: PaymentId) -> RepositoryResult<()> {
        self.payments
            .write()
            .map_err(|_| poisoned())?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "payment",
                id: id.to_string(),
            })
    }
}
