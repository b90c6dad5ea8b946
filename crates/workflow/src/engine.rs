//! The `DocumentWorkflow` service: load, mutate, save.
//!
//! Every public operation follows the same pipeline:
//!
//! ```text
//! load aggregate(s) from repositories
//!   ↓
//! apply domain operation (pure, may fail without side effects)
//!   ↓
//! persist with optimistic version check
//! ```
//!
//! Operations touching more than one document run inside a [`UnitOfWork`]
//! and additionally compensate (delete the derived document) when a later
//! write fails, so stores without transactions are never left half-updated.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use tradeflow_core::pagination::MAX_PAGE_SIZE;
use tradeflow_core::{
    AggregateId, AggregateRoot, Clock, ContactId, DocumentType, DomainError, ItemId, PagedResult,
    PaginationParams,
};
use tradeflow_documents::{
    AtomicSequence, CloneOptions, Document, DocumentNumberer, Duplicate, InvoiceStatus,
    ItemEditable, LineInput, QuotationStatus,
};
use tradeflow_invoicing::{Invoice, InvoiceDates, InvoiceId};
use tradeflow_purchasing::{Delivery, DeliveryId, PurchaseOrder, PurchaseOrderId};
use tradeflow_sales::{
    NewQuotation, Quotation, QuotationId, SalesOrder, SalesOrderId, SalesOrderTerms,
};

use crate::config::WorkflowConfig;
use crate::error::WorkflowResult;
use crate::in_memory::{InMemoryPaymentRepository, InMemoryRepository};
use crate::repository::{DocumentRepository, NoopUnitOfWork, PaymentRepository, UnitOfWork};

/// One repository per document type, plus payments.
#[derive(Clone)]
pub struct Repositories {
    pub quotations: Arc<dyn DocumentRepository<Quotation>>,
    pub sales_orders: Arc<dyn DocumentRepository<SalesOrder>>,
    pub purchase_orders: Arc<dyn DocumentRepository<PurchaseOrder>>,
    pub invoices: Arc<dyn DocumentRepository<Invoice>>,
    pub deliveries: Arc<dyn DocumentRepository<Delivery>>,
    pub payments: Arc<dyn PaymentRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            quotations: Arc::new(InMemoryRepository::<Quotation>::new()),
            sales_orders: Arc::new(InMemoryRepository::<SalesOrder>::new()),
            purchase_orders: Arc::new(InMemoryRepository::<PurchaseOrder>::new()),
            invoices: Arc::new(InMemoryRepository::<Invoice>::new()),
            deliveries: Arc::new(InMemoryRepository::<Delivery>::new()),
            payments: Arc::new(InMemoryPaymentRepository::new()),
        }
    }
}

/// Static dispatch from a document type to its repository.
pub trait RepositoryFor<D: Document> {
    fn repository(&self) -> &dyn DocumentRepository<D>;
}

macro_rules! repository_for {
    ($doc:ty, $field:ident) => {
        impl RepositoryFor<$doc> for Repositories {
            fn repository(&self) -> &dyn DocumentRepository<$doc> {
                self.$field.as_ref()
            }
        }
    };
}

repository_for!(Quotation, quotations);
repository_for!(SalesOrder, sales_orders);
repository_for!(PurchaseOrder, purchase_orders);
repository_for!(Invoice, invoices);
repository_for!(Delivery, deliveries);

pub struct DocumentWorkflow {
    repos: Repositories,
    unit_of_work: Arc<dyn UnitOfWork>,
    clock: Arc<dyn Clock>,
    numberer: DocumentNumberer,
    config: WorkflowConfig,
}

impl DocumentWorkflow {
    /// Numbers come from a process-wide [`AtomicSequence`] bounded by
    /// `config.sequence_modulus`.
    pub fn new(
        repos: Repositories,
        unit_of_work: Arc<dyn UnitOfWork>,
        clock: Arc<dyn Clock>,
        config: WorkflowConfig,
    ) -> Self {
        let sequence = Arc::new(AtomicSequence::new(config.sequence_modulus));
        let numberer = DocumentNumberer::new(sequence, clock.clone());
        Self {
            repos,
            unit_of_work,
            clock,
            numberer,
            config,
        }
    }

    /// In-memory repositories without transactions.
    pub fn in_memory(clock: Arc<dyn Clock>, config: WorkflowConfig) -> Self {
        Self::new(
            Repositories::in_memory(),
            Arc::new(NoopUnitOfWork),
            clock,
            config,
        )
    }

    pub fn with_numberer(mut self, numberer: DocumentNumberer) -> Self {
        self.numberer = numberer;
        self
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn next_number(&self, document_type: DocumentType) -> String {
        self.numberer.next_number(document_type)
    }

    pub(crate) fn repo<D>(&self) -> &dyn DocumentRepository<D>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        <Repositories as RepositoryFor<D>>::repository(&self.repos)
    }

    /// Load a document; a missing one is a `NotFound` domain error.
    pub fn get<D>(&self, id: &D::Id) -> WorkflowResult<D>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        match self.repo::<D>().get_by_id(id)? {
            Some(document) => Ok(document),
            None => Err(DomainError::not_found(D::DOCUMENT_TYPE.as_str(), id).into()),
        }
    }

    pub fn list_by_status<D>(
        &self,
        status: D::Status,
        page: PaginationParams,
    ) -> WorkflowResult<PagedResult<D>>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        Ok(self.repo::<D>().get_by_status(status, page)?)
    }

    pub fn list_by_contact<D>(
        &self,
        contact_id: ContactId,
        page: PaginationParams,
    ) -> WorkflowResult<PagedResult<D>>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        Ok(self.repo::<D>().get_by_contact(contact_id, page)?)
    }

    pub(crate) fn insert<D>(&self, document: &mut D) -> WorkflowResult<()>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        self.repo::<D>().create(document)?;
        document.set_version(1);
        Ok(())
    }

    pub(crate) fn save<D>(&self, document: &mut D) -> WorkflowResult<()>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        let version = self.repo::<D>().update(document)?;
        document.set_version(version);
        Ok(())
    }

    /// Persist a derived document, then its updated source. If the source
    /// cannot be saved the derived document is deleted again.
    pub(crate) fn insert_with_source_update<C, S>(
        &self,
        operation: &'static str,
        derived: &mut C,
        source: &mut S,
    ) -> WorkflowResult<()>
    where
        C: Document,
        S: Document,
        Repositories: RepositoryFor<C> + RepositoryFor<S>,
    {
        self.insert(derived)?;
        if let Err(err) = self.save(source) {
            warn!(
                operation,
                document_id = %derived.id(),
                source_id = %source.id(),
                error = %err,
                "source update failed; deleting derived document"
            );
            if let Err(cleanup) = self.repo::<C>().delete(derived.id()) {
                error!(operation, document_id = %derived.id(), error = %cleanup, "compensating delete failed");
            }
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn in_unit_of_work<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce() -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        self.unit_of_work.begin()?;
        match work() {
            Ok(value) => {
                self.unit_of_work.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(operation, error = %err, "rolling back unit of work");
                if let Err(rollback) = self.unit_of_work.rollback() {
                    error!(operation, error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Move a document along a legal status edge, recording `reason` for
    /// cancel/reject edges. Re-applying the current status is a no-op.
    pub fn transition<D>(
        &self,
        id: &D::Id,
        to: D::Status,
        reason: Option<&str>,
    ) -> WorkflowResult<D>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        let mut document: D = self.get(id)?;
        let from = document.status();
        document.transition(to, reason)?;
        if from != to {
            self.save(&mut document)?;
            info!(
                document_type = %D::DOCUMENT_TYPE,
                document_id = %id,
                number = document.number(),
                from = %from,
                to = %to,
                "document status changed"
            );
        }
        Ok(document)
    }

    pub fn add_item<D>(&self, id: &D::Id, input: LineInput) -> WorkflowResult<ItemId>
    where
        D: ItemEditable,
        Repositories: RepositoryFor<D>,
    {
        let mut document: D = self.get(id)?;
        let item_id = document.add_item(input)?;
        self.save(&mut document)?;
        debug!(document_id = %id, item_id = %item_id, grand_total = %document.grand_total(), "item added");
        Ok(item_id)
    }

    pub fn update_item<D>(&self, id: &D::Id, item_id: ItemId, input: LineInput) -> WorkflowResult<D>
    where
        D: ItemEditable,
        Repositories: RepositoryFor<D>,
    {
        let mut document: D = self.get(id)?;
        document.update_item(item_id, input)?;
        self.save(&mut document)?;
        debug!(document_id = %id, item_id = %item_id, grand_total = %document.grand_total(), "item updated");
        Ok(document)
    }

    pub fn remove_item<D>(&self, id: &D::Id, item_id: ItemId) -> WorkflowResult<D>
    where
        D: ItemEditable,
        Repositories: RepositoryFor<D>,
    {
        let mut document: D = self.get(id)?;
        document.remove_item(item_id)?;
        self.save(&mut document)?;
        debug!(document_id = %id, item_id = %item_id, grand_total = %document.grand_total(), "item removed");
        Ok(document)
    }

    fn add_lines<D: ItemEditable>(document: &mut D, lines: Vec<LineInput>) -> WorkflowResult<()> {
        for line in lines {
            document.add_item(line)?;
        }
        Ok(())
    }

    fn created<D: Document>(&self, mut document: D) -> WorkflowResult<D>
    where
        Repositories: RepositoryFor<D>,
    {
        self.insert(&mut document)?;
        info!(
            document_type = %D::DOCUMENT_TYPE,
            document_id = %document.id(),
            number = document.number(),
            grand_total = %document.grand_total(),
            "document created"
        );
        Ok(document)
    }

    pub fn create_quotation(
        &self,
        header: NewQuotation,
        lines: Vec<LineInput>,
    ) -> WorkflowResult<Quotation> {
        let mut quotation = Quotation::new(
            QuotationId::new(AggregateId::new()),
            self.next_number(DocumentType::Quotation),
            header,
            self.now(),
        );
        Self::add_lines(&mut quotation, lines)?;
        self.created(quotation)
    }

    pub fn create_sales_order(
        &self,
        contact_id: ContactId,
        terms: SalesOrderTerms,
        lines: Vec<LineInput>,
    ) -> WorkflowResult<SalesOrder> {
        let mut order = SalesOrder::new(
            SalesOrderId::new(AggregateId::new()),
            self.next_number(DocumentType::SalesOrder),
            contact_id,
            terms,
            self.now(),
        );
        Self::add_lines(&mut order, lines)?;
        self.created(order)
    }

    pub fn create_purchase_order(
        &self,
        supplier_id: ContactId,
        expected_date: NaiveDate,
        lines: Vec<LineInput>,
    ) -> WorkflowResult<PurchaseOrder> {
        let mut order = PurchaseOrder::new(
            PurchaseOrderId::new(AggregateId::new()),
            self.next_number(DocumentType::PurchaseOrder),
            supplier_id,
            expected_date,
            self.now(),
        );
        Self::add_lines(&mut order, lines)?;
        self.created(order)
    }

    pub fn create_invoice(
        &self,
        contact_id: ContactId,
        dates: InvoiceDates,
        lines: Vec<LineInput>,
    ) -> WorkflowResult<Invoice> {
        let mut invoice = Invoice::new(
            InvoiceId::new(AggregateId::new()),
            self.next_number(DocumentType::Invoice),
            contact_id,
            dates,
            self.now(),
        )?;
        Self::add_lines(&mut invoice, lines)?;
        self.created(invoice)
    }

    /// Copy a document into a new draft of the same type with a fresh number.
    pub fn clone_document<D>(&self, id: &D::Id, options: &CloneOptions) -> WorkflowResult<D>
    where
        D: Duplicate,
        D::Id: From<AggregateId>,
        Repositories: RepositoryFor<D>,
    {
        let source: D = self.get(id)?;
        let mut copy = source.duplicate(
            <D::Id as From<AggregateId>>::from(AggregateId::new()),
            self.next_number(D::DOCUMENT_TYPE),
            options,
            self.now(),
        )?;
        self.insert(&mut copy)?;
        info!(
            document_type = %D::DOCUMENT_TYPE,
            source_id = %id,
            document_id = %copy.id(),
            number = copy.number(),
            "document cloned"
        );
        Ok(copy)
    }

    pub fn clone_quotation(&self, id: QuotationId, options: &CloneOptions) -> WorkflowResult<Quotation> {
        self.clone_document(&id, options)
    }

    pub fn clone_sales_order(&self, id: SalesOrderId, options: &CloneOptions) -> WorkflowResult<SalesOrder> {
        self.clone_document(&id, options)
    }

    pub fn clone_purchase_order(
        &self,
        id: PurchaseOrderId,
        options: &CloneOptions,
    ) -> WorkflowResult<PurchaseOrder> {
        self.clone_document(&id, options)
    }

    pub fn clone_invoice(&self, id: InvoiceId, options: &CloneOptions) -> WorkflowResult<Invoice> {
        self.clone_document(&id, options)
    }

    /// Re-ship the same lines against the same order as a new draft.
    pub fn clone_delivery(&self, id: DeliveryId, options: &CloneOptions) -> WorkflowResult<Delivery> {
        self.clone_document(&id, options)
    }

    fn all_with_status<D>(&self, status: D::Status) -> WorkflowResult<Vec<D>>
    where
        D: Document,
        Repositories: RepositoryFor<D>,
    {
        let mut page = PaginationParams::new(1, MAX_PAGE_SIZE);
        let mut all = Vec::new();
        loop {
            let result = self.repo::<D>().get_by_status(status, page)?;
            let more = result.has_next_page();
            all.extend(result.items);
            if !more {
                return Ok(all);
            }
            page.page += 1;
        }
    }

    /// Move `sent` quotations whose expiry date has passed to `expired`.
    pub fn expire_quotations(&self) -> WorkflowResult<Vec<QuotationId>> {
        let today = self.today();
        let mut expired = Vec::new();
        for mut quotation in self.all_with_status::<Quotation>(QuotationStatus::Sent)? {
            if !quotation.is_expired(today) {
                continue;
            }
            quotation.transition(QuotationStatus::Expired, None)?;
            self.save(&mut quotation)?;
            info!(
                document_id = %quotation.id_typed(),
                number = quotation.number(),
                expiry_date = %quotation.expiry_date(),
                "quotation expired"
            );
            expired.push(quotation.id_typed());
        }
        Ok(expired)
    }

    /// Move open invoices that are past due and still owe money to `overdue`.
    pub fn mark_overdue_invoices(&self) -> WorkflowResult<Vec<InvoiceId>> {
        let today = self.today();
        let mut overdue = Vec::new();
        for status in [InvoiceStatus::Sent, InvoiceStatus::PartiallyPaid] {
            for mut invoice in self.all_with_status::<Invoice>(status)? {
                if !invoice.is_overdue(today) {
                    continue;
                }
                invoice.transition(InvoiceStatus::Overdue, None)?;
                self.save(&mut invoice)?;
                info!(
                    document_id = %invoice.id_typed(),
                    number = invoice.number(),
                    days_overdue = invoice.days_overdue(today),
                    balance = %invoice.balance(),
                    "invoice overdue"
                );
                overdue.push(invoice.id_typed());
            }
        }
        Ok(overdue)
    }
}

impl core::fmt::Debug for DocumentWorkflow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DocumentWorkflow")
            .field("numberer", &self.numberer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
