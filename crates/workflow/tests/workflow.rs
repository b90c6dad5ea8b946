use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, DomainError, FixedClock, PagedResult, PaginationParams,
    ProductId,
};
use tradeflow_documents::{
    CloneOptions, DeliveryStatus, Document, InvoiceStatus, ItemSelection, LineInput,
    PurchaseOrderStatus, QuotationStatus, SalesOrderStatus,
};
use tradeflow_invoicing::{Invoice, NewPayment, PaymentMethod};
use tradeflow_purchasing::{Delivery, DeliveryLine, DeliveryPlan, PurchaseOrder, Receipt};
use tradeflow_sales::{NewQuotation, Quotation, QuotationId, SalesOrder, SalesOrderTerms};
use tradeflow_workflow::{
    ConvertQuotation, CreateDelivery, CreateInvoice, CreatePurchaseOrder, DocumentRepository,
    DocumentWorkflow, InMemoryRepository, Repositories, RepositoryError, RepositoryResult,
    UnitOfWork, WorkflowConfig, WorkflowError,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, d).unwrap()
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_date(today()))
}

fn workflow() -> DocumentWorkflow {
    tradeflow_observability::init();
    DocumentWorkflow::in_memory(clock(), WorkflowConfig::default())
}

fn line(quantity: i64, unit_price: Decimal, discount_pct: Decimal, tax_pct: Decimal) -> LineInput {
    LineInput {
        product_id: ProductId::new(),
        product_name: "Industrial pump".to_string(),
        product_code: "PMP-100".to_string(),
        quantity,
        unit_price,
        discount_pct,
        tax_pct,
    }
}

fn header(expiry_date: NaiveDate) -> NewQuotation {
    NewQuotation {
        contact_id: ContactId::new(),
        expiry_date,
        notes: "Quote valid for stock on hand".to_string(),
        terms: "Net 30".to_string(),
    }
}

fn convert_request() -> ConvertQuotation {
    ConvertQuotation {
        expected_date: day(3, 20),
        payment_terms: "Net 30".to_string(),
        shipping_address: "12 Quay Street".to_string(),
        accept_quotation: None,
    }
}

fn terms() -> SalesOrderTerms {
    SalesOrderTerms {
        expected_date: day(3, 20),
        payment_terms: String::new(),
        shipping_address: String::new(),
    }
}

fn confirmed_order(wf: &DocumentWorkflow, lines: Vec<LineInput>) -> anyhow::Result<SalesOrder> {
    let order = wf.create_sales_order(ContactId::new(), terms(), lines)?;
    Ok(wf.transition::<SalesOrder>(order.id(), SalesOrderStatus::Confirmed, None)?)
}

fn domain(err: WorkflowError) -> DomainError {
    match err {
        WorkflowError::Domain(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

#[test]
fn sent_quotation_converts_to_draft_order_with_same_total() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(10, dec!(100.00), dec!(5), dec!(15))])?;
    assert_eq!(q.grand_total(), dec!(1092.5));
    assert_eq!(q.number(), "QUO-20240301-0001");

    wf.transition::<Quotation>(q.id(), QuotationStatus::Sent, None)?;
    let order = wf.convert_quotation_to_sales_order(q.id_typed(), convert_request())?;

    assert_eq!(order.status(), SalesOrderStatus::Draft);
    assert_eq!(order.grand_total(), dec!(1092.5));
    assert_eq!(order.number(), "SO-20240301-0002");
    assert_eq!(order.quotation_id(), Some(q.id_typed()));
    assert_eq!(order.shipping_address(), "12 Quay Street");

    let stored: Quotation = wf.get(q.id())?;
    assert_eq!(stored.status(), QuotationStatus::Accepted);
    let stored_order: SalesOrder = wf.get(order.id())?;
    assert_eq!(stored_order, order);
    Ok(())
}

#[test]
fn draft_quotation_passes_through_sent_when_accepted() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;

    wf.convert_quotation_to_sales_order(q.id_typed(), convert_request())?;
    let stored: Quotation = wf.get(q.id())?;
    assert_eq!(stored.status(), QuotationStatus::Accepted);
    Ok(())
}

#[test]
fn conversion_without_acceptance_leaves_quotation_alone() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;

    let request = ConvertQuotation {
        accept_quotation: Some(false),
        ..convert_request()
    };
    wf.convert_quotation_to_sales_order(q.id_typed(), request)?;
    let stored: Quotation = wf.get(q.id())?;
    assert_eq!(stored.status(), QuotationStatus::Draft);
    assert_eq!(stored.version(), 1);
    Ok(())
}

#[test]
fn quotation_converts_only_once() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;
    let request = ConvertQuotation {
        accept_quotation: Some(false),
        ..convert_request()
    };
    wf.convert_quotation_to_sales_order(q.id_typed(), request.clone())?;

    let err = domain(wf.convert_quotation_to_sales_order(q.id_typed(), request).unwrap_err());
    assert!(matches!(err, DomainError::InvalidState { .. }));
    assert_eq!(wf.repositories().sales_orders.list_all()?.len(), 1);
    Ok(())
}

#[test]
fn cancelled_quotation_is_not_convertible() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;
    let cancelled =
        wf.transition::<Quotation>(q.id(), QuotationStatus::Cancelled, Some("customer declined"))?;
    assert_eq!(
        cancelled.notes(),
        "Quote valid for stock on hand\nCancellation reason: customer declined"
    );

    let err = domain(wf.convert_quotation_to_sales_order(q.id_typed(), convert_request()).unwrap_err());
    assert!(matches!(err, DomainError::InvalidState { status, .. } if status == "cancelled"));
    Ok(())
}

#[test]
fn missing_source_is_not_found() {
    let wf = workflow();
    let err = wf
        .convert_quotation_to_sales_order(QuotationId::new(AggregateId::new()), convert_request())
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::NotFound { entity: "quotation", .. }));
}

#[test]
fn illegal_transition_leaves_document_untouched() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;

    let err = domain(wf.transition::<Quotation>(q.id(), QuotationStatus::Accepted, None).unwrap_err());
    assert!(matches!(err, DomainError::StateTransition { .. }));
    let stored: Quotation = wf.get(q.id())?;
    assert_eq!(stored.status(), QuotationStatus::Draft);
    assert_eq!(stored.version(), 1);
    Ok(())
}

#[test]
fn items_are_editable_only_in_draft() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![])?;

    let first = wf.add_item::<Quotation>(q.id(), line(2, dec!(10), dec!(0), dec!(0)))?;
    let second = wf.add_item::<Quotation>(q.id(), line(1, dec!(7.5), dec!(0), dec!(0)))?;
    let updated = wf.update_item::<Quotation>(q.id(), first, line(3, dec!(10), dec!(0), dec!(0)))?;
    assert_eq!(updated.grand_total(), dec!(37.5));

    let removed = wf.remove_item::<Quotation>(q.id(), second)?;
    assert_eq!(removed.grand_total(), dec!(30));
    assert_eq!(removed.items().len(), 1);

    wf.transition::<Quotation>(q.id(), QuotationStatus::Sent, None)?;
    let err = domain(wf.add_item::<Quotation>(q.id(), line(1, dec!(1), dec!(0), dec!(0))).unwrap_err());
    assert!(matches!(err, DomainError::InvalidState { operation: "add items", .. }));
    Ok(())
}

#[test]
fn purchase_order_from_sales_order_zeroes_prices() -> anyhow::Result<()> {
    let wf = workflow();
    let order = confirmed_order(
        &wf,
        vec![line(4, dec!(25), dec!(0), dec!(10)), line(2, dec!(8), dec!(0), dec!(10))],
    )?;

    let po = wf.create_purchase_order_from_sales_order(
        order.id_typed(),
        CreatePurchaseOrder {
            supplier_id: ContactId::new(),
            items: ItemSelection::Only(vec![order.items()[1].id]),
            expected_date: day(3, 10),
            keep_unit_prices: None,
        },
    )?;

    assert_eq!(po.items().len(), 1);
    assert_eq!(po.items()[0].fields.quantity(), 2);
    assert_eq!(po.grand_total(), Decimal::ZERO);
    assert_eq!(po.status(), PurchaseOrderStatus::Draft);
    let linked = wf
        .repositories()
        .purchase_orders
        .get_by_origin_document(order.aggregate_id())?;
    assert_eq!(linked.map(|p| p.id_typed()), Some(po.id_typed()));
    Ok(())
}

#[test]
fn draft_sales_order_cannot_be_purchased() -> anyhow::Result<()> {
    let wf = workflow();
    let order = wf.create_sales_order(ContactId::new(), terms(), vec![line(1, dec!(1), dec!(0), dec!(0))])?;
    let err = wf
        .create_purchase_order_from_sales_order(
            order.id_typed(),
            CreatePurchaseOrder {
                supplier_id: ContactId::new(),
                items: ItemSelection::All,
                expected_date: day(3, 10),
                keep_unit_prices: Some(true),
            },
        )
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::InvalidState { .. }));
    assert!(wf.repositories().purchase_orders.list_all()?.is_empty());
    Ok(())
}

#[test]
fn invoice_from_subset_recomputes_totals() -> anyhow::Result<()> {
    let wf = workflow();
    let order = confirmed_order(
        &wf,
        vec![
            line(10, dec!(100.00), dec!(5), dec!(15)),
            line(1, dec!(50), dec!(0), dec!(0)),
            line(3, dec!(20), dec!(0), dec!(10)),
        ],
    )?;
    let picked = vec![order.items()[0].id, order.items()[2].id];

    let invoice = wf.create_invoice_from_sales_order(
        order.id_typed(),
        CreateInvoice {
            items: ItemSelection::Only(picked),
            issue_date: day(3, 1),
            due_date: day(3, 31),
        },
    )?;

    assert_eq!(invoice.items().len(), 2);
    assert_eq!(invoice.grand_total(), dec!(1158.5));
    assert_eq!(invoice.balance(), dec!(1158.5));
    Ok(())
}

#[test]
fn invoice_due_before_issue_is_rejected() -> anyhow::Result<()> {
    let wf = workflow();
    let order = confirmed_order(&wf, vec![line(1, dec!(10), dec!(0), dec!(0))])?;
    let err = wf
        .create_invoice_from_sales_order(
            order.id_typed(),
            CreateInvoice {
                items: ItemSelection::All,
                issue_date: day(3, 10),
                due_date: day(3, 1),
            },
        )
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::Validation(_)));
    Ok(())
}

#[test]
fn delivery_clamps_quantities_and_starts_processing() -> anyhow::Result<()> {
    let wf = workflow();
    let order = confirmed_order(
        &wf,
        vec![line(5, dec!(1), dec!(0), dec!(0)), line(3, dec!(1), dec!(0), dec!(0))],
    )?;

    let delivery = wf.create_delivery_from_sales_order(
        order.id_typed(),
        CreateDelivery {
            lines: vec![
                DeliveryLine { item_id: order.items()[0].id, quantity: 9 },
                DeliveryLine { item_id: order.items()[1].id, quantity: 0 },
            ],
            shipping: Default::default(),
            planned_date: Some(day(3, 5)),
        },
    )?;

    assert_eq!(delivery.items().len(), 1);
    assert_eq!(delivery.items()[0].quantity, 5);
    let stored: SalesOrder = wf.get(order.id())?;
    assert_eq!(stored.status(), SalesOrderStatus::Processing);

    let err = wf
        .create_delivery_from_sales_order(
            order.id_typed(),
            CreateDelivery {
                lines: vec![DeliveryLine { item_id: order.items()[1].id, quantity: -1 }],
                shipping: Default::default(),
                planned_date: None,
            },
        )
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::EmptyDocument { .. }));
    Ok(())
}

#[test]
fn receiving_inbound_delivery_moves_purchase_order() -> anyhow::Result<()> {
    let wf = workflow();
    let order = confirmed_order(&wf, vec![line(6, dec!(2), dec!(0), dec!(0))])?;
    let po = wf.create_purchase_order_from_sales_order(
        order.id_typed(),
        CreatePurchaseOrder {
            supplier_id: ContactId::new(),
            items: ItemSelection::All,
            expected_date: day(3, 10),
            keep_unit_prices: Some(true),
        },
    )?;
    wf.transition::<PurchaseOrder>(po.id(), PurchaseOrderStatus::Sent, None)?;
    wf.transition::<PurchaseOrder>(po.id(), PurchaseOrderStatus::Confirmed, None)?;

    let delivery = wf.create_delivery_from_purchase_order(po.id_typed(), DeliveryPlan::default())?;
    wf.transition::<Delivery>(delivery.id(), DeliveryStatus::InTransit, None)?;
    let item = delivery.items()[0].id;

    let partial = wf.receive_delivery(delivery.id_typed(), &[Receipt { item_id: item, quantity: 4 }], day(3, 8))?;
    assert_eq!(partial.status(), DeliveryStatus::PartiallyReceived);
    let stored: PurchaseOrder = wf.get(po.id())?;
    assert_eq!(stored.status(), PurchaseOrderStatus::PartiallyReceived);

    let err = wf
        .receive_delivery(delivery.id_typed(), &[Receipt { item_id: item, quantity: 3 }], day(3, 9))
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::InvariantViolation(_)));

    let done = wf.receive_delivery(delivery.id_typed(), &[Receipt { item_id: item, quantity: 2 }], day(3, 9))?;
    assert_eq!(done.status(), DeliveryStatus::Received);
    let stored: PurchaseOrder = wf.get(po.id())?;
    assert_eq!(stored.status(), PurchaseOrderStatus::Received);
    Ok(())
}

fn sent_invoice(wf: &DocumentWorkflow, due_date: NaiveDate) -> anyhow::Result<Invoice> {
    let order = confirmed_order(wf, vec![line(10, dec!(100), dec!(0), dec!(0))])?;
    let invoice = wf.create_invoice_from_sales_order(
        order.id_typed(),
        CreateInvoice {
            items: ItemSelection::All,
            issue_date: day(2, 1),
            due_date,
        },
    )?;
    Ok(wf.transition::<Invoice>(invoice.id(), InvoiceStatus::Sent, None)?)
}

fn pay(amount: Decimal) -> NewPayment {
    NewPayment {
        amount,
        date: today(),
        method: PaymentMethod::BankTransfer,
        reference: "TRX-1".to_string(),
    }
}

#[test]
fn payments_settle_invoice() -> anyhow::Result<()> {
    let wf = workflow();
    let invoice = sent_invoice(&wf, day(3, 31))?;

    let first = wf.record_payment(invoice.id_typed(), pay(dec!(400)))?;
    assert_eq!(first.invoice.status(), InvoiceStatus::PartiallyPaid);
    assert_eq!(first.invoice.balance(), dec!(600));

    let err = wf.record_payment(invoice.id_typed(), pay(dec!(600.01))).unwrap_err();
    assert!(matches!(domain(err), DomainError::InvariantViolation(_)));
    assert_eq!(wf.payments_for_invoice(invoice.id_typed())?.len(), 1);

    let second = wf.record_payment(invoice.id_typed(), pay(dec!(600)))?;
    assert_eq!(second.invoice.status(), InvoiceStatus::Paid);
    assert_eq!(second.invoice.balance(), Decimal::ZERO);

    let reconciled = wf.reconcile_invoice_payments(invoice.id_typed())?;
    assert_eq!(reconciled.amount_paid(), dec!(1000));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn split_payments_settle_exactly(parts in proptest::collection::vec(1u32..500, 1..8)) {
        let wf = workflow();
        let total: u32 = parts.iter().sum();
        let order = confirmed_order(&wf, vec![line(1, Decimal::from(total), dec!(0), dec!(0))]).unwrap();
        let invoice = wf
            .create_invoice_from_sales_order(
                order.id_typed(),
                CreateInvoice { items: ItemSelection::All, issue_date: day(3, 1), due_date: day(3, 31) },
            )
            .unwrap();
        wf.transition::<Invoice>(invoice.id(), InvoiceStatus::Sent, None).unwrap();

        let mut paid = Decimal::ZERO;
        for part in &parts {
            let recorded = wf.record_payment(invoice.id_typed(), pay(Decimal::from(*part))).unwrap();
            paid += Decimal::from(*part);
            prop_assert_eq!(recorded.invoice.amount_paid(), paid);
            prop_assert!(recorded.invoice.balance() >= Decimal::ZERO);
        }

        let stored: Invoice = wf.get(invoice.id()).unwrap();
        prop_assert_eq!(stored.status(), InvoiceStatus::Paid);
        prop_assert_eq!(wf.payments_for_invoice(invoice.id_typed()).unwrap().len(), parts.len());
    }
}

#[test]
fn sweeps_expire_quotations_and_flag_overdue_invoices() -> anyhow::Result<()> {
    let wf = workflow();
    let stale = wf.create_quotation(header(day(2, 15)), vec![line(1, dec!(1), dec!(0), dec!(0))])?;
    let fresh = wf.create_quotation(header(day(3, 15)), vec![line(1, dec!(1), dec!(0), dec!(0))])?;
    let unsent = wf.create_quotation(header(day(2, 1)), vec![line(1, dec!(1), dec!(0), dec!(0))])?;
    wf.transition::<Quotation>(stale.id(), QuotationStatus::Sent, None)?;
    wf.transition::<Quotation>(fresh.id(), QuotationStatus::Sent, None)?;

    assert_eq!(wf.expire_quotations()?, vec![stale.id_typed()]);
    let drafts: PagedResult<Quotation> =
        wf.list_by_status(QuotationStatus::Draft, PaginationParams::default())?;
    assert_eq!(drafts.items[0].id_typed(), unsent.id_typed());

    let late = sent_invoice(&wf, day(2, 20))?;
    let current = sent_invoice(&wf, day(3, 1))?;
    assert_eq!(wf.mark_overdue_invoices()?, vec![late.id_typed()]);
    let stored: Invoice = wf.get(current.id())?;
    assert_eq!(stored.status(), InvoiceStatus::Sent);

    let paid = wf.record_payment(late.id_typed(), pay(dec!(100)))?;
    assert_eq!(paid.invoice.status(), InvoiceStatus::Overdue);
    Ok(())
}

#[test]
fn clone_adjusts_prices_and_numbers() -> anyhow::Result<()> {
    let wf = workflow();
    let q = wf.create_quotation(header(day(3, 31)), vec![line(2, dec!(50), dec!(0), dec!(0))])?;
    wf.transition::<Quotation>(q.id(), QuotationStatus::Sent, None)?;

    let copy = wf.clone_quotation(
        q.id_typed(),
        &CloneOptions {
            price_adjustment_pct: Some(dec!(10)),
            date_override: Some(day(4, 30)),
            ..CloneOptions::default()
        },
    )?;

    assert_eq!(copy.status(), QuotationStatus::Draft);
    assert_eq!(copy.grand_total(), dec!(110));
    assert_eq!(copy.expiry_date(), day(4, 30));
    assert_ne!(copy.number(), q.number());
    assert_eq!(copy.notes(), "");
    Ok(())
}

#[test]
fn clone_delivery_reships_the_same_lines() -> anyhow::Result<()> {
    let wf = workflow();
    let order = confirmed_order(&wf, vec![line(4, dec!(10), dec!(0), dec!(0))])?;
    let source_item = order.items()[0].id;
    let delivery = wf.create_delivery_from_sales_order(
        order.id_typed(),
        CreateDelivery {
            lines: vec![
                DeliveryLine { item_id: source_item, quantity: 3 },
                DeliveryLine { item_id: source_item, quantity: 3 },
            ],
            shipping: Default::default(),
            planned_date: None,
        },
    )?;
    assert_eq!(delivery.items().len(), 1);
    assert_eq!(delivery.items()[0].quantity, 4);
    wf.transition::<Delivery>(delivery.id(), DeliveryStatus::InTransit, None)?;
    wf.transition::<Delivery>(delivery.id(), DeliveryStatus::Cancelled, Some("wrong carrier"))?;

    let copy = wf.clone_delivery(
        delivery.id_typed(),
        &CloneOptions {
            date_override: Some(day(3, 20)),
            ..CloneOptions::default()
        },
    )?;
    assert_eq!(copy.status(), DeliveryStatus::Draft);
    assert_ne!(copy.number(), delivery.number());
    assert_eq!(copy.origin(), delivery.origin());
    assert_eq!(copy.planned_date(), Some(day(3, 20)));
    assert_eq!(copy.items()[0].source_item_id, source_item);
    assert_eq!(copy.items()[0].received_qty(), 0);

    let stored: Delivery = wf.get(copy.id())?;
    assert_eq!(stored, copy);
    Ok(())
}

/// Delegates to an in-memory store; updates fail once `fail_updates` is set.
struct FlakyRepository<D: Document> {
    inner: InMemoryRepository<D>,
    fail_updates: AtomicBool,
}

impl<D: Document> FlakyRepository<D> {
    fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            fail_updates: AtomicBool::new(false),
        }
    }
}

impl<D: Document> DocumentRepository<D> for FlakyRepository<D> {
    fn get_by_id(&self, id: &D::Id) -> RepositoryResult<Option<D>> {
        self.inner.get_by_id(id)
    }

    fn create(&self, document: &D) -> RepositoryResult<D::Id> {
        self.inner.create(document)
    }

    fn update(&self, document: &D) -> RepositoryResult<u64> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("disk full".to_string()));
        }
        self.inner.update(document)
    }

    fn delete(&self, id: &D::Id) -> RepositoryResult<()> {
        self.inner.delete(id)
    }

    fn get_by_status(&self, status: D::Status, page: PaginationParams) -> RepositoryResult<PagedResult<D>> {
        self.inner.get_by_status(status, page)
    }

    fn get_by_contact(&self, contact_id: ContactId, page: PaginationParams) -> RepositoryResult<PagedResult<D>> {
        self.inner.get_by_contact(contact_id, page)
    }

    fn get_by_origin_document(&self, origin: AggregateId) -> RepositoryResult<Option<D>> {
        self.inner.get_by_origin_document(origin)
    }

    fn list_all(&self) -> RepositoryResult<Vec<D>> {
        self.inner.list_all()
    }
}

#[derive(Default)]
struct RecordingUnitOfWork {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingUnitOfWork {
    fn record(&self, call: &'static str) -> RepositoryResult<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl UnitOfWork for RecordingUnitOfWork {
    fn begin(&self) -> RepositoryResult<()> {
        self.record("begin")
    }

    fn commit(&self) -> RepositoryResult<()> {
        self.record("commit")
    }

    fn rollback(&self) -> RepositoryResult<()> {
        self.record("rollback")
    }
}

#[test]
fn failed_source_update_deletes_created_order() -> anyhow::Result<()> {
    tradeflow_observability::init();
    let quotations = Arc::new(FlakyRepository::<Quotation>::new());
    let unit_of_work = Arc::new(RecordingUnitOfWork::default());
    let mut repos = Repositories::in_memory();
    repos.quotations = quotations.clone();
    let wf = DocumentWorkflow::new(repos, unit_of_work.clone(), clock(), WorkflowConfig::default());

    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;
    quotations.fail_updates.store(true, Ordering::SeqCst);

    let err = wf.convert_quotation_to_sales_order(q.id_typed(), convert_request()).unwrap_err();
    assert!(matches!(err, WorkflowError::Repository(RepositoryError::Storage(_))));
    assert!(wf.repositories().sales_orders.list_all()?.is_empty());
    assert_eq!(unit_of_work.calls(), vec!["begin", "rollback"]);

    let stored: Quotation = wf.get(q.id())?;
    assert_eq!(stored.status(), QuotationStatus::Draft);
    Ok(())
}

#[test]
fn failed_order_update_deletes_created_delivery() -> anyhow::Result<()> {
    tradeflow_observability::init();
    let orders = Arc::new(FlakyRepository::<SalesOrder>::new());
    let mut repos = Repositories::in_memory();
    repos.sales_orders = orders.clone();
    let unit_of_work = Arc::new(RecordingUnitOfWork::default());
    let wf = DocumentWorkflow::new(repos, unit_of_work.clone(), clock(), WorkflowConfig::default());

    let order = confirmed_order(&wf, vec![line(2, dec!(1), dec!(0), dec!(0))])?;
    orders.fail_updates.store(true, Ordering::SeqCst);

    let result = wf.create_delivery_from_sales_order(
        order.id_typed(),
        CreateDelivery {
            lines: vec![DeliveryLine { item_id: order.items()[0].id, quantity: 2 }],
            shipping: Default::default(),
            planned_date: None,
        },
    );
    assert!(result.is_err());
    assert!(wf.repositories().deliveries.list_all()?.is_empty());
    assert_eq!(unit_of_work.calls().last(), Some(&"rollback"));
    Ok(())
}

#[test]
fn successful_conversion_commits() -> anyhow::Result<()> {
    let unit_of_work = Arc::new(RecordingUnitOfWork::default());
    let wf = DocumentWorkflow::new(
        Repositories::in_memory(),
        unit_of_work.clone(),
        clock(),
        WorkflowConfig::default(),
    );
    let q = wf.create_quotation(header(day(3, 31)), vec![line(1, dec!(5), dec!(0), dec!(0))])?;
    wf.convert_quotation_to_sales_order(q.id_typed(), convert_request())?;
    assert_eq!(unit_of_work.calls(), vec!["begin", "commit"]);
    Ok(())
}
