use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, DocumentType, DomainError, DomainResult, Entity, ItemId,
};
use tradeflow_documents::{
    CloneOptions, CommonItemFields, Document, DocumentStatus, DocumentTotals, Duplicate,
    InvoiceStatus, ItemEditable, ItemSelection, LineInput, LineItem, Lines, SalesOrderStatus,
    apply_transition,
};
use tradeflow_sales::{SalesOrder, SalesOrderId};

use crate::payment::Payment;

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl From<AggregateId> for InvoiceId {
    fn from(value: AggregateId) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice line, optionally billed against a sales order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: ItemId,
    pub fields: CommonItemFields,
    pub sales_order_item_id: Option<ItemId>,
}

impl Entity for InvoiceItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

impl LineItem for InvoiceItem {
    fn fields(&self) -> &CommonItemFields {
        &self.fields
    }

    fn set_fields(&mut self, fields: CommonItemFields) {
        self.fields = fields;
    }
}

/// Issue and due date; the due date may not precede the issue date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDates {
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl InvoiceDates {
    pub fn validate(&self) -> DomainResult<()> {
        if self.due_date < self.issue_date {
            return Err(DomainError::validation(format!(
                "due date {} is before issue date {}",
                self.due_date, self.issue_date
            )));
        }
        Ok(())
    }
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    number: String,
    sales_order_id: Option<SalesOrderId>,
    contact_id: ContactId,
    status: InvoiceStatus,
    dates: InvoiceDates,
    lines: Lines<InvoiceItem>,
    amount_paid: Decimal,
    notes: String,
    created_at: DateTime<Utc>,
    version: u64,
}

impl Invoice {
    /// A new invoice in `draft`, without items.
    pub fn new(
        id: InvoiceId,
        number: String,
        contact_id: ContactId,
        dates: InvoiceDates,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        dates.validate()?;
        Ok(Self {
            id,
            number,
            sales_order_id: None,
            contact_id,
            status: InvoiceStatus::Draft,
            dates,
            lines: Lines::new(),
            amount_paid: Decimal::ZERO,
            notes: String::new(),
            created_at: now,
            version: 0,
        })
    }

    /// Bill the selected lines of a confirmed, processing or completed sales
    /// order at full sales pricing.
    pub fn from_sales_order(
        order: &SalesOrder,
        selection: &ItemSelection,
        dates: InvoiceDates,
        id: InvoiceId,
        number: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        order.ensure_status(SalesOrderStatus::allows_invoicing, "create invoice")?;

        let items: Vec<_> = order
            .lines()
            .select(&order.id_typed(), selection)?
            .into_iter()
            .map(|item| InvoiceItem {
                id: ItemId::new(),
                fields: item.fields.clone(),
                sales_order_item_id: Some(item.id),
            })
            .collect();
        if items.is_empty() {
            return Err(DomainError::empty_document(
                DocumentType::Invoice,
                "sales order conversion",
            ));
        }

        let mut invoice = Self::new(id, number, order.contact_id_typed(), dates, now)?;
        invoice.sales_order_id = Some(order.id_typed());
        invoice.lines = Lines::from_items(items)?;
        Ok(invoice)
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn sales_order_id(&self) -> Option<SalesOrderId> {
        self.sales_order_id
    }

    pub fn contact_id_typed(&self) -> ContactId {
        self.contact_id
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.dates.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.dates.due_date
    }

    pub fn items(&self) -> &[InvoiceItem] {
        self.lines.items()
    }

    pub fn lines(&self) -> &Lines<InvoiceItem> {
        &self.lines
    }

    pub fn totals(&self) -> DocumentTotals {
        self.lines.totals()
    }

    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    /// Outstanding amount; never negative.
    pub fn balance(&self) -> Decimal {
        self.lines.totals().grand_total - self.amount_paid
    }

    /// Open (`sent` or `partially_paid`), past due and still owing money.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid)
            && self.dates.due_date < today
            && self.balance() > Decimal::ZERO
    }

    /// Whole days past due as of `today`; zero or negative when not yet due.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.dates.due_date).num_days()
    }

    /// Register a payment of `amount` and move to `partially_paid` or `paid`.
    ///
    /// An `overdue` invoice stays `overdue` until it is paid in full.
    pub fn apply_payment(&mut self, amount: Decimal) -> DomainResult<InvoiceStatus> {
        if !self.status.accepts_payment() {
            return Err(DomainError::invalid_state(
                DocumentType::Invoice,
                self.id,
                self.status,
                "register payment",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if amount > self.balance() {
            return Err(DomainError::invariant(format!(
                "cannot overpay invoice: payment {amount} exceeds balance {}",
                self.balance()
            )));
        }

        self.amount_paid += amount;
        self.advance_payment_status()?;
        Ok(self.status)
    }

    /// Recompute `amount_paid` from the stored payments of this invoice.
    ///
    /// Payments for other invoices are ignored. A `partially_paid` invoice
    /// with nothing paid any more goes back to `sent`; otherwise the status
    /// only moves towards `paid`. Terminal statuses are left as they are.
    pub fn reconcile_payments(&mut self, payments: &[Payment]) -> DomainResult<()> {
        let paid = payments
            .iter()
            .filter(|p| p.invoice_id == self.id)
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
            .ok_or_else(|| DomainError::validation("payment sum overflow"))?;
        if paid > self.lines.totals().grand_total {
            return Err(DomainError::invariant(format!(
                "payments {paid} exceed invoice total {}",
                self.lines.totals().grand_total
            )));
        }

        self.amount_paid = paid;
        if self.status == InvoiceStatus::PartiallyPaid && paid.is_zero() {
            self.status = InvoiceStatus::Sent;
        } else if self.status.accepts_payment() && paid > Decimal::ZERO {
            self.advance_payment_status()?;
        }
        Ok(())
    }

    fn advance_payment_status(&mut self) -> DomainResult<()> {
        let next = if self.balance() == Decimal::ZERO {
            InvoiceStatus::Paid
        } else if self.status == InvoiceStatus::Overdue {
            InvoiceStatus::Overdue
        } else {
            InvoiceStatus::PartiallyPaid
        };
        apply_transition(&mut self.status, next, None, &mut self.notes).map(|_| ())
    }

    fn ensure_editable(&self, operation: &'static str) -> DomainResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(
                DocumentType::Invoice,
                self.id,
                self.status,
                operation,
            ))
        }
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Document for Invoice {
    type Status = InvoiceStatus;

    fn aggregate_id(&self) -> AggregateId {
        self.id.0
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn status(&self) -> InvoiceStatus {
        self.status
    }

    fn contact_id(&self) -> Option<ContactId> {
        Some(self.contact_id)
    }

    fn origin_id(&self) -> Option<AggregateId> {
        self.sales_order_id.map(|so| so.0)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn grand_total(&self) -> Decimal {
        self.lines.totals().grand_total
    }

    fn notes(&self) -> &str {
        &self.notes
    }

    fn transition(&mut self, to: InvoiceStatus, reason: Option<&str>) -> DomainResult<()> {
        if to == InvoiceStatus::Sent && self.lines.is_empty() {
            return Err(DomainError::empty_document(DocumentType::Invoice, "send"));
        }
        if to == InvoiceStatus::Paid && to != self.status && self.balance() > Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "invoice {} has an outstanding balance of {}",
                self.number,
                self.balance()
            )));
        }
        apply_transition(&mut self.status, to, reason, &mut self.notes).map(|_| ())
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl ItemEditable for Invoice {
    fn add_item(&mut self, input: LineInput) -> DomainResult<ItemId> {
        self.ensure_editable("add items")?;
        let item = InvoiceItem {
            id: ItemId::new(),
            fields: CommonItemFields::new(input)?,
            sales_order_item_id: None,
        };
        let id = item.id;
        self.lines.push(item)?;
        Ok(id)
    }

    fn update_item(&mut self, item_id: ItemId, input: LineInput) -> DomainResult<()> {
        self.ensure_editable("update items")?;
        let fields = CommonItemFields::new(input)?;
        self.lines.update(&self.id, item_id, fields)
    }

    fn remove_item(&mut self, item_id: ItemId) -> DomainResult<()> {
        self.ensure_editable("remove items")?;
        self.lines.remove(&self.id, item_id)
    }
}

impl Duplicate for Invoice {
    /// `date_override` sets the issue date; the due date keeps its distance
    /// from the issue date. Payments are not copied.
    fn duplicate(
        &self,
        id: InvoiceId,
        number: String,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let items: Vec<_> = self
            .lines
            .copy_selected(&self.id, &options.selection(), options.price_adjustment_pct)?
            .into_iter()
            .map(|(_, fields)| InvoiceItem {
                id: ItemId::new(),
                fields,
                sales_order_item_id: None,
            })
            .collect();
        if items.is_empty() {
            return Err(DomainError::empty_document(DocumentType::Invoice, "clone"));
        }

        let dates = match options.date_override {
            Some(issue_date) => InvoiceDates {
                issue_date,
                due_date: issue_date
                    .checked_add_signed(self.dates.due_date - self.dates.issue_date)
                    .ok_or_else(|| {
                        DomainError::validation(format!(
                            "due date out of range for issue date {issue_date}"
                        ))
                    })?,
            },
            None => self.dates,
        };

        let mut copy = Self::new(
            id,
            number,
            options.contact_override.unwrap_or(self.contact_id),
            dates,
            now,
        )?;
        copy.lines = Lines::from_items(items)?;
        if options.copy_notes {
            copy.notes = self.notes.clone();
        }
        Ok(copy)
    }
}
