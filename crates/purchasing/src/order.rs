use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, DocumentType, DomainError, DomainResult, Entity, ItemId,
};
use tradeflow_documents::{
    CloneOptions, CommonItemFields, Document, DocumentStatus, DocumentTotals, Duplicate,
    ItemEditable, ItemSelection, LineInput, LineItem, Lines, PurchaseOrderStatus,
    SalesOrderStatus, apply_transition,
};
use tradeflow_sales::{SalesOrder, SalesOrderId};

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl From<AggregateId> for PurchaseOrderId {
    fn from(value: AggregateId) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub id: ItemId,
    pub fields: CommonItemFields,
    pub sales_order_item_id: Option<ItemId>,
}

impl Entity for PurchaseOrderItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

impl LineItem for PurchaseOrderItem {
    fn fields(&self) -> &CommonItemFields {
        &self.fields
    }

    fn set_fields(&mut self, fields: CommonItemFields) {
        self.fields = fields;
    }
}

/// Parameters for deriving a purchase order from a sales order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierTerms {
    pub supplier_id: ContactId,
    pub expected_date: NaiveDate,
    /// Keep the sales prices instead of zeroing them for the buyer to fill in.
    #[serde(default)]
    pub keep_unit_prices: bool,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    number: String,
    sales_order_id: Option<SalesOrderId>,
    supplier_id: ContactId,
    status: PurchaseOrderStatus,
    expected_date: NaiveDate,
    lines: Lines<PurchaseOrderItem>,
    notes: String,
    created_at: DateTime<Utc>,
    version: u64,
}

impl PurchaseOrder {
    /// A new order in `draft`, without items.
    pub fn new(
        id: PurchaseOrderId,
        number: String,
        supplier_id: ContactId,
        expected_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number,
            sales_order_id: None,
            supplier_id,
            status: PurchaseOrderStatus::Draft,
            expected_date,
            lines: Lines::new(),
            notes: String::new(),
            created_at: now,
            version: 0,
        }
    }

    /// Derive a draft purchase order from the selected lines of a confirmed or
    /// processing sales order.
    ///
    /// Unit prices are zeroed unless `terms.keep_unit_prices` is set; quantity,
    /// discount and tax are copied as-is.
    pub fn from_sales_order(
        order: &SalesOrder,
        selection: &ItemSelection,
        terms: SupplierTerms,
        id: PurchaseOrderId,
        number: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        order.ensure_status(SalesOrderStatus::allows_purchasing, "create purchase order")?;

        let items = order
            .lines()
            .select(&order.id_typed(), selection)?
            .into_iter()
            .map(|item| {
                let fields = if terms.keep_unit_prices {
                    item.fields.clone()
                } else {
                    item.fields.with_unit_price(Decimal::ZERO)?
                };
                Ok(PurchaseOrderItem {
                    id: ItemId::new(),
                    fields,
                    sales_order_item_id: Some(item.id),
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        if items.is_empty() {
            return Err(DomainError::empty_document(
                DocumentType::PurchaseOrder,
                "sales order conversion",
            ));
        }

        let mut po = Self::new(id, number, terms.supplier_id, terms.expected_date, now);
        po.sales_order_id = Some(order.id_typed());
        po.lines = Lines::from_items(items)?;
        Ok(po)
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn sales_order_id(&self) -> Option<SalesOrderId> {
        self.sales_order_id
    }

    pub fn supplier_id(&self) -> ContactId {
        self.supplier_id
    }

    pub fn expected_date(&self) -> NaiveDate {
        self.expected_date
    }

    pub fn items(&self) -> &[PurchaseOrderItem] {
        self.lines.items()
    }

    pub fn lines(&self) -> &Lines<PurchaseOrderItem> {
        &self.lines
    }

    pub fn totals(&self) -> DocumentTotals {
        self.lines.totals()
    }

    pub fn ensure_receivable(&self, operation: &'static str) -> DomainResult<()> {
        if self.status.allows_receiving() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(
                DocumentType::PurchaseOrder,
                self.id,
                self.status,
                operation,
            ))
        }
    }

    /// Follow the receipt progress of a delivery raised against this order.
    pub fn record_receipt_progress(&mut self, complete: bool) -> DomainResult<()> {
        self.ensure_receivable("receive goods")?;
        let next = if complete {
            PurchaseOrderStatus::Received
        } else {
            PurchaseOrderStatus::PartiallyReceived
        };
        self.transition(next, None)
    }

    fn ensure_editable(&self, operation: &'static str) -> DomainResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(
                DocumentType::PurchaseOrder,
                self.id,
                self.status,
                operation,
            ))
        }
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Document for PurchaseOrder {
    type Status = PurchaseOrderStatus;

    fn aggregate_id(&self) -> AggregateId {
        self.id.0
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    fn contact_id(&self) -> Option<ContactId> {
        Some(self.supplier_id)
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

    fn transition(&mut self, to: PurchaseOrderStatus, reason: Option<&str>) -> DomainResult<()> {
        apply_transition(&mut self.status, to, reason, &mut self.notes).map(|_| ())
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl ItemEditable for PurchaseOrder {
    fn add_item(&mut self, input: LineInput) -> DomainResult<ItemId> {
        self.ensure_editable("add items")?;
        let item = PurchaseOrderItem {
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

impl Duplicate for PurchaseOrder {
    fn duplicate(
        &self,
        id: PurchaseOrderId,
        number: String,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let items: Vec<_> = self
            .lines
            .copy_selected(&self.id, &options.selection(), options.price_adjustment_pct)?
            .into_iter()
            .map(|(_, fields)| PurchaseOrderItem {
                id: ItemId::new(),
                fields,
                sales_order_item_id: None,
            })
            .collect();
        if items.is_empty() {
            return Err(DomainError::empty_document(DocumentType::PurchaseOrder, "clone"));
        }

        let mut copy = Self::new(
            id,
            number,
            options.contact_override.unwrap_or(self.supplier_id),
            options.date_override.unwrap_or(self.expected_date),
            now,
        );
        copy.lines = Lines::from_items(items)?;
        if options.copy_notes {
            copy.notes = self.notes.clone();
        }
        Ok(copy)
    }
}
