use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, DocumentType, DomainError, DomainResult, Entity, ItemId,
};
use tradeflow_documents::{
    CloneOptions, CommonItemFields, Document, DocumentStatus, DocumentTotals, Duplicate,
    ItemEditable, LineInput, LineItem, Lines, SalesOrderStatus, apply_transition,
};

use crate::quotation::{Quotation, QuotationId};

/// Sales order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl From<AggregateId> for SalesOrderId {
    fn from(value: AggregateId) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order line; remembers the quotation line it was copied from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderItem {
    pub id: ItemId,
    pub fields: CommonItemFields,
    pub quotation_item_id: Option<ItemId>,
}

impl Entity for SalesOrderItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

impl LineItem for SalesOrderItem {
    fn fields(&self) -> &CommonItemFields {
        &self.fields
    }

    fn set_fields(&mut self, fields: CommonItemFields) {
        self.fields = fields;
    }
}

/// Fulfillment header fields of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderTerms {
    pub expected_date: NaiveDate,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub shipping_address: String,
}

/// Aggregate root: SalesOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    number: String,
    quotation_id: Option<QuotationId>,
    contact_id: ContactId,
    status: SalesOrderStatus,
    expected_date: NaiveDate,
    lines: Lines<SalesOrderItem>,
    payment_terms: String,
    shipping_address: String,
    notes: String,
    created_at: DateTime<Utc>,
    version: u64,
}

impl SalesOrder {
    /// A new order in `draft`, without items.
    pub fn new(
        id: SalesOrderId,
        number: String,
        contact_id: ContactId,
        terms: SalesOrderTerms,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number,
            quotation_id: None,
            contact_id,
            status: SalesOrderStatus::Draft,
            expected_date: terms.expected_date,
            lines: Lines::new(),
            payment_terms: terms.payment_terms,
            shipping_address: terms.shipping_address,
            notes: String::new(),
            created_at: now,
            version: 0,
        }
    }

    /// Derive a draft order from a quotation.
    ///
    /// Contact, notes and every item (product, quantity, price, discount, tax)
    /// are copied verbatim, so the order's totals equal the quotation's. Which
    /// quotation statuses may be converted is decided by the caller.
    pub fn from_quotation(
        quotation: &Quotation,
        id: SalesOrderId,
        number: String,
        terms: SalesOrderTerms,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quotation.items().is_empty() {
            return Err(DomainError::empty_document(
                DocumentType::SalesOrder,
                "quotation conversion",
            ));
        }

        let items = quotation
            .items()
            .iter()
            .map(|item| SalesOrderItem {
                id: ItemId::new(),
                fields: item.fields.clone(),
                quotation_item_id: Some(item.id),
            })
            .collect();

        let mut order = Self::new(id, number, quotation.contact_id_typed(), terms, now);
        order.quotation_id = Some(quotation.id_typed());
        order.notes = quotation.notes().to_string();
        order.lines = Lines::from_items(items)?;
        Ok(order)
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn quotation_id(&self) -> Option<QuotationId> {
        self.quotation_id
    }

    pub fn contact_id_typed(&self) -> ContactId {
        self.contact_id
    }

    pub fn expected_date(&self) -> NaiveDate {
        self.expected_date
    }

    pub fn payment_terms(&self) -> &str {
        &self.payment_terms
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn items(&self) -> &[SalesOrderItem] {
        self.lines.items()
    }

    pub fn lines(&self) -> &Lines<SalesOrderItem> {
        &self.lines
    }

    pub fn totals(&self) -> DocumentTotals {
        self.lines.totals()
    }

    pub fn is_modifiable(&self) -> bool {
        self.status.is_editable()
    }

    /// Guard for deriving downstream documents; `allowed` is one of the
    /// `SalesOrderStatus::allows_*` predicates.
    pub fn ensure_status(
        &self,
        allowed: fn(SalesOrderStatus) -> bool,
        operation: &'static str,
    ) -> DomainResult<()> {
        if allowed(self.status) {
            Ok(())
        } else {
            Err(DomainError::invalid_state(
                DocumentType::SalesOrder,
                self.id,
                self.status,
                operation,
            ))
        }
    }

    fn ensure_modifiable(&self, operation: &'static str) -> DomainResult<()> {
        self.ensure_status(SalesOrderStatus::is_editable, operation)
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Document for SalesOrder {
    type Status = SalesOrderStatus;

    fn aggregate_id(&self) -> AggregateId {
        self.id.0
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn status(&self) -> SalesOrderStatus {
        self.status
    }

    fn contact_id(&self) -> Option<ContactId> {
        Some(self.contact_id)
    }

    fn origin_id(&self) -> Option<AggregateId> {
        self.quotation_id.map(|q| q.0)
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

    fn transition(&mut self, to: SalesOrderStatus, reason: Option<&str>) -> DomainResult<()> {
        if to == SalesOrderStatus::Confirmed && self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm order without lines"));
        }
        apply_transition(&mut self.status, to, reason, &mut self.notes).map(|_| ())
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl ItemEditable for SalesOrder {
    fn add_item(&mut self, input: LineInput) -> DomainResult<ItemId> {
        self.ensure_modifiable("add items")?;
        let item = SalesOrderItem {
            id: ItemId::new(),
            fields: CommonItemFields::new(input)?,
            quotation_item_id: None,
        };
        let id = item.id;
        self.lines.push(item)?;
        Ok(id)
    }

    fn update_item(&mut self, item_id: ItemId, input: LineInput) -> DomainResult<()> {
        self.ensure_modifiable("update items")?;
        let fields = CommonItemFields::new(input)?;
        self.lines.update(&self.id, item_id, fields)
    }

    fn remove_item(&mut self, item_id: ItemId) -> DomainResult<()> {
        self.ensure_modifiable("remove items")?;
        self.lines.remove(&self.id, item_id)
    }
}

impl Duplicate for SalesOrder {
    fn duplicate(
        &self,
        id: SalesOrderId,
        number: String,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let copied = self
            .lines
            .copy_selected(&self.id, &options.selection(), options.price_adjustment_pct)?;
        if copied.is_empty() {
            return Err(DomainError::empty_document(DocumentType::SalesOrder, "clone"));
        }

        let items = copied
            .into_iter()
            .map(|(_, fields)| SalesOrderItem {
                id: ItemId::new(),
                fields,
                quotation_item_id: None,
            })
            .collect();

        Ok(Self {
            id,
            number,
            quotation_id: None,
            contact_id: options.contact_override.unwrap_or(self.contact_id),
            status: SalesOrderStatus::Draft,
            expected_date: options.date_override.unwrap_or(self.expected_date),
            lines: Lines::from_items(items)?,
            payment_terms: self.payment_terms.clone(),
            shipping_address: self.shipping_address.clone(),
            notes: if options.copy_notes {
                self.notes.clone()
            } else {
                String::new()
            },
            created_at: now,
            version: 0,
        })
    }
}
