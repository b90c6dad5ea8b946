use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, DocumentType, DomainError, DomainResult, Entity, ItemId,
};
use tradeflow_documents::{
    CloneOptions, CommonItemFields, Document, DocumentStatus, DocumentTotals, Duplicate,
    ItemEditable, LineInput, LineItem, Lines, QuotationStatus, apply_transition,
};

/// Quotation identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotationId(pub AggregateId);

impl QuotationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl From<AggregateId> for QuotationId {
    fn from(value: AggregateId) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for QuotationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Quotation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationItem {
    pub id: ItemId,
    pub fields: CommonItemFields,
}

impl Entity for QuotationItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

impl LineItem for QuotationItem {
    fn fields(&self) -> &CommonItemFields {
        &self.fields
    }

    fn set_fields(&mut self, fields: CommonItemFields) {
        self.fields = fields;
    }
}

/// Header data for a new quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuotation {
    pub contact_id: ContactId,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub terms: String,
}

/// Aggregate root: Quotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quotation {
    id: QuotationId,
    number: String,
    contact_id: ContactId,
    status: QuotationStatus,
    expiry_date: NaiveDate,
    lines: Lines<QuotationItem>,
    notes: String,
    terms: String,
    created_at: DateTime<Utc>,
    version: u64,
}

impl Quotation {
    /// A new quotation in `draft`, without items.
    pub fn new(id: QuotationId, number: String, header: NewQuotation, now: DateTime<Utc>) -> Self {
        Self {
            id,
            number,
            contact_id: header.contact_id,
            status: QuotationStatus::Draft,
            expiry_date: header.expiry_date,
            lines: Lines::new(),
            notes: header.notes,
            terms: header.terms,
            created_at: now,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> QuotationId {
        self.id
    }

    pub fn contact_id_typed(&self) -> ContactId {
        self.contact_id
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn items(&self) -> &[QuotationItem] {
        self.lines.items()
    }

    pub fn lines(&self) -> &Lines<QuotationItem> {
        &self.lines
    }

    pub fn totals(&self) -> DocumentTotals {
        self.lines.totals()
    }

    pub fn terms(&self) -> &str {
        &self.terms
    }

    /// A sent quotation whose expiry date lies before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.status == QuotationStatus::Sent && self.expiry_date < today
    }

    fn ensure_editable(&self, operation: &'static str) -> DomainResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(
                DocumentType::Quotation,
                self.id,
                self.status,
                operation,
            ))
        }
    }
}

impl AggregateRoot for Quotation {
    type Id = QuotationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Document for Quotation {
    type Status = QuotationStatus;

    fn aggregate_id(&self) -> AggregateId {
        self.id.0
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn status(&self) -> QuotationStatus {
        self.status
    }

    fn contact_id(&self) -> Option<ContactId> {
        Some(self.contact_id)
    }

    fn origin_id(&self) -> Option<AggregateId> {
        None
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

    fn transition(&mut self, to: QuotationStatus, reason: Option<&str>) -> DomainResult<()> {
        apply_transition(&mut self.status, to, reason, &mut self.notes).map(|_| ())
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl ItemEditable for Quotation {
    fn add_item(&mut self, input: LineInput) -> DomainResult<ItemId> {
        self.ensure_editable("add items")?;
        let item = QuotationItem {
            id: ItemId::new(),
            fields: CommonItemFields::new(input)?,
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

impl Duplicate for Quotation {
    fn duplicate(
        &self,
        id: QuotationId,
        number: String,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let copied = self
            .lines
            .copy_selected(&self.id, &options.selection(), options.price_adjustment_pct)?;
        if copied.is_empty() {
            return Err(DomainError::empty_document(DocumentType::Quotation, "clone"));
        }

        let items = copied
            .into_iter()
            .map(|(_, fields)| QuotationItem {
                id: ItemId::new(),
                fields,
            })
            .collect();

        Ok(Self {
            id,
            number,
            contact_id: options.contact_override.unwrap_or(self.contact_id),
            status: QuotationStatus::Draft,
            expiry_date: options.date_override.unwrap_or(self.expiry_date),
            lines: Lines::from_items(items)?,
            notes: if options.copy_notes {
                self.notes.clone()
            } else {
                String::new()
            },
            terms: self.terms.clone(),
            created_at: now,
            version: 0,
        })
    }
}
