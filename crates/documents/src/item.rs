//! Line-item model shared by all priced documents.
//!
//! Every document-specific item type (quotation, sales order, purchase order,
//! invoice) holds a [`CommonItemFields`] value plus its own extras, and every
//! document keeps its items in a [`Lines`] list that owns the totals.

use core::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, Entity, ItemId, ProductId};

use crate::totals::{self, DocumentTotals, ItemAmounts};

/// Caller-supplied line data. Carries no total: totals are always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_code: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_pct: Decimal,
    #[serde(default)]
    pub tax_pct: Decimal,
}

/// Validated line pricing with its derived total.
///
/// Deserialization goes through [`LineInput`], so a serialized `total` is
/// ignored and recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineInput")]
pub struct CommonItemFields {
    product_id: ProductId,
    product_name: String,
    product_code: String,
    quantity: i64,
    unit_price: Decimal,
    discount_pct: Decimal,
    tax_pct: Decimal,
    #[serde(flatten)]
    amounts: ItemAmounts,
}

impl CommonItemFields {
    pub fn new(input: LineInput) -> DomainResult<Self> {
        let amounts = totals::compute_item_amounts(
            input.quantity,
            input.unit_price,
            input.discount_pct,
            input.tax_pct,
        )?;

        Ok(Self {
            product_id: input.product_id,
            product_name: input.product_name,
            product_code: input.product_code,
            quantity: input.quantity,
            unit_price: input.unit_price,
            discount_pct: input.discount_pct,
            tax_pct: input.tax_pct,
            amounts,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn discount_pct(&self) -> Decimal {
        self.discount_pct
    }

    pub fn tax_pct(&self) -> Decimal {
        self.tax_pct
    }

    pub fn total(&self) -> Decimal {
        self.amounts.total
    }

    pub fn amounts(&self) -> ItemAmounts {
        self.amounts
    }

    pub fn to_input(&self) -> LineInput {
        LineInput {
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            product_code: self.product_code.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_pct: self.discount_pct,
            tax_pct: self.tax_pct,
        }
    }

    pub fn with_unit_price(&self, unit_price: Decimal) -> DomainResult<Self> {
        Self::new(LineInput {
            unit_price,
            ..self.to_input()
        })
    }

    pub fn with_quantity(&self, quantity: i64) -> DomainResult<Self> {
        Self::new(LineInput {
            quantity,
            ..self.to_input()
        })
    }

    /// Unit price scaled by `1 + pct / 100`, total recomputed.
    pub fn price_adjusted(&self, pct: Decimal) -> DomainResult<Self> {
        let factor = Decimal::ONE + pct / Decimal::ONE_HUNDRED;
        let unit_price = self
            .unit_price
            .checked_mul(factor)
            .ok_or_else(|| DomainError::validation("price adjustment overflow"))?;
        self.with_unit_price(unit_price)
    }
}

impl TryFrom<LineInput> for CommonItemFields {
    type Error = DomainError;

    fn try_from(value: LineInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A priced line item with stable identity.
pub trait LineItem: Entity<Id = ItemId> + Clone {
    fn fields(&self) -> &CommonItemFields;

    fn set_fields(&mut self, fields: CommonItemFields);

    fn item_id(&self) -> ItemId {
        *self.id()
    }
}

/// Which items of a source document an operation applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "item_ids")]
pub enum ItemSelection {
    #[default]
    All,
    Only(Vec<ItemId>),
}

impl ItemSelection {
    pub fn from_subset(subset: Option<Vec<ItemId>>) -> Self {
        match subset {
            Some(ids) => ItemSelection::Only(ids),
            None => ItemSelection::All,
        }
    }
}

/// Item list of one document; owns the document totals.
///
/// Totals are recomputed after every insert, update and removal and cannot be
/// set any other way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lines<T> {
    items: Vec<T>,
    totals: DocumentTotals,
}

impl<T> Default for Lines<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            totals: DocumentTotals::default(),
        }
    }
}

impl<T: LineItem> Lines<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<T>) -> DomainResult<Self> {
        let totals = DocumentTotals::from_items(items.iter().map(|i| i.fields()))?;
        Ok(Self { items, totals })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn totals(&self) -> DocumentTotals {
        self.totals
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: ItemId) -> Option<&T> {
        self.items.iter().find(|i| i.item_id() == item_id)
    }

    pub fn require(&self, document_id: &impl Display, item_id: ItemId) -> DomainResult<&T> {
        self.get(item_id)
            .ok_or_else(|| DomainError::item_not_found(document_id, item_id))
    }

    /// Append an item. On a totals overflow the list is left unchanged.
    pub fn push(&mut self, item: T) -> DomainResult<()> {
        self.totals = DocumentTotals::from_items(
            self.items.iter().chain(core::iter::once(&item)).map(|i| i.fields()),
        )?;
        self.items.push(item);
        Ok(())
    }

    pub fn update(
        &mut self,
        document_id: &impl Display,
        item_id: ItemId,
        fields: CommonItemFields,
    ) -> DomainResult<()> {
        self.require(document_id, item_id)?;
        let replacement = &fields;
        let totals = DocumentTotals::from_items(self.items.iter().map(|i| {
            if i.item_id() == item_id {
                replacement
            } else {
                i.fields()
            }
        }))?;
        if let Some(item) = self.items.iter_mut().find(|i| i.item_id() == item_id) {
            item.set_fields(fields);
        }
        self.totals = totals;
        Ok(())
    }

    /// Remove by id; the list is rebuilt by filtering, never spliced by index.
    pub fn remove(&mut self, document_id: &impl Display, item_id: ItemId) -> DomainResult<()> {
        self.require(document_id, item_id)?;
        self.items = core::mem::take(&mut self.items)
            .into_iter()
            .filter(|i| i.item_id() != item_id)
            .collect();
        self.recompute()
    }

    /// Resolve a selection in document order. Every explicitly named id must exist.
    pub fn select(
        &self,
        document_id: &impl Display,
        selection: &ItemSelection,
    ) -> DomainResult<Vec<&T>> {
        match selection {
            ItemSelection::All => Ok(self.items.iter().collect()),
            ItemSelection::Only(ids) => {
                for id in ids {
                    self.require(document_id, *id)?;
                }
                Ok(self
                    .items
                    .iter()
                    .filter(|i| ids.contains(&i.item_id()))
                    .collect())
            }
        }
    }

    /// Copies of the selected items' fields paired with their source ids,
    /// optionally price-adjusted by `adjustment_pct`.
    pub fn copy_selected(
        &self,
        document_id: &impl Display,
        selection: &ItemSelection,
        adjustment_pct: Option<Decimal>,
    ) -> DomainResult<Vec<(ItemId, CommonItemFields)>> {
        self.select(document_id, selection)?
            .into_iter()
            .map(|item| {
                let fields = match adjustment_pct {
                    Some(pct) => item.fields().price_adjusted(pct)?,
                    None => item.fields().clone(),
                };
                Ok((item.item_id(), fields))
            })
            .collect()
    }

    fn recompute(&mut self) -> DomainResult<()> {
        self.totals = DocumentTotals::from_items(self.items.iter().map(|i| i.fields()))?;
        Ok(())
    }
}
