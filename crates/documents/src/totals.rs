//! Line and document financial totals.
//!
//! The calculation order is fixed; changing it changes rounding behavior once
//! amounts are persisted at limited precision:
//!
//! 1. `line_subtotal = quantity * unit_price`
//! 2. `discount_amount = line_subtotal * discount_pct / 100`
//! 3. `taxable_amount = line_subtotal - discount_amount`
//! 4. `tax_amount = taxable_amount * tax_pct / 100`
//! 5. `total = taxable_amount + tax_amount`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{DomainError, DomainResult, ValueObject};

use crate::item::CommonItemFields;

/// Every intermediate amount of one line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAmounts {
    pub line_subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl ValueObject for ItemAmounts {}

/// Aggregate totals of a document's item list.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
}

impl ValueObject for DocumentTotals {}

pub(crate) fn validate(
    quantity: i64,
    unit_price: Decimal,
    discount_pct: Decimal,
    tax_pct: Decimal,
) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    if unit_price < Decimal::ZERO {
        return Err(DomainError::validation("unit_price must not be negative"));
    }
    if discount_pct < Decimal::ZERO || discount_pct > Decimal::ONE_HUNDRED {
        return Err(DomainError::validation(
            "discount percentage must be between 0 and 100",
        ));
    }
    if tax_pct < Decimal::ZERO {
        return Err(DomainError::validation("tax percentage must not be negative"));
    }
    Ok(())
}

fn overflow(step: &str) -> DomainError {
    DomainError::validation(format!("{step} overflow"))
}

/// `amount * pct / 100` without panicking on out-of-range values.
fn percent_of(amount: Decimal, pct: Decimal, step: &str) -> DomainResult<Decimal> {
    amount
        .checked_mul(pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| overflow(step))
}

/// Compute every amount of a line, rejecting malformed input.
pub fn compute_item_amounts(
    quantity: i64,
    unit_price: Decimal,
    discount_pct: Decimal,
    tax_pct: Decimal,
) -> DomainResult<ItemAmounts> {
    validate(quantity, unit_price, discount_pct, tax_pct)?;
    line_amounts(quantity, unit_price, discount_pct, tax_pct)
}

/// Arithmetic of the five steps. Every step is checked; an amount outside
/// the decimal range is a validation error.
pub(crate) fn line_amounts(
    quantity: i64,
    unit_price: Decimal,
    discount_pct: Decimal,
    tax_pct: Decimal,
) -> DomainResult<ItemAmounts> {
    let line_subtotal = Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| overflow("line subtotal"))?;
    let discount_amount = percent_of(line_subtotal, discount_pct, "discount amount")?;
    let taxable_amount = line_subtotal
        .checked_sub(discount_amount)
        .ok_or_else(|| overflow("taxable amount"))?;
    let tax_amount = percent_of(taxable_amount, tax_pct, "tax amount")?;
    let total = taxable_amount
        .checked_add(tax_amount)
        .ok_or_else(|| overflow("line total"))?;

    Ok(ItemAmounts {
        line_subtotal,
        discount_amount,
        taxable_amount,
        tax_amount,
        total,
    })
}

pub fn compute_item_total(
    quantity: i64,
    unit_price: Decimal,
    discount_pct: Decimal,
    tax_pct: Decimal,
) -> DomainResult<Decimal> {
    compute_item_amounts(quantity, unit_price, discount_pct, tax_pct).map(|a| a.total)
}

impl DocumentTotals {
    fn checked_add(self, a: &ItemAmounts) -> DomainResult<Self> {
        let sum = |acc: Decimal, v: Decimal, what: &str| {
            acc.checked_add(v).ok_or_else(|| overflow(what))
        };
        Ok(DocumentTotals {
            subtotal: sum(self.subtotal, a.line_subtotal, "document subtotal")?,
            discount_total: sum(self.discount_total, a.discount_amount, "document discount")?,
            tax_total: sum(self.tax_total, a.tax_amount, "document tax")?,
            grand_total: sum(self.grand_total, a.total, "document total")?,
        })
    }

    /// Field-wise sum over already validated lines.
    pub fn from_items<'a, I>(items: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = &'a CommonItemFields>,
    {
        items
            .into_iter()
            .try_fold(DocumentTotals::default(), |acc, item| {
                acc.checked_add(&item.amounts())
            })
    }
}
