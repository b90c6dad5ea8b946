//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity**; they are defined
//! entirely by their attribute values.

/// Marker trait for value objects.
///
/// - **Value Object**: no identity (two totals with the same amounts are equal)
/// - **Entity**: has identity (two line items with the same id are the same item)
///
/// Example:
/// - `DocumentTotals { subtotal, discount_total, tax_total, grand_total }` is a value object
/// - `QuotationItem { id: ItemId(...), .. }` is an entity
///
/// To "modify" a value object, build a new one with the new values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
