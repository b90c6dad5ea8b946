//! Purchasing documents: purchase orders and deliveries.
//!
//! This crate contains business rules for the supply side of the workflow and
//! for shipment tracking, implemented purely as deterministic domain logic (no
//! IO, no HTTP, no storage).

pub mod delivery;
pub mod order;

pub use delivery::{
    Delivery, DeliveryId, DeliveryItem, DeliveryItemStatus, DeliveryLine, DeliveryOrigin,
    DeliveryPlan, Receipt, ShippingInfo,
};
pub use order::{PurchaseOrder, PurchaseOrderId, PurchaseOrderItem, SupplierTerms};
