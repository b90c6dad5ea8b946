//! Deliveries: unpriced shipments raised against a sales order (outbound) or a
//! purchase order (inbound), tracking received quantities per line.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{
    AggregateId, AggregateRoot, ContactId, DocumentType, DomainError, DomainResult, Entity, ItemId,
    ProductId,
};
use tradeflow_documents::{
    CloneOptions, DeliveryStatus, Document, Duplicate, LineItem, SalesOrderStatus,
    apply_transition,
};
use tradeflow_sales::{SalesOrder, SalesOrderId};

use crate::order::{PurchaseOrder, PurchaseOrderId};

/// Delivery identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub AggregateId);

impl DeliveryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl From<AggregateId> for DeliveryId {
    fn from(value: AggregateId) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The order a delivery fulfils.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum DeliveryOrigin {
    PurchaseOrder(PurchaseOrderId),
    SalesOrder(SalesOrderId),
}

impl DeliveryOrigin {
    pub fn aggregate_id(&self) -> AggregateId {
        match self {
            DeliveryOrigin::PurchaseOrder(id) => id.0,
            DeliveryOrigin::SalesOrder(id) => id.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: String,
}

/// Receipt progress of one delivery line, derived from its quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryItemStatus {
    Pending,
    Partial,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub id: ItemId,
    /// Line of the originating order.
    pub source_item_id: ItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
    received_qty: i64,
}

impl DeliveryItem {
    fn shipped_from(source: &impl LineItem, quantity: i64) -> Self {
        let fields = source.fields();
        Self {
            id: ItemId::new(),
            source_item_id: source.item_id(),
            product_id: fields.product_id(),
            product_name: fields.product_name().to_string(),
            product_code: fields.product_code().to_string(),
            quantity,
            received_qty: 0,
        }
    }

    pub fn received_qty(&self) -> i64 {
        self.received_qty
    }

    pub fn outstanding_qty(&self) -> i64 {
        self.quantity - self.received_qty
    }

    pub fn status(&self) -> DeliveryItemStatus {
        if self.received_qty == 0 {
            DeliveryItemStatus::Pending
        } else if self.received_qty < self.quantity {
            DeliveryItemStatus::Partial
        } else {
            DeliveryItemStatus::Complete
        }
    }
}

impl Entity for DeliveryItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

/// Requested shipment quantity for one sales order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLine {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Quantity received against one delivery line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Header data shared by both derivations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPlan {
    #[serde(default)]
    pub shipping: ShippingInfo,
    pub planned_date: Option<NaiveDate>,
}

/// Aggregate root: Delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    id: DeliveryId,
    number: String,
    origin: DeliveryOrigin,
    contact_id: ContactId,
    status: DeliveryStatus,
    planned_date: Option<NaiveDate>,
    received_date: Option<NaiveDate>,
    shipping: ShippingInfo,
    items: Vec<DeliveryItem>,
    notes: String,
    created_at: DateTime<Utc>,
    version: u64,
}

impl Delivery {
    fn with_items(
        id: DeliveryId,
        number: String,
        origin: DeliveryOrigin,
        contact_id: ContactId,
        plan: DeliveryPlan,
        items: Vec<DeliveryItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::empty_document(DocumentType::Delivery, "create delivery"));
        }
        Ok(Self {
            id,
            number,
            origin,
            contact_id,
            status: DeliveryStatus::Draft,
            planned_date: plan.planned_date,
            received_date: None,
            shipping: plan.shipping,
            items,
            notes: String::new(),
            created_at: now,
            version: 0,
        })
    }

    /// Ship the requested lines of a confirmed or processing sales order.
    ///
    /// Requests naming the same order line are summed first. Each order line
    /// then ships `min(requested, ordered)`, never below zero; lines that end
    /// up at zero are dropped.
    pub fn from_sales_order(
        order: &SalesOrder,
        lines: &[DeliveryLine],
        plan: DeliveryPlan,
        id: DeliveryId,
        number: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        order.ensure_status(SalesOrderStatus::allows_delivery, "create delivery")?;

        let mut requested: Vec<(ItemId, i64)> = Vec::with_capacity(lines.len());
        for line in lines {
            order.lines().require(&order.id_typed(), line.item_id)?;
            let quantity = line.quantity.max(0);
            match requested.iter_mut().find(|(id, _)| *id == line.item_id) {
                Some((_, total)) => *total = total.saturating_add(quantity),
                None => requested.push((line.item_id, quantity)),
            }
        }

        let mut items = Vec::with_capacity(requested.len());
        for (item_id, quantity) in requested {
            let source = order.lines().require(&order.id_typed(), item_id)?;
            let quantity = quantity.min(source.fields.quantity());
            if quantity > 0 {
                items.push(DeliveryItem::shipped_from(source, quantity));
            }
        }

        Self::with_items(
            id,
            number,
            DeliveryOrigin::SalesOrder(order.id_typed()),
            order.contact_id_typed(),
            plan,
            items,
            now,
        )
    }

    /// Inbound delivery for every line of a purchase order, in full. Each
    /// order line yields exactly one delivery line.
    pub fn from_purchase_order(
        order: &PurchaseOrder,
        plan: DeliveryPlan,
        id: DeliveryId,
        number: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        order.ensure_receivable("create delivery")?;

        let items = order
            .items()
            .iter()
            .map(|item| DeliveryItem::shipped_from(item, item.fields.quantity()))
            .collect();

        Self::with_items(
            id,
            number,
            DeliveryOrigin::PurchaseOrder(order.id_typed()),
            order.supplier_id(),
            plan,
            items,
            now,
        )
    }

    pub fn id_typed(&self) -> DeliveryId {
        self.id
    }

    pub fn origin(&self) -> DeliveryOrigin {
        self.origin
    }

    pub fn planned_date(&self) -> Option<NaiveDate> {
        self.planned_date
    }

    pub fn received_date(&self) -> Option<NaiveDate> {
        self.received_date
    }

    pub fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    pub fn items(&self) -> &[DeliveryItem] {
        &self.items
    }

    pub fn is_fully_received(&self) -> bool {
        self.items
            .iter()
            .all(|i| i.status() == DeliveryItemStatus::Complete)
    }

    /// Record received quantities and advance to `partially_received` or
    /// `received`.
    ///
    /// All receipts are checked before any is applied: an unknown line, a
    /// non-positive quantity or a cumulative quantity above the shipped one
    /// rejects the whole call.
    pub fn receive(&mut self, receipts: &[Receipt], date: NaiveDate) -> DomainResult<DeliveryStatus> {
        if !self.status.accepts_receipts() {
            return Err(DomainError::invalid_state(
                DocumentType::Delivery,
                self.id,
                self.status,
                "receive goods",
            ));
        }
        if receipts.is_empty() {
            return Err(DomainError::validation("no receipts given"));
        }

        let mut received: Vec<i64> = self.items.iter().map(|i| i.received_qty).collect();
        for receipt in receipts {
            if receipt.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "received quantity must be positive, got {}",
                    receipt.quantity
                )));
            }
            let idx = self
                .items
                .iter()
                .position(|i| i.id == receipt.item_id)
                .ok_or_else(|| DomainError::item_not_found(self.id, receipt.item_id))?;
            let outstanding = self.items[idx].quantity - received[idx];
            if receipt.quantity > outstanding {
                return Err(DomainError::invariant(format!(
                    "received quantity {} exceeds outstanding quantity {} for item {}",
                    receipt.quantity, outstanding, receipt.item_id
                )));
            }
            received[idx] += receipt.quantity;
        }

        for (item, qty) in self.items.iter_mut().zip(received) {
            item.received_qty = qty;
        }
        self.received_date = Some(date);

        let next = if self.is_fully_received() {
            DeliveryStatus::Received
        } else {
            DeliveryStatus::PartiallyReceived
        };
        apply_transition(&mut self.status, next, None, &mut self.notes)?;
        Ok(self.status)
    }
}

impl AggregateRoot for Delivery {
    type Id = DeliveryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Document for Delivery {
    type Status = DeliveryStatus;

    fn aggregate_id(&self) -> AggregateId {
        self.id.0
    }

    fn number(&self) -> &str {
        &self.number
    }

    fn status(&self) -> DeliveryStatus {
        self.status
    }

    fn contact_id(&self) -> Option<ContactId> {
        Some(self.contact_id)
    }

    fn origin_id(&self) -> Option<AggregateId> {
        Some(self.origin.aggregate_id())
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Deliveries carry no prices.
    fn grand_total(&self) -> Decimal {
        Decimal::ZERO
    }

    fn notes(&self) -> &str {
        &self.notes
    }

    fn transition(&mut self, to: DeliveryStatus, reason: Option<&str>) -> DomainResult<()> {
        if to == DeliveryStatus::Received && to != self.status && !self.is_fully_received() {
            return Err(DomainError::validation(
                "delivery has outstanding quantities; record receipts instead",
            ));
        }
        apply_transition(&mut self.status, to, reason, &mut self.notes).map(|_| ())
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// A copy ships the same lines of the same order again: fresh line ids,
/// nothing received, back in draft. Deliveries carry no prices, so a price
/// adjustment has no effect; `date_override` sets the planned date.
impl Duplicate for Delivery {
    fn duplicate(
        &self,
        id: DeliveryId,
        number: String,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if let Some(subset) = &options.item_subset {
            if let Some(missing) = subset.iter().find(|id| !self.items.iter().any(|i| i.id == **id)) {
                return Err(DomainError::item_not_found(self.id, *missing));
            }
        }
        let items: Vec<_> = self
            .items
            .iter()
            .filter(|i| {
                options
                    .item_subset
                    .as_ref()
                    .is_none_or(|subset| subset.contains(&i.id))
            })
            .map(|i| DeliveryItem {
                id: ItemId::new(),
                received_qty: 0,
                ..i.clone()
            })
            .collect();
        if items.is_empty() {
            return Err(DomainError::empty_document(DocumentType::Delivery, "clone"));
        }

        let mut copy = Self::with_items(
            id,
            number,
            self.origin,
            options.contact_override.unwrap_or(self.contact_id),
            DeliveryPlan {
                shipping: self.shipping.clone(),
                planned_date: options.date_override.or(self.planned_date),
            },
            items,
            now,
        )?;
        if options.copy_notes {
            copy.notes = self.notes.clone();
        }
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::SupplierTerms;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tradeflow_documents::{ItemEditable, ItemSelection, LineInput, PurchaseOrderStatus};
    use tradeflow_sales::SalesOrderTerms;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn confirmed_order(quantities: &[i64]) -> SalesOrder {
        let mut so = SalesOrder::new(
            SalesOrderId::new(AggregateId::new()),
            "SO-1".to_string(),
            ContactId::new(),
            SalesOrderTerms {
                expected_date: date(20),
                payment_terms: String::new(),
                shipping_address: "Depot 4".to_string(),
            },
            test_time(),
        );
        for (n, q) in quantities.iter().enumerate() {
            so.add_item(LineInput {
                product_id: ProductId::new(),
                product_name: format!("Part {n}"),
                product_code: format!("P{n}"),
                quantity: *q,
                unit_price: dec!(3.00),
                discount_pct: dec!(0),
                tax_pct: dec!(0),
            })
            .unwrap();
        }
        so.transition(SalesOrderStatus::Confirmed, None).unwrap();
        so
    }

    fn ship(so: &SalesOrder, lines: &[DeliveryLine]) -> DomainResult<Delivery> {
        Delivery::from_sales_order(
            so,
            lines,
            DeliveryPlan::default(),
            DeliveryId::new(AggregateId::new()),
            "DEL-1".to_string(),
            test_time(),
        )
    }

    fn in_transit(so: &SalesOrder) -> Delivery {
        let lines: Vec<_> = so
            .items()
            .iter()
            .map(|i| DeliveryLine {
                item_id: i.id,
                quantity: i.fields.quantity(),
            })
            .collect();
        let mut d = ship(so, &lines).unwrap();
        d.transition(DeliveryStatus::InTransit, None).unwrap();
        d
    }

    #[test]
    fn requested_quantities_are_clamped_to_order() {
        let so = confirmed_order(&[5, 3, 2]);
        let ids: Vec<_> = so.items().iter().map(|i| i.id).collect();

        let d = ship(
            &so,
            &[
                DeliveryLine { item_id: ids[0], quantity: 8 },
                DeliveryLine { item_id: ids[1], quantity: 2 },
                DeliveryLine { item_id: ids[2], quantity: -4 },
            ],
        )
        .unwrap();

        assert_eq!(d.items().len(), 2);
        assert_eq!(d.items()[0].quantity, 5);
        assert_eq!(d.items()[1].quantity, 2);
        assert_eq!(d.items()[0].source_item_id, ids[0]);
        assert_eq!(d.origin(), DeliveryOrigin::SalesOrder(so.id_typed()));
        assert!(d.items().iter().all(|i| i.status() == DeliveryItemStatus::Pending));
    }

    #[test]
    fn repeated_lines_are_summed_before_clamping() {
        let so = confirmed_order(&[5, 4]);
        let ids: Vec<_> = so.items().iter().map(|i| i.id).collect();

        let d = ship(
            &so,
            &[
                DeliveryLine { item_id: ids[0], quantity: 5 },
                DeliveryLine { item_id: ids[1], quantity: 1 },
                DeliveryLine { item_id: ids[0], quantity: 5 },
                DeliveryLine { item_id: ids[1], quantity: 2 },
                DeliveryLine { item_id: ids[1], quantity: i64::MAX },
            ],
        )
        .unwrap();

        assert_eq!(d.items().len(), 2);
        assert_eq!(d.items()[0].source_item_id, ids[0]);
        assert_eq!(d.items()[0].quantity, 5);
        assert_eq!(d.items()[1].quantity, 4);

        let partial = ship(
            &so,
            &[
                DeliveryLine { item_id: ids[1], quantity: 1 },
                DeliveryLine { item_id: ids[1], quantity: -3 },
                DeliveryLine { item_id: ids[1], quantity: 2 },
            ],
        )
        .unwrap();
        assert_eq!(partial.items().len(), 1);
        assert_eq!(partial.items()[0].quantity, 3);
    }

    #[test]
    fn all_zero_lines_fail_as_empty() {
        let so = confirmed_order(&[5]);
        let err = ship(&so, &[DeliveryLine { item_id: so.items()[0].id, quantity: 0 }]).unwrap_err();
        assert!(matches!(err, DomainError::EmptyDocument { document_type: DocumentType::Delivery, .. }));
    }

    #[test]
    fn unknown_line_is_rejected() {
        let so = confirmed_order(&[5]);
        let err = ship(&so, &[DeliveryLine { item_id: ItemId::new(), quantity: 1 }]).unwrap_err();
        assert!(matches!(err, DomainError::ItemNotFound { .. }));
    }

    #[test]
    fn receipts_advance_status() {
        let so = confirmed_order(&[5, 3]);
        let mut d = in_transit(&so);
        let (a, b) = (d.items()[0].id, d.items()[1].id);

        let status = d.receive(&[Receipt { item_id: a, quantity: 5 }], date(2)).unwrap();
        assert_eq!(status, DeliveryStatus::PartiallyReceived);
        assert_eq!(d.items()[0].status(), DeliveryItemStatus::Complete);
        assert_eq!(d.items()[1].status(), DeliveryItemStatus::Pending);

        d.receive(&[Receipt { item_id: b, quantity: 1 }], date(3)).unwrap();
        assert_eq!(d.items()[1].status(), DeliveryItemStatus::Partial);

        let status = d.receive(&[Receipt { item_id: b, quantity: 2 }], date(4)).unwrap();
        assert_eq!(status, DeliveryStatus::Received);
        assert_eq!(d.received_date(), Some(date(4)));
    }

    #[test]
    fn over_receipt_leaves_delivery_untouched() {
        let so = confirmed_order(&[5, 3]);
        let mut d = in_transit(&so);
        let (a, b) = (d.items()[0].id, d.items()[1].id);
        let before = d.clone();

        let err = d
            .receive(
                &[Receipt { item_id: a, quantity: 2 }, Receipt { item_id: b, quantity: 4 }],
                date(2),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(d, before);
    }

    #[test]
    fn huge_receipt_after_partial_one_is_rejected() {
        let so = confirmed_order(&[5]);
        let mut d = in_transit(&so);
        let item = d.items()[0].id;

        d.receive(&[Receipt { item_id: item, quantity: 1 }], date(2)).unwrap();
        let before = d.clone();
        let err = d
            .receive(&[Receipt { item_id: item, quantity: i64::MAX }], date(3))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(d, before);
        assert_eq!(d.items()[0].received_qty(), 1);

        let err = d
            .receive(
                &[Receipt { item_id: item, quantity: 3 }, Receipt { item_id: item, quantity: i64::MAX }],
                date(3),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(d.items()[0].received_qty(), 1);
    }

    #[test]
    fn draft_delivery_does_not_accept_receipts() {
        let so = confirmed_order(&[1]);
        let mut d = ship(&so, &[DeliveryLine { item_id: so.items()[0].id, quantity: 1 }]).unwrap();
        let item = d.items()[0].id;
        let err = d.receive(&[Receipt { item_id: item, quantity: 1 }], date(1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
    }

    #[test]
    fn manual_received_requires_complete_items() {
        let so = confirmed_order(&[2]);
        let mut d = in_transit(&so);
        assert!(d.transition(DeliveryStatus::Received, None).is_err());
        d.transition(DeliveryStatus::Cancelled, Some("lost in transit")).unwrap();
        assert_eq!(d.notes(), "Cancellation reason: lost in transit");
    }

    #[test]
    fn purchase_order_delivery_ships_full_quantities() {
        let so = confirmed_order(&[6, 1]);
        let mut po = PurchaseOrder::from_sales_order(
            &so,
            &ItemSelection::All,
            SupplierTerms {
                supplier_id: ContactId::new(),
                expected_date: date(9),
                keep_unit_prices: false,
            },
            PurchaseOrderId::new(AggregateId::new()),
            "PO-1".to_string(),
            test_time(),
        )
        .unwrap();

        let plan = DeliveryPlan {
            shipping: ShippingInfo {
                carrier: "Freightline".to_string(),
                ..ShippingInfo::default()
            },
            planned_date: Some(date(12)),
        };
        let not_yet = Delivery::from_purchase_order(
            &po,
            plan.clone(),
            DeliveryId::new(AggregateId::new()),
            "DEL-2".to_string(),
            test_time(),
        );
        assert!(not_yet.is_err());

        po.transition(PurchaseOrderStatus::Sent, None).unwrap();
        po.transition(PurchaseOrderStatus::Confirmed, None).unwrap();
        let d = Delivery::from_purchase_order(
            &po,
            plan,
            DeliveryId::new(AggregateId::new()),
            "DEL-2".to_string(),
            test_time(),
        )
        .unwrap();

        assert_eq!(d.items().iter().map(|i| i.quantity).collect::<Vec<_>>(), vec![6, 1]);
        assert_eq!(d.contact_id(), Some(po.supplier_id()));
        assert_eq!(d.origin_id(), Some(po.aggregate_id()));
        assert_eq!(d.shipping().carrier, "Freightline");
        assert_eq!(d.planned_date(), Some(date(12)));
    }

    #[test]
    fn duplicate_resets_receipts_and_keeps_origin() {
        let so = confirmed_order(&[5, 3]);
        let mut d = in_transit(&so);
        let (a, b) = (d.items()[0].id, d.items()[1].id);
        d.receive(&[Receipt { item_id: a, quantity: 2 }], date(2)).unwrap();
        d.transition(DeliveryStatus::Cancelled, Some("damaged")).unwrap();

        let copy = d
            .duplicate(
                DeliveryId::new(AggregateId::new()),
                "DEL-2".to_string(),
                &CloneOptions {
                    date_override: Some(date(15)),
                    item_subset: Some(vec![a]),
                    ..CloneOptions::default()
                },
                test_time(),
            )
            .unwrap();

        assert_eq!(copy.status(), DeliveryStatus::Draft);
        assert_eq!(copy.origin(), d.origin());
        assert_eq!(copy.contact_id(), d.contact_id());
        assert_eq!(copy.planned_date(), Some(date(15)));
        assert_eq!(copy.received_date(), None);
        assert_eq!(copy.notes(), "");
        assert_eq!(copy.version(), 0);
        assert_eq!(copy.items().len(), 1);
        assert_ne!(copy.items()[0].id, a);
        assert_eq!(copy.items()[0].source_item_id, d.items()[0].source_item_id);
        assert_eq!(copy.items()[0].quantity, 5);
        assert_eq!(copy.items()[0].received_qty(), 0);

        let with_notes = d
            .duplicate(
                DeliveryId::new(AggregateId::new()),
                "DEL-3".to_string(),
                &CloneOptions { copy_notes: true, ..CloneOptions::default() },
                test_time(),
            )
            .unwrap();
        assert_eq!(with_notes.items().len(), 2);
        assert_eq!(with_notes.items()[1].quantity, 3);
        assert_eq!(with_notes.notes(), d.notes());

        let missing = ItemId::new();
        let err = d
            .duplicate(
                DeliveryId::new(AggregateId::new()),
                "DEL-4".to_string(),
                &CloneOptions { item_subset: Some(vec![b, missing]), ..CloneOptions::default() },
                test_time(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::ItemNotFound { item_id, .. } if item_id == missing));

        let err = d
            .duplicate(
                DeliveryId::new(AggregateId::new()),
                "DEL-5".to_string(),
                &CloneOptions { item_subset: Some(vec![]), ..CloneOptions::default() },
                test_time(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::EmptyDocument { .. }));
    }

    proptest! {
        #[test]
        fn received_never_exceeds_shipped(
            shipped in 1i64..20,
            receipts in proptest::collection::vec(1i64..8, 1..10),
        ) {
            let so = confirmed_order(&[shipped]);
            let mut d = in_transit(&so);
            let item = d.items()[0].id;
            for qty in receipts {
                let before = d.items()[0].received_qty();
                match d.receive(&[Receipt { item_id: item, quantity: qty }], date(5)) {
                    Ok(_) => prop_assert_eq!(d.items()[0].received_qty(), before + qty),
                    Err(_) => prop_assert_eq!(d.items()[0].received_qty(), before),
                }
                prop_assert!(d.items()[0].received_qty() <= shipped);
                if d.status() == DeliveryStatus::Received {
                    break;
                }
            }
        }
    }
}
