use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use tradeflow_core::AggregateRoot;
use tradeflow_documents::{DeliveryStatus, Document};
use tradeflow_purchasing::{Delivery, DeliveryId, DeliveryOrigin, PurchaseOrder, Receipt};

use crate::engine::DocumentWorkflow;
use crate::error::WorkflowResult;

impl DocumentWorkflow {
    /// Record received quantities on a delivery.
    ///
    /// For inbound deliveries the purchase order follows to
    /// `partially_received` / `received` while it is still receivable. If the
    /// purchase order cannot be saved the delivery is restored.
    pub fn receive_delivery(
        &self,
        delivery_id: DeliveryId,
        receipts: &[Receipt],
        date: NaiveDate,
    ) -> WorkflowResult<Delivery> {
        self.in_unit_of_work("receive delivery", || {
            let mut delivery: Delivery = self.get(&delivery_id)?;
            let previous = delivery.clone();
            let status = delivery.receive(receipts, date)?;

            let mut purchase = match delivery.origin() {
                DeliveryOrigin::PurchaseOrder(purchase_order_id) => {
                    let mut purchase: PurchaseOrder = self.get(&purchase_order_id)?;
                    if purchase.status().allows_receiving() {
                        purchase.record_receipt_progress(status == DeliveryStatus::Received)?;
                        Some(purchase)
                    } else {
                        debug!(
                            purchase_order_id = %purchase_order_id,
                            status = %purchase.status(),
                            "purchase order no longer receivable; leaving status"
                        );
                        None
                    }
                }
                DeliveryOrigin::SalesOrder(_) => None,
            };

            self.save(&mut delivery)?;
            if let Some(purchase) = purchase.as_mut() {
                if let Err(err) = self.save(purchase) {
                    warn!(
                        delivery_id = %delivery_id,
                        purchase_order_id = %purchase.id_typed(),
                        error = %err,
                        "purchase order update failed; restoring delivery"
                    );
                    let mut restore = previous;
                    restore.set_version(delivery.version());
                    if let Err(cleanup) = self.save(&mut restore) {
                        error!(delivery_id = %delivery_id, error = %cleanup, "delivery restore failed");
                    }
                    return Err(err);
                }
            }

            info!(
                delivery_id = %delivery_id,
                number = delivery.number(),
                status = %status,
                received_date = %date,
                "delivery receipts recorded"
            );
            Ok(delivery)
        })
    }
}
