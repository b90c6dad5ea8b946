//! Document-to-document derivations: quotation → sales order → purchase
//! order / invoice / delivery, and purchase order → delivery.
//!
//! The target aggregates own the copy rules; this module loads the source,
//! allocates id and number, persists, and moves the source along when the
//! derivation implies it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use tradeflow_core::{AggregateId, ContactId, DocumentType, DomainError};
use tradeflow_documents::{Document, ItemSelection, QuotationStatus, SalesOrderStatus};
use tradeflow_invoicing::{Invoice, InvoiceDates, InvoiceId};
use tradeflow_purchasing::{
    Delivery, DeliveryId, DeliveryLine, DeliveryPlan, PurchaseOrder, PurchaseOrderId,
    ShippingInfo, SupplierTerms,
};
use tradeflow_sales::{Quotation, QuotationId, SalesOrder, SalesOrderId, SalesOrderTerms};

use crate::engine::DocumentWorkflow;
use crate::error::WorkflowResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertQuotation {
    pub expected_date: NaiveDate,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub shipping_address: String,
    /// Overrides `WorkflowConfig::accept_quotation_on_conversion`.
    #[serde(default)]
    pub accept_quotation: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub supplier_id: ContactId,
    #[serde(default)]
    pub items: ItemSelection,
    pub expected_date: NaiveDate,
    /// Overrides `WorkflowConfig::keep_purchase_prices`.
    #[serde(default)]
    pub keep_unit_prices: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    #[serde(default)]
    pub items: ItemSelection,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDelivery {
    pub lines: Vec<DeliveryLine>,
    #[serde(default)]
    pub shipping: ShippingInfo,
    pub planned_date: Option<NaiveDate>,
}

impl DocumentWorkflow {
    /// Create a draft sales order carrying every quotation line verbatim.
    ///
    /// The quotation must be in a configured convertible status and must not
    /// have been converted before. When acceptance applies, a `draft`
    /// quotation passes through `sent` on its way to `accepted`.
    pub fn convert_quotation_to_sales_order(
        &self,
        quotation_id: QuotationId,
        request: ConvertQuotation,
    ) -> WorkflowResult<SalesOrder> {
        self.in_unit_of_work("convert quotation", || {
            let mut quotation: Quotation = self.get(&quotation_id)?;
            let status = quotation.status();
            if !self.config().is_convertible(status) {
                return Err(DomainError::invalid_state(
                    DocumentType::Quotation,
                    quotation_id,
                    status,
                    "convert to sales order",
                )
                .into());
            }
            if self
                .repo::<SalesOrder>()
                .get_by_origin_document(quotation.aggregate_id())?
                .is_some()
            {
                return Err(DomainError::invalid_state(
                    DocumentType::Quotation,
                    quotation_id,
                    status,
                    "convert an already converted quotation",
                )
                .into());
            }

            let mut order = SalesOrder::from_quotation(
                &quotation,
                SalesOrderId::new(AggregateId::new()),
                self.next_number(DocumentType::SalesOrder),
                SalesOrderTerms {
                    expected_date: request.expected_date,
                    payment_terms: request.payment_terms,
                    shipping_address: request.shipping_address,
                },
                self.now(),
            )?;

            let accept = request
                .accept_quotation
                .unwrap_or(self.config().accept_quotation_on_conversion);
            if accept {
                if status == QuotationStatus::Draft {
                    quotation.transition(QuotationStatus::Sent, None)?;
                }
                quotation.transition(QuotationStatus::Accepted, None)?;
                self.insert_with_source_update("convert quotation", &mut order, &mut quotation)?;
            } else {
                self.insert(&mut order)?;
            }

            info!(
                quotation_id = %quotation_id,
                quotation_number = quotation.number(),
                order_id = %order.id_typed(),
                number = order.number(),
                grand_total = %order.grand_total(),
                accepted = accept,
                "quotation converted to sales order"
            );
            Ok(order)
        })
    }

    /// Create a draft purchase order from the selected sales order lines.
    pub fn create_purchase_order_from_sales_order(
        &self,
        order_id: SalesOrderId,
        request: CreatePurchaseOrder,
    ) -> WorkflowResult<PurchaseOrder> {
        self.in_unit_of_work("create purchase order", || {
            let order: SalesOrder = self.get(&order_id)?;
            let keep_unit_prices = request
                .keep_unit_prices
                .unwrap_or(self.config().keep_purchase_prices);

            let mut purchase = PurchaseOrder::from_sales_order(
                &order,
                &request.items,
                SupplierTerms {
                    supplier_id: request.supplier_id,
                    expected_date: request.expected_date,
                    keep_unit_prices,
                },
                PurchaseOrderId::new(AggregateId::new()),
                self.next_number(DocumentType::PurchaseOrder),
                self.now(),
            )?;
            self.insert(&mut purchase)?;

            info!(
                order_id = %order_id,
                purchase_order_id = %purchase.id_typed(),
                number = purchase.number(),
                items = purchase.items().len(),
                keep_unit_prices,
                "purchase order created from sales order"
            );
            Ok(purchase)
        })
    }

    /// Create a draft invoice for the selected sales order lines at full price.
    pub fn create_invoice_from_sales_order(
        &self,
        order_id: SalesOrderId,
        request: CreateInvoice,
    ) -> WorkflowResult<Invoice> {
        self.in_unit_of_work("create invoice", || {
            let order: SalesOrder = self.get(&order_id)?;
            let mut invoice = Invoice::from_sales_order(
                &order,
                &request.items,
                InvoiceDates {
                    issue_date: request.issue_date,
                    due_date: request.due_date,
                },
                InvoiceId::new(AggregateId::new()),
                self.next_number(DocumentType::Invoice),
                self.now(),
            )?;
            self.insert(&mut invoice)?;

            info!(
                order_id = %order_id,
                invoice_id = %invoice.id_typed(),
                number = invoice.number(),
                grand_total = %invoice.grand_total(),
                "invoice created from sales order"
            );
            Ok(invoice)
        })
    }

    /// Ship sales order lines; a `confirmed` order moves to `processing`.
    pub fn create_delivery_from_sales_order(
        &self,
        order_id: SalesOrderId,
        request: CreateDelivery,
    ) -> WorkflowResult<Delivery> {
        self.in_unit_of_work("create delivery", || {
            let mut order: SalesOrder = self.get(&order_id)?;
            let mut delivery = Delivery::from_sales_order(
                &order,
                &request.lines,
                DeliveryPlan {
                    shipping: request.shipping,
                    planned_date: request.planned_date,
                },
                DeliveryId::new(AggregateId::new()),
                self.next_number(DocumentType::Delivery),
                self.now(),
            )?;

            if order.status() == SalesOrderStatus::Confirmed {
                order.transition(SalesOrderStatus::Processing, None)?;
                self.insert_with_source_update("create delivery", &mut delivery, &mut order)?;
            } else {
                self.insert(&mut delivery)?;
            }

            info!(
                order_id = %order_id,
                delivery_id = %delivery.id_typed(),
                number = delivery.number(),
                items = delivery.items().len(),
                order_status = %order.status(),
                "delivery created from sales order"
            );
            Ok(delivery)
        })
    }

    /// Inbound delivery for a confirmed or partially received purchase order.
    pub fn create_delivery_from_purchase_order(
        &self,
        purchase_order_id: PurchaseOrderId,
        plan: DeliveryPlan,
    ) -> WorkflowResult<Delivery> {
        self.in_unit_of_work("create delivery", || {
            let purchase: PurchaseOrder = self.get(&purchase_order_id)?;
            let mut delivery = Delivery::from_purchase_order(
                &purchase,
                plan,
                DeliveryId::new(AggregateId::new()),
                self.next_number(DocumentType::Delivery),
                self.now(),
            )?;
            self.insert(&mut delivery)?;

            info!(
                purchase_order_id = %purchase_order_id,
                delivery_id = %delivery.id_typed(),
                number = delivery.number(),
                "delivery created from purchase order"
            );
            Ok(delivery)
        })
    }
}
