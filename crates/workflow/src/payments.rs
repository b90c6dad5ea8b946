use tracing::{error, info, warn};

use tradeflow_core::PaymentId;
use tradeflow_documents::Document;
use tradeflow_invoicing::{Invoice, InvoiceId, NewPayment, Payment};

use crate::engine::DocumentWorkflow;
use crate::error::WorkflowResult;

/// A stored payment together with the invoice it was applied to.
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    pub invoice: Invoice,
}

impl DocumentWorkflow {
    /// Apply a payment to an invoice and store it.
    ///
    /// Rejected unless the invoice is `sent`, `partially_paid` or `overdue`
    /// and `0 < amount <= balance`. If the invoice cannot be saved the stored
    /// payment is deleted again.
    pub fn record_payment(
        &self,
        invoice_id: InvoiceId,
        input: NewPayment,
    ) -> WorkflowResult<RecordedPayment> {
        self.in_unit_of_work("record payment", || {
            let mut invoice: Invoice = self.get(&invoice_id)?;
            let payment = Payment::new(PaymentId::new(), invoice_id, input, self.now())?;
            invoice.apply_payment(payment.amount)?;

            let payments = &self.repositories().payments;
            payments.create(&payment)?;
            if let Err(err) = self.save(&mut invoice) {
                warn!(
                    invoice_id = %invoice_id,
                    payment_id = %payment.id,
                    error = %err,
                    "invoice update failed; deleting payment"
                );
                if let Err(cleanup) = payments.delete(payment.id) {
                    error!(payment_id = %payment.id, error = %cleanup, "compensating delete failed");
                }
                return Err(err);
            }

            info!(
                invoice_id = %invoice_id,
                number = invoice.number(),
                payment_id = %payment.id,
                amount = %payment.amount,
                balance = %invoice.balance(),
                status = %invoice.status(),
                "payment recorded"
            );
            Ok(RecordedPayment { payment, invoice })
        })
    }

    pub fn payments_for_invoice(&self, invoice_id: InvoiceId) -> WorkflowResult<Vec<Payment>> {
        Ok(self.repositories().payments.list_by_invoice(invoice_id)?)
    }

    /// Recompute an invoice's paid amount from its stored payments.
    pub fn reconcile_invoice_payments(&self, invoice_id: InvoiceId) -> WorkflowResult<Invoice> {
        let mut invoice: Invoice = self.get(&invoice_id)?;
        let payments = self.payments_for_invoice(invoice_id)?;
        let before = invoice.amount_paid();
        invoice.reconcile_payments(&payments)?;
        self.save(&mut invoice)?;

        if before != invoice.amount_paid() {
            warn!(
                invoice_id = %invoice_id,
                number = invoice.number(),
                recorded = %before,
                reconciled = %invoice.amount_paid(),
                "invoice paid amount corrected"
            );
        }
        Ok(invoice)
    }
}
