use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use tradeflow_documents::Document;
use tradeflow_sales::{Quotation, SalesOrder};
use tradeflow_workflow::DocumentRepository;

use crate::statistics::{DateRange, count_percent, in_range, percent};

/// How many quotations turned into sales orders, and how fast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationConversion {
    pub total: usize,
    pub converted: usize,
    pub conversion_rate: f64,
    /// Mean time from quotation creation to order creation, in days.
    pub average_days_to_convert: f64,
    pub total_value: Decimal,
    pub converted_value: Decimal,
    pub value_conversion_rate: f64,
}

/// Match each quotation in `range` with the sales order derived from it.
///
/// A failed lookup counts as not converted.
pub fn quotation_conversion(
    quotations: &[Quotation],
    orders: &dyn DocumentRepository<SalesOrder>,
    range: Option<&DateRange>,
) -> QuotationConversion {
    let mut total = 0;
    let mut converted = 0;
    let mut total_value = Decimal::ZERO;
    let mut converted_value = Decimal::ZERO;
    let mut days_to_convert = 0.0;

    for quotation in quotations.iter().filter(|q| in_range(*q, range)) {
        total += 1;
        total_value += quotation.grand_total();

        let order = match orders.get_by_origin_document(quotation.aggregate_id()) {
            Ok(order) => order,
            Err(err) => {
                warn!(
                    quotation_id = %quotation.id_typed(),
                    number = quotation.number(),
                    error = %err,
                    "sales order lookup failed; counting quotation as not converted"
                );
                None
            }
        };
        if let Some(order) = order {
            converted += 1;
            converted_value += quotation.grand_total();
            let elapsed = order.created_at() - quotation.created_at();
            days_to_convert += elapsed.num_seconds() as f64 / 86_400.0;
        }
    }

    QuotationConversion {
        total,
        converted,
        conversion_rate: count_percent(converted, total),
        average_days_to_convert: if converted == 0 {
            0.0
        } else {
            days_to_convert / converted as f64
        },
        total_value,
        converted_value,
        value_conversion_rate: percent(converted_value, total_value),
    }
}
