use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use tradeflow_documents::Document;

use crate::statistics::{DateRange, in_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub range: DateRange,
    pub count: usize,
    pub value: Decimal,
}

impl PeriodSummary {
    fn collect<D: Document>(documents: &[D], range: DateRange) -> Self {
        let (count, value) = documents
            .iter()
            .filter(|d| in_range(*d, Some(&range)))
            .fold((0, Decimal::ZERO), |(count, value), d| {
                (count + 1, value + d.grand_total())
            });
        Self { range, count, value }
    }
}

/// Two periods side by side. Changes are percentages relative to `previous`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: PeriodSummary,
    pub previous: PeriodSummary,
    pub count_change_pct: f64,
    pub value_change_pct: f64,
}

/// `(current - previous) / previous * 100`; 0 when there is no previous value.
fn percent_change(current: Decimal, previous: Decimal) -> f64 {
    if previous.is_zero() {
        return 0.0;
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

pub fn compare_periods<D: Document>(
    documents: &[D],
    current: DateRange,
    previous: DateRange,
) -> PeriodComparison {
    let current = PeriodSummary::collect(documents, current);
    let previous = PeriodSummary::collect(documents, previous);
    PeriodComparison {
        count_change_pct: percent_change(
            Decimal::from(current.count),
            Decimal::from(previous.count),
        ),
        value_change_pct: percent_change(current.value, previous.value),
        current,
        previous,
    }
}
