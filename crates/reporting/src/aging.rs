//! Receivables aging.
//!
//! Open invoices are bucketed by how many days past their due date they are
//! as of a given day. Paid and cancelled invoices, and invoices with nothing
//! left to pay, are not receivables and are skipped.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tradeflow_documents::{Document, InvoiceStatus};
use tradeflow_invoicing::Invoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "1-30")]
    Days1To30,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "91+")]
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        Self::Current,
        Self::Days1To30,
        Self::Days31To60,
        Self::Days61To90,
        Self::Over90,
    ];

    /// Not yet due (or due today) is `Current`.
    pub fn for_days_overdue(days: i64) -> Self {
        match days {
            i64::MIN..=0 => Self::Current,
            1..=30 => Self::Days1To30,
            31..=60 => Self::Days31To60,
            61..=90 => Self::Days61To90,
            _ => Self::Over90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Days1To30 => "1-30",
            Self::Days31To60 => "31-60",
            Self::Days61To90 => "61-90",
            Self::Over90 => "91+",
        }
    }
}

impl core::fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingBucketSummary {
    pub bucket: AgingBucket,
    pub count: usize,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    /// Always one entry per bucket, youngest first.
    pub buckets: Vec<AgingBucketSummary>,
    pub total_count: usize,
    pub total_outstanding: Decimal,
}

impl AgingReport {
    pub fn bucket(&self, bucket: AgingBucket) -> AgingBucketSummary {
        self.buckets
            .iter()
            .copied()
            .find(|b| b.bucket == bucket)
            .unwrap_or(AgingBucketSummary {
                bucket,
                count: 0,
                balance: Decimal::ZERO,
            })
    }
}

fn is_receivable(invoice: &Invoice) -> bool {
    !matches!(invoice.status(), InvoiceStatus::Paid | InvoiceStatus::Cancelled)
        && invoice.balance() > Decimal::ZERO
}

pub fn aging_report(invoices: &[Invoice], today: NaiveDate) -> AgingReport {
    let mut buckets: Vec<AgingBucketSummary> = AgingBucket::ALL
        .iter()
        .map(|&bucket| AgingBucketSummary {
            bucket,
            count: 0,
            balance: Decimal::ZERO,
        })
        .collect();
    let mut total_count = 0;
    let mut total_outstanding = Decimal::ZERO;

    for invoice in invoices.iter().filter(|i| is_receivable(i)) {
        let bucket = AgingBucket::for_days_overdue(invoice.days_overdue(today));
        if let Some(entry) = buckets.iter_mut().find(|b| b.bucket == bucket) {
            entry.count += 1;
            entry.balance += invoice.balance();
        }
        total_count += 1;
        total_outstanding += invoice.balance();
    }

    debug!(
        as_of = %today,
        invoices = total_count,
        outstanding = %total_outstanding,
        "aging report computed"
    );
    AgingReport {
        as_of: today,
        buckets,
        total_count,
        total_outstanding,
    }
}
