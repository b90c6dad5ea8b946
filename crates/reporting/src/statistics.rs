//! Count and value summaries for any document type.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use tradeflow_core::{ContactId, DomainError, DomainResult};
use tradeflow_documents::{Document, DocumentStatus};

/// Inclusive calendar range matched against a document's `created_at` date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::validation(format!(
                "date range ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        self.start <= date && date <= self.end
    }
}

pub(crate) fn in_range<D: Document>(document: &D, range: Option<&DateRange>) -> bool {
    range.is_none_or(|r| r.contains(document.created_at()))
}

/// `part / whole * 100`, or 0 for an empty whole.
pub(crate) fn percent(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    (part / whole * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

pub(crate) fn count_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary<S> {
    pub status: S,
    pub count: usize,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub contact_id: ContactId,
    pub count: usize,
    pub value: Decimal,
}

/// Ranking key for [`DocumentStatistics::top_contacts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopBy {
    Value,
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatistics<S> {
    pub count: usize,
    pub total_value: Decimal,
    pub average_value: Decimal,
    /// Present statuses only, in lifecycle order.
    pub by_status: Vec<StatusSummary<S>>,
    /// Documents without a counterparty are not listed.
    pub by_contact: Vec<ContactSummary>,
}

impl<S> DocumentStatistics<S> {
    /// The `n` largest contacts; ties fall back to the other measure.
    pub fn top_contacts(&self, n: usize, by: TopBy) -> Vec<ContactSummary> {
        let mut ranked = self.by_contact.clone();
        ranked.sort_by(|a, b| match by {
            TopBy::Value => b.value.cmp(&a.value).then(b.count.cmp(&a.count)),
            TopBy::Count => b.count.cmp(&a.count).then(b.value.cmp(&a.value)),
        });
        ranked.truncate(n);
        ranked
    }
}

/// Summarize the documents created within `range` (all when `None`).
pub fn document_statistics<D: Document>(
    documents: &[D],
    range: Option<&DateRange>,
) -> DocumentStatistics<D::Status> {
    let mut count = 0;
    let mut total_value = Decimal::ZERO;
    let mut statuses: HashMap<D::Status, (usize, Decimal)> = HashMap::new();
    let mut contacts: HashMap<ContactId, (usize, Decimal)> = HashMap::new();

    for document in documents.iter().filter(|d| in_range(*d, range)) {
        let value = document.grand_total();
        count += 1;
        total_value += value;

        let entry = statuses.entry(document.status()).or_default();
        entry.0 += 1;
        entry.1 += value;

        if let Some(contact_id) = document.contact_id() {
            let entry = contacts.entry(contact_id).or_default();
            entry.0 += 1;
            entry.1 += value;
        }
    }

    let by_status = <D::Status as DocumentStatus>::ALL
        .iter()
        .filter_map(|status| {
            statuses.get(status).map(|&(count, value)| StatusSummary {
                status: *status,
                count,
                value,
            })
        })
        .collect();

    let mut by_contact: Vec<ContactSummary> = contacts
        .into_iter()
        .map(|(contact_id, (count, value))| ContactSummary {
            contact_id,
            count,
            value,
        })
        .collect();
    by_contact.sort_by(|a, b| b.value.cmp(&a.value).then(a.contact_id.cmp(&b.contact_id)));

    let average_value = if count == 0 {
        Decimal::ZERO
    } else {
        (total_value / Decimal::from(count)).round_dp(2)
    };

    DocumentStatistics {
        count,
        total_value,
        average_value,
        by_status,
        by_contact,
    }
}
