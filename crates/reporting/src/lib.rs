//! Read-side summaries over document collections.
//!
//! Everything here is computed from documents the caller already loaded; the
//! only repository access is the sales-order lookup behind
//! [`quotation_conversion`].

pub mod aging;
pub mod comparison;
pub mod conversion;
pub mod statistics;

pub use aging::{AgingBucket, AgingBucketSummary, AgingReport, aging_report};
pub use comparison::{PeriodComparison, PeriodSummary, compare_periods};
pub use conversion::{QuotationConversion, quotation_conversion};
pub use statistics::{
    ContactSummary, DateRange, DocumentStatistics, StatusSummary, TopBy, document_statistics,
};
