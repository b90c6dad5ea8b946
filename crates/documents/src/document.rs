//! Traits every document aggregate implements.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradeflow_core::{AggregateId, AggregateRoot, ContactId, DocumentType, DomainResult, ItemId};

use crate::item::{ItemSelection, LineInput};
use crate::status::DocumentStatus;

/// A commercial document aggregate: header, status and owned items.
///
/// The workflow and reporting layers program against this trait; status only
/// changes through [`Document::transition`].
pub trait Document: AggregateRoot<Id: Send + Sync> + Clone + Send + Sync + 'static {
    type Status: DocumentStatus;

    const DOCUMENT_TYPE: DocumentType = <Self::Status as DocumentStatus>::DOCUMENT_TYPE;

    fn aggregate_id(&self) -> AggregateId;

    fn number(&self) -> &str;

    fn status(&self) -> Self::Status;

    /// Customer or supplier; `None` for documents without a counterparty.
    fn contact_id(&self) -> Option<ContactId>;

    /// The document this one was derived from, if any.
    fn origin_id(&self) -> Option<AggregateId>;

    fn created_at(&self) -> DateTime<Utc>;

    fn grand_total(&self) -> Decimal;

    fn notes(&self) -> &str;

    /// Move along a legal edge; `reason` is recorded for cancel/reject edges.
    fn transition(&mut self, to: Self::Status, reason: Option<&str>) -> DomainResult<()>;

    /// Repository bookkeeping after a successful write.
    fn set_version(&mut self, version: u64);
}

/// Documents whose items can be edited while in their initial status.
pub trait ItemEditable: Document {
    fn add_item(&mut self, input: LineInput) -> DomainResult<ItemId>;

    fn update_item(&mut self, item_id: ItemId, input: LineInput) -> DomainResult<()>;

    fn remove_item(&mut self, item_id: ItemId) -> DomainResult<()>;
}

/// Options for copying a document into a new draft of the same type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Counterparty of the copy; defaults to the source's.
    pub contact_override: Option<ContactId>,
    /// Primary date of the copy (expiry, expected or issue date).
    pub date_override: Option<NaiveDate>,
    /// Applied to every unit price as `price * (1 + pct / 100)`.
    pub price_adjustment_pct: Option<Decimal>,
    #[serde(default)]
    pub copy_notes: bool,
    /// Copy only these items; `None` copies all.
    pub item_subset: Option<Vec<ItemId>>,
}

impl CloneOptions {
    pub fn selection(&self) -> ItemSelection {
        ItemSelection::from_subset(self.item_subset.clone())
    }
}

/// Documents that can be cloned into a new draft of the same type.
pub trait Duplicate: Document {
    fn duplicate(
        &self,
        id: Self::Id,
        number: String,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self>;
}
