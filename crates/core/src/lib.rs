//! `tradeflow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every document
//! crate (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod document_type;
pub mod entity;
pub mod error;
pub mod id;
pub mod pagination;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use document_type::DocumentType;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, ContactId, ItemId, PaymentId, ProductId};
pub use pagination::{PagedResult, PaginationParams};
pub use value_object::ValueObject;
