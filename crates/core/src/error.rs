//! Domain error model.

use thiserror::Error;

use crate::document_type::DocumentType;
use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, illegal state changes). Storage concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. negative quantity or price).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced document does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The document's current status forbids the requested operation.
    #[error("{document_type} {id} is {status}; cannot {operation}")]
    InvalidState {
        document_type: DocumentType,
        id: String,
        status: String,
        operation: &'static str,
    },

    /// A status change along an edge the state machine does not define.
    #[error("illegal {document_type} status transition: {from} -> {to}")]
    StateTransition {
        document_type: DocumentType,
        from: String,
        to: String,
    },

    /// An item id is not part of the parent document's item list.
    #[error("item {item_id} not found in document {document_id}")]
    ItemNotFound { document_id: String, item_id: ItemId },

    /// The operation would produce a document without items.
    #[error("{operation} would produce an empty {document_type}")]
    EmptyDocument {
        document_type: DocumentType,
        operation: &'static str,
    },

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn item_not_found(document_id: impl ToString, item_id: ItemId) -> Self {
        Self::ItemNotFound {
            document_id: document_id.to_string(),
            item_id,
        }
    }

    pub fn empty_document(document_type: DocumentType, operation: &'static str) -> Self {
        Self::EmptyDocument {
            document_type,
            operation,
        }
    }

    pub fn invalid_state(
        document_type: DocumentType,
        id: impl ToString,
        status: impl ToString,
        operation: &'static str,
    ) -> Self {
        Self::InvalidState {
            document_type,
            id: id.to_string(),
            status: status.to_string(),
            operation,
        }
    }
}
