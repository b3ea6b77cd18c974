//! # heightcert Core
//!
//! Core types, errors, authorization rules and utilities for the heightcert API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`permissions`]: Closed role/permission sets and the static policy table
//! - [`training_status`]: Training lifecycle statuses and the transition guard
//! - [`pagination`]: Pagination utilities for list endpoints
//! - [`password`]: Password hashing and verification
//! - [`file_storage`]: Storage backend abstraction for uploaded documents
//! - [`serde`]: Custom serde helpers for query parameters
//!
//! # Example
//!
//! ```ignore
//! use heightcert_core::permissions::{Permission, Role, has_permission};
//! use heightcert_core::training_status::{TrainingStatus, TransitionState, validate_transition};
//!
//! assert!(has_permission(Some(Role::Coordinator), Permission::ManageTrainings));
//!
//! let state = TransitionState {
//!     status: TrainingStatus::Active,
//!     start_date: chrono::Utc::now(),
//!     has_issued_certificates: true,
//! };
//! assert!(validate_transition(&state, TrainingStatus::Cancelled, chrono::Utc::now()).is_err());
//! ```

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod serde;
pub mod training_status;

pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use pagination::{PaginationMeta, PaginationParams, SortOrder};
pub use password::{hash_password, verify_password};
pub use permissions::{Permission, Role};
pub use training_status::{TrainingStatus, TransitionRejected, TransitionState};
