//! Transactional mutation of documents.
//!
//! # Responsibility
//! - Define the two edit primitives and their atomic application.
//! - Map positions from one document version to the next.
//!
//! # Invariants
//! - Documents are never mutated in place; older versions stay usable.
//! - A rejected transaction leaves the caller's document untouched.

pub mod mapping;
pub mod step;

pub use mapping::{Assoc, Mapping, StepMap};
pub use step::{apply, apply_transaction, AppliedTransaction, EditRejection, InvalidEdit, Step, Transaction};
