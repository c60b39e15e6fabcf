//! Personnel domain model.
//!
//! # Responsibility
//! - Define the Employee, Employer and Project records and their ids.
//! - Hold association state as id-keyed sets instead of object pointers.
//! - Provide the per-operation arena (`EntityGraph`) that associations are
//!   maintained in.
//!
//! # Invariants
//! - Outside storage hydration, association sets are only mutated through
//!   `crate::integrity::relations`.
//! - Every persisted entity carries a storage-assigned id.

pub mod employee;
pub mod employer;
pub mod graph;
pub mod ids;
pub mod project;
pub mod validation;
