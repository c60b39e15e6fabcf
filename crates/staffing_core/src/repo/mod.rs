//! Persistence collaborator contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide find/insert/save/delete/list access per entity kind.
//! - Provide the transaction boundary coordinator operations run in.
//!
//! # Invariants
//! - Write paths validate entity fields before SQL mutations.
//! - Read paths re-validate rows and report corrupt data as `InvalidData`.
//! - Associations are persisted from the owning row (`employer_id`) or the
//!   `project_employees` join table; there are no cascading deletes.

pub mod staff_repo;
