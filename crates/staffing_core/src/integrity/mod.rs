//! Association integrity rules.
//!
//! # Responsibility
//! - `relations`: the only code that mutates association sets; every call
//!   updates both sides of one association.
//! - `assignment`: business preconditions checked before an attach.
//!
//! # Invariants
//! - Bidirectional symmetry holds after every `relations` call.
//! - Validators never mutate state.

pub mod assignment;
pub mod relations;
