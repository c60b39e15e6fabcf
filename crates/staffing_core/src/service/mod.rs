//! Use-case layer over the staff repository.
//!
//! # Responsibility
//! - Coordinate validator, relationship maintainer and persistence per
//!   lifecycle operation.
//! - Translate lower-layer failures into `StaffServiceError`.

pub mod error;
pub mod staff_service;
