//! Relationship-integrity engine for employees, employers and projects.
//!
//! The coordinator (`StaffService`) is the only write path; it keeps the
//! employment, ownership and assignment links symmetric and persisted.

pub mod config;
pub mod db;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StaffConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use integrity::assignment::{can_assign, IntegrityError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::employee::{Employee, EmployeeInput};
pub use model::employer::{Employer, EmployerInput};
pub use model::graph::{EntityGraph, Inconsistency};
pub use model::ids::{EmployeeId, EmployerId, EntityKind, ProjectId};
pub use model::project::{Project, ProjectInput, ProjectStatus};
pub use model::validation::{parse_project_date, EntityValidationError};
pub use repo::staff_repo::{RepoError, RepoResult, SqliteStaffRepository, StaffRepository};
pub use service::error::{ServiceResult, StaffServiceError};
pub use service::staff_service::StaffService;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
