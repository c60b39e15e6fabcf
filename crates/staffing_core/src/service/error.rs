//! Typed failures of coordinator operations.

use crate::integrity::assignment::IntegrityError;
use crate::model::graph::Inconsistency;
use crate::model::ids::{EmployeeId, EmployerId, EntityKind, ProjectId};
use crate::model::validation::EntityValidationError;
use crate::repo::staff_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, StaffServiceError>;

/// Errors returned by `StaffService` operations.
#[derive(Debug)]
pub enum StaffServiceError {
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Insert input already carries an id.
    AlreadyExists { kind: EntityKind, id: i64 },
    /// Update input carries no id.
    MissingIdentifier(EntityKind),
    /// Employee already has an employer.
    InvalidHiring {
        employee: EmployeeId,
        current_employer: EmployerId,
        requested_employer: EmployerId,
    },
    /// Employee has no employer or a different one than the project.
    InvalidEmployeeAssignment {
        employee: EmployeeId,
        project: ProjectId,
    },
    /// Employee is already linked to the project.
    ProjectAlreadyAssigned {
        employee: EmployeeId,
        project: ProjectId,
    },
    /// Entity fields violate a validation rule.
    Validation(EntityValidationError),
    /// The unit of work would persist broken associations.
    InconsistentState(Vec<Inconsistency>),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl StaffServiceError {
    /// Stable machine-readable code, used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::MissingIdentifier(_) => "missing_identifier",
            Self::InvalidHiring { .. } => "invalid_hiring",
            Self::InvalidEmployeeAssignment { .. } => "invalid_employee_assignment",
            Self::ProjectAlreadyAssigned { .. } => "project_already_assigned",
            Self::Validation(_) => "validation",
            Self::InconsistentState(_) => "inconsistent_state",
            Self::Repo(_) => "repo",
        }
    }

    /// Whether the error rejects caller input rather than reporting a fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::InconsistentState(_) | Self::Repo(_))
    }

    pub(crate) fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }
}

impl Display for StaffServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::AlreadyExists { kind, id } => write!(f, "{kind} already exists: {id}"),
            Self::MissingIdentifier(kind) => write!(f, "{kind} update requires an id"),
            Self::InvalidHiring {
                employee,
                current_employer,
                requested_employer,
            } => write!(
                f,
                "employee {employee} already works for employer {current_employer}; release before hiring by {requested_employer}"
            ),
            Self::InvalidEmployeeAssignment { employee, project } => write!(
                f,
                "employee {employee} does not share an employer with project {project}"
            ),
            Self::ProjectAlreadyAssigned { employee, project } => write!(
                f,
                "project {project} is already assigned to employee {employee}"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InconsistentState(issues) => {
                write!(f, "inconsistent associations:")?;
                for issue in issues {
                    write!(f, " [{issue}]")?;
                }
                Ok(())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StaffServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StaffServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<IntegrityError> for StaffServiceError {
    fn from(value: IntegrityError) -> Self {
        match value {
            IntegrityError::InvalidHiring {
                employee,
                current_employer,
                requested_employer,
            } => Self::InvalidHiring {
                employee,
                current_employer,
                requested_employer,
            },
            IntegrityError::InvalidEmployeeAssignment { employee, project } => {
                Self::InvalidEmployeeAssignment { employee, project }
            }
            IntegrityError::ProjectAlreadyAssigned { employee, project } => {
                Self::ProjectAlreadyAssigned { employee, project }
            }
        }
    }
}

impl From<EntityValidationError> for StaffServiceError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}
