//! Assignment and hiring preconditions.
//!
//! # Invariants
//! - An employee joins a project only when both share the same employer.
//! - An employee is hired only when it currently has no employer.

use crate::model::employee::Employee;
use crate::model::employer::Employer;
use crate::model::ids::{EmployeeId, EmployerId, ProjectId};
use crate::model::project::Project;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected association precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityError {
    /// Employee already has an employer and must be released first.
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
    /// Employee and project are already linked.
    ProjectAlreadyAssigned {
        employee: EmployeeId,
        project: ProjectId,
    },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
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
        }
    }
}

impl Error for IntegrityError {}

/// Returns whether `employee` may be assigned to `project` right now.
pub fn can_assign(employee: &Employee, project: &Project) -> bool {
    shares_employer(employee, project) && !project.has_employee(employee.id())
}

/// Checks the shared-employer rule and rejects duplicate links.
pub fn validate_assignment(employee: &Employee, project: &Project) -> Result<(), IntegrityError> {
    if !shares_employer(employee, project) {
        return Err(IntegrityError::InvalidEmployeeAssignment {
            employee: employee.id(),
            project: project.id(),
        });
    }
    if employee.has_project(project.id()) || project.has_employee(employee.id()) {
        return Err(IntegrityError::ProjectAlreadyAssigned {
            employee: employee.id(),
            project: project.id(),
        });
    }
    Ok(())
}

/// Rejects hiring an employee who already has an employer.
///
/// Transfers between employers take a release followed by a hire.
pub fn validate_hiring(employee: &Employee, employer: &Employer) -> Result<(), IntegrityError> {
    match employee.employer() {
        Some(current_employer) => Err(IntegrityError::InvalidHiring {
            employee: employee.id(),
            current_employer,
            requested_employer: employer.id(),
        }),
        None => Ok(()),
    }
}

fn shares_employer(employee: &Employee, project: &Project) -> bool {
    match (employee.employer(), project.employer()) {
        (Some(employee_employer), Some(project_employer)) => employee_employer == project_employer,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{can_assign, validate_assignment, validate_hiring, IntegrityError};
    use crate::model::employee::Employee;
    use crate::model::employer::Employer;
    use crate::model::ids::{EmployeeId, EmployerId, ProjectId};
    use crate::model::project::{Project, ProjectStatus};
    use chrono::NaiveDate;

    fn employee(employer: Option<i64>) -> Employee {
        let mut employee = Employee::new(EmployeeId::new(1), "John", "Doe", "Dev", 1.0);
        employee.set_employer(employer.map(EmployerId::new));
        employee
    }

    fn project(employer: i64) -> Project {
        Project::new(
            ProjectId::new(7),
            "Apollo",
            "",
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2031, 1, 1).unwrap(),
            ProjectStatus::Active,
            EmployerId::new(employer),
        )
    }

    #[test]
    fn assignment_requires_matching_employer() {
        let project = project(1);
        assert!(can_assign(&employee(Some(1)), &project));
        assert!(!can_assign(&employee(Some(2)), &project));
        assert!(!can_assign(&employee(None), &project));

        let err = validate_assignment(&employee(None), &project).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::InvalidEmployeeAssignment {
                employee: EmployeeId::new(1),
                project: ProjectId::new(7),
            }
        );
        assert!(validate_assignment(&employee(Some(2)), &project).is_err());
    }

    #[test]
    fn assignment_rejects_existing_link() {
        let mut employee = employee(Some(1));
        let mut project = project(1);
        employee.insert_project(project.id());
        project.insert_employee(employee.id());

        assert!(!can_assign(&employee, &project));
        assert!(matches!(
            validate_assignment(&employee, &project),
            Err(IntegrityError::ProjectAlreadyAssigned { .. })
        ));
    }

    #[test]
    fn hiring_requires_release_first() {
        let employer = Employer::new(EmployerId::new(5), "Globex", "");
        assert!(validate_hiring(&employee(None), &employer).is_ok());

        let err = validate_hiring(&employee(Some(1)), &employer).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::InvalidHiring {
                employee: EmployeeId::new(1),
                current_employer: EmployerId::new(1),
                requested_employer: EmployerId::new(5),
            }
        );
    }
}
