//! Employee record.
//!
//! # Invariants
//! - `salary` is finite and non-negative.
//! - Every project in `projects` is owned by `employer`; an employee without
//!   an employer has no projects.
//! - `employer` and `projects` change only through the relationship
//!   maintainer, which keeps the inverse collections in sync.

use super::ids::{EmployeeId, EmployerId, ProjectId};
use super::validation::{require_text, EntityValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Persisted employee with its association state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub salary: f64,
    employer: Option<EmployerId>,
    projects: BTreeSet<ProjectId>,
}

/// Caller-supplied employee fields for insert and update.
///
/// `id` must be `None` on insert (storage assigns it) and `Some` on update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub id: Option<EmployeeId>,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub salary: f64,
}

impl EmployeeInput {
    /// Builds insert input without an id.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        job_title: impl Into<String>,
        salary: f64,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            job_title: job_title.into(),
            salary,
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_fields(&self.first_name, &self.last_name, self.salary)
    }
}

impl Employee {
    /// Creates an employee with no employer and no projects.
    pub fn new(
        id: EmployeeId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        job_title: impl Into<String>,
        salary: f64,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            job_title: job_title.into(),
            salary,
            employer: None,
            projects: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    /// Current employer, if hired.
    pub fn employer(&self) -> Option<EmployerId> {
        self.employer
    }

    /// Read-only view of assigned projects.
    pub fn projects(&self) -> &BTreeSet<ProjectId> {
        &self.projects
    }

    pub fn has_project(&self, project_id: ProjectId) -> bool {
        self.projects.contains(&project_id)
    }

    /// Copies scalar fields from `input`; associations are left untouched.
    pub fn apply(&mut self, input: &EmployeeInput) {
        self.first_name = input.first_name.clone();
        self.last_name = input.last_name.clone();
        self.job_title = input.job_title.clone();
        self.salary = input.salary;
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_fields(&self.first_name, &self.last_name, self.salary)
    }

    pub(crate) fn set_employer(&mut self, employer: Option<EmployerId>) {
        self.employer = employer;
    }

    pub(crate) fn insert_project(&mut self, project_id: ProjectId) -> bool {
        self.projects.insert(project_id)
    }

    pub(crate) fn remove_project(&mut self, project_id: ProjectId) -> bool {
        self.projects.remove(&project_id)
    }
}

fn validate_fields(
    first_name: &str,
    last_name: &str,
    salary: f64,
) -> Result<(), EntityValidationError> {
    require_text("first_name", first_name)?;
    require_text("last_name", last_name)?;
    if !salary.is_finite() || salary < 0.0 {
        return Err(EntityValidationError::InvalidSalary(salary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Employee, EmployeeInput};
    use crate::model::ids::EmployeeId;
    use crate::model::validation::EntityValidationError;

    #[test]
    fn new_employee_starts_unassociated() {
        let employee = Employee::new(EmployeeId::new(1), "John", "Doe", "Engineer", 1500.0);
        assert_eq!(employee.employer(), None);
        assert!(employee.projects().is_empty());
        assert!(employee.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_or_nan_salary() {
        let mut input = EmployeeInput::new("John", "Doe", "Engineer", -1.0);
        assert_eq!(
            input.validate().unwrap_err(),
            EntityValidationError::InvalidSalary(-1.0)
        );

        input.salary = f64::NAN;
        assert!(matches!(
            input.validate().unwrap_err(),
            EntityValidationError::InvalidSalary(_)
        ));
    }

    #[test]
    fn validate_rejects_blank_names() {
        let input = EmployeeInput::new("John", " ", "Engineer", 10.0);
        assert_eq!(
            input.validate().unwrap_err(),
            EntityValidationError::BlankField("last_name")
        );
    }

    #[test]
    fn apply_copies_scalars_only() {
        let mut employee = Employee::new(EmployeeId::new(3), "A", "B", "C", 1.0);
        let mut input = EmployeeInput::new("Jane", "Roe", "Lead", 2000.0);
        input.id = Some(EmployeeId::new(99));

        employee.apply(&input);

        assert_eq!(employee.id(), EmployeeId::new(3));
        assert_eq!(employee.first_name, "Jane");
        assert_eq!(employee.salary, 2000.0);
    }
}
