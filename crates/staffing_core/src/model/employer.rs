//! Employer record.
//!
//! # Invariants
//! - `employees` is the inverse of `Employee::employer`.
//! - `projects` is the inverse of `Project::employer`; projects never outlive
//!   their employer.

use super::ids::{EmployeeId, EmployerId, ProjectId};
use super::validation::{require_text, EntityValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Persisted employer with the inverse sides of its associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employer {
    id: EmployerId,
    pub name: String,
    pub address: String,
    employees: BTreeSet<EmployeeId>,
    projects: BTreeSet<ProjectId>,
}

/// Caller-supplied employer fields for insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmployerInput {
    pub id: Option<EmployerId>,
    pub name: String,
    pub address: String,
}

impl EmployerInput {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            address: address.into(),
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        require_text("name", &self.name)
    }
}

impl Employer {
    /// Creates an employer with no employees and no projects.
    pub fn new(id: EmployerId, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            employees: BTreeSet::new(),
            projects: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> EmployerId {
        self.id
    }

    /// Read-only view of employees this employer owns.
    pub fn employees(&self) -> &BTreeSet<EmployeeId> {
        &self.employees
    }

    /// Read-only view of projects this employer owns.
    pub fn projects(&self) -> &BTreeSet<ProjectId> {
        &self.projects
    }

    pub fn apply(&mut self, input: &EmployerInput) {
        self.name = input.name.clone();
        self.address = input.address.clone();
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        require_text("name", &self.name)
    }

    pub(crate) fn insert_employee(&mut self, employee_id: EmployeeId) -> bool {
        self.employees.insert(employee_id)
    }

    pub(crate) fn remove_employee(&mut self, employee_id: EmployeeId) -> bool {
        self.employees.remove(&employee_id)
    }

    pub(crate) fn insert_project(&mut self, project_id: ProjectId) -> bool {
        self.projects.insert(project_id)
    }

    pub(crate) fn remove_project(&mut self, project_id: ProjectId) -> bool {
        self.projects.remove(&project_id)
    }
}
