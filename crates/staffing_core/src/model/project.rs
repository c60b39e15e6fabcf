//! Project record.
//!
//! # Invariants
//! - `end_date` is strictly after `start_date`.
//! - `employer` is set for every persisted project; it is cleared only while
//!   the project is being deleted.
//! - Every employee in `employees` has the same employer as the project.

use super::ids::{EmployeeId, EmployerId, ProjectId};
use super::validation::{
    require_length, require_storable_date, require_text, EntityValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Inactive,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Persisted project with its owning employer and assigned employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    id: ProjectId,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    employer: Option<EmployerId>,
    employees: BTreeSet<EmployeeId>,
}

/// Caller-supplied project fields for insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub id: Option<ProjectId>,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    /// Required on insert. On update it must be `None` or the current owner.
    pub employer_id: Option<EmployerId>,
}

impl ProjectInput {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        employer_id: EmployerId,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            start_date,
            end_date,
            status: ProjectStatus::Active,
            employer_id: Some(employer_id),
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_fields(&self.name, &self.description, self.start_date, self.end_date)
    }

    /// Rejects schedules that start or end before `today`. Checked on insert only.
    pub fn validate_schedule(&self, today: NaiveDate) -> Result<(), EntityValidationError> {
        for date in [self.start_date, self.end_date] {
            if date < today {
                return Err(EntityValidationError::DateInPast { date, today });
            }
        }
        Ok(())
    }
}

impl Project {
    /// Creates a project owned by `employer` with no assigned employees.
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: ProjectStatus,
        employer: EmployerId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            start_date,
            end_date,
            status,
            employer: Some(employer),
            employees: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    /// Owning employer. `None` only mid-deletion.
    pub fn employer(&self) -> Option<EmployerId> {
        self.employer
    }

    /// Read-only view of assigned employees.
    pub fn employees(&self) -> &BTreeSet<EmployeeId> {
        &self.employees
    }

    pub fn has_employee(&self, employee_id: EmployeeId) -> bool {
        self.employees.contains(&employee_id)
    }

    /// Copies scalar fields from `input`. The owning employer is not changed.
    pub fn apply(&mut self, input: &ProjectInput) {
        self.name = input.name.clone();
        self.description = input.description.clone();
        self.start_date = input.start_date;
        self.end_date = input.end_date;
        self.status = input.status;
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        validate_fields(&self.name, &self.description, self.start_date, self.end_date)
    }

    pub(crate) fn set_employer(&mut self, employer: Option<EmployerId>) {
        self.employer = employer;
    }

    pub(crate) fn insert_employee(&mut self, employee_id: EmployeeId) -> bool {
        self.employees.insert(employee_id)
    }

    pub(crate) fn remove_employee(&mut self, employee_id: EmployeeId) -> bool {
        self.employees.remove(&employee_id)
    }
}

fn validate_fields(
    name: &str,
    description: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), EntityValidationError> {
    require_text("name", name)?;
    require_length("name", name, 3, 20)?;
    require_text("description", description)?;
    require_length("description", description, 5, 35)?;
    require_storable_date(start_date)?;
    require_storable_date(end_date)?;
    if end_date <= start_date {
        return Err(EntityValidationError::EndNotAfterStart {
            start: start_date,
            end: end_date,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectInput, ProjectStatus};
    use crate::model::ids::{EmployerId, ProjectId};
    use crate::model::validation::EntityValidationError;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn validate_requires_end_strictly_after_start() {
        let same_day = ProjectInput::new(
            "Apollo",
            "moonshot",
            date(2030, 1, 1),
            date(2030, 1, 1),
            EmployerId::new(1),
        );
        assert_eq!(
            same_day.validate().unwrap_err(),
            EntityValidationError::EndNotAfterStart {
                start: date(2030, 1, 1),
                end: date(2030, 1, 1),
            }
        );
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&ProjectStatus::Inactive).unwrap();
        assert_eq!(json, "\"INACTIVE\"");
        assert_eq!(ProjectStatus::parse("ACTIVE"), Some(ProjectStatus::Active));
        assert_eq!(ProjectStatus::parse("active"), None);
    }

    #[test]
    fn new_project_is_owned_and_empty() {
        let project = Project::new(
            ProjectId::new(5),
            "Apollo",
            "Crewed lunar landing",
            date(2030, 1, 1),
            date(2030, 6, 1),
            ProjectStatus::Active,
            EmployerId::new(2),
        );
        assert_eq!(project.employer(), Some(EmployerId::new(2)));
        assert!(project.employees().is_empty());
        assert!(project.validate().is_ok());
    }

    #[test]
    fn validate_enforces_text_lengths() {
        let mut input = ProjectInput::new(
            "Ap",
            "moonshot",
            date(2030, 1, 1),
            date(2030, 2, 1),
            EmployerId::new(1),
        );
        assert!(matches!(
            input.validate(),
            Err(EntityValidationError::TextLength { field: "name", .. })
        ));

        input.name = "Apollo".to_string();
        input.description = "x".repeat(36);
        assert!(matches!(
            input.validate(),
            Err(EntityValidationError::TextLength {
                field: "description",
                actual: 36,
                ..
            })
        ));

        input.description = "   ".to_string();
        assert_eq!(
            input.validate().unwrap_err(),
            EntityValidationError::BlankField("description")
        );
    }

    #[test]
    fn validate_rejects_five_digit_years() {
        let input = ProjectInput::new(
            "Apollo",
            "moonshot",
            date(2024, 1, 1),
            date(10000, 1, 1),
            EmployerId::new(1),
        );
        assert_eq!(
            input.validate().unwrap_err(),
            EntityValidationError::DateOutOfRange(date(10000, 1, 1))
        );
    }

    #[test]
    fn schedule_must_not_lie_before_today() {
        let input = ProjectInput::new(
            "Apollo",
            "moonshot",
            date(2030, 1, 1),
            date(2030, 2, 1),
            EmployerId::new(1),
        );
        assert!(input.validate_schedule(date(2030, 1, 1)).is_ok());
        assert_eq!(
            input.validate_schedule(date(2030, 1, 15)).unwrap_err(),
            EntityValidationError::DateInPast {
                date: date(2030, 1, 1),
                today: date(2030, 1, 15),
            }
        );
    }
}
