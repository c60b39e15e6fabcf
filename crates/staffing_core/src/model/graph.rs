//! Per-operation entity arena.
//!
//! # Responsibility
//! - Hold the entities one unit of work has loaded, addressed by id.
//! - Track ids removed during the unit of work so they can be deleted from
//!   storage after their associations are cleared.
//! - Report invariant violations across the loaded entities.
//!
//! # Invariants
//! - An id is never both loaded and removed.
//! - Consistency checks only judge loaded entities; references to ids that
//!   were never loaded are outside the unit of work.

use super::employee::Employee;
use super::employer::Employer;
use super::ids::{EmployeeId, EmployerId, ProjectId};
use super::project::Project;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Arena of entities loaded for one coordinator operation.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    employees: BTreeMap<EmployeeId, Employee>,
    employers: BTreeMap<EmployerId, Employer>,
    projects: BTreeMap<ProjectId, Project>,
    removed_employees: BTreeSet<EmployeeId>,
    removed_employers: BTreeSet<EmployerId>,
    removed_projects: BTreeSet<ProjectId>,
}

/// One violated association invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inconsistency {
    /// Employee lists the project but the project does not list the employee,
    /// or the reverse.
    AsymmetricAssignment {
        employee: EmployeeId,
        project: ProjectId,
    },
    /// Employee and employer disagree about the employment link.
    AsymmetricEmployment {
        employee: EmployeeId,
        employer: EmployerId,
    },
    /// Project and employer disagree about ownership.
    AsymmetricOwnership {
        project: ProjectId,
        employer: EmployerId,
    },
    /// Assigned employee works for a different employer than the project.
    EmployerMismatch {
        employee: EmployeeId,
        project: ProjectId,
    },
    /// Loaded project has no owning employer.
    OrphanProject(ProjectId),
    /// A loaded entity still references a removed employee.
    DanglingEmployee(EmployeeId),
    /// A loaded entity still references a removed employer.
    DanglingEmployer(EmployerId),
    /// A loaded entity still references a removed project.
    DanglingProject(ProjectId),
}

impl Display for Inconsistency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AsymmetricAssignment { employee, project } => write!(
                f,
                "assignment between employee {employee} and project {project} is one-sided"
            ),
            Self::AsymmetricEmployment { employee, employer } => write!(
                f,
                "employment between employee {employee} and employer {employer} is one-sided"
            ),
            Self::AsymmetricOwnership { project, employer } => write!(
                f,
                "ownership between project {project} and employer {employer} is one-sided"
            ),
            Self::EmployerMismatch { employee, project } => write!(
                f,
                "employee {employee} is assigned to project {project} of another employer"
            ),
            Self::OrphanProject(id) => write!(f, "project {id} has no employer"),
            Self::DanglingEmployee(id) => write!(f, "removed employee {id} is still referenced"),
            Self::DanglingEmployer(id) => write!(f, "removed employer {id} is still referenced"),
            Self::DanglingProject(id) => write!(f, "removed project {id} is still referenced"),
        }
    }
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a loaded employee, replacing any previous copy.
    pub fn load_employee(&mut self, employee: Employee) {
        self.removed_employees.remove(&employee.id());
        self.employees.insert(employee.id(), employee);
    }

    pub fn load_employer(&mut self, employer: Employer) {
        self.removed_employers.remove(&employer.id());
        self.employers.insert(employer.id(), employer);
    }

    pub fn load_project(&mut self, project: Project) {
        self.removed_projects.remove(&project.id());
        self.projects.insert(project.id(), project);
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    pub fn employer(&self, id: EmployerId) -> Option<&Employer> {
        self.employers.get(&id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    /// Mutable access for scalar edits. Association sets stay read-only.
    pub fn employee_mut(&mut self, id: EmployeeId) -> Option<&mut Employee> {
        self.employees.get_mut(&id)
    }

    pub fn employer_mut(&mut self, id: EmployerId) -> Option<&mut Employer> {
        self.employers.get_mut(&id)
    }

    pub fn project_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.get_mut(&id)
    }

    pub fn contains_employee(&self, id: EmployeeId) -> bool {
        self.employees.contains_key(&id)
    }

    pub fn contains_employer(&self, id: EmployerId) -> bool {
        self.employers.contains_key(&id)
    }

    pub fn contains_project(&self, id: ProjectId) -> bool {
        self.projects.contains_key(&id)
    }

    pub fn employees(&self) -> impl Iterator<Item = &Employee> {
        self.employees.values()
    }

    pub fn employers(&self) -> impl Iterator<Item = &Employer> {
        self.employers.values()
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn removed_employees(&self) -> &BTreeSet<EmployeeId> {
        &self.removed_employees
    }

    pub fn removed_employers(&self) -> &BTreeSet<EmployerId> {
        &self.removed_employers
    }

    pub fn removed_projects(&self) -> &BTreeSet<ProjectId> {
        &self.removed_projects
    }

    /// Drops an employee from the arena and schedules it for deletion.
    ///
    /// Callers must detach every association first.
    pub(crate) fn remove_employee(&mut self, id: EmployeeId) -> Option<Employee> {
        let removed = self.employees.remove(&id);
        if removed.is_some() {
            self.removed_employees.insert(id);
        }
        removed
    }

    pub(crate) fn remove_employer(&mut self, id: EmployerId) -> Option<Employer> {
        let removed = self.employers.remove(&id);
        if removed.is_some() {
            self.removed_employers.insert(id);
        }
        removed
    }

    pub(crate) fn remove_project(&mut self, id: ProjectId) -> Option<Project> {
        let removed = self.projects.remove(&id);
        if removed.is_some() {
            self.removed_projects.insert(id);
        }
        removed
    }

    /// Splits the borrow so one employee and one project can be edited together.
    pub(crate) fn employee_and_project_mut(
        &mut self,
        employee_id: EmployeeId,
        project_id: ProjectId,
    ) -> (Option<&mut Employee>, Option<&mut Project>) {
        (
            self.employees.get_mut(&employee_id),
            self.projects.get_mut(&project_id),
        )
    }

    pub(crate) fn employee_and_employer_mut(
        &mut self,
        employee_id: EmployeeId,
        employer_id: EmployerId,
    ) -> (Option<&mut Employee>, Option<&mut Employer>) {
        (
            self.employees.get_mut(&employee_id),
            self.employers.get_mut(&employer_id),
        )
    }

    pub(crate) fn project_and_employer_mut(
        &mut self,
        project_id: ProjectId,
        employer_id: EmployerId,
    ) -> (Option<&mut Project>, Option<&mut Employer>) {
        (
            self.projects.get_mut(&project_id),
            self.employers.get_mut(&employer_id),
        )
    }

    /// Lists every invariant violated by the loaded entities.
    ///
    /// An empty result means the arena is safe to persist.
    pub fn check_consistency(&self) -> Vec<Inconsistency> {
        let mut found = Vec::new();

        for employee in self.employees.values() {
            let employee_id = employee.id();
            if let Some(employer_id) = employee.employer() {
                if self.removed_employers.contains(&employer_id) {
                    found.push(Inconsistency::DanglingEmployer(employer_id));
                } else if let Some(employer) = self.employers.get(&employer_id) {
                    if !employer.employees().contains(&employee_id) {
                        found.push(Inconsistency::AsymmetricEmployment {
                            employee: employee_id,
                            employer: employer_id,
                        });
                    }
                }
            }

            for &project_id in employee.projects() {
                if self.removed_projects.contains(&project_id) {
                    found.push(Inconsistency::DanglingProject(project_id));
                    continue;
                }
                let Some(project) = self.projects.get(&project_id) else {
                    continue;
                };
                if !project.has_employee(employee_id) {
                    found.push(Inconsistency::AsymmetricAssignment {
                        employee: employee_id,
                        project: project_id,
                    });
                }
                if employee.employer().is_none() || employee.employer() != project.employer() {
                    found.push(Inconsistency::EmployerMismatch {
                        employee: employee_id,
                        project: project_id,
                    });
                }
            }
        }

        for employer in self.employers.values() {
            let employer_id = employer.id();
            for &employee_id in employer.employees() {
                if self.removed_employees.contains(&employee_id) {
                    found.push(Inconsistency::DanglingEmployee(employee_id));
                } else if let Some(employee) = self.employees.get(&employee_id) {
                    if employee.employer() != Some(employer_id) {
                        found.push(Inconsistency::AsymmetricEmployment {
                            employee: employee_id,
                            employer: employer_id,
                        });
                    }
                }
            }
            for &project_id in employer.projects() {
                if self.removed_projects.contains(&project_id) {
                    found.push(Inconsistency::DanglingProject(project_id));
                } else if let Some(project) = self.projects.get(&project_id) {
                    if project.employer() != Some(employer_id) {
                        found.push(Inconsistency::AsymmetricOwnership {
                            project: project_id,
                            employer: employer_id,
                        });
                    }
                }
            }
        }

        for project in self.projects.values() {
            let project_id = project.id();
            match project.employer() {
                None => found.push(Inconsistency::OrphanProject(project_id)),
                Some(employer_id) if self.removed_employers.contains(&employer_id) => {
                    found.push(Inconsistency::DanglingEmployer(employer_id));
                }
                Some(employer_id) => {
                    if let Some(employer) = self.employers.get(&employer_id) {
                        if !employer.projects().contains(&project_id) {
                            found.push(Inconsistency::AsymmetricOwnership {
                                project: project_id,
                                employer: employer_id,
                            });
                        }
                    }
                }
            }
            for &employee_id in project.employees() {
                if self.removed_employees.contains(&employee_id) {
                    found.push(Inconsistency::DanglingEmployee(employee_id));
                } else if let Some(employee) = self.employees.get(&employee_id) {
                    if !employee.has_project(project_id) {
                        found.push(Inconsistency::AsymmetricAssignment {
                            employee: employee_id,
                            project: project_id,
                        });
                    }
                }
            }
        }

        found
    }
}
