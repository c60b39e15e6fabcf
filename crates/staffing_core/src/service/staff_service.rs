//! Lifecycle coordinator for employees, employers and projects.
//!
//! # Responsibility
//! - Expose one operation per insert/update/hire/release/assign/delete use
//!   case, each taking plain ids or input objects.
//! - Load the entities an operation touches into an `EntityGraph`, apply
//!   relationship maintainer calls in a fixed order, then persist the graph.
//!
//! # Invariants
//! - Every mutating operation runs in one repository transaction; any error
//!   rolls back every write made by that operation.
//! - A graph is persisted only when `check_consistency()` reports nothing.
//! - Persist order: employers, employees, projects, then deletions of
//!   projects, employees, employers. Assignment rows are rewritten before
//!   the rows they point at are deleted.

use super::error::{ServiceResult, StaffServiceError};
use crate::integrity::assignment::{can_assign, validate_assignment, validate_hiring};
use crate::integrity::relations::{
    attach_employee_employer, attach_employee_project, attach_project_employer,
    detach_employee_employer, detach_employee_project, detach_project_employer,
};
use crate::model::employee::{Employee, EmployeeInput};
use crate::model::employer::{Employer, EmployerInput};
use crate::model::graph::EntityGraph;
use crate::model::ids::{EmployeeId, EmployerId, EntityKind, ProjectId};
use crate::model::project::{Project, ProjectInput};
use crate::model::validation::EntityValidationError;
use crate::repo::staff_repo::StaffRepository;
use chrono::Local;
use log::{debug, error, info, warn};
use std::time::Instant;

/// Coordinator facade over a staff repository.
pub struct StaffService<R: StaffRepository> {
    repo: R,
}

impl<R: StaffRepository> StaffService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts an employee with no employer and no projects.
    pub fn insert_employee(&self, input: &EmployeeInput) -> ServiceResult<Employee> {
        self.run("employee_insert", String::new(), |repo| {
            if let Some(id) = input.id {
                return Err(StaffServiceError::AlreadyExists {
                    kind: EntityKind::Employee,
                    id: id.get(),
                });
            }
            input.validate()?;
            let id = repo.insert_employee(input)?;
            require_employee(repo, id)
        })
    }

    /// Inserts an employer with no employees and no projects.
    pub fn insert_employer(&self, input: &EmployerInput) -> ServiceResult<Employer> {
        self.run("employer_insert", String::new(), |repo| {
            if let Some(id) = input.id {
                return Err(StaffServiceError::AlreadyExists {
                    kind: EntityKind::Employer,
                    id: id.get(),
                });
            }
            input.validate()?;
            let id = repo.insert_employer(input)?;
            require_employer(repo, id)
        })
    }

    /// Inserts a project and attaches it to its existing employer.
    pub fn insert_project(&self, input: &ProjectInput) -> ServiceResult<Project> {
        let subject = input
            .employer_id
            .map(|id| format!("employer_id={id}"))
            .unwrap_or_default();
        self.run("project_insert", subject, |repo| {
            if let Some(id) = input.id {
                return Err(StaffServiceError::AlreadyExists {
                    kind: EntityKind::Project,
                    id: id.get(),
                });
            }
            input.validate()?;
            input.validate_schedule(Local::now().date_naive())?;
            let employer_id = input
                .employer_id
                .ok_or(EntityValidationError::MissingEmployer)?;
            let employer = require_employer(repo, employer_id)?;

            let project_id = repo.insert_project(input)?;
            let mut graph = EntityGraph::new();
            graph.load_employer(employer);
            graph.load_project(require_project(repo, project_id)?);
            attach_project_employer(&mut graph, project_id, employer_id);
            persist(repo, &graph)?;

            require_project(repo, project_id)
        })
    }

    /// Replaces employee scalar fields. Associations are untouched.
    pub fn update_employee(&self, input: &EmployeeInput) -> ServiceResult<Employee> {
        let id = input
            .id
            .ok_or(StaffServiceError::MissingIdentifier(EntityKind::Employee))?;
        self.run("employee_update", format!("employee_id={id}"), |repo| {
            let mut employee = require_employee(repo, id)?;
            input.validate()?;
            employee.apply(input);
            repo.save_employee(&employee)?;
            require_employee(repo, id)
        })
    }

    /// Replaces employer scalar fields. Associations are untouched.
    pub fn update_employer(&self, input: &EmployerInput) -> ServiceResult<Employer> {
        let id = input
            .id
            .ok_or(StaffServiceError::MissingIdentifier(EntityKind::Employer))?;
        self.run("employer_update", format!("employer_id={id}"), |repo| {
            let mut employer = require_employer(repo, id)?;
            input.validate()?;
            employer.apply(input);
            repo.save_employer(&employer)?;
            require_employer(repo, id)
        })
    }

    /// Replaces project scalar fields.
    ///
    /// The owning employer cannot change; `input.employer_id` must be `None`
    /// or the current owner.
    pub fn update_project(&self, input: &ProjectInput) -> ServiceResult<Project> {
        let id = input
            .id
            .ok_or(StaffServiceError::MissingIdentifier(EntityKind::Project))?;
        self.run("project_update", format!("project_id={id}"), |repo| {
            let mut project = require_project(repo, id)?;
            input.validate()?;
            if input
                .employer_id
                .is_some_and(|requested| Some(requested) != project.employer())
            {
                return Err(EntityValidationError::EmployerImmutable.into());
            }
            project.apply(input);
            repo.save_project(&project)?;
            require_project(repo, id)
        })
    }

    /// Hires an employee who currently has no employer.
    pub fn hire(&self, employee_id: EmployeeId, employer_id: EmployerId) -> ServiceResult<Employee> {
        self.run(
            "employee_hire",
            format!("employee_id={employee_id} employer_id={employer_id}"),
            |repo| {
                let employee = require_employee(repo, employee_id)?;
                let employer = require_employer(repo, employer_id)?;
                validate_hiring(&employee, &employer)?;

                let mut graph = EntityGraph::new();
                graph.load_employee(employee);
                graph.load_employer(employer);
                attach_employee_employer(&mut graph, employee_id, employer_id);
                persist(repo, &graph)?;

                require_employee(repo, employee_id)
            },
        )
    }

    /// Creates a new employer and hires the employee into it.
    pub fn hire_new_employer(
        &self,
        employee_id: EmployeeId,
        input: &EmployerInput,
    ) -> ServiceResult<Employee> {
        self.run(
            "employee_hire_new_employer",
            format!("employee_id={employee_id}"),
            |repo| {
                let employee = require_employee(repo, employee_id)?;
                if let Some(id) = input.id {
                    return Err(StaffServiceError::AlreadyExists {
                        kind: EntityKind::Employer,
                        id: id.get(),
                    });
                }
                input.validate()?;
                let employer_id = repo.insert_employer(input)?;
                let employer = require_employer(repo, employer_id)?;
                validate_hiring(&employee, &employer)?;

                let mut graph = EntityGraph::new();
                graph.load_employee(employee);
                graph.load_employer(employer);
                attach_employee_employer(&mut graph, employee_id, employer_id);
                persist(repo, &graph)?;

                require_employee(repo, employee_id)
            },
        )
    }

    /// Releases an employee from its employer.
    ///
    /// Project assignments are removed first, then the employer link. An
    /// employee without an employer is returned unchanged.
    pub fn release(&self, employee_id: EmployeeId) -> ServiceResult<Employee> {
        self.run("employee_release", format!("employee_id={employee_id}"), |repo| {
            release_in(repo, employee_id)
        })
    }

    /// Releases an employee, requiring that `employer_id` is its employer.
    pub fn release_from(
        &self,
        employee_id: EmployeeId,
        employer_id: EmployerId,
    ) -> ServiceResult<Employee> {
        self.run(
            "employee_release",
            format!("employee_id={employee_id} employer_id={employer_id}"),
            |repo| {
                require_employer(repo, employer_id)?;
                let employee = require_employee(repo, employee_id)?;
                if employee.employer() != Some(employer_id) {
                    return Err(StaffServiceError::not_found(
                        EntityKind::Employer,
                        employer_id.get(),
                    ));
                }
                release_in(repo, employee_id)
            },
        )
    }

    /// Assigns a project to an employee of the same employer.
    pub fn assign(&self, employee_id: EmployeeId, project_id: ProjectId) -> ServiceResult<Employee> {
        self.run(
            "project_assign",
            format!("employee_id={employee_id} project_id={project_id}"),
            |repo| {
                let project = require_project(repo, project_id)?;
                let employee = require_employee(repo, employee_id)?;
                validate_assignment(&employee, &project)?;

                let mut graph = EntityGraph::new();
                graph.load_employee(employee);
                graph.load_project(project);
                attach_employee_project(&mut graph, employee_id, project_id);
                persist(repo, &graph)?;

                require_employee(repo, employee_id)
            },
        )
    }

    /// Removes a project assignment. Unlinked pairs are left unchanged.
    pub fn unassign(
        &self,
        employee_id: EmployeeId,
        project_id: ProjectId,
    ) -> ServiceResult<Employee> {
        self.run(
            "project_unassign",
            format!("employee_id={employee_id} project_id={project_id}"),
            |repo| {
                let project = require_project(repo, project_id)?;
                let employee = require_employee(repo, employee_id)?;

                let mut graph = EntityGraph::new();
                graph.load_employee(employee);
                graph.load_project(project);
                detach_employee_project(&mut graph, employee_id, project_id);
                persist(repo, &graph)?;

                require_employee(repo, employee_id)
            },
        )
    }

    /// Deletes an employee after clearing its projects and employer.
    pub fn delete_employee(&self, employee_id: EmployeeId) -> ServiceResult<()> {
        self.run("employee_delete", format!("employee_id={employee_id}"), |repo| {
            let mut graph = EntityGraph::new();
            let project_ids = load_employee_links(repo, &mut graph, employee_id)?;

            for project_id in project_ids {
                detach_employee_project(&mut graph, employee_id, project_id);
            }
            detach_employee_employer(&mut graph, employee_id);
            graph.remove_employee(employee_id);

            persist(repo, &graph)
        })
    }

    /// Deletes an employer, its projects, and its employment links.
    ///
    /// Order: release every employee, destroy every project (clearing its
    /// assignments), then remove the employer.
    pub fn delete_employer(&self, employer_id: EmployerId) -> ServiceResult<()> {
        self.run("employer_delete", format!("employer_id={employer_id}"), |repo| {
            let employer = require_employer(repo, employer_id)?;
            let employee_ids: Vec<EmployeeId> = employer.employees().iter().copied().collect();
            let project_ids: Vec<ProjectId> = employer.projects().iter().copied().collect();

            let mut graph = EntityGraph::new();
            graph.load_employer(employer);
            for &employee_id in &employee_ids {
                load_employee_if_absent(repo, &mut graph, employee_id)?;
            }
            for &project_id in &project_ids {
                let project = require_project(repo, project_id)?;
                for &member_id in project.employees() {
                    load_employee_if_absent(repo, &mut graph, member_id)?;
                }
                graph.load_project(project);
            }

            for &employee_id in &employee_ids {
                detach_employee_employer(&mut graph, employee_id);
            }
            for &project_id in &project_ids {
                destroy_project(&mut graph, project_id);
            }
            graph.remove_employer(employer_id);

            debug!(
                "event=employer_delete module=service status=cascade employer_id={} released={} projects={}",
                employer_id,
                employee_ids.len(),
                project_ids.len()
            );
            persist(repo, &graph)
        })
    }

    /// Deletes a project after clearing its assignments and employer link.
    pub fn delete_project(&self, project_id: ProjectId) -> ServiceResult<()> {
        self.run("project_delete", format!("project_id={project_id}"), |repo| {
            let project = require_project(repo, project_id)?;
            let mut graph = EntityGraph::new();
            if let Some(employer_id) = project.employer() {
                graph.load_employer(require_employer(repo, employer_id)?);
            }
            for &employee_id in project.employees() {
                load_employee_if_absent(repo, &mut graph, employee_id)?;
            }
            graph.load_project(project);

            destroy_project(&mut graph, project_id);
            persist(repo, &graph)
        })
    }

    pub fn get_employee(&self, id: EmployeeId) -> ServiceResult<Employee> {
        require_employee(&self.repo, id)
    }

    pub fn get_employer(&self, id: EmployerId) -> ServiceResult<Employer> {
        require_employer(&self.repo, id)
    }

    pub fn get_project(&self, id: ProjectId) -> ServiceResult<Project> {
        require_project(&self.repo, id)
    }

    /// Lists employees ordered by last name, first name, id.
    pub fn list_employees(&self) -> ServiceResult<Vec<Employee>> {
        Ok(self.repo.list_employees()?)
    }

    pub fn list_employers(&self) -> ServiceResult<Vec<Employer>> {
        Ok(self.repo.list_employers()?)
    }

    pub fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.repo.list_projects()?)
    }

    pub fn projects_of_employee(&self, employee_id: EmployeeId) -> ServiceResult<Vec<Project>> {
        require_employee(&self.repo, employee_id)?;
        Ok(self.repo.list_projects_of_employee(employee_id)?)
    }

    pub fn employees_of_employer(&self, employer_id: EmployerId) -> ServiceResult<Vec<Employee>> {
        require_employer(&self.repo, employer_id)?;
        Ok(self.repo.list_employees_of_employer(employer_id)?)
    }

    pub fn projects_of_employer(&self, employer_id: EmployerId) -> ServiceResult<Vec<Project>> {
        require_employer(&self.repo, employer_id)?;
        Ok(self.repo.list_projects_of_employer(employer_id)?)
    }

    pub fn employees_of_project(&self, project_id: ProjectId) -> ServiceResult<Vec<Employee>> {
        require_project(&self.repo, project_id)?;
        Ok(self.repo.list_employees_of_project(project_id)?)
    }

    /// Returns whether `assign(employee_id, project_id)` would pass validation.
    pub fn can_assign(&self, employee_id: EmployeeId, project_id: ProjectId) -> ServiceResult<bool> {
        let employee = require_employee(&self.repo, employee_id)?;
        let project = require_project(&self.repo, project_id)?;
        Ok(can_assign(&employee, &project))
    }

    fn run<T>(
        &self,
        event: &'static str,
        subject: String,
        work: impl FnOnce(&R) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        debug!("event={event} module=service status=start {subject}");

        let result = self.repo.with_transaction(work);
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!("event={event} module=service status=ok {subject} duration_ms={duration_ms}"),
            Err(err) if err.is_rejection() => warn!(
                "event={event} module=service status=rejected {subject} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
            Err(err) => error!(
                "event={event} module=service status=error {subject} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
        }
        result
    }
}

fn release_in<R: StaffRepository>(repo: &R, employee_id: EmployeeId) -> ServiceResult<Employee> {
    let mut graph = EntityGraph::new();
    let project_ids = load_employee_links(repo, &mut graph, employee_id)?;

    for project_id in project_ids {
        detach_employee_project(&mut graph, employee_id, project_id);
    }
    detach_employee_employer(&mut graph, employee_id);
    persist(repo, &graph)?;

    require_employee(repo, employee_id)
}

/// Clears every assignment and the employer link of a loaded project, then
/// schedules it for deletion.
fn destroy_project(graph: &mut EntityGraph, project_id: ProjectId) {
    let members: Vec<EmployeeId> = graph
        .project(project_id)
        .map(|project| project.employees().iter().copied().collect())
        .unwrap_or_default();
    for employee_id in members {
        detach_employee_project(graph, employee_id, project_id);
    }
    detach_project_employer(graph, project_id);
    graph.remove_project(project_id);
}

/// Loads an employee plus its employer and projects; returns the project ids.
fn load_employee_links<R: StaffRepository>(
    repo: &R,
    graph: &mut EntityGraph,
    employee_id: EmployeeId,
) -> ServiceResult<Vec<ProjectId>> {
    let employee = require_employee(repo, employee_id)?;
    if let Some(employer_id) = employee.employer() {
        if !graph.contains_employer(employer_id) {
            graph.load_employer(require_employer(repo, employer_id)?);
        }
    }
    let project_ids: Vec<ProjectId> = employee.projects().iter().copied().collect();
    for &project_id in &project_ids {
        if !graph.contains_project(project_id) {
            graph.load_project(require_project(repo, project_id)?);
        }
    }
    graph.load_employee(employee);
    Ok(project_ids)
}

fn load_employee_if_absent<R: StaffRepository>(
    repo: &R,
    graph: &mut EntityGraph,
    employee_id: EmployeeId,
) -> ServiceResult<()> {
    if !graph.contains_employee(employee_id) {
        graph.load_employee(require_employee(repo, employee_id)?);
    }
    Ok(())
}

fn persist<R: StaffRepository>(repo: &R, graph: &EntityGraph) -> ServiceResult<()> {
    let issues = graph.check_consistency();
    if !issues.is_empty() {
        return Err(StaffServiceError::InconsistentState(issues));
    }

    for employer in graph.employers() {
        repo.save_employer(employer)?;
    }
    for employee in graph.employees() {
        repo.save_employee(employee)?;
    }
    for project in graph.projects() {
        repo.save_project(project)?;
    }
    for &project_id in graph.removed_projects() {
        repo.delete_project(project_id)?;
    }
    for &employee_id in graph.removed_employees() {
        repo.delete_employee(employee_id)?;
    }
    for &employer_id in graph.removed_employers() {
        repo.delete_employer(employer_id)?;
    }
    Ok(())
}

fn require_employee<R: StaffRepository>(repo: &R, id: EmployeeId) -> ServiceResult<Employee> {
    repo.find_employee(id)?
        .ok_or_else(|| StaffServiceError::not_found(EntityKind::Employee, id.get()))
}

fn require_employer<R: StaffRepository>(repo: &R, id: EmployerId) -> ServiceResult<Employer> {
    repo.find_employer(id)?
        .ok_or_else(|| StaffServiceError::not_found(EntityKind::Employer, id.get()))
}

fn require_project<R: StaffRepository>(repo: &R, id: ProjectId) -> ServiceResult<Project> {
    repo.find_project(id)?
        .ok_or_else(|| StaffServiceError::not_found(EntityKind::Project, id.get()))
}
