//! Relationship maintainer.
//!
//! Each function updates both sides of one association inside an
//! `EntityGraph`. Calls are idempotent and infallible. A side whose entity
//! is not loaded belongs to another unit of work and is skipped; storage
//! derives the persisted link from whichever side is written.

use crate::model::graph::EntityGraph;
use crate::model::ids::{EmployeeId, EmployerId, ProjectId};
use log::warn;

/// Links an employee and a project on both sides.
///
/// Already-linked pairs are left unchanged. A one-sided link is repaired.
pub fn attach_employee_project(
    graph: &mut EntityGraph,
    employee_id: EmployeeId,
    project_id: ProjectId,
) {
    let (employee, project) = graph.employee_and_project_mut(employee_id, project_id);
    let employee_added = employee.map(|employee| employee.insert_project(project_id));
    let project_added = project.map(|project| project.insert_employee(employee_id));

    if let (Some(employee_added), Some(project_added)) = (employee_added, project_added) {
        if employee_added != project_added {
            warn!(
                "event=assignment_repair module=integrity status=ok employee_id={} project_id={}",
                employee_id, project_id
            );
        }
    }
}

/// Unlinks an employee and a project on both sides.
pub fn detach_employee_project(
    graph: &mut EntityGraph,
    employee_id: EmployeeId,
    project_id: ProjectId,
) {
    let (employee, project) = graph.employee_and_project_mut(employee_id, project_id);
    if let Some(employee) = employee {
        employee.remove_project(project_id);
    }
    if let Some(project) = project {
        project.remove_employee(employee_id);
    }
}

/// Sets the employee's employer and adds the employee to that employer.
///
/// A previous, different employer loses the employee so both sides agree.
pub fn attach_employee_employer(
    graph: &mut EntityGraph,
    employee_id: EmployeeId,
    employer_id: EmployerId,
) {
    let previous = graph
        .employee(employee_id)
        .and_then(|employee| employee.employer());
    if let Some(previous) = previous.filter(|previous| *previous != employer_id) {
        if let Some(former) = graph.employer_mut(previous) {
            former.remove_employee(employee_id);
        }
    }

    let (employee, employer) = graph.employee_and_employer_mut(employee_id, employer_id);
    if let Some(employee) = employee {
        employee.set_employer(Some(employer_id));
    }
    if let Some(employer) = employer {
        employer.insert_employee(employee_id);
    }
}

/// Clears the employee's employer and removes it from that employer.
///
/// No-op when the employee has no employer. Project assignments are not
/// touched; releasing callers detach projects first.
pub fn detach_employee_employer(graph: &mut EntityGraph, employee_id: EmployeeId) {
    let Some(employer_id) = graph
        .employee(employee_id)
        .and_then(|employee| employee.employer())
    else {
        return;
    };

    let (employee, employer) = graph.employee_and_employer_mut(employee_id, employer_id);
    if let Some(employee) = employee {
        employee.set_employer(None);
    }
    if let Some(employer) = employer {
        employer.remove_employee(employee_id);
    }
}

/// Sets the project's owning employer and adds it to the employer's projects.
pub fn attach_project_employer(
    graph: &mut EntityGraph,
    project_id: ProjectId,
    employer_id: EmployerId,
) {
    let previous = graph
        .project(project_id)
        .and_then(|project| project.employer());
    if let Some(previous) = previous.filter(|previous| *previous != employer_id) {
        if let Some(former) = graph.employer_mut(previous) {
            former.remove_project(project_id);
        }
    }

    let (project, employer) = graph.project_and_employer_mut(project_id, employer_id);
    if let Some(project) = project {
        project.set_employer(Some(employer_id));
    }
    if let Some(employer) = employer {
        employer.insert_project(project_id);
    }
}

/// Clears the project's owning employer. Only used while deleting.
pub fn detach_project_employer(graph: &mut EntityGraph, project_id: ProjectId) {
    let Some(employer_id) = graph
        .project(project_id)
        .and_then(|project| project.employer())
    else {
        return;
    };

    let (project, employer) = graph.project_and_employer_mut(project_id, employer_id);
    if let Some(project) = project {
        project.set_employer(None);
    }
    if let Some(employer) = employer {
        employer.remove_project(project_id);
    }
}
