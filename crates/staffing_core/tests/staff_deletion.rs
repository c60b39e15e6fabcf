use chrono::NaiveDate;
use rusqlite::Connection;
use staffing_core::{
    open_db_in_memory, EmployeeId, EmployeeInput, EmployerId, EmployerInput, EntityKind,
    ProjectId, ProjectInput, SqliteStaffRepository, StaffService, StaffServiceError,
};

type Service<'conn> = StaffService<SqliteStaffRepository<'conn>>;

struct Fixture {
    acme: EmployerId,
    globex: EmployerId,
    p1: ProjectId,
    p2: ProjectId,
    other: ProjectId,
    john: EmployeeId,
    mary: EmployeeId,
    outsider: EmployeeId,
}

fn service(conn: &Connection) -> Service<'_> {
    StaffService::new(SqliteStaffRepository::try_new(conn).unwrap())
}

fn project_input(name: &str, owner: EmployerId) -> ProjectInput {
    ProjectInput::new(
        name,
        "Staff rollout",
        NaiveDate::from_ymd_opt(2090, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2090, 12, 31).unwrap(),
        owner,
    )
}

/// Acme owns Apollo (p1) and Gemini (p2) and employs John (both) and Mary (p1).
/// Globex owns Other and employs Outsider (Other).
fn seed(service: &Service<'_>) -> Fixture {
    let acme = service
        .insert_employer(&EmployerInput::new("Acme", ""))
        .unwrap()
        .id();
    let globex = service
        .insert_employer(&EmployerInput::new("Globex", ""))
        .unwrap()
        .id();
    let p1 = service.insert_project(&project_input("Apollo", acme)).unwrap().id();
    let p2 = service.insert_project(&project_input("Gemini", acme)).unwrap().id();
    let other = service
        .insert_project(&project_input("Other", globex))
        .unwrap()
        .id();
    let hire = |first: &str, employer: EmployerId, projects: &[ProjectId]| {
        let id = service
            .insert_employee(&EmployeeInput::new(first, "Smith", "", 10.0))
            .unwrap()
            .id();
        service.hire(id, employer).unwrap();
        for &project in projects {
            service.assign(id, project).unwrap();
        }
        id
    };
    let john = hire("John", acme, &[p1, p2]);
    let mary = hire("Mary", acme, &[p1]);
    let outsider = hire("Outsider", globex, &[other]);

    Fixture {
        acme,
        globex,
        p1,
        p2,
        other,
        john,
        mary,
        outsider,
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn delete_employer_releases_staff_and_removes_projects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    service.delete_employer(f.acme).unwrap();

    assert!(matches!(
        service.get_employer(f.acme),
        Err(StaffServiceError::NotFound {
            kind: EntityKind::Employer,
            ..
        })
    ));
    for project in [f.p1, f.p2] {
        assert!(service.get_project(project).is_err());
    }
    for id in [f.john, f.mary] {
        let employee = service.get_employee(id).unwrap();
        assert_eq!(employee.employer(), None);
        assert!(employee.projects().is_empty());
    }

    let outsider = service.get_employee(f.outsider).unwrap();
    assert_eq!(outsider.employer(), Some(f.globex));
    assert!(outsider.has_project(f.other));
    assert_eq!(count(&conn, "project_employees"), 1);
    assert_eq!(count(&conn, "projects"), 1);
}

#[test]
fn delete_project_clears_assignments_and_ownership() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    service.delete_project(f.p1).unwrap();

    assert!(service.get_project(f.p1).is_err());
    let john = service.get_employee(f.john).unwrap();
    assert!(!john.has_project(f.p1));
    assert!(john.has_project(f.p2));
    assert!(service.get_employee(f.mary).unwrap().projects().is_empty());
    assert!(!service.get_employer(f.acme).unwrap().projects().contains(&f.p1));
    assert_eq!(count(&conn, "project_employees"), 2);
}

#[test]
fn delete_employee_clears_projects_and_employer() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    service.delete_employee(f.john).unwrap();

    assert!(service.get_employee(f.john).is_err());
    for project in [f.p1, f.p2] {
        assert!(!service.get_project(project).unwrap().has_employee(f.john));
    }
    assert!(service.get_project(f.p1).unwrap().has_employee(f.mary));
    let acme = service.get_employer(f.acme).unwrap();
    assert!(!acme.employees().contains(&f.john));
    assert!(acme.employees().contains(&f.mary));
}

#[test]
fn deleting_unknown_entities_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(matches!(
        service.delete_employer(EmployerId::new(12)),
        Err(StaffServiceError::NotFound {
            kind: EntityKind::Employer,
            id: 12
        })
    ));
    assert!(matches!(
        service.delete_project(ProjectId::new(13)),
        Err(StaffServiceError::NotFound {
            kind: EntityKind::Project,
            id: 13
        })
    ));
    assert!(matches!(
        service.delete_employee(EmployeeId::new(14)),
        Err(StaffServiceError::NotFound {
            kind: EntityKind::Employee,
            id: 14
        })
    ));
}

#[test]
fn failed_operation_leaves_no_partial_writes() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);
    let employers_before = service.list_employers().unwrap().len();

    let err = service
        .hire_new_employer(f.john, &EmployerInput::new("Initech", ""))
        .unwrap_err();
    assert!(matches!(err, StaffServiceError::InvalidHiring { .. }));
    assert_eq!(service.list_employers().unwrap().len(), employers_before);
    assert_eq!(
        service.get_employee(f.john).unwrap().employer(),
        Some(f.acme)
    );
    assert!(conn.is_autocommit());
}

#[test]
fn operations_join_an_outer_transaction() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    conn.execute_batch("BEGIN;").unwrap();
    service.delete_employer(f.acme).unwrap();
    service.release(f.outsider).unwrap();
    conn.execute_batch("ROLLBACK;").unwrap();

    assert_eq!(count(&conn, "projects"), 3);
    assert_eq!(
        service.get_employee(f.outsider).unwrap().employer(),
        Some(f.globex)
    );
    assert!(service.get_employee(f.john).unwrap().has_project(f.p2));
}

#[test]
fn failed_operation_inside_outer_transaction_is_undone() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    conn.execute_batch("BEGIN;").unwrap();
    service.unassign(f.mary, f.p1).unwrap();
    let err = service
        .hire_new_employer(f.john, &EmployerInput::new("Initech", ""))
        .unwrap_err();
    assert!(matches!(err, StaffServiceError::InvalidHiring { .. }));
    conn.execute_batch("COMMIT;").unwrap();

    assert_eq!(count(&conn, "employers"), 2);
    assert!(service.get_employee(f.mary).unwrap().projects().is_empty());
    assert_eq!(service.get_employee(f.john).unwrap().employer(), Some(f.acme));
    assert!(conn.is_autocommit());
}
