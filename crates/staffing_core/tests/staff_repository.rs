use chrono::NaiveDate;
use rusqlite::Connection;
use staffing_core::{
    open_db_in_memory, Employee, EmployeeId, EmployeeInput, EmployerId, EmployerInput,
    EntityKind, EntityValidationError, ProjectId, ProjectInput, ProjectStatus, RepoError,
    SqliteStaffRepository, StaffRepository,
};

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

fn seed_employer(repo: &SqliteStaffRepository<'_>, name: &str) -> EmployerId {
    repo.insert_employer(&EmployerInput::new(name, "Harbour Road 4"))
        .unwrap()
}

#[test]
fn inserted_records_round_trip_with_empty_associations() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();

    let employer_id = seed_employer(&repo, "Acme");
    let employee_id = repo
        .insert_employee(&EmployeeInput::new("John", "Doe", "Engineer", 5200.0))
        .unwrap();
    let project_id = repo
        .insert_project(&ProjectInput::new(
            "Apollo",
            "Moon landing",
            date("2024-01-01"),
            date("2024-12-31"),
            employer_id,
        ))
        .unwrap();

    let employee = repo.find_employee(employee_id).unwrap().unwrap();
    assert_eq!(employee.first_name, "John");
    assert_eq!(employee.salary, 5200.0);
    assert_eq!(employee.employer(), None);
    assert!(employee.projects().is_empty());

    let project = repo.find_project(project_id).unwrap().unwrap();
    assert_eq!(project.start_date, date("2024-01-01"));
    assert_eq!(project.status, ProjectStatus::Active);
    assert_eq!(project.employer(), Some(employer_id));

    let employer = repo.find_employer(employer_id).unwrap().unwrap();
    assert!(employer.employees().is_empty());
    assert!(employer.projects().contains(&project_id));
}

#[test]
fn find_returns_none_for_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();

    assert!(repo.find_employee(EmployeeId::new(404)).unwrap().is_none());
    assert!(repo.find_employer(EmployerId::new(404)).unwrap().is_none());
    assert!(repo.find_project(ProjectId::new(404)).unwrap().is_none());
}

#[test]
fn loading_hydrates_links_from_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();
    let employer_id = seed_employer(&repo, "Acme");
    let employee_id = repo
        .insert_employee(&EmployeeInput::new("Ada", "Byron", "Analyst", 100.0))
        .unwrap();
    let project_id = repo
        .insert_project(&ProjectInput::new(
            "Engine",
            "Difference engine",
            date("2024-03-01"),
            date("2024-04-01"),
            employer_id,
        ))
        .unwrap();

    conn.execute(
        "UPDATE employees SET employer_id = ?1 WHERE id = ?2;",
        [employer_id.get(), employee_id.get()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO project_employees (project_id, employee_id) VALUES (?1, ?2);",
        [project_id.get(), employee_id.get()],
    )
    .unwrap();

    let employee = repo.find_employee(employee_id).unwrap().unwrap();
    assert_eq!(employee.employer(), Some(employer_id));
    assert!(employee.has_project(project_id));

    let project = repo.find_project(project_id).unwrap().unwrap();
    assert!(project.has_employee(employee_id));

    let employer = repo.find_employer(employer_id).unwrap().unwrap();
    assert!(employer.employees().contains(&employee_id));

    let staffed = repo.list_employees_of_project(project_id).unwrap();
    assert_eq!(staffed.len(), 1);
    assert_eq!(repo.list_projects_of_employee(employee_id).unwrap().len(), 1);
    assert_eq!(repo.list_employees_of_employer(employer_id).unwrap().len(), 1);
    assert_eq!(repo.list_projects_of_employer(employer_id).unwrap().len(), 1);
}

#[test]
fn list_employees_orders_by_last_then_first_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();
    for (first, last) in [("Zoe", "Adams"), ("Bob", "Young"), ("Amy", "Adams")] {
        repo.insert_employee(&EmployeeInput::new(first, last, "", 1.0))
            .unwrap();
    }

    let names: Vec<String> = repo
        .list_employees()
        .unwrap()
        .into_iter()
        .map(|e| format!("{} {}", e.first_name, e.last_name))
        .collect();
    assert_eq!(names, vec!["Amy Adams", "Zoe Adams", "Bob Young"]);
}

#[test]
fn save_and_delete_report_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();
    let ghost = Employee::new(EmployeeId::new(77), "Ghost", "Writer", "", 1.0);

    match repo.save_employee(&ghost).unwrap_err() {
        RepoError::NotFound { kind, id } => {
            assert_eq!(kind, EntityKind::Employee);
            assert_eq!(id, 77);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        repo.delete_project(ProjectId::new(5)),
        Err(RepoError::NotFound {
            kind: EntityKind::Project,
            id: 5
        })
    ));
}

#[test]
fn insert_rejects_invalid_fields_before_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();

    let err = repo
        .insert_employee(&EmployeeInput::new(" ", "Doe", "", 1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(EntityValidationError::BlankField(_))
    ));

    let mut orphan = ProjectInput::new(
        "Orphan",
        "No owner given",
        date("2024-01-01"),
        date("2024-01-02"),
        EmployerId::new(1),
    );
    orphan.employer_id = None;
    assert!(matches!(
        repo.insert_project(&orphan),
        Err(RepoError::Validation(EntityValidationError::MissingEmployer))
    ));
    assert!(repo.list_employees().unwrap().is_empty());
}

#[test]
fn corrupt_rows_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();
    let employer_id = seed_employer(&repo, "Acme");
    let project_id = repo
        .insert_project(&ProjectInput::new(
            "Apollo",
            "Moon landing",
            date("2024-01-01"),
            date("2024-02-01"),
            employer_id,
        ))
        .unwrap();
    conn.execute(
        "UPDATE projects SET start_date = '2024-01-5' WHERE id = ?1;",
        [project_id.get()],
    )
    .unwrap();

    match repo.find_project(project_id).unwrap_err() {
        RepoError::InvalidData(message) => assert!(message.contains("projects.start_date")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn with_transaction_rolls_back_on_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();

    let result: Result<(), RepoError> = repo.with_transaction(|repo| {
        seed_employer(repo, "Doomed");
        Err(RepoError::InvalidData("abort".to_string()))
    });
    assert!(result.is_err());
    assert!(repo.list_employers().unwrap().is_empty());

    repo.with_transaction(|repo| -> Result<(), RepoError> {
        seed_employer(repo, "Kept");
        Ok(())
    })
    .unwrap();
    assert_eq!(repo.list_employers().unwrap().len(), 1);
    assert!(conn.is_autocommit());
}

#[test]
fn entities_serialize_with_plain_ids() {
    let conn: Connection = open_db_in_memory().unwrap();
    let repo = SqliteStaffRepository::try_new(&conn).unwrap();
    let employer_id = seed_employer(&repo, "Acme");
    let project_id = repo
        .insert_project(&ProjectInput::new(
            "Apollo",
            "Moon landing",
            date("2024-01-01"),
            date("2024-02-01"),
            employer_id,
        ))
        .unwrap();

    let project = repo.find_project(project_id).unwrap().unwrap();
    let json = serde_json::to_value(&project).unwrap();
    assert_eq!(json["id"], serde_json::json!(project_id.get()));
    assert_eq!(json["status"], "ACTIVE");
    assert_eq!(json["start_date"], "2024-01-01");
    assert_eq!(json["employer"], serde_json::json!(employer_id.get()));
}
