//! Staff repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Map Employee/Employer/Project records to the `employees`, `employers`,
//!   `projects` and `project_employees` tables.
//! - Hydrate association sets when loading so entities arrive complete.
//!
//! # Invariants
//! - Ids are assigned by SQLite on insert and never reused by callers.
//! - Saving an employee or project rewrites that entity's assignment rows.
//! - Multi-statement writes are atomic; inside an open transaction they run
//!   under a savepoint so a failure undoes only their own writes.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::employee::{Employee, EmployeeInput};
use crate::model::employer::{Employer, EmployerInput};
use crate::model::ids::{EmployeeId, EmployerId, EntityKind, ProjectId};
use crate::model::project::{Project, ProjectInput, ProjectStatus};
use crate::model::validation::{parse_project_date, EntityValidationError, DATE_FORMAT};
use chrono::NaiveDate;
use log::error;
use rusqlite::{params, Connection, Params, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    e.id AS id,
    e.first_name AS first_name,
    e.last_name AS last_name,
    e.job_title AS job_title,
    e.salary AS salary,
    e.employer_id AS employer_id
FROM employees e";

const EMPLOYER_SELECT_SQL: &str = "SELECT
    r.id AS id,
    r.name AS name,
    r.address AS address
FROM employers r";

const PROJECT_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.name AS name,
    p.description AS description,
    p.start_date AS start_date,
    p.end_date AS end_date,
    p.status AS status,
    p.employer_id AS employer_id
FROM projects p";

const EMPLOYEE_ORDER_SQL: &str = "ORDER BY e.last_name ASC, e.first_name ASC, e.id ASC";

const SAVEPOINT_NAME: &str = "staff_op";

const REQUIRED_TABLES: [&str; 4] = ["employers", "employees", "projects", "project_employees"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for staff persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Entity fields violate a validation rule.
    Validation(EntityValidationError),
    /// Underlying SQLite/bootstrap error, including constraint violations.
    Db(DbError),
    /// No row with this id exists.
    NotFound { kind: EntityKind, id: i64 },
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted staff data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "staff repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "staff repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence collaborator used by the lifecycle coordinator.
pub trait StaffRepository {
    /// Runs `work` inside one transaction.
    ///
    /// Commits when `work` succeeds; every write is rolled back when it fails.
    fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;

    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn find_employer(&self, id: EmployerId) -> RepoResult<Option<Employer>>;
    fn find_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;

    /// Inserts a new unassociated employee and returns its assigned id.
    fn insert_employee(&self, input: &EmployeeInput) -> RepoResult<EmployeeId>;
    /// Inserts a new employer with no employees or projects.
    fn insert_employer(&self, input: &EmployerInput) -> RepoResult<EmployerId>;
    /// Inserts a new project owned by `input.employer_id`.
    fn insert_project(&self, input: &ProjectInput) -> RepoResult<ProjectId>;

    /// Writes scalar fields, employer link and assignment rows of an employee.
    fn save_employee(&self, employee: &Employee) -> RepoResult<()>;
    /// Writes scalar fields of an employer.
    fn save_employer(&self, employer: &Employer) -> RepoResult<()>;
    /// Writes scalar fields, employer link and assignment rows of a project.
    fn save_project(&self, project: &Project) -> RepoResult<()>;

    fn delete_employee(&self, id: EmployeeId) -> RepoResult<()>;
    fn delete_employer(&self, id: EmployerId) -> RepoResult<()>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;

    /// Lists employees ordered by last name, first name, id.
    fn list_employees(&self) -> RepoResult<Vec<Employee>>;
    fn list_employers(&self) -> RepoResult<Vec<Employer>>;
    fn list_projects(&self) -> RepoResult<Vec<Project>>;

    fn list_employees_of_employer(&self, employer_id: EmployerId) -> RepoResult<Vec<Employee>>;
    fn list_employees_of_project(&self, project_id: ProjectId) -> RepoResult<Vec<Employee>>;
    fn list_projects_of_employer(&self, employer_id: EmployerId) -> RepoResult<Vec<Project>>;
    fn list_projects_of_employee(&self, employee_id: EmployeeId) -> RepoResult<Vec<Project>>;
}

/// SQLite-backed staff repository.
pub struct SqliteStaffRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStaffRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_staff_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn write_atomically<T>(&self, work: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        if !self.conn.is_autocommit() {
            return within_savepoint(self.conn, || work(self.conn));
        }
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let output = work(self.conn)?;
        tx.commit()?;
        Ok(output)
    }
}

impl StaffRepository for SqliteStaffRepository<'_> {
    fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        if !self.conn.is_autocommit() {
            return within_savepoint(self.conn, || work(self));
        }
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let output = work(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(output)
    }

    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT_SQL} WHERE e.id = ?1;");
        Ok(query_employees(self.conn, &sql, [id.get()])?.pop())
    }

    fn find_employer(&self, id: EmployerId) -> RepoResult<Option<Employer>> {
        let sql = format!("{EMPLOYER_SELECT_SQL} WHERE r.id = ?1;");
        Ok(query_employers(self.conn, &sql, [id.get()])?.pop())
    }

    fn find_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let sql = format!("{PROJECT_SELECT_SQL} WHERE p.id = ?1;");
        Ok(query_projects(self.conn, &sql, [id.get()])?.pop())
    }

    fn insert_employee(&self, input: &EmployeeInput) -> RepoResult<EmployeeId> {
        input.validate()?;
        self.conn.execute(
            "INSERT INTO employees (first_name, last_name, job_title, salary, employer_id)
             VALUES (?1, ?2, ?3, ?4, NULL);",
            params![
                input.first_name.as_str(),
                input.last_name.as_str(),
                input.job_title.as_str(),
                input.salary,
            ],
        )?;
        Ok(EmployeeId::new(self.conn.last_insert_rowid()))
    }

    fn insert_employer(&self, input: &EmployerInput) -> RepoResult<EmployerId> {
        input.validate()?;
        self.conn.execute(
            "INSERT INTO employers (name, address) VALUES (?1, ?2);",
            params![input.name.as_str(), input.address.as_str()],
        )?;
        Ok(EmployerId::new(self.conn.last_insert_rowid()))
    }

    fn insert_project(&self, input: &ProjectInput) -> RepoResult<ProjectId> {
        input.validate()?;
        let employer_id = input
            .employer_id
            .ok_or(EntityValidationError::MissingEmployer)?;
        self.conn.execute(
            "INSERT INTO projects (name, description, start_date, end_date, status, employer_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                input.name.as_str(),
                input.description.as_str(),
                date_to_db(input.start_date),
                date_to_db(input.end_date),
                input.status.as_str(),
                employer_id.get(),
            ],
        )?;
        Ok(ProjectId::new(self.conn.last_insert_rowid()))
    }

    fn save_employee(&self, employee: &Employee) -> RepoResult<()> {
        employee.validate()?;
        self.write_atomically(|conn| {
            let changed = conn.execute(
                "UPDATE employees
                 SET
                    first_name = ?2,
                    last_name = ?3,
                    job_title = ?4,
                    salary = ?5,
                    employer_id = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    employee.id().get(),
                    employee.first_name.as_str(),
                    employee.last_name.as_str(),
                    employee.job_title.as_str(),
                    employee.salary,
                    employee.employer().map(EmployerId::get),
                ],
            )?;
            if changed == 0 {
                return Err(not_found(EntityKind::Employee, employee.id().get()));
            }

            conn.execute(
                "DELETE FROM project_employees WHERE employee_id = ?1;",
                [employee.id().get()],
            )?;
            for project_id in employee.projects() {
                conn.execute(
                    "INSERT INTO project_employees (project_id, employee_id) VALUES (?1, ?2);",
                    params![project_id.get(), employee.id().get()],
                )?;
            }
            Ok(())
        })
    }

    fn save_employer(&self, employer: &Employer) -> RepoResult<()> {
        employer.validate()?;
        let changed = self.conn.execute(
            "UPDATE employers
             SET
                name = ?2,
                address = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                employer.id().get(),
                employer.name.as_str(),
                employer.address.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Employer, employer.id().get()));
        }
        Ok(())
    }

    fn save_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        let employer_id = project
            .employer()
            .ok_or(EntityValidationError::MissingEmployer)?;
        self.write_atomically(|conn| {
            let changed = conn.execute(
                "UPDATE projects
                 SET
                    name = ?2,
                    description = ?3,
                    start_date = ?4,
                    end_date = ?5,
                    status = ?6,
                    employer_id = ?7,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    project.id().get(),
                    project.name.as_str(),
                    project.description.as_str(),
                    date_to_db(project.start_date),
                    date_to_db(project.end_date),
                    project.status.as_str(),
                    employer_id.get(),
                ],
            )?;
            if changed == 0 {
                return Err(not_found(EntityKind::Project, project.id().get()));
            }

            conn.execute(
                "DELETE FROM project_employees WHERE project_id = ?1;",
                [project.id().get()],
            )?;
            for employee_id in project.employees() {
                conn.execute(
                    "INSERT INTO project_employees (project_id, employee_id) VALUES (?1, ?2);",
                    params![project.id().get(), employee_id.get()],
                )?;
            }
            Ok(())
        })
    }

    fn delete_employee(&self, id: EmployeeId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::Employee, id.get())
    }

    fn delete_employer(&self, id: EmployerId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::Employer, id.get())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        delete_row(self.conn, EntityKind::Project, id.get())
    }

    fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT_SQL} {EMPLOYEE_ORDER_SQL};");
        query_employees(self.conn, &sql, [])
    }

    fn list_employers(&self) -> RepoResult<Vec<Employer>> {
        let sql = format!("{EMPLOYER_SELECT_SQL} ORDER BY r.id ASC;");
        query_employers(self.conn, &sql, [])
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let sql = format!("{PROJECT_SELECT_SQL} ORDER BY p.id ASC;");
        query_projects(self.conn, &sql, [])
    }

    fn list_employees_of_employer(&self, employer_id: EmployerId) -> RepoResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT_SQL} WHERE e.employer_id = ?1 {EMPLOYEE_ORDER_SQL};");
        query_employees(self.conn, &sql, [employer_id.get()])
    }

    fn list_employees_of_project(&self, project_id: ProjectId) -> RepoResult<Vec<Employee>> {
        let sql = format!(
            "{EMPLOYEE_SELECT_SQL}
             INNER JOIN project_employees pe ON pe.employee_id = e.id
             WHERE pe.project_id = ?1
             {EMPLOYEE_ORDER_SQL};"
        );
        query_employees(self.conn, &sql, [project_id.get()])
    }

    fn list_projects_of_employer(&self, employer_id: EmployerId) -> RepoResult<Vec<Project>> {
        let sql = format!("{PROJECT_SELECT_SQL} WHERE p.employer_id = ?1 ORDER BY p.id ASC;");
        query_projects(self.conn, &sql, [employer_id.get()])
    }

    fn list_projects_of_employee(&self, employee_id: EmployeeId) -> RepoResult<Vec<Project>> {
        let sql = format!(
            "{PROJECT_SELECT_SQL}
             INNER JOIN project_employees pe ON pe.project_id = p.id
             WHERE pe.employee_id = ?1
             ORDER BY p.id ASC;"
        );
        query_projects(self.conn, &sql, [employee_id.get()])
    }
}

/// Runs `work` inside the caller's open transaction, undoing only its own
/// writes when it fails.
fn within_savepoint<T, E>(conn: &Connection, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
where
    E: From<RepoError>,
{
    conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT_NAME};"))
        .map_err(RepoError::from)?;
    match work() {
        Ok(output) => {
            conn.execute_batch(&format!("RELEASE {SAVEPOINT_NAME};"))
                .map_err(RepoError::from)?;
            Ok(output)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.execute_batch(&format!(
                "ROLLBACK TO {SAVEPOINT_NAME}; RELEASE {SAVEPOINT_NAME};"
            )) {
                error!(
                    "event=savepoint_rollback module=repo status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

fn query_employees<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<Employee>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut employees = Vec::new();
    while let Some(row) = rows.next()? {
        employees.push(parse_employee_row(row)?);
    }

    for employee in &mut employees {
        for project_id in linked_ids(
            conn,
            "SELECT project_id FROM project_employees WHERE employee_id = ?1 ORDER BY project_id;",
            employee.id().get(),
        )? {
            employee.insert_project(ProjectId::new(project_id));
        }
    }
    Ok(employees)
}

fn query_employers<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<Employer>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut employers = Vec::new();
    while let Some(row) = rows.next()? {
        employers.push(parse_employer_row(row)?);
    }

    for employer in &mut employers {
        let id = employer.id().get();
        for employee_id in linked_ids(
            conn,
            "SELECT id FROM employees WHERE employer_id = ?1 ORDER BY id;",
            id,
        )? {
            employer.insert_employee(EmployeeId::new(employee_id));
        }
        for project_id in linked_ids(
            conn,
            "SELECT id FROM projects WHERE employer_id = ?1 ORDER BY id;",
            id,
        )? {
            employer.insert_project(ProjectId::new(project_id));
        }
    }
    Ok(employers)
}

fn query_projects<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<Project>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut projects = Vec::new();
    while let Some(row) = rows.next()? {
        projects.push(parse_project_row(row)?);
    }

    for project in &mut projects {
        for employee_id in linked_ids(
            conn,
            "SELECT employee_id FROM project_employees WHERE project_id = ?1 ORDER BY employee_id;",
            project.id().get(),
        )? {
            project.insert_employee(EmployeeId::new(employee_id));
        }
    }
    Ok(projects)
}

fn linked_ids(conn: &Connection, sql: &str, owner_id: i64) -> RepoResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query([owner_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let mut employee = Employee::new(
        EmployeeId::new(row.get("id")?),
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
        row.get::<_, String>("job_title")?,
        row.get::<_, f64>("salary")?,
    );
    employee.set_employer(row.get::<_, Option<i64>>("employer_id")?.map(EmployerId::new));
    employee.validate().map_err(|err| {
        RepoError::InvalidData(format!("employee {}: {err}", employee.id()))
    })?;
    Ok(employee)
}

fn parse_employer_row(row: &Row<'_>) -> RepoResult<Employer> {
    let employer = Employer::new(
        EmployerId::new(row.get("id")?),
        row.get::<_, String>("name")?,
        row.get::<_, String>("address")?,
    );
    employer.validate().map_err(|err| {
        RepoError::InvalidData(format!("employer {}: {err}", employer.id()))
    })?;
    Ok(employer)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id = ProjectId::new(row.get("id")?);

    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid project status `{status_text}` in projects.status"))
    })?;

    let project = Project::new(
        id,
        row.get::<_, String>("name")?,
        row.get::<_, String>("description")?,
        parse_db_date(&row.get::<_, String>("start_date")?, "projects.start_date")?,
        parse_db_date(&row.get::<_, String>("end_date")?, "projects.end_date")?,
        status,
        EmployerId::new(row.get("employer_id")?),
    );
    project
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("project {id}: {err}")))?;
    Ok(project)
}

fn delete_row(conn: &Connection, kind: EntityKind, id: i64) -> RepoResult<()> {
    let sql = match kind {
        EntityKind::Employee => "DELETE FROM employees WHERE id = ?1;",
        EntityKind::Employer => "DELETE FROM employers WHERE id = ?1;",
        EntityKind::Project => "DELETE FROM projects WHERE id = ?1;",
    };
    let changed = conn.execute(sql, [id])?;
    if changed == 0 {
        return Err(not_found(kind, id));
    }
    Ok(())
}

fn not_found(kind: EntityKind, id: i64) -> RepoError {
    RepoError::NotFound { kind, id }
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_db_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    parse_project_date(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn ensure_staff_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
