//! Inspection entry point for a staffing database.
//!
//! Usage: `staffing_cli [CONFIG.toml]`. Without a config file an empty
//! in-memory database is opened.

use log::info;
use staffing_core::{
    init_from_config, open_db, open_db_in_memory, SqliteStaffRepository, StaffConfig,
    StaffService,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("staffing_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => StaffConfig::load(path)?,
        None => StaffConfig::default(),
    };
    init_from_config(&config.logging)?;

    let conn = match config.database.path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = StaffService::new(SqliteStaffRepository::try_new(&conn)?);

    let employers = service.list_employers()?;
    let employees = service.list_employees()?;
    let projects = service.list_projects()?;
    let unemployed = employees.iter().filter(|e| e.employer().is_none()).count();

    println!("staffing_core version={}", staffing_core::core_version());
    println!("employers={}", employers.len());
    println!("employees={} unemployed={}", employees.len(), unemployed);
    println!("projects={}", projects.len());
    for employer in &employers {
        println!(
            "employer id={} employees={} projects={} name={}",
            employer.id(),
            employer.employees().len(),
            employer.projects().len(),
            employer.name
        );
    }

    info!(
        "event=cli_summary module=cli status=ok employers={} employees={} projects={}",
        employers.len(),
        employees.len(),
        projects.len()
    );
    Ok(())
}
