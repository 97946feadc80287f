//! Criteria command handlers.

use std::path::Path;

use chrono::{Local, NaiveDate};

use qpw_core::{Connection, Criteria};

use crate::cli::GlobalOpts;
use crate::commands::lookups;
use crate::error::CliError;
use crate::output;

/// Print initial criteria ending on `today` (or the local date).
pub fn new(today: Option<NaiveDate>, global: &GlobalOpts) {
    let criteria = Criteria::new(today.unwrap_or_else(|| Local::now().date_naive()));
    print_criteria(&criteria, global);
}

/// Print the effective view of a criteria file. No network access.
pub fn effective(file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let criteria = read_criteria(file)?;
    print_criteria(&criteria.effective(), global);
    Ok(())
}

/// Validate a criteria file against lookups loaded now.
pub async fn check(
    connection: &Connection,
    file: &Path,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let criteria = read_criteria(file)?;
    let set = lookups::load_all(connection).await?;
    criteria.validate(&set)?;

    if !global.quiet {
        eprintln!("{}: criteria valid", file.display());
    }
    Ok(())
}

/// Read and parse a criteria JSON document.
pub fn read_criteria(path: &Path) -> Result<Criteria, CliError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_criteria(criteria: &Criteria, global: &GlobalOpts) {
    let out = output::render_single(
        &global.output(),
        criteria,
        output::render_json_pretty,
        |c| format!("{}..{}", c.date_range.start, c.date_range.end),
    );
    output::print_output(&out, global.quiet);
}
