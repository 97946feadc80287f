//! Lookup command handler.

use serde::Serialize;
use tabled::Tabled;

use qpw_core::{Connection, LookupKind, LookupLoad, LookupOption, LookupSet};

use crate::cli::{GlobalOpts, LookupsArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct LookupEntry<'a> {
    kind: LookupKind,
    #[serde(flatten)]
    option: &'a LookupOption,
}

#[derive(Tabled)]
struct LookupRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
}

fn to_row(entry: &LookupEntry<'_>) -> LookupRow {
    LookupRow {
        kind: entry.kind.to_string(),
        id: entry.option.id.clone(),
        label: entry.option.label.clone(),
    }
}

pub async fn handle(
    connection: &Connection,
    args: LookupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.kind {
        Some(kind) => {
            let options = connection.load_lookup(kind).await?;
            let entries: Vec<LookupEntry<'_>> = options
                .iter()
                .map(|option| LookupEntry { kind, option })
                .collect();
            render(&entries, global);
        }
        None => {
            let set = load_all(connection).await?;
            render_set(&set, global);
        }
    }
    Ok(())
}

/// Load every lookup, turning a partial failure into a single error.
pub async fn load_all(connection: &Connection) -> Result<LookupSet, CliError> {
    let load = connection.load_lookups().await;
    if load.is_complete() {
        return Ok(load.lookups);
    }
    Err(incomplete(load))
}

fn incomplete(mut load: LookupLoad) -> CliError {
    if let Some(pos) = load.failures.iter().position(|f| f.error.requires_login()) {
        return load.failures.swap_remove(pos).error.into();
    }

    let details = load
        .failures
        .iter()
        .map(|f| format!("{} ({}): {}", f.kind, f.path, f.error))
        .collect::<Vec<_>>()
        .join("\n");
    CliError::LookupsIncomplete {
        failed: load.failures.len(),
        details,
    }
}

fn render_set(set: &LookupSet, global: &GlobalOpts) {
    let entries: Vec<LookupEntry<'_>> = set
        .iter()
        .flat_map(|(kind, options)| options.iter().map(move |option| LookupEntry { kind, option }))
        .collect();
    render(&entries, global);
}

fn render(entries: &[LookupEntry<'_>], global: &GlobalOpts) {
    let out = output::render_list(&global.output(), entries, to_row, |e| e.option.id.clone());
    output::print_output(&out, global.quiet);
}
