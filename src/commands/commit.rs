use anyhow::{Context, Result};
use staff_import::commit::{
    collect_commit_rows, validate_commit_rows, validate_confirmed_duplicates,
};
use staff_import::model::{CommitRowDraft, DuplicateDecisions};
use staff_import::roster::Roster;
use staff_import::util::{ensure_directory, read_json};
use tracing::info;

use crate::cli::CommitArgs;

pub fn run(args: CommitArgs) -> Result<()> {
    let drafts: Vec<CommitRowDraft> = read_json(&args.rows_file)?;
    let decisions = match args.duplicate_decisions_file.as_deref() {
        Some(path) => read_json::<DuplicateDecisions>(path)?,
        None => DuplicateDecisions::new(),
    };

    let rows = collect_commit_rows(&drafts).into_rows()?;
    validate_confirmed_duplicates(&rows, &decisions)?;
    validate_commit_rows(&rows)?;

    let db_path = args.store.resolved_db_path();
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let mut roster = Roster::open(&db_path)?;
    let outcome = roster
        .import_rows_with_requirements(&args.store.organization_id, &rows)
        .with_context(|| format!("failed to import staff into {}", db_path.display()))?;

    info!(
        org = %args.store.organization_id,
        submitted = drafts.len(),
        committed = rows.len(),
        inserted = outcome.inserted_count,
        matched = outcome.matched_count,
        "staff import committed"
    );

    Ok(())
}
