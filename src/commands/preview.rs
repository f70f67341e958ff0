use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result, bail};
use staff_import::StaffImportParser;
use staff_import::model::{CertificationCode, ExistingStaffName, ImportRequest, PatternDecisions};
use staff_import::roster::Roster;
use staff_import::util::{read_json, write_json_pretty};
use tracing::{debug, info, warn};

use crate::cli::PreviewArgs;

pub fn run(args: PreviewArgs) -> Result<()> {
    let raw_text = read_paste(&args)?;
    if raw_text.trim().is_empty() {
        bail!("Paste at least one staff name.");
    }

    let required_cert_codes = selected_certs(&args);
    if required_cert_codes.is_empty() {
        bail!("Select at least one certification.");
    }

    let pattern_decisions = match args.decisions_file.as_deref() {
        Some(path) => Some(read_json::<PatternDecisions>(path)?),
        None => None,
    };
    for (pattern_id, decision) in pattern_decisions.iter().flatten() {
        debug!(pattern_id = %pattern_id, decision = decision.as_str(), "loaded pattern decision");
    }

    let existing_staff = load_existing_staff(&args)?;
    let parser = StaffImportParser::new()?;
    let preview = parser.parse(&ImportRequest {
        raw_text: &raw_text,
        required_cert_codes: &required_cert_codes,
        existing_staff: &existing_staff,
        pattern_decisions: pattern_decisions.as_ref(),
    });

    match args.output.as_deref() {
        Some(path) => {
            write_json_pretty(path, &preview)?;
            info!(path = %path.display(), "wrote import preview");
        }
        None => {
            let rendered = serde_json::to_string_pretty(&preview)
                .context("failed to serialize import preview")?;
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}").context("failed to write import preview")?;
        }
    }

    info!(
        org = %args.store.organization_id,
        source_type = preview.detected_source_type.as_str(),
        resolved = preview.resolved.len(),
        unresolved = preview.unresolved.len(),
        pending = preview.pending_pattern_decisions.len(),
        "import preview complete"
    );

    for pending in &preview.pending_pattern_decisions {
        warn!(
            pattern_id = %pending.pattern_id,
            first = %pending.sample_first_token,
            second = %pending.sample_second_token,
            "name order needs a decision"
        );
    }
    if preview.needs_decisions() {
        warn!("answer pending name-order decisions and rerun with --decisions-file");
    }

    Ok(())
}

fn read_paste(args: &PreviewArgs) -> Result<String> {
    if args.reads_stdin() {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read paste from stdin")?;
        return Ok(raw);
    }

    fs::read_to_string(&args.paste_file)
        .with_context(|| format!("failed to read {}", args.paste_file.display()))
}

fn selected_certs(args: &PreviewArgs) -> Vec<CertificationCode> {
    if args.all_certs {
        return CertificationCode::ALL.to_vec();
    }

    let chosen = args
        .certs
        .iter()
        .copied()
        .map(CertificationCode::from)
        .collect::<Vec<CertificationCode>>();
    CertificationCode::canonical_set(&chosen)
}

fn load_existing_staff(args: &PreviewArgs) -> Result<Vec<ExistingStaffName>> {
    let db_path = args.store.resolved_db_path();
    if !db_path.exists() {
        warn!(path = %db_path.display(), "roster database missing; skipping existing-staff check");
        return Ok(Vec::new());
    }

    let roster = Roster::open_read_only(&db_path)?;
    let names = roster.list_staff_names(&args.store.organization_id)?;
    info!(existing = names.len(), "loaded existing staff names");
    Ok(names)
}
