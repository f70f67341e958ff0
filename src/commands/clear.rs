use anyhow::{Result, bail};
use staff_import::roster::Roster;
use tracing::{info, warn};

use crate::cli::ClearArgs;

pub fn run(args: ClearArgs) -> Result<()> {
    if !args.yes {
        bail!(
            "refusing to clear staff for {} without --yes",
            args.store.organization_id
        );
    }

    let db_path = args.store.resolved_db_path();
    if !db_path.exists() {
        warn!(path = %db_path.display(), "roster database missing; nothing to clear");
        return Ok(());
    }

    let mut roster = Roster::open(&db_path)?;
    let removed = roster.clear_staff(&args.store.organization_id)?;

    info!(
        org = %args.store.organization_id,
        removed,
        "cleared staff roster"
    );

    Ok(())
}
