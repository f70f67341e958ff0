use anyhow::Result;
use staff_import::roster::Roster;
use staff_import::util::now_utc_string;
use tracing::{info, warn};

use crate::cli::StatusArgs;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();

    info!(
        data_root = %args.store.data_root.display(),
        org = %args.store.organization_id,
        checked_at = %now_utc_string(),
        "status requested"
    );

    if !db_path.exists() {
        warn!(path = %db_path.display(), "roster database missing");
        return Ok(());
    }

    let roster = Roster::open_read_only(&db_path)?;
    let staff_count = roster.count_staff(&args.store.organization_id)?;
    let requirement_count = roster.count_requirements(&args.store.organization_id)?;

    info!(
        path = %db_path.display(),
        staff = staff_count,
        requirements = requirement_count,
        "roster status"
    );

    if args.details {
        for name in roster.list_staff_names(&args.store.organization_id)? {
            let codes = roster
                .required_cert_codes(&args.store.organization_id, &name)?
                .unwrap_or_default();
            let required = codes
                .iter()
                .map(|code| code.as_str())
                .collect::<Vec<&str>>()
                .join(",");

            info!(
                first = %name.first_name,
                middle = %name.middle_name.as_deref().unwrap_or(""),
                last = %name.last_name,
                required = %required,
                "staff requirements"
            );
        }
    }

    Ok(())
}
