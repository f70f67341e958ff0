use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};
use tracing::{debug, info};

use crate::import::collision::{first_last_key, full_name_key};
use crate::model::{CertificationCode, CommitRow, ExistingStaffName, ImportOutcome, NameParts};


const DB_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug)]
pub struct Roster {
    connection: Connection,
}

impl Roster {
    pub fn open(path: &Path) -> Result<Self> {
        let connection =
            Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn open_read_only(path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {} read-only", path.display()))?;
        Ok(Self { connection })
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory roster database")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn list_staff_names(&self, organization_id: &str) -> Result<Vec<ExistingStaffName>> {
        let mut statement = self.connection.prepare(
            "
            SELECT first_name, middle_name, last_name
            FROM staff
            WHERE organization_id = ?1
            ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE, staff_id
            ",
        )?;

        let rows = statement.query_map(params![organization_id], |row| {
            Ok(NameParts {
                first_name: row.get(0)?,
                middle_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.context("failed to read staff row")?);
        }
        Ok(names)
    }

    pub fn count_staff(&self, organization_id: &str) -> Result<i64> {
        query_count(
            &self.connection,
            "SELECT COUNT(*) FROM staff WHERE organization_id = ?1",
            organization_id,
        )
    }

    pub fn count_requirements(&self, organization_id: &str) -> Result<i64> {
        query_count(
            &self.connection,
            "SELECT COUNT(*) FROM staff_certification_requirements WHERE organization_id = ?1",
            organization_id,
        )
    }

    pub fn required_cert_codes(
        &self,
        organization_id: &str,
        name: &NameParts,
    ) -> Result<Option<Vec<CertificationCode>>> {
        let Some(staff_id) = find_staff_id(
            &self.connection,
            organization_id,
            &name.first_name,
            name.middle_name.as_deref(),
            &name.last_name,
        )?
        else {
            return Ok(None);
        };

        let mut statement = self.connection.prepare(
            "
            SELECT cert_code
            FROM staff_certification_requirements
            WHERE staff_id = ?1 AND is_required = 1
            ",
        )?;
        let rows = statement.query_map(params![staff_id], |row| row.get::<_, String>(0))?;

        let mut codes = Vec::new();
        for row in rows {
            let raw = row.context("failed to read certification requirement")?;
            let code = raw
                .parse::<CertificationCode>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid certification code stored for staff {staff_id}"))?;
            codes.push(code);
        }

        Ok(Some(CertificationCode::canonical_set(&codes)))
    }

    pub fn import_rows_with_requirements(
        &mut self,
        organization_id: &str,
        rows: &[CommitRow],
    ) -> Result<ImportOutcome> {
        let final_rows = collapse_full_name_duplicates(rows);
        self.assert_middle_name_on_collisions(organization_id, &final_rows)?;

        let tx = self.connection.transaction()?;
        let mut outcome = ImportOutcome::default();

        for row in &final_rows {
            let existing = find_staff_id(
                &tx,
                organization_id,
                &row.first_name,
                row.middle_name.as_deref(),
                &row.last_name,
            )?;

            let staff_id = match existing {
                Some(staff_id) => {
                    tx.execute(
                        "UPDATE staff SET updated_at = ?2 WHERE staff_id = ?1",
                        params![staff_id, Utc::now()],
                    )?;
                    outcome.matched_count += 1;
                    staff_id
                }
                None => {
                    let staff_id = insert_staff(&tx, organization_id, row)?;
                    outcome.inserted_count += 1;
                    staff_id
                }
            };

            replace_requirements(&tx, organization_id, staff_id, &row.required_cert_codes)?;
        }

        tx.commit().context("failed to commit staff import")?;

        info!(
            org = %organization_id,
            inserted = outcome.inserted_count,
            matched = outcome.matched_count,
            "staff rows imported"
        );

        Ok(outcome)
    }

    pub fn clear_staff(&mut self, organization_id: &str) -> Result<usize> {
        let tx = self.connection.transaction()?;
        tx.execute(
            "DELETE FROM staff_certification_requirements WHERE organization_id = ?1",
            params![organization_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM staff WHERE organization_id = ?1",
            params![organization_id],
        )?;
        tx.commit().context("failed to commit staff cleanup")?;

        Ok(deleted)
    }

    fn assert_middle_name_on_collisions(
        &self,
        organization_id: &str,
        rows: &[CommitRow],
    ) -> Result<()> {
        let mut group_order = Vec::<String>::new();
        let mut groups = HashMap::<String, Vec<&CommitRow>>::new();
        for row in rows {
            let key = first_last_key(&row.first_name, &row.last_name);
            let group = groups.entry(key.clone()).or_default();
            if group.is_empty() {
                group_order.push(key);
            }
            group.push(row);
        }

        let mut statement = self.connection.prepare(
            "
            SELECT middle_name
            FROM staff
            WHERE organization_id = ?1
              AND lower(first_name) = lower(?2)
              AND lower(last_name) = lower(?3)
            ",
        )?;

        for key in &group_order {
            let Some(grouped) = groups.get(key) else {
                continue;
            };
            let Some(sample) = grouped.first() else {
                continue;
            };

            let stored = statement
                .query_map(
                    params![organization_id, &sample.first_name, &sample.last_name],
                    |row| row.get::<_, Option<String>>(0),
                )?
                .collect::<rusqlite::Result<Vec<Option<String>>>>()?;

            let total = stored.len() + grouped.len();
            if total <= 1 {
                continue;
            }

            let missing_middle = grouped.iter().any(|row| is_blank(row.middle_name.as_deref()))
                || stored.iter().any(|middle| is_blank(middle.as_deref()));
            if missing_middle {
                bail!(
                    "Middle name/initial required for duplicate staff name {} {}.",
                    sample.first_name,
                    sample.last_name
                );
            }
        }

        Ok(())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;

    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS staff (
              staff_id INTEGER PRIMARY KEY AUTOINCREMENT,
              organization_id TEXT NOT NULL,
              first_name TEXT NOT NULL,
              middle_name TEXT,
              last_name TEXT NOT NULL,
              is_active INTEGER NOT NULL DEFAULT 1,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS staff_org_last_first_idx
              ON staff(organization_id, last_name, first_name);

            CREATE TABLE IF NOT EXISTS staff_certification_requirements (
              organization_id TEXT NOT NULL,
              staff_id INTEGER NOT NULL,
              cert_code TEXT NOT NULL,
              is_required INTEGER NOT NULL DEFAULT 1,
              created_at TEXT NOT NULL,
              PRIMARY KEY (staff_id, cert_code),
              FOREIGN KEY(staff_id) REFERENCES staff(staff_id) ON DELETE CASCADE
            );
            ",
        )
        .context("failed to create roster schema")?;

    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record roster schema version")?;

    Ok(())
}

fn query_count(connection: &Connection, sql: &str, organization_id: &str) -> Result<i64> {
    let count = connection.query_row(sql, params![organization_id], |row| row.get(0))?;
    Ok(count)
}

fn find_staff_id(
    connection: &Connection,
    organization_id: &str,
    first_name: &str,
    middle_name: Option<&str>,
    last_name: &str,
) -> Result<Option<i64>> {
    let middle_name = middle_name.map(str::trim).filter(|value| !value.is_empty());
    let staff_id = connection
        .query_row(
            "
            SELECT staff_id
            FROM staff
            WHERE organization_id = ?1
              AND lower(first_name) = lower(?2)
              AND lower(last_name) = lower(?3)
              AND ((?4 IS NULL AND middle_name IS NULL) OR lower(middle_name) = lower(?4))
            ORDER BY staff_id
            LIMIT 1
            ",
            params![organization_id, first_name.trim(), last_name.trim(), middle_name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(staff_id)
}

fn insert_staff(tx: &Transaction<'_>, organization_id: &str, row: &CommitRow) -> Result<i64> {
    let now = Utc::now();
    let middle_name = row
        .middle_name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    tx.execute(
        "
        INSERT INTO staff(
          organization_id, first_name, middle_name, last_name, is_active, created_at, updated_at
        )
        VALUES(?1, ?2, ?3, ?4, 1, ?5, ?5)
        ",
        params![
            organization_id,
            row.first_name.trim(),
            middle_name,
            row.last_name.trim(),
            now
        ],
    )
    .with_context(|| {
        format!(
            "failed to insert staff {} {}",
            row.first_name, row.last_name
        )
    })?;

    Ok(tx.last_insert_rowid())
}

fn replace_requirements(
    tx: &Transaction<'_>,
    organization_id: &str,
    staff_id: i64,
    codes: &[CertificationCode],
) -> Result<()> {
    tx.execute(
        "
        DELETE FROM staff_certification_requirements
        WHERE organization_id = ?1 AND staff_id = ?2
        ",
        params![organization_id, staff_id],
    )?;

    let mut statement = tx.prepare(
        "
        INSERT INTO staff_certification_requirements(
          organization_id, staff_id, cert_code, is_required, created_at
        )
        VALUES(?1, ?2, ?3, 1, ?4)
        ",
    )?;

    let now = Utc::now();
    for code in CertificationCode::canonical_set(codes) {
        statement.execute(params![organization_id, staff_id, code.as_str(), now])?;
    }

    debug!(staff_id, requirements = codes.len(), "replaced certification requirements");
    Ok(())
}

fn collapse_full_name_duplicates(rows: &[CommitRow]) -> Vec<CommitRow> {
    let mut collapsed = Vec::<CommitRow>::with_capacity(rows.len());
    let mut positions = HashMap::<String, usize>::new();

    for row in rows {
        let key = full_name_key(&NameParts {
            first_name: row.first_name.clone(),
            middle_name: row.middle_name.clone(),
            last_name: row.last_name.clone(),
        });
        match positions.get(&key) {
            Some(&position) => collapsed[position] = row.clone(),
            None => {
                positions.insert(key, collapsed.len());
                collapsed.push(row.clone());
            }
        }
    }

    collapsed
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|inner| inner.trim().is_empty()).unwrap_or(true)
}
