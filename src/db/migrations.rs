use anyhow::{bail, Context, Result};
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

/// Creates the `local_storage` table on a fresh file and stamps
/// `user_version`. A file already at the schema version is left alone.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    match version {
        SCHEMA_VERSION => return Ok(()),
        0 => {}
        newer => bail!("storage version {newer} is newer than supported schema {SCHEMA_VERSION}"),
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;
    tx.execute_batch(include_str!("schemas/schema_v1.sql"))
        .context("failed to create local_storage table")?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_twice_keeps_the_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES ('k', 'v', 'now')",
            [],
        )
        .unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM local_storage", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(run_migrations(&mut conn).is_err());
    }
}
