use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::domain::diff::quote_ident;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn attach_database(conn: &Connection, db_path: &Path, alias: &str) -> Result<()> {
    let path = db_path.to_string_lossy().into_owned();
    conn.execute(
        &format!("ATTACH DATABASE ?1 AS {}", quote_ident(alias)),
        params![path],
    )
    .with_context(|| format!("failed to attach {} as {alias}", db_path.display()))?;
    Ok(())
}
