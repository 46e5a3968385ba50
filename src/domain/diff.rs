//! Turns an edited grid into the write statements that persist it.

use crate::domain::entities::edit::{DeletedSet, GridRow, Statement};
use crate::domain::entities::table::{ColumnMeta, SnapshotRow};
use crate::domain::error::{EditError, EditResult};
use crate::domain::unique_key::resolve_unique_key;

pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn qualified_table(database: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(database), quote_ident(table))
}

/// Diffs `grid` against `snapshot` and returns the statements that make the
/// server match the grid.
///
/// Rows below `snapshot.len()` existed at load time and produce at most one
/// DELETE or UPDATE each, in row order. Rows past it were appended and each
/// produce one INSERT, after all existing-row statements. Appended rows that
/// were flagged for deletion before ever being saved are dropped.
pub fn compute_statements(
    snapshot: &[SnapshotRow],
    grid: &[GridRow],
    deleted: &DeletedSet,
    columns: &[ColumnMeta],
    database: &str,
    table: &str,
) -> EditResult<Vec<Statement>> {
    check_alignment(snapshot, grid, columns)?;
    let Some(key) = resolve_unique_key(columns) else {
        return Ok(Vec::new());
    };

    let target = qualified_table(database, table);
    let key_ident = quote_ident(&key.name);
    let mut statements = Vec::new();

    for (row_idx, (before, after)) in snapshot.iter().zip(grid).enumerate() {
        // Loaded key value, not the grid's: an edited key still hits its row.
        let unique_value = before[key.index].as_text().into_owned();

        if deleted.contains(row_idx) {
            statements.push(Statement::new(
                format!("DELETE FROM {target} WHERE {key_ident} = ?"),
                vec![unique_value],
            ));
            continue;
        }

        let mut assignments = Vec::new();
        let mut parameters = Vec::new();
        for ((column, old), new) in columns.iter().zip(before).zip(after) {
            let encoded = new.encode();
            if encoded == old.as_text() {
                continue;
            }
            assignments.push(format!("{} = ?", quote_ident(&column.name)));
            parameters.push(encoded);
        }

        if !assignments.is_empty() {
            statements.push(Statement::new(
                format!(
                    "UPDATE {target} SET {} WHERE {key_ident} = {}",
                    assignments.join(", "),
                    quote_literal(&unique_value)
                ),
                parameters,
            ));
        }
    }

    for (row_idx, row) in grid.iter().enumerate().skip(snapshot.len()) {
        if deleted.contains(row_idx) {
            tracing::debug!(row_idx, "skipping appended row flagged for deletion");
            continue;
        }
        statements.push(insert_statement(&target, columns, row));
    }

    for statement in &statements {
        tracing::debug!(%statement, "generated statement");
    }
    Ok(statements)
}

/// Empty cells are left out of the column list so the server fills them
/// from the column default, NULL, or the next rowid.
fn insert_statement(target: &str, columns: &[ColumnMeta], row: &GridRow) -> Statement {
    let (names, parameters): (Vec<String>, Vec<String>) = columns
        .iter()
        .zip(row)
        .map(|(column, cell)| (quote_ident(&column.name), cell.encode()))
        .filter(|(_, value)| !value.is_empty())
        .unzip();

    if parameters.is_empty() {
        return Statement::new(format!("INSERT INTO {target} DEFAULT VALUES"), parameters);
    }
    let placeholders = vec!["?"; parameters.len()].join(", ");
    if parameters.len() == columns.len() {
        Statement::new(
            format!("INSERT INTO {target} VALUES ({placeholders})"),
            parameters,
        )
    } else {
        Statement::new(
            format!(
                "INSERT INTO {target} ({}) VALUES ({placeholders})",
                names.join(", ")
            ),
            parameters,
        )
    }
}

fn check_alignment(
    snapshot: &[SnapshotRow],
    grid: &[GridRow],
    columns: &[ColumnMeta],
) -> EditResult<()> {
    if grid.len() < snapshot.len() {
        return Err(EditError::Misaligned(format!(
            "grid has {} rows but {} were loaded",
            grid.len(),
            snapshot.len()
        )));
    }
    if let Some((row_idx, row)) = snapshot
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != columns.len())
    {
        return Err(EditError::Misaligned(format!(
            "snapshot row {row_idx} has {} cells for {} columns",
            row.len(),
            columns.len()
        )));
    }
    if let Some((row_idx, row)) = grid
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != columns.len())
    {
        return Err(EditError::Misaligned(format!(
            "grid row {row_idx} has {} cells for {} columns",
            row.len(),
            columns.len()
        )));
    }
    Ok(())
}
