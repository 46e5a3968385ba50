use std::rc::Rc;

use crate::config::AppConfig;
use crate::domain::codec::{DisplayValue, TypeCodec};
use crate::domain::diff::compute_statements;
use crate::domain::entities::edit::{DeletedSet, GridRow, Statement};
use crate::domain::entities::table::{ColumnMeta, RawValue, SnapshotRow, TableSnapshot};
use crate::domain::error::{EditError, EditResult};
use crate::usecase::ports::repo::{StatementExecutor, TableSource};

/// A loaded table: the snapshot read from the server and the grid the user
/// edits. Row indices stay stable until the next reload.
#[derive(Debug, Clone)]
pub struct EditSession {
    database: String,
    table: String,
    columns: Vec<ColumnMeta>,
    snapshot: Vec<SnapshotRow>,
    grid: Vec<GridRow>,
    deleted: DeletedSet,
    read_only: bool,
    codec: TypeCodec,
}

impl EditSession {
    pub fn from_snapshot(
        snapshot: TableSnapshot,
        codec: TypeCodec,
        read_only: bool,
    ) -> EditResult<Self> {
        let TableSnapshot {
            database,
            table,
            columns,
            rows,
        } = snapshot;

        let mut grid = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(EditError::Misaligned(format!(
                    "row {row_idx} has {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            let cells = row
                .iter()
                .zip(&columns)
                .map(|(raw, column)| codec.decode_cell(raw, column))
                .collect::<EditResult<GridRow>>()?;
            grid.push(cells);
        }

        Ok(Self {
            database,
            table,
            columns,
            snapshot: rows,
            grid,
            deleted: DeletedSet::new(),
            read_only,
            codec,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.grid
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&DisplayValue> {
        self.grid.get(row).and_then(|cells| cells.get(col))
    }

    pub fn loaded_row_count(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_appended(&self, row: usize) -> bool {
        row >= self.snapshot.len()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_deleted(&self, row: usize) -> bool {
        self.deleted.contains(row)
    }

    pub fn deleted(&self) -> &DeletedSet {
        &self.deleted
    }

    pub fn toggle_deleted(&mut self, row: usize) -> EditResult<bool> {
        self.ensure_editable()?;
        self.ensure_row(row)?;
        let flagged = self.deleted.toggle(row);
        tracing::debug!(row, flagged, "toggled row deletion");
        Ok(flagged)
    }

    pub fn add_row(&mut self) -> EditResult<usize> {
        self.ensure_editable()?;
        let row = self
            .columns
            .iter()
            .map(|column| self.codec.blank(column))
            .collect::<EditResult<GridRow>>()?;
        self.grid.push(row);
        Ok(self.grid.len() - 1)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, input: &str) -> EditResult<()> {
        self.ensure_editable()?;
        self.ensure_row(row)?;
        if self.deleted.contains(row) {
            return Err(EditError::Format(format!(
                "row {row} is flagged for deletion"
            )));
        }
        let column_count = self.columns.len();
        let cell = self.grid[row].get_mut(col).ok_or_else(|| {
            EditError::Misaligned(format!("column {col} is out of range ({column_count})"))
        })?;
        cell.accept(input)
    }

    pub fn pending_statements(&self) -> EditResult<Vec<Statement>> {
        compute_statements(
            &self.snapshot,
            &self.grid,
            &self.deleted,
            &self.columns,
            &self.database,
            &self.table,
        )
    }

    pub fn is_dirty(&self) -> bool {
        self.pending_statements()
            .map(|statements| !statements.is_empty())
            .unwrap_or(true)
    }

    /// Folds the saved edits into the snapshot without asking the server:
    /// flagged rows go away and every remaining row becomes loaded as shown.
    fn commit_locally(&mut self) {
        let grid = std::mem::take(&mut self.grid);
        self.snapshot.clear();
        for (row_idx, row) in grid.into_iter().enumerate() {
            if self.deleted.contains(row_idx) {
                continue;
            }
            self.snapshot
                .push(row.iter().map(|cell| RawValue::Text(cell.encode())).collect());
            self.grid.push(row);
        }
        self.deleted = DeletedSet::new();
    }

    fn ensure_editable(&self) -> EditResult<()> {
        if self.read_only {
            return Err(EditError::ReadOnly(self.database.clone()));
        }
        Ok(())
    }

    fn ensure_row(&self, row: usize) -> EditResult<()> {
        if row >= self.grid.len() {
            return Err(EditError::Misaligned(format!(
                "row {row} is out of range ({})",
                self.grid.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub applied: usize,
    /// Set when the statements were applied but reloading the table failed.
    /// The session then shows the edits as saved without server values.
    pub refresh_error: Option<String>,
}

pub struct EditService {
    source: Rc<dyn TableSource>,
    executor: Rc<dyn StatementExecutor>,
    codec: TypeCodec,
    config: AppConfig,
}

impl EditService {
    pub fn new(
        source: Rc<dyn TableSource>,
        executor: Rc<dyn StatementExecutor>,
        config: &AppConfig,
    ) -> Self {
        Self {
            source,
            executor,
            codec: TypeCodec::new(config.codec_ranges()),
            config: config.clone(),
        }
    }

    pub fn load(&self, database: &str, table: &str) -> EditResult<EditSession> {
        let columns = self.source.describe_table(database, table)?;
        let rows = self.source.fetch_rows(database, table)?;
        tracing::info!(database, table, rows = rows.len(), "loaded table");

        let read_only = self.config.is_read_only(database);
        EditSession::from_snapshot(
            TableSnapshot {
                database: database.to_string(),
                table: table.to_string(),
                columns,
                rows,
            },
            self.codec,
            read_only,
        )
    }

    /// Writes the session's edits and reloads it from the server.
    ///
    /// On failure the session keeps its edits; the error says which statement
    /// failed and how many before it were applied.
    pub fn save(&self, session: &mut EditSession) -> EditResult<SaveReport> {
        session.ensure_editable()?;
        let statements = session.pending_statements()?;
        if statements.is_empty() {
            return Ok(SaveReport {
                applied: 0,
                refresh_error: None,
            });
        }

        match self.executor.execute_all(&statements) {
            Ok(applied) => {
                tracing::info!(
                    database = session.database(),
                    table = session.table(),
                    applied,
                    "saved edits"
                );
                let refresh_error = match self.load(session.database(), session.table()) {
                    Ok(reloaded) => {
                        *session = reloaded;
                        None
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "reload after save failed");
                        session.commit_locally();
                        Some(err.to_string())
                    }
                };
                Ok(SaveReport {
                    applied,
                    refresh_error,
                })
            }
            Err(failure) => {
                let statement = statements
                    .get(failure.index)
                    .map(|statement| statement.to_string())
                    .unwrap_or_default();
                tracing::warn!(
                    index = failure.index,
                    message = %failure.message,
                    "save stopped at failing statement"
                );
                Err(EditError::Execution {
                    index: failure.index,
                    statement,
                    message: failure.message,
                    applied: failure.index,
                })
            }
        }
    }

    pub fn discard(&self, session: &mut EditSession) -> EditResult<()> {
        *session = self.load(session.database(), session.table())?;
        Ok(())
    }
}
