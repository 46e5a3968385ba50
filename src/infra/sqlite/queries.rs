use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection};

use crate::domain::diff::{qualified_table, quote_ident};
use crate::domain::entities::edit::Statement;
use crate::domain::entities::table::{
    ColumnMeta, KeyClass, RawValue, SnapshotRow, TableEntry, TableKind,
};
use crate::usecase::ports::repo::{ExecutionFailure, QueryOutcome, ResultGrid};

pub fn list_databases(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_database_list ORDER BY seq ASC")
        .context("failed to prepare database list query")?;
    let databases = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("failed to query database list")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect database list")?;
    Ok(databases)
}

pub fn list_tables(conn: &Connection, database: &str) -> Result<Vec<TableEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT name, type
             FROM {}.sqlite_master
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
             ORDER BY name ASC",
            quote_ident(database)
        ))
        .with_context(|| format!("failed to prepare table list query for {database}"))?;
    let tables = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let kind: String = row.get(1)?;
            Ok(TableEntry {
                name,
                kind: if kind == "view" {
                    TableKind::View
                } else {
                    TableKind::Table
                },
            })
        })
        .with_context(|| format!("failed to query tables of {database}"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect tables")?;
    Ok(tables)
}

/// Column metadata in declared order. `pk` columns are PRIMARY, columns
/// covered alone by a unique index are UNIQUE.
pub fn describe_table(conn: &Connection, database: &str, table: &str) -> Result<Vec<ColumnMeta>> {
    let mut columns_stmt = conn
        .prepare(
            "SELECT name, type, dflt_value, pk, \"notnull\"
             FROM pragma_table_info(?1, ?2)
             ORDER BY cid ASC",
        )
        .context("failed to prepare table_info query")?;
    let mut columns = columns_stmt
        .query_map(params![table, database], |row| {
            let name: String = row.get(0)?;
            let declared_type: String = row.get(1)?;
            let default_value: Option<String> = row.get(2)?;
            let pk: i64 = row.get(3)?;
            let not_null: i64 = row.get(4)?;
            Ok(ColumnMeta {
                name,
                declared_type,
                default_value: default_value.map(|value| unquote_default(&value)),
                key_class: if pk > 0 {
                    KeyClass::Primary
                } else {
                    KeyClass::None
                },
                nullable: not_null == 0,
            })
        })
        .with_context(|| format!("failed to describe {database}.{table}"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect column metadata")?;
    drop(columns_stmt);

    if columns.is_empty() {
        anyhow::bail!("table not found: {database}.{table}")
    }

    for column_name in single_column_unique_indexes(conn, database, table)? {
        if let Some(column) = columns
            .iter_mut()
            .find(|column| column.name == column_name && column.key_class == KeyClass::None)
        {
            column.key_class = KeyClass::Unique;
        }
    }

    Ok(columns)
}

fn single_column_unique_indexes(
    conn: &Connection,
    database: &str,
    table: &str,
) -> Result<HashSet<String>> {
    let mut index_stmt = conn
        .prepare(
            "SELECT name
             FROM pragma_index_list(?1, ?2)
             WHERE \"unique\" = 1",
        )
        .context("failed to prepare index_list query")?;
    let indexes = index_stmt
        .query_map(params![table, database], |row| row.get::<_, String>(0))
        .context("failed to query unique indexes")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect unique indexes")?;

    let mut info_stmt = conn
        .prepare("SELECT name FROM pragma_index_info(?1, ?2)")
        .context("failed to prepare index_info query")?;
    let mut unique_columns = HashSet::new();
    for index in indexes {
        let index_columns = info_stmt
            .query_map(params![index, database], |row| row.get::<_, Option<String>>(0))
            .with_context(|| format!("failed to query columns of index {index}"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to collect index columns")?;
        if let [Some(column)] = index_columns.as_slice() {
            unique_columns.insert(column.clone());
        }
    }
    Ok(unique_columns)
}

/// `'2020-01-01'` as stored by SQLite becomes `2020-01-01`; expressions
/// such as `CURRENT_TIMESTAMP` pass through.
pub fn unquote_default(value: &str) -> String {
    value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .map(|inner| inner.replace("''", "'"))
        .unwrap_or_else(|| value.to_string())
}

pub fn fetch_rows(conn: &Connection, database: &str, table: &str) -> Result<Vec<SnapshotRow>> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", qualified_table(database, table)))
        .with_context(|| format!("failed to prepare select from {database}.{table}"))?;
    let column_count = stmt.column_count();

    let mut rows = Vec::new();
    let mut result = stmt
        .query([])
        .with_context(|| format!("failed to select from {database}.{table}"))?;
    while let Some(row) = result.next().context("failed to read row")? {
        let mut values = Vec::with_capacity(column_count);
        for col_idx in 0..column_count {
            let value = row
                .get_ref(col_idx)
                .with_context(|| format!("failed to read column {col_idx}"))?;
            values.push(raw_value(value));
        }
        rows.push(values);
    }
    Ok(rows)
}

fn raw_value(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(number) => RawValue::Text(number.to_string()),
        ValueRef::Real(number) => RawValue::Text(number.to_string()),
        ValueRef::Text(text) => RawValue::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => RawValue::Bytes(bytes.to_vec()),
    }
}

fn display_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        other => raw_value(other).as_text().into_owned(),
    }
}

pub fn execute_all(
    conn: &Connection,
    statements: &[Statement],
) -> std::result::Result<usize, ExecutionFailure> {
    for (index, statement) in statements.iter().enumerate() {
        let result = conn.execute(&statement.text, params_from_iter(statement.parameters.iter()));
        if let Err(err) = result {
            tracing::warn!(index, statement = %statement, error = %err, "statement failed");
            return Err(ExecutionFailure {
                index,
                message: err.to_string(),
            });
        }
    }
    Ok(statements.len())
}

pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryOutcome> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("failed to prepare: {sql}"))?;
    let column_count = stmt.column_count();
    if column_count == 0 {
        let affected = stmt.execute([]).with_context(|| format!("failed to run: {sql}"))?;
        return Ok(QueryOutcome::Affected(affected));
    }

    let columns = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    let mut result = stmt
        .query([])
        .with_context(|| format!("failed to run: {sql}"))?;
    while let Some(row) = result.next().context("failed to read result row")? {
        let mut values = Vec::with_capacity(column_count);
        for col_idx in 0..column_count {
            let value = row
                .get_ref(col_idx)
                .with_context(|| format!("failed to read result column {col_idx}"))?;
            values.push(display_value(value));
        }
        rows.push(values);
    }
    Ok(QueryOutcome::Rows(ResultGrid { columns, rows }))
}
