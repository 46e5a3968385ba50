use std::rc::Rc;

use crate::domain::diff::{qualified_table, quote_ident};
use crate::domain::entities::table::{TableEntry, TableKind};
use crate::usecase::ports::repo::{QueryOutcome, RepoError, StatementExecutor, TableSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Use,
    ResultSet,
    SchemaChange,
    Other,
}

fn leading_code(statement: &str) -> &str {
    let mut rest = statement;
    loop {
        rest = rest.trim_start_matches(|ch: char| ch.is_whitespace() || ch == '(');
        if let Some(comment) = rest.strip_prefix("--") {
            rest = comment
                .split_once('\n')
                .map(|(_, tail)| tail)
                .unwrap_or_default();
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment
                .split_once("*/")
                .map(|(_, tail)| tail)
                .unwrap_or_default();
        } else {
            return rest;
        }
    }
}

pub fn classify(statement: &str) -> StatementKind {
    let keyword = leading_code(statement)
        .split(|ch: char| !ch.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    match keyword.as_str() {
        "USE" => StatementKind::Use,
        "SELECT" | "SHOW" | "EXPLAIN" | "DESC" | "DESCRIBE" | "PRAGMA" | "WITH" | "VALUES" => {
            StatementKind::ResultSet
        }
        "ALTER" | "CREATE" | "DROP" | "RENAME" => StatementKind::SchemaChange,
        _ => StatementKind::Other,
    }
}

/// Splits a script on `;`, ignoring semicolons inside quotes and comments.
/// Statements that are blank or only comments are dropped.
pub fn split_script(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = script.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Some(open) => {
                current.push(ch);
                if ch == open {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' | '`' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '-' if chars.peek() == Some(&'-') => {
                    current.push(ch);
                    for next in chars.by_ref() {
                        current.push(next);
                        if next == '\n' {
                            break;
                        }
                    }
                }
                '/' if chars.peek() == Some(&'*') => {
                    current.push(ch);
                    current.extend(chars.next());
                    let mut last = '\0';
                    for next in chars.by_ref() {
                        current.push(next);
                        if last == '*' && next == '/' {
                            break;
                        }
                        last = next;
                    }
                }
                ';' => {
                    statements.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            },
        }
    }
    statements.push(current);

    statements
        .into_iter()
        .filter(|statement| !leading_code(statement).is_empty())
        .map(|statement| statement.trim().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub statement: String,
    pub kind: StatementKind,
    pub outcome: QueryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// 1-based position of the failing statement in the script.
    pub number: usize,
    pub statement: String,
    pub message: String,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "In query {}:\n\n{}\n\n{}",
            self.number, self.statement, self.message
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub outputs: Vec<ScriptOutput>,
    /// A statement altered the schema; table lists should be reloaded.
    pub schema_changed: bool,
    pub error: Option<ScriptError>,
}

pub struct QueryService {
    source: Rc<dyn TableSource>,
    executor: Rc<dyn StatementExecutor>,
    current_database: Option<String>,
}

impl QueryService {
    pub fn new(source: Rc<dyn TableSource>, executor: Rc<dyn StatementExecutor>) -> Self {
        Self {
            source,
            executor,
            current_database: None,
        }
    }

    pub fn current_database(&self) -> Option<&str> {
        self.current_database.as_deref()
    }

    pub fn set_current_database(&mut self, database: Option<String>) {
        self.current_database = database;
    }

    pub fn list_databases(&self) -> Result<Vec<String>, RepoError> {
        self.source.list_databases()
    }

    pub fn list_tables(&self, database: &str) -> Result<Vec<TableEntry>, RepoError> {
        self.source.list_tables(database)
    }

    /// Runs each statement of `script` in order and stops at the first
    /// failure, keeping the outputs produced before it.
    pub fn run_script(&mut self, script: &str) -> ScriptReport {
        let mut report = ScriptReport::default();

        for (position, statement) in split_script(script).into_iter().enumerate() {
            let kind = classify(&statement);
            let result = match kind {
                StatementKind::Use => self.use_database(&statement).map(|_| None),
                _ => self.executor.run_query(&statement).map(Some),
            };

            match result {
                Ok(outcome) => {
                    tracing::debug!(statement = %statement, ?kind, "ran statement");
                    report.schema_changed |= kind == StatementKind::SchemaChange;
                    if let Some(outcome) = outcome {
                        report.outputs.push(ScriptOutput {
                            statement,
                            kind,
                            outcome,
                        });
                    }
                }
                Err(err) => {
                    tracing::warn!(statement = %statement, error = %err, "script stopped");
                    report.error = Some(ScriptError {
                        number: position + 1,
                        statement,
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        report
    }

    fn use_database(&mut self, statement: &str) -> Result<(), RepoError> {
        let name = leading_code(statement)
            .trim_end()
            .get(3..)
            .unwrap_or_default()
            .trim()
            .trim_matches(|ch: char| ch == '`' || ch == '"' || ch == '\'')
            .to_string();
        if name.is_empty() {
            return Err(RepoError::Message("USE needs a database name".to_string()));
        }

        let databases = self.source.list_databases()?;
        if !databases.iter().any(|database| database == &name) {
            return Err(RepoError::Message(format!("Unknown database '{name}'")));
        }
        self.executor.use_database(&name)?;
        tracing::info!(database = %name, "switched database");
        self.current_database = Some(name);
        Ok(())
    }

    pub fn drop_table(&self, database: &str, entry: &TableEntry) -> Result<(), RepoError> {
        let object = match entry.kind {
            TableKind::Table => "TABLE",
            TableKind::View => "VIEW",
        };
        self.executor
            .run_query(&format!(
                "DROP {object} {}",
                qualified_table(database, &entry.name)
            ))
            .map(|_| ())
    }

    pub fn rename_table(&self, database: &str, from: &str, to: &str) -> Result<(), RepoError> {
        self.executor
            .run_query(&format!(
                "ALTER TABLE {} RENAME TO {}",
                qualified_table(database, from),
                quote_ident(to)
            ))
            .map(|_| ())
    }
}
