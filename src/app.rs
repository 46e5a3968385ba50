use std::collections::BTreeMap;
use std::path::Path;

use dioxus::desktop::tao::event::{Event, WindowEvent};
use dioxus::desktop::{use_wry_event_handler, window, WindowCloseBehaviour};
use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::config::{default_config_path, load_default_config, AppConfig};
use crate::domain::codec::{DisplayValue, DATE_FORMAT};
use crate::domain::entities::table::{ColumnMeta, TableEntry, TableKind};
use crate::domain::error::EditError;
use crate::ui::state::app_state::{AppState, DetailsTab, Workspace};
use crate::usecase::ports::repo::QueryOutcome;
use crate::usecase::services::edit_service::EditSession;
use crate::usecase::services::query_service::ScriptReport;

const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATABASE_EXTENSIONS: [&str; 3] = ["sqlite", "sqlite3", "db"];
const QUERY_EXTENSIONS: [&str; 1] = ["sql"];
const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 2px 4px;";
const HEADER_STYLE: &str =
    "border: 1px solid #ddd; padding: 4px 6px; background: #f3f3f3; text-align: left;";

fn show_error(title: &str, description: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn show_info(title: &str, description: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn confirm(title: &str, description: &str) -> bool {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::YesNo)
        .show()
        == MessageDialogResult::Yes
}

fn pick_database_file() -> Option<std::path::PathBuf> {
    FileDialog::new()
        .add_filter("SQLite", &DATABASE_EXTENSIONS)
        .pick_file()
}

fn load_config_or_default() -> AppConfig {
    load_default_config().unwrap_or_else(|err| {
        tracing::warn!("falling back to default config: {err:#}");
        AppConfig::default()
    })
}

fn remember_database(mut state: AppState, db_path: &Path) {
    state.config.write().database_path = Some(db_path.to_path_buf());
    let config = state.config.peek().clone();
    if let Err(err) = default_config_path().and_then(|path| config.save(&path)) {
        tracing::warn!("failed to save config: {err:#}");
    }
}

fn open_database(mut state: AppState, db_path: &Path) {
    let config = state.config.peek().clone();
    match Workspace::open(db_path, &config) {
        Ok(opened) => {
            *state.session.write() = None;
            state.query_tabs.write().clear_reports();
            *state.workspace.write() = Some(opened);
            refresh_tree(state);
            *state.status.write() = format!("Opened {}", db_path.display());
            remember_database(state, db_path);
        }
        Err(err) => {
            *state.status.write() = format!("Failed to open database: {err}");
        }
    }
}

fn attach_database(mut state: AppState) {
    let Some(path) = pick_database_file() else {
        return;
    };
    let alias = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("attached")
        .to_string();
    let result = state
        .workspace
        .peek()
        .as_ref()
        .map(|workspace| workspace.repo.attach(&path, &alias));
    match result {
        Some(Ok(())) => {
            refresh_tree(state);
            *state.status.write() = format!("Attached {} as {alias}", path.display());
        }
        Some(Err(err)) => show_error("Error", &err.to_string()),
        None => {}
    }
}

fn refresh_tree(mut state: AppState) {
    let result = match state.workspace.peek().as_ref() {
        Some(workspace) => workspace.tree(),
        None => Ok(BTreeMap::new()),
    };
    match result {
        Ok(tree) => *state.tree.write() = tree,
        Err(err) => *state.status.write() = format!("Failed to list tables: {err}"),
    }
}

fn load_table(mut state: AppState, database: &str, table: &str) {
    let dirty = state
        .session
        .peek()
        .as_ref()
        .is_some_and(EditSession::is_dirty);
    if dirty && !confirm("Unsaved Changes", "Discard the changes made to this table?") {
        return;
    }

    let result = state.workspace.write().as_mut().map(|workspace| {
        workspace
            .query
            .set_current_database(Some(database.to_string()));
        workspace.edit.load(database, table)
    });
    match result {
        Some(Ok(loaded)) => {
            *state.rename_input.write() = table.to_string();
            *state.status.write() = format!(
                "Loaded `{table}` from `{database}` ({} rows)",
                loaded.loaded_row_count()
            );
            *state.session.write() = Some(loaded);
        }
        Some(Err(err)) => show_error("Error", &err.to_string()),
        None => {}
    }
}

fn drop_table(mut state: AppState, database: &str, entry: &TableEntry) {
    let question = format!(
        "Are you sure you want to delete {} from {database}?",
        entry.name
    );
    if !confirm("Drop Table", &question) {
        return;
    }

    let result = state
        .workspace
        .peek()
        .as_ref()
        .map(|workspace| workspace.query.drop_table(database, entry));
    match result {
        Some(Ok(())) => {
            let showing_dropped = state
                .session
                .peek()
                .as_ref()
                .is_some_and(|current| {
                    current.database() == database && current.table() == entry.name
                });
            if showing_dropped {
                *state.session.write() = None;
            }
            refresh_tree(state);
            show_info("Success", "Successfully dropped!");
        }
        Some(Err(err)) => show_error("Error", &err.to_string()),
        None => {}
    }
}

fn rename_table(mut state: AppState) {
    let new_name = state.rename_input.peek().trim().to_string();
    let target = state
        .session
        .peek()
        .as_ref()
        .map(|current| (current.database().to_string(), current.table().to_string()));
    let Some((database, table)) = target else {
        return;
    };
    if new_name.is_empty() || new_name == table {
        return;
    }

    let result = state
        .workspace
        .peek()
        .as_ref()
        .map(|workspace| workspace.query.rename_table(&database, &table, &new_name));
    match result {
        Some(Ok(())) => {
            *state.session.write() = None;
            refresh_tree(state);
            load_table(state, &database, &new_name);
        }
        Some(Err(err)) => show_error("Error", &err.to_string()),
        None => {}
    }
}

fn add_row(mut state: AppState) {
    let result = state.session.write().as_mut().map(EditSession::add_row);
    if let Some(Err(err)) = result {
        *state.status.write() = err.to_string();
    }
}

fn toggle_deleted(mut state: AppState, row: usize) {
    let result = state
        .session
        .write()
        .as_mut()
        .map(|current| current.toggle_deleted(row));
    if let Some(Err(err)) = result {
        *state.status.write() = err.to_string();
    }
}

fn set_cell(mut state: AppState, row: usize, col: usize, input: String) {
    let result = state
        .session
        .write()
        .as_mut()
        .map(|current| current.set_cell(row, col, &input));
    match result {
        Some(Err(err)) => *state.status.write() = err.to_string(),
        Some(Ok(())) => *state.status.write() = "Ready".to_string(),
        None => {}
    }
}

fn save_changes(mut state: AppState) {
    *state.busy.write() = true;
    let result = {
        let workspace = state.workspace.peek();
        let mut session = state.session.write();
        match (workspace.as_ref(), session.as_mut()) {
            (Some(workspace), Some(current)) => Some(workspace.edit.save(current)),
            _ => None,
        }
    };
    *state.busy.write() = false;

    match result {
        Some(Ok(report)) => match report.refresh_error {
            None => {
                *state.status.write() = format!("Applied {} statement(s)", report.applied);
                show_info("Success", "Successfully Executed");
            }
            Some(err) => {
                *state.status.write() = format!(
                    "Applied {} statement(s); reload failed",
                    report.applied
                );
                show_error(
                    "Reload Failed",
                    &format!(
                        "The changes were saved, but the table could not be reloaded:\n\n{err}\n\nUse Cancel Changes to reload it."
                    ),
                );
            }
        },
        Some(Err(EditError::Execution {
            index,
            statement,
            message,
            applied,
        })) => {
            *state.status.write() = format!("Save failed after {applied} statement(s)");
            show_error(
                "Error",
                &format!(
                    "Statement {} failed:\n\n{statement}\n\n{message}\n\n{applied} earlier statement(s) were applied.",
                    index + 1
                ),
            );
        }
        Some(Err(err)) => show_error("Error", &err.to_string()),
        None => {}
    }
}

fn discard_changes(mut state: AppState) {
    let result = {
        let workspace = state.workspace.peek();
        let mut session = state.session.write();
        match (workspace.as_ref(), session.as_mut()) {
            (Some(workspace), Some(current)) => Some(workspace.edit.discard(current)),
            _ => None,
        }
    };
    match result {
        Some(Ok(())) => *state.status.write() = "Changes discarded".to_string(),
        Some(Err(err)) => show_error("Error", &err.to_string()),
        None => {}
    }
}

fn run_script(mut state: AppState) {
    let script = state.query_tabs.peek().active_tab().text().to_string();
    *state.busy.write() = true;
    let report = state
        .workspace
        .write()
        .as_mut()
        .map(|workspace| workspace.query.run_script(&script));
    *state.busy.write() = false;
    let Some(report) = report else {
        return;
    };

    if let Some(error) = &report.error {
        show_error("Error executing query", &error.to_string());
    }
    if report.schema_changed {
        refresh_tree(state);
    }
    *state.status.write() = format!("Ran {} statement(s)", report.outputs.len());
    state.query_tabs.write().active_tab_mut().report = Some(report);
}

fn open_query_file(mut state: AppState) {
    let Some(path) = FileDialog::new()
        .add_filter("SQL", &QUERY_EXTENSIONS)
        .pick_file()
    else {
        return;
    };
    let result = state.query_tabs.write().open_file(&path);
    if let Err(err) = result {
        show_error("Error", &format!("{err:#}"));
    }
}

fn save_query_as(mut state: AppState) {
    let Some(path) = FileDialog::new()
        .add_filter("SQL", &QUERY_EXTENSIONS)
        .set_file_name("query.sql")
        .save_file()
    else {
        return;
    };
    let result = {
        let mut tabs = state.query_tabs.write();
        let active = tabs.active();
        tabs.save_as(active, &path)
    };
    match result {
        Ok(()) => *state.status.write() = format!("Saved {}", path.display()),
        Err(err) => show_error("Error", &format!("{err:#}")),
    }
}

fn save_query(mut state: AppState) {
    let result = {
        let mut tabs = state.query_tabs.write();
        let active = tabs.active();
        tabs.save(active)
    };
    match result {
        Ok(true) => *state.status.write() = "Query saved".to_string(),
        Ok(false) => save_query_as(state),
        Err(err) => show_error("Error", &format!("{err:#}")),
    }
}

/// Asks about modified query files before the window closes. Returns whether
/// closing may go ahead.
fn confirm_close(mut state: AppState) -> bool {
    if state.query_tabs.peek().unsaved().is_empty() {
        return true;
    }

    let choice = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Unsaved Changes")
        .set_description("You have unsaved changes. Would you like to save them?")
        .set_buttons(MessageButtons::YesNoCancel)
        .show();
    match choice {
        MessageDialogResult::Yes => match state.query_tabs.write().save_all() {
            Ok(saved) => {
                tracing::info!(saved, "saved query files before closing");
                true
            }
            Err(err) => {
                show_error("Error", &format!("{err:#}"));
                false
            }
        },
        MessageDialogResult::No => true,
        _ => false,
    }
}

#[component]
fn CellEditor(value: DisplayValue, disabled: bool, on_change: EventHandler<String>) -> Element {
    match value {
        DisplayValue::Text(text) => rsx! {
            input {
                value: "{text}",
                disabled: disabled,
                onchange: move |event| on_change.call(event.value()),
            }
        },
        DisplayValue::Enum { options, selected } => rsx! {
            select {
                disabled: disabled,
                onchange: move |event| on_change.call(event.value()),
                for choice in options {
                    option {
                        value: "{choice}",
                        selected: choice == selected,
                        "{choice}"
                    }
                }
            }
        },
        DisplayValue::Date { value, range } => {
            let text = value
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default();
            let min = range.min.format(DATE_FORMAT).to_string();
            let max = range.max.format(DATE_FORMAT).to_string();
            rsx! {
                input {
                    r#type: "date",
                    value: "{text}",
                    min: "{min}",
                    max: "{max}",
                    disabled: disabled,
                    onchange: move |event| on_change.call(event.value()),
                }
            }
        }
        DisplayValue::DateTime { value, range } => {
            let text = value
                .map(|stamp| stamp.format(DATETIME_INPUT_FORMAT).to_string())
                .unwrap_or_default();
            let min = range.min.format(DATETIME_INPUT_FORMAT).to_string();
            let max = range.max.format(DATETIME_INPUT_FORMAT).to_string();
            rsx! {
                input {
                    r#type: "datetime-local",
                    step: "1",
                    value: "{text}",
                    min: "{min}",
                    max: "{max}",
                    disabled: disabled,
                    onchange: move |event| on_change.call(event.value()),
                }
            }
        }
    }
}

fn render_grid(mut state: AppState, current: &EditSession, busy: bool) -> Element {
    let read_only = current.is_read_only();
    let title = format!(
        "Current Table: `{}` From `{}`",
        current.table(),
        current.database()
    );
    let headers: Vec<String> = current
        .columns()
        .iter()
        .map(|column| column.name.clone())
        .collect();
    let pending = current
        .pending_statements()
        .map(|statements| statements.len())
        .unwrap_or(0);
    let rows: Vec<(usize, bool, bool, Vec<DisplayValue>)> = current
        .rows()
        .iter()
        .enumerate()
        .map(|(row_idx, cells)| {
            (
                row_idx,
                current.is_deleted(row_idx),
                current.is_appended(row_idx),
                cells.clone(),
            )
        })
        .collect();
    let flagged = current.deleted().len();
    let rename_value = state.rename_input.cloned();

    rsx! {
        div {
            style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; padding: 8px 0;",
            strong { "{title}" }
            if read_only {
                span { style: "color: #a33;", "(read-only)" }
            }
            if flagged > 0 {
                span { style: "color: #a33;", "{flagged} row(s) flagged for deletion" }
            }
            button {
                disabled: busy || read_only,
                onclick: move |_| add_row(state),
                "Add New Entry"
            }
            button {
                disabled: busy || read_only || pending == 0,
                onclick: move |_| save_changes(state),
                "Save Changes ({pending})"
            }
            button {
                disabled: busy,
                onclick: move |_| discard_changes(state),
                "Cancel Changes"
            }
            input {
                value: "{rename_value}",
                disabled: busy || read_only,
                oninput: move |event| *state.rename_input.write() = event.value(),
            }
            button {
                disabled: busy || read_only,
                onclick: move |_| rename_table(state),
                "Rename Table"
            }
        }
        div { style: "flex: 1; overflow: auto;",
            table { style: "border-collapse: collapse;",
                thead {
                    tr {
                        th { style: HEADER_STYLE, "" }
                        for header in headers.iter() {
                            th { style: HEADER_STYLE, "{header}" }
                        }
                    }
                }
                tbody {
                    {rows.into_iter().map(move |(row_idx, deleted, appended, cells)| {
                        let row_style = if deleted {
                            "opacity: 0.45; text-decoration: line-through;"
                        } else if appended {
                            "background: #e4f6e4;"
                        } else {
                            ""
                        };
                        rsx! {
                            tr { key: "{row_idx}", style: "{row_style}",
                                td { style: CELL_STYLE,
                                    button {
                                        title: "Click to remove row",
                                        disabled: busy || read_only,
                                        onclick: move |_| toggle_deleted(state, row_idx),
                                        if deleted { "↺" } else { "✕" }
                                    }
                                }
                                {cells.into_iter().enumerate().map(move |(col_idx, value)| rsx! {
                                    td { key: "{col_idx}", style: CELL_STYLE,
                                        CellEditor {
                                            value,
                                            disabled: busy || read_only || deleted,
                                            on_change: move |input: String| set_cell(state, row_idx, col_idx, input),
                                        }
                                    }
                                })}
                            }
                        }
                    })}
                }
            }
        }
    }
}

fn render_structure(columns: &[ColumnMeta]) -> Element {
    let rows: Vec<(String, String, &'static str, &'static str, String)> = columns
        .iter()
        .map(|column| {
            (
                column.name.clone(),
                column.declared_type.clone(),
                if column.nullable { "YES" } else { "NO" },
                column.key_class.label(),
                column.default_value.clone().unwrap_or_else(|| "NULL".to_string()),
            )
        })
        .collect();

    rsx! {
        div { style: "flex: 1; overflow: auto;",
            table { style: "border-collapse: collapse;",
                thead {
                    tr {
                        for header in ["Field", "Type", "Null", "Key", "Default"] {
                            th { style: HEADER_STYLE, "{header}" }
                        }
                    }
                }
                tbody {
                    for (name, declared_type, nullable, key, default) in rows {
                        tr { key: "{name}",
                            td { style: CELL_STYLE, "{name}" }
                            td { style: CELL_STYLE, "{declared_type}" }
                            td { style: CELL_STYLE, "{nullable}" }
                            td { style: CELL_STYLE, "{key}" }
                            td { style: CELL_STYLE, "{default}" }
                        }
                    }
                }
            }
        }
    }
}

fn render_query_tabs(mut state: AppState, busy: bool, has_workspace: bool) -> Element {
    let tabs = state.query_tabs.read().clone();
    let active = tabs.active();
    let labels: Vec<(usize, String, String)> = tabs
        .tabs()
        .iter()
        .enumerate()
        .map(|(index, tab)| {
            let location = tab
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            (index, tab.label(), location)
        })
        .collect();
    let can_close = labels.len() > 1;
    let text = tabs.active_tab().text().to_string();
    let report = tabs.active_tab().report.clone();

    rsx! {
        div { style: "display: flex; gap: 4px; align-items: center; flex-wrap: wrap;",
            {labels.into_iter().map(move |(index, label, location)| {
                let tab_style = if index == active {
                    "border: 1px solid #888; padding: 2px 6px; background: #fff;"
                } else {
                    "border: 1px solid #ddd; padding: 2px 6px; background: #f3f3f3;"
                };
                rsx! {
                    span { key: "{index}", style: tab_style,
                        span {
                            style: "cursor: pointer;",
                            title: "{location}",
                            onclick: move |_| state.query_tabs.write().select(index),
                            "{label}"
                        }
                        if can_close {
                            button {
                                title: "Close",
                                style: "margin-left: 4px;",
                                onclick: move |_| {
                                    state.query_tabs.write().close_tab(index);
                                },
                                "✕"
                            }
                        }
                    }
                }
            })}
            button {
                onclick: move |_| {
                    state.query_tabs.write().add_tab();
                },
                "+"
            }
            button { onclick: move |_| open_query_file(state), "Open File…" }
            button { onclick: move |_| save_query(state), "Save File" }
            button { onclick: move |_| save_query_as(state), "Save File As…" }
        }
        textarea {
            style: "width: 100%; height: 90px; font-family: monospace;",
            value: "{text}",
            oninput: move |event| state.query_tabs.write().set_text(event.value()),
        }
        button {
            disabled: busy || !has_workspace,
            onclick: move |_| run_script(state),
            "Execute"
        }
        if let Some(report) = report {
            {render_report(report)}
        }
    }
}

fn render_report(report: ScriptReport) -> Element {
    rsx! {
        div { style: "display: flex; flex-direction: column; gap: 8px; padding-top: 8px;",
            {report.outputs.into_iter().enumerate().map(|(idx, output)| {
                match output.outcome {
                    QueryOutcome::Affected(count) => rsx! {
                        div { key: "{idx}", "{count} rows affected" }
                    },
                    QueryOutcome::Rows(grid) => rsx! {
                        table { key: "{idx}", style: "border-collapse: collapse;",
                            thead {
                                tr {
                                    for column in grid.columns.iter() {
                                        th { style: HEADER_STYLE, "{column}" }
                                    }
                                }
                            }
                            tbody {
                                for row in grid.rows.iter() {
                                    tr {
                                        for value in row.iter() {
                                            td { style: CELL_STYLE, "{value}" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                }
            })}
        }
    }
}

#[component]
pub fn App() -> Element {
    let initial_config = use_hook(load_config_or_default);
    let state = AppState::new(initial_config);
    let AppState {
        workspace,
        tree,
        session,
        mut details_tab,
        busy,
        status,
        ..
    } = state;

    use_hook(|| window().set_close_behavior(WindowCloseBehaviour::WindowHides));
    use_wry_event_handler(move |event, _| {
        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            if confirm_close(state) {
                window().set_close_behavior(WindowCloseBehaviour::WindowCloses);
            } else {
                // The window hides right after this handler returns.
                spawn(async move { window().set_visible(true) });
            }
        }
    });

    use_effect(move || {
        let resolved = state.config.peek().resolved_database_path();
        match resolved {
            Ok(db_path) => open_database(state, &db_path),
            Err(err) => {
                let mut status = state.status;
                *status.write() = format!("Unable to resolve database path: {err:#}");
            }
        }
    });

    let busy_now = busy();
    let tree_snapshot = tree();
    let current = session.read().clone();
    let details = details_tab();
    let (has_workspace, db_label, current_db) = match workspace.read().as_ref() {
        Some(opened) => (
            true,
            opened.repo.db_path.display().to_string(),
            opened.query.current_database().map(String::from),
        ),
        None => (false, String::new(), None),
    };

    rsx! {
        div {
            style: "display: flex; flex-direction: column; height: 100vh; font-family: sans-serif; font-size: 14px;",
            nav {
                style: "display: flex; gap: 12px; align-items: center; padding: 8px; border-bottom: 1px solid #ccc;",
                button {
                    disabled: busy_now,
                    onclick: move |_| {
                        if let Some(db_path) = pick_database_file() {
                            open_database(state, &db_path);
                        }
                    },
                    "Open Database…"
                }
                button {
                    disabled: busy_now || !has_workspace,
                    onclick: move |_| attach_database(state),
                    "Attach Database…"
                }
                button {
                    disabled: busy_now || !has_workspace,
                    onclick: move |_| refresh_tree(state),
                    "Refresh"
                }
                span { style: "color: #666;", "{db_label}" }
                if let Some(database) = current_db {
                    span { "Current Database: {database}" }
                }
                span { style: "margin-left: auto;", "{status}" }
            }
            div { style: "display: flex; flex: 1; min-height: 0;",
                aside {
                    style: "width: 240px; overflow: auto; border-right: 1px solid #ccc; padding: 8px;",
                    {tree_snapshot.into_iter().map(move |(database, entries)| rsx! {
                        div { key: "{database}",
                            div { style: "font-weight: 600; margin-top: 8px;", "{database}" }
                            {entries.into_iter().map({
                                let database = database.clone();
                                move |entry| {
                                    let label = match entry.kind {
                                        TableKind::Table => entry.name.clone(),
                                        TableKind::View => format!("{} (view)", entry.name),
                                    };
                                    let database_for_load = database.clone();
                                    let database_for_drop = database.clone();
                                    let name = entry.name.clone();
                                    rsx! {
                                        div {
                                            key: "{label}",
                                            style: "display: flex; gap: 4px; align-items: center; padding-left: 12px;",
                                            span {
                                                style: "cursor: pointer; flex: 1;",
                                                onclick: move |_| load_table(state, &database_for_load, &name),
                                                "{label}"
                                            }
                                            button {
                                                title: "Drop",
                                                disabled: busy_now,
                                                onclick: move |_| drop_table(state, &database_for_drop, &entry),
                                                "✕"
                                            }
                                        }
                                    }
                                }
                            })}
                        }
                    })}
                }
                main { style: "display: flex; flex-direction: column; flex: 1; min-width: 0; padding: 0 8px;",
                    div { style: "display: flex; flex-direction: column; flex: 1; min-height: 0;",
                        {match current.as_ref() {
                            Some(current) => rsx! {
                                div { style: "display: flex; gap: 4px; padding-top: 8px;",
                                    button {
                                        disabled: details == DetailsTab::Structure,
                                        onclick: move |_| *details_tab.write() = DetailsTab::Structure,
                                        "Structure"
                                    }
                                    button {
                                        disabled: details == DetailsTab::Data,
                                        onclick: move |_| *details_tab.write() = DetailsTab::Data,
                                        "Data"
                                    }
                                }
                                {match details {
                                    DetailsTab::Structure => render_structure(current.columns()),
                                    DetailsTab::Data => render_grid(state, current, busy_now),
                                }}
                            },
                            None => rsx! {
                                p { style: "color: #666;", "Select a table to edit." }
                            },
                        }}
                    }
                    section { style: "border-top: 1px solid #ccc; padding: 8px 0; max-height: 40%; overflow: auto;",
                        {render_query_tabs(state, busy_now, has_workspace)}
                    }
                }
            }
        }
    }
}
