use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::usecase::services::query_service::ScriptReport;

const UNTITLED_PREFIX: &str = "Tab - ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTab {
    title: String,
    path: Option<PathBuf>,
    text: String,
    saved_text: String,
    pub report: Option<ScriptReport>,
}

impl QueryTab {
    fn untitled(number: usize) -> Self {
        Self {
            title: format!("{UNTITLED_PREFIX}{number}"),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Only tabs backed by a file can be modified; untitled tabs are scratch.
    pub fn is_modified(&self) -> bool {
        self.path.is_some() && self.text != self.saved_text
    }

    pub fn label(&self) -> String {
        if self.is_modified() {
            format!("* {}", self.title)
        } else {
            self.title.clone()
        }
    }

    fn untitled_number(&self) -> Option<usize> {
        if self.path.is_some() {
            return None;
        }
        self.title.strip_prefix(UNTITLED_PREFIX)?.parse().ok()
    }

    fn bind(&mut self, path: &Path, contents: String) {
        self.title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.path = Some(path.to_path_buf());
        self.saved_text = contents;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTabs {
    tabs: Vec<QueryTab>,
    active: usize,
}

impl Default for QueryTabs {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTabs {
    pub fn new() -> Self {
        Self {
            tabs: vec![QueryTab::untitled(1)],
            active: 0,
        }
    }

    pub fn tabs(&self) -> &[QueryTab] {
        &self.tabs
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> &QueryTab {
        &self.tabs[self.active]
    }

    pub fn active_tab_mut(&mut self) -> &mut QueryTab {
        &mut self.tabs[self.active]
    }

    pub fn add_tab(&mut self) -> usize {
        let mut number = 1;
        while self
            .tabs
            .iter()
            .any(|tab| tab.untitled_number() == Some(number))
        {
            number += 1;
        }
        self.tabs.push(QueryTab::untitled(number));
        self.active = self.tabs.len() - 1;
        self.active
    }

    /// Closes the tab at `index`. The last remaining tab stays open.
    pub fn close_tab(&mut self, index: usize) -> bool {
        if self.tabs.len() == 1 || index >= self.tabs.len() {
            return false;
        }
        self.tabs.remove(index);
        if self.active > index || self.active == self.tabs.len() {
            self.active -= 1;
        }
        true
    }

    pub fn select(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = index;
        }
    }

    pub fn set_text(&mut self, text: String) {
        self.active_tab_mut().text = text;
    }

    pub fn open_file(&mut self, path: &Path) -> Result<()> {
        ensure_sql_file(path)?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read query file {}", path.display()))?;
        let tab = self.active_tab_mut();
        tab.text = contents.clone();
        tab.bind(path, contents);
        tab.report = None;
        tracing::info!(path = %path.display(), "opened query file");
        Ok(())
    }

    /// Writes the tab to its file. Returns `false` for an untitled tab, which
    /// needs [`QueryTabs::save_as`] instead.
    pub fn save(&mut self, index: usize) -> Result<bool> {
        let Some(tab) = self.tabs.get_mut(index) else {
            return Ok(false);
        };
        let Some(path) = tab.path.clone() else {
            return Ok(false);
        };
        write_query_file(&path, &tab.text)?;
        tab.saved_text = tab.text.clone();
        Ok(true)
    }

    pub fn save_as(&mut self, index: usize, path: &Path) -> Result<()> {
        ensure_sql_file(path)?;
        let Some(tab) = self.tabs.get_mut(index) else {
            bail!("no query tab at {index}");
        };
        write_query_file(path, &tab.text)?;
        let contents = tab.text.clone();
        tab.bind(path, contents);
        Ok(())
    }

    pub fn clear_reports(&mut self) {
        for tab in &mut self.tabs {
            tab.report = None;
        }
    }

    pub fn unsaved(&self) -> Vec<usize> {
        self.tabs
            .iter()
            .enumerate()
            .filter(|(_, tab)| tab.is_modified())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn save_all(&mut self) -> Result<usize> {
        let unsaved = self.unsaved();
        for &index in &unsaved {
            self.save(index)?;
        }
        Ok(unsaved.len())
    }
}

fn ensure_sql_file(path: &Path) -> Result<()> {
    let is_sql = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("sql"));
    if !is_sql {
        bail!("{} is not a .sql file", path.display());
    }
    Ok(())
}

fn write_query_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text)
        .with_context(|| format!("failed to write query file {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved query file");
    Ok(())
}
