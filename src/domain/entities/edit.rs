use std::collections::BTreeSet;

use crate::domain::codec::DisplayValue;

pub type GridRow = Vec<DisplayValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedSet {
    rows: BTreeSet<usize>,
}

impl DeletedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags `row` if it is not flagged yet, otherwise clears it. Returns
    /// whether the row is flagged afterwards.
    pub fn toggle(&mut self, row: usize) -> bool {
        if self.rows.remove(&row) {
            false
        } else {
            self.rows.insert(row);
            true
        }
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl FromIterator<usize> for DeletedSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub parameters: Vec<String>,
}

impl Statement {
    pub fn new(text: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.text, self.parameters)
    }
}
