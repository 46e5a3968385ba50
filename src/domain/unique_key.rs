use crate::domain::entities::table::ColumnMeta;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: String,
    pub index: usize,
}

/// Picks the first PRIMARY or UNIQUE column in declared order.
///
/// Tables without one are addressed by their first column, which may match
/// zero or several rows. That is an accepted limitation. Returns `None` only
/// for a table with no columns.
pub fn resolve_unique_key(columns: &[ColumnMeta]) -> Option<UniqueKey> {
    let index = columns
        .iter()
        .position(|column| column.key_class.identifies_row())
        .unwrap_or(0);
    columns.get(index).map(|column| UniqueKey {
        name: column.name.clone(),
        index,
    })
}
