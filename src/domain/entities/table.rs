use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyClass {
    #[default]
    None,
    Unique,
    Primary,
}

impl KeyClass {
    pub fn identifies_row(self) -> bool {
        !matches!(self, KeyClass::None)
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyClass::None => "",
            KeyClass::Unique => "UNI",
            KeyClass::Primary => "PRI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub declared_type: String,
    pub default_value: Option<String>,
    pub key_class: KeyClass,
    pub nullable: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            default_value: None,
            key_class: KeyClass::None,
            nullable: true,
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_key(mut self, key_class: KeyClass) -> Self {
        self.key_class = key_class;
        self
    }

    /// The default as the codec sees it: empty defaults count as absent.
    pub fn default_raw(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

/// A cell value exactly as the server returned it at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Null,
    Text(String),
    Bytes(Vec<u8>),
}

impl RawValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Null => Cow::Borrowed(""),
            RawValue::Text(text) => Cow::Borrowed(text.as_str()),
            RawValue::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

pub type SnapshotRow = Vec<RawValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub kind: TableKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub database: String,
    pub table: String,
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<SnapshotRow>,
}
