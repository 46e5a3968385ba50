//! Conversion between a column's declared server type and the value a grid
//! cell edits.
//!
//! Raw values come from the server as text or bytes. Enumerations, dates and
//! date-times get a typed editor; everything else is edited as plain text.
//! [`DisplayValue::encode`] produces the text that goes back on the wire.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::entities::table::{ColumnMeta, RawValue};
use crate::domain::error::{EditError, EditResult};

pub const ENUM_PREFIX: &str = "enum";
pub const DATE_TYPE: &str = "date";
pub const DATETIME_TYPE: &str = "datetime";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy + Ord> EditableRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn widen_to(&mut self, value: T) {
        if value < self.min {
            self.min = value;
        } else if value > self.max {
            self.max = value;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecRanges {
    pub date: EditableRange<NaiveDate>,
    pub datetime: EditableRange<NaiveDateTime>,
}

impl Default for CodecRanges {
    fn default() -> Self {
        let min = NaiveDate::from_ymd_opt(1752, 9, 14).unwrap_or(NaiveDate::MIN);
        let max = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
        Self {
            date: EditableRange::new(min, max),
            datetime: EditableRange::new(
                min.and_hms_opt(0, 0, 0).unwrap_or_default(),
                max.and_hms_opt(23, 59, 59).unwrap_or_default(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    Text(String),
    Enum {
        options: Vec<String>,
        selected: String,
    },
    Date {
        value: Option<NaiveDate>,
        range: EditableRange<NaiveDate>,
    },
    DateTime {
        value: Option<NaiveDateTime>,
        range: EditableRange<NaiveDateTime>,
    },
}

impl DisplayValue {
    /// Wire text for this value. Empty dates encode as an empty string.
    pub fn encode(&self) -> String {
        match self {
            DisplayValue::Text(text) => text.clone(),
            DisplayValue::Enum { selected, .. } => selected.clone(),
            DisplayValue::Date { value, .. } => value
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            DisplayValue::DateTime { value, .. } => value
                .map(|datetime| datetime.format(DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    /// Replaces the value with user input, parsed according to the kind.
    /// The value is left unchanged when the input is rejected.
    pub fn accept(&mut self, input: &str) -> EditResult<()> {
        match self {
            DisplayValue::Text(text) => {
                *text = input.to_string();
            }
            DisplayValue::Enum { options, selected } => {
                if !options.iter().any(|option| option == input) {
                    return Err(EditError::Format(format!(
                        "`{input}` is not one of {options:?}"
                    )));
                }
                *selected = input.to_string();
            }
            DisplayValue::Date { value, range } => {
                let input = input.trim();
                if input.is_empty() {
                    *value = None;
                    return Ok(());
                }
                let date = parse_date(input)?;
                if !range.contains(date) {
                    return Err(EditError::Format(format!(
                        "{input} is outside {} .. {}",
                        range.min.format(DATE_FORMAT),
                        range.max.format(DATE_FORMAT)
                    )));
                }
                *value = Some(date);
            }
            DisplayValue::DateTime { value, range } => {
                let input = normalize_datetime_input(input);
                if input.is_empty() {
                    *value = None;
                    return Ok(());
                }
                let datetime = parse_datetime(&input)?;
                if !range.contains(datetime) {
                    return Err(EditError::Format(format!(
                        "{input} is outside {} .. {}",
                        range.min.format(DATETIME_FORMAT),
                        range.max.format(DATETIME_FORMAT)
                    )));
                }
                *value = Some(datetime);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Enum(Vec<String>),
    Date,
    DateTime,
}

impl ColumnKind {
    pub fn of(declared_type: &str) -> EditResult<Self> {
        let trimmed = declared_type.trim();
        let is_enum = trimmed
            .get(..ENUM_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ENUM_PREFIX));
        if is_enum {
            return parse_enum_options(&trimmed[ENUM_PREFIX.len()..]).map(ColumnKind::Enum);
        }
        if trimmed.eq_ignore_ascii_case(DATE_TYPE) {
            Ok(ColumnKind::Date)
        } else if trimmed.eq_ignore_ascii_case(DATETIME_TYPE) {
            Ok(ColumnKind::DateTime)
        } else {
            Ok(ColumnKind::Text)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCodec {
    ranges: CodecRanges,
}

impl TypeCodec {
    pub fn new(ranges: CodecRanges) -> Self {
        Self { ranges }
    }

    /// Builds the editable value for `raw` in a column of `declared_type`.
    ///
    /// Date ranges are widened so both the current value and a parseable
    /// default stay selectable. Defaults that are not literal dates (such as
    /// `CURRENT_TIMESTAMP`) leave the range alone.
    pub fn decode(
        &self,
        raw: &RawValue,
        declared_type: &str,
        default_raw: Option<&str>,
    ) -> EditResult<DisplayValue> {
        let text = raw_text(raw)?;
        match ColumnKind::of(declared_type)? {
            ColumnKind::Text => Ok(DisplayValue::Text(text.unwrap_or_default())),
            ColumnKind::Enum(options) => Ok(DisplayValue::Enum {
                options,
                selected: text.unwrap_or_default(),
            }),
            ColumnKind::Date => {
                let mut range = self.ranges.date;
                let value = non_empty(text).map(|text| parse_date(&text)).transpose()?;
                if let Some(date) = value {
                    range.widen_to(date);
                }
                if let Some(default) = default_raw.and_then(|raw| parse_date(raw.trim()).ok()) {
                    range.widen_to(default);
                }
                Ok(DisplayValue::Date { value, range })
            }
            ColumnKind::DateTime => {
                let mut range = self.ranges.datetime;
                let value = non_empty(text)
                    .map(|text| parse_datetime(&text))
                    .transpose()?;
                if let Some(datetime) = value {
                    range.widen_to(datetime);
                }
                if let Some(default) = default_raw.and_then(|raw| parse_datetime(raw.trim()).ok())
                {
                    range.widen_to(default);
                }
                Ok(DisplayValue::DateTime { value, range })
            }
        }
    }

    pub fn decode_cell(&self, raw: &RawValue, column: &ColumnMeta) -> EditResult<DisplayValue> {
        self.decode(raw, &column.declared_type, column.default_raw())
            .map_err(|err| match err {
                EditError::Format(message) => {
                    EditError::Format(format!("column `{}`: {message}", column.name))
                }
                other => other,
            })
    }

    /// Value for a freshly appended row: the column default when it decodes,
    /// otherwise an empty value of the column's kind.
    pub fn blank(&self, column: &ColumnMeta) -> EditResult<DisplayValue> {
        if let Some(default) = column.default_raw() {
            if let Ok(value) = self.decode_cell(&RawValue::from(default), column) {
                return Ok(value);
            }
        }
        self.decode_cell(&RawValue::Null, column)
    }
}

fn raw_text(raw: &RawValue) -> EditResult<Option<String>> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Text(text) => Ok(Some(text.clone())),
        RawValue::Bytes(bytes) => String::from_utf8(bytes.clone())
            .map(Some)
            .map_err(|err| EditError::Format(format!("binary value is not UTF-8: {err}"))),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.is_empty())
}

/// Parses a zero-padded `YYYY-MM-DD` date. Text that only parses leniently
/// (`2020-1-5`, surrounding spaces) is rejected, since it would not encode
/// back to the same text.
pub fn parse_date(text: &str) -> EditResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|err| EditError::Format(format!("`{text}` is not a YYYY-MM-DD date: {err}")))?;
    if date.format(DATE_FORMAT).to_string() != text {
        return Err(EditError::Format(format!(
            "`{text}` is not a zero-padded YYYY-MM-DD date"
        )));
    }
    Ok(date)
}

pub fn parse_datetime(text: &str) -> EditResult<NaiveDateTime> {
    let datetime = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).map_err(|err| {
        EditError::Format(format!(
            "`{text}` is not a YYYY-MM-DD HH:MM:SS date-time: {err}"
        ))
    })?;
    if datetime.format(DATETIME_FORMAT).to_string() != text {
        return Err(EditError::Format(format!(
            "`{text}` is not a zero-padded YYYY-MM-DD HH:MM:SS date-time"
        )));
    }
    Ok(datetime)
}

/// Accepts the `T` separator and minute precision that HTML date-time inputs
/// produce.
fn normalize_datetime_input(input: &str) -> String {
    let mut text = input.trim().replacen('T', " ", 1);
    if text.len() == "YYYY-MM-DD HH:MM".len() {
        text.push_str(":00");
    }
    text
}

pub fn parse_enum_options(list: &str) -> EditResult<Vec<String>> {
    let malformed = |reason: &str| EditError::Format(format!("malformed enum list {list:?}: {reason}"));

    let inner = list
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| malformed("expected a parenthesized list"))?;

    let mut options = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            return Err(malformed("options must be quoted"));
        }

        let mut option = String::new();
        loop {
            match chars.next() {
                None => return Err(malformed("unterminated option")),
                Some('\\') => match chars.next() {
                    Some(escaped) => option.push(escaped),
                    None => return Err(malformed("dangling escape")),
                },
                Some(ch) if ch == quote => {
                    if chars.next_if_eq(&quote).is_some() {
                        option.push(quote);
                    } else {
                        break;
                    }
                }
                Some(ch) => option.push(ch),
            }
        }
        options.push(option);

        while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => {
                if chars.peek().is_none() {
                    return Err(malformed("trailing comma"));
                }
            }
            Some(_) => return Err(malformed("expected `,` between options")),
        }
    }
    Ok(options)
}
