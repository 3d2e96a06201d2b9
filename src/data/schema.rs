//! Column naming and load options for measurement tables.

use serde::{Deserialize, Serialize};

/// Names of the columns holding each measurement attribute.
///
/// `day`, `subject` and `value` are required. `group` and `flag` are optional:
/// when the header lacks them, measurements load without a group and with
/// the post-treatment flag unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub day: String,
    pub subject: String,
    pub value: String,
    pub group: String,
    pub flag: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            day: "day".to_string(),
            subject: "mouse".to_string(),
            value: "yl32".to_string(),
            group: "group".to_string(),
            flag: "post_antibiotic".to_string(),
        }
    }
}

impl ColumnSchema {
    /// Name of the derived log10 column written next to the value column.
    pub fn log10_column(&self) -> String {
        format!("log10_{}", self.value)
    }
}

/// Options controlling how a delimited file is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Single-byte field delimiter. Never sniffed.
    pub delimiter: u8,
    /// Column names to look for.
    pub columns: ColumnSchema,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            columns: ColumnSchema::default(),
        }
    }
}

impl LoadOptions {
    /// Comma-separated input with default columns.
    pub fn csv() -> Self {
        Self::default()
    }

    /// Tab-separated input with default columns.
    pub fn tsv() -> Self {
        Self::default().with_delimiter(b'\t')
    }

    /// Set the delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the column names.
    pub fn with_columns(mut self, columns: ColumnSchema) -> Self {
        self.columns = columns;
        self
    }
}

/// Parse a delimiter given as text (`,`, `\t`, `tab`, `;`, ...).
pub fn parse_delimiter(text: &str) -> Option<u8> {
    match text {
        "\\t" | "tab" | "\t" => Some(b'\t'),
        "comma" => Some(b','),
        "semicolon" => Some(b';'),
        "space" => Some(b' '),
        other if other.len() == 1 && other.is_ascii() => Some(other.as_bytes()[0]),
        _ => None,
    }
}
