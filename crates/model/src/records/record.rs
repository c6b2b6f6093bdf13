use serde::{Serialize, Serializer, ser::SerializeMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One source row addressed to a destination table.
///
/// Serializes as
/// `{"database": .., "table": .., "data": {"<column>": "<value>", ..}}`.
/// Column/value pairs are zipped in column order; whichever list is longer
/// gets truncated to the shorter one.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Record<'a> {
    database: &'a str,
    table: &'a str,
    data: ColumnValues<'a>,
}

impl<'a> Record<'a> {
    pub fn new(
        database: &'a str,
        table: &'a str,
        columns: &'a [String],
        values: &'a [String],
    ) -> Self {
        Record {
            database,
            table,
            data: ColumnValues { columns, values },
        }
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnValues<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl ColumnValues<'_> {
    fn len(&self) -> usize {
        self.columns.len().min(self.values.len())
    }
}

impl Serialize for ColumnValues<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
