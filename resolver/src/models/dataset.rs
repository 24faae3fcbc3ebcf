//! Ordered tabular data: headers plus one JSON object per row.

use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

use crate::error::{BatchError, BatchResult, CsvError, CsvResult};

/// Ordered rows with named columns.
///
/// Row order is significant: results are attached positionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    /// Column names, in file order.
    pub headers: Vec<String>,
    /// One object per row, keyed by column name.
    pub records: Vec<Map<String, Value>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
        }
    }

    /// Build a dataset from JSON values. Non-object values become empty rows.
    pub fn from_values(headers: Vec<String>, values: Vec<Value>) -> Self {
        let records = values
            .into_iter()
            .map(|v| match v {
                Value::Object(obj) => obj,
                _ => Map::new(),
            })
            .collect();
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn push_record(&mut self, record: Map<String, Value>) {
        self.records.push(record);
    }

    /// Set `column` on every row, one value per row.
    ///
    /// Appends the header if it is new; overwrites existing values otherwise.
    pub fn set_column(&mut self, column: &str, values: Vec<Value>) -> BatchResult<()> {
        if values.len() != self.records.len() {
            return Err(BatchError::LengthMismatch {
                rows: self.records.len(),
                results: values.len(),
            });
        }

        if !self.has_column(column) {
            self.headers.push(column.to_string());
        }

        for (record, value) in self.records.iter_mut().zip(values) {
            record.insert(column.to_string(), value);
        }

        Ok(())
    }

    /// Rows as JSON objects.
    pub fn to_json_records(&self) -> Vec<Value> {
        self.records.iter().cloned().map(Value::Object).collect()
    }

    /// Write as delimited text, header line first.
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> CsvResult<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        wtr.write_record(&self.headers)
            .map_err(|e| CsvError::Write(e.to_string()))?;

        for record in &self.records {
            let cells: Vec<String> = self
                .headers
                .iter()
                .map(|h| render_cell(record.get(h)))
                .collect();
            wtr.write_record(&cells)
                .map_err(|e| CsvError::Write(e.to_string()))?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self, delimiter: u8) -> CsvResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, delimiter)?;
        String::from_utf8(buf).map_err(|_| CsvError::Encoding("utf-8".to_string()))
    }
}

/// Text form of a cell. Booleans use the `True`/`False` spelling.
fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
