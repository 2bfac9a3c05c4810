use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_csv::reader::Format;
use arrow_csv::ReaderBuilder;
use arrow_schema::ArrowError;
use regex::Regex;
use tracing::debug;

use crate::error::{CatchmentError, Result};
use crate::table::Table;

/// Cell contents read as null. The empty string is always null as well.
pub const DEFAULT_NULL_VALUES: [&str; 4] = ["NA", "na", "N/A", "n/a"];

/// Options for the CSV reader.
#[derive(Debug, Clone)]
pub struct CsvReaderOptions {
    /// Whether the first line holds column names.
    pub has_header: bool,

    /// The field delimiter.
    pub delimiter: u8,

    /// Strings read as null, besides the empty string.
    pub null_values: Vec<String>,

    /// Maximum number of records used to infer the schema. `None` reads the whole file.
    pub max_infer_records: Option<usize>,

    /// The number of rows in each batch.
    pub batch_size: usize,
}

impl CsvReaderOptions {
    fn null_regex(&self) -> Result<Regex> {
        let alternatives = self
            .null_values
            .iter()
            .map(|value| regex::escape(value))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("^({alternatives})?$"))
            .map_err(|err| CatchmentError::General(format!("invalid null values: {err}")))
    }

    fn format(&self) -> Result<Format> {
        Ok(Format::default()
            .with_header(self.has_header)
            .with_delimiter(self.delimiter)
            .with_null_regex(self.null_regex()?))
    }
}

impl Default for CsvReaderOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            null_values: DEFAULT_NULL_VALUES.iter().map(|v| v.to_string()).collect(),
            max_infer_records: None,
            batch_size: 65_536,
        }
    }
}

/// Read a CSV file to a [`Table`], inferring column types.
///
/// The input is scanned once for inference and rewound before parsing.
pub fn read_csv<R: Read + Seek>(mut reader: R, options: &CsvReaderOptions) -> Result<Table> {
    let format = options.format()?;
    let (schema, records) = format.infer_schema(&mut reader, options.max_infer_records)?;
    debug!(records, columns = schema.fields().len(), "inferred csv schema");
    reader.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(schema);
    let csv = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(options.batch_size)
        .build(reader)?;
    let batches = csv.collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;
    Table::try_new(schema, batches)
}
