//! Read attribute tables from CSV files.

pub use reader::{read_csv, CsvReaderOptions, DEFAULT_NULL_VALUES};

mod reader;
