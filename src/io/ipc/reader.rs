use std::io::{Read, Seek};

use arrow_array::{RecordBatch, RecordBatchReader};
use arrow_ipc::reader::{FileReader, StreamReader};
use arrow_schema::ArrowError;

use crate::error::Result;
use crate::table::Table;

fn read_all(reader: impl RecordBatchReader) -> Result<Table> {
    let schema = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;
    Table::try_new(schema, batches)
}

/// Read an Arrow IPC (Feather v2) file into a [`Table`].
pub fn read_ipc<R: Read + Seek>(reader: R) -> Result<Table> {
    read_all(FileReader::try_new(reader, None)?)
}

/// Read an Arrow IPC record batch stream into a [`Table`].
pub fn read_ipc_stream<R: Read>(reader: R) -> Result<Table> {
    read_all(StreamReader::try_new(reader, None)?)
}
