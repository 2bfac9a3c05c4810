//! Read from and write to Arrow IPC (Feather v2) files.

pub use reader::{read_ipc, read_ipc_stream};
pub use writer::{write_ipc, write_ipc_stream};

mod reader;
mod writer;

#[cfg(test)]
mod test {
    use std::io::{Cursor, Seek, SeekFrom};
    use std::sync::Arc;

    use arrow_array::RecordBatch;
    use arrow_schema::Schema;

    use super::*;
    use crate::algorithm::native::BBOX_COLUMN_NAMES;
    use crate::array::MultiPolygonArray;
    use crate::table::{AugmentOptions, Table};
    use crate::test::multipolygon::{mp0, mp1, mp_array};
    use crate::trait_::GeometryArrayTrait;

    fn geometry_table() -> Table {
        let arr = mp_array();
        let field = arr.extension_field("geometry", None);
        let schema = Arc::new(Schema::new(vec![field]));
        Table::from(RecordBatch::try_new(schema, vec![arr.into_array_ref()]).unwrap())
    }

    #[test]
    fn file_round_trip_keeps_extension_metadata() {
        let mut table = geometry_table();
        table
            .append_bbox_columns(&AugmentOptions::default())
            .unwrap();

        let mut file = tempfile::tempfile().unwrap();
        write_ipc(&table, &mut file).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let back = read_ipc(file).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back.schema(), table.schema());
        for name in BBOX_COLUMN_NAMES {
            assert!(back.column_index(name).is_some());
        }

        let geometry = back.column_by_name("geometry").unwrap();
        let arr = MultiPolygonArray::try_from(geometry[0].as_ref()).unwrap();
        assert_eq!(arr.value(0).to_owned(), mp0());
        assert_eq!(arr.value(1).to_owned(), mp1());
    }

    #[test]
    fn stream_round_trip() {
        let table = geometry_table();
        let mut buf = Vec::new();
        write_ipc_stream(&table, &mut buf).unwrap();
        let back = read_ipc_stream(Cursor::new(buf)).unwrap();
        assert_eq!(back.len(), table.len());
        assert_eq!(back.schema(), table.schema());
    }
}
