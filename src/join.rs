//! Joining catchment geometries with their attribute tables.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Int64Type;
use arrow_array::{Array, ArrayRef, RecordBatch, UInt32Array};
use arrow_cast::{cast_with_options, CastOptions};
use arrow_schema::{DataType, Field, FieldRef, Schema};
use tracing::debug;

use crate::error::{CatchmentError, Result};
use crate::table::Table;

/// Name of the catchment identifier in the source GeoPackage.
pub const SOURCE_KEY: &str = "HYBAS_ID";

/// Name of the catchment identifier in every produced table.
pub const CATCHMENT_KEY: &str = "catchID";

/// Cast the chunks of `key` to `Int64`.
fn int64_key(table: &Table, key: &str) -> Result<(usize, Vec<ArrayRef>)> {
    let i = table
        .column_index(key)
        .ok_or_else(|| CatchmentError::MissingColumn(key.to_string()))?;
    // Values that cannot be converted fail the cast instead of becoming null
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    let chunks = table
        .column(i)
        .iter()
        .map(|chunk| {
            cast_with_options(chunk, &DataType::Int64, &options).map_err(|err| {
                CatchmentError::IncorrectType(
                    format!("key column {key} cannot be read as Int64: {err}").into(),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((i, chunks))
}

/// Reduce a catchment layer to `catchID` (Int64) and its geometry column.
///
/// The source key `HYBAS_ID` is renamed to `catchID`. A layer that already carries `catchID`
/// is accepted as is.
pub fn prepare_catchments(mut table: Table, geometry_column: &str) -> Result<Table> {
    if table.column_index(CATCHMENT_KEY).is_none() {
        table.rename_column(SOURCE_KEY, CATCHMENT_KEY)?;
    }
    let (i, chunks) = int64_key(&table, CATCHMENT_KEY)?;
    let field = Arc::new(Field::new(CATCHMENT_KEY, DataType::Int64, true));
    table.replace_column(i, field, chunks)?;
    table.select(&[CATCHMENT_KEY, geometry_column])
}

/// Inner join of `left` and `right` on the integer column `key`.
///
/// Rows come out in the order of `left`; a left row matching several right rows is repeated once
/// per match, in the order of `right`. Null keys never match. The output holds every left
/// column followed by every right column except `key`.
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let (left_key_index, left_keys) = int64_key(left, key)?;
    let (right_key_index, right_keys) = int64_key(right, key)?;

    let right_batch = right.concat()?;
    let right_keys = if right_keys.is_empty() {
        arrow_array::new_empty_array(&DataType::Int64)
    } else {
        arrow_select::concat::concat(&right_keys.iter().map(|a| a.as_ref()).collect::<Vec<_>>())?
    };
    let right_keys = right_keys.as_primitive::<Int64Type>();

    let mut lookup: HashMap<i64, Vec<u32>> = HashMap::new();
    for (row, value) in right_keys.iter().enumerate() {
        if let Some(value) = value {
            let row = u32::try_from(row).map_err(|_| CatchmentError::Overflow)?;
            lookup.entry(value).or_default().push(row);
        }
    }

    let mut fields: Vec<FieldRef> = left.schema().fields().iter().cloned().collect();
    fields[left_key_index] = Arc::new(Field::new(key, DataType::Int64, true));
    for (j, field) in right.schema().fields().iter().enumerate() {
        if j == right_key_index {
            continue;
        }
        if fields.iter().any(|f| f.name() == field.name()) {
            return Err(CatchmentError::General(format!(
                "column {} exists on both sides of the join",
                field.name()
            )));
        }
        fields.push(field.clone());
    }
    let schema = Arc::new(Schema::new_with_metadata(
        fields,
        left.schema().metadata().clone(),
    ));

    let mut batches = Vec::with_capacity(left.batches().len());
    for (batch, keys) in left.batches().iter().zip(&left_keys) {
        let keys = keys.as_primitive::<Int64Type>();
        let mut left_indices = Vec::new();
        let mut right_indices = Vec::new();
        for (row, value) in keys.iter().enumerate() {
            let Some(matches) = value.and_then(|v| lookup.get(&v)) else {
                continue;
            };
            let row = u32::try_from(row).map_err(|_| CatchmentError::Overflow)?;
            for right_row in matches {
                left_indices.push(row);
                right_indices.push(*right_row);
            }
        }
        debug!(rows = batch.num_rows(), matched = left_indices.len(), "joined batch");

        let left_indices = UInt32Array::from(left_indices);
        let right_indices = UInt32Array::from(right_indices);

        let mut columns = Vec::with_capacity(schema.fields().len());
        for (j, column) in batch.columns().iter().enumerate() {
            let column = if j == left_key_index {
                keys as &dyn Array
            } else {
                column.as_ref()
            };
            columns.push(arrow_select::take::take(column, &left_indices, None)?);
        }
        for (j, column) in right_batch.columns().iter().enumerate() {
            if j != right_key_index {
                columns.push(arrow_select::take::take(
                    column.as_ref(),
                    &right_indices,
                    None,
                )?);
            }
        }
        batches.push(RecordBatch::try_new(schema.clone(), columns)?);
    }

    Table::try_new(schema, batches)
}

#[cfg(test)]
mod test {
    use arrow_array::{BinaryArray, Float64Array, Int32Array, Int64Array, StringArray};

    use super::*;

    fn col(array: impl Array + 'static) -> ArrayRef {
        Arc::new(array)
    }

    fn table(columns: Vec<(&str, ArrayRef)>) -> Table {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, array)| array).collect();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap();
        Table::from(batch)
    }

    fn catchments() -> Table {
        table(vec![
            ("catchID", col(Int64Array::from(vec![30, 10, 20, 40]))),
            (
                "geometry",
                col(BinaryArray::from(vec![
                    b"c".as_ref(),
                    b"a".as_ref(),
                    b"b".as_ref(),
                    b"d".as_ref(),
                ])),
            ),
        ])
    }

    fn i64_values(table: &Table, name: &str) -> Vec<i64> {
        table
            .column_by_name(name)
            .unwrap()
            .iter()
            .flat_map(|c| c.as_primitive::<Int64Type>().values().to_vec())
            .collect()
    }

    #[test]
    fn keeps_left_order_and_drops_unmatched() {
        let attributes = table(vec![
            ("catchID", col(Int64Array::from(vec![10, 30, 50]))),
            ("ph", col(Float64Array::from(vec![7.1, 6.5, 8.0]))),
        ]);
        let joined = inner_join(&catchments(), &attributes, "catchID").unwrap();

        assert_eq!(joined.len(), 2);
        assert_eq!(i64_values(&joined, "catchID"), vec![30, 10]);
        let names: Vec<_> = joined
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, ["catchID", "geometry", "ph"]);

        let ph = &joined.column_by_name("ph").unwrap()[0];
        assert_eq!(
            ph.as_primitive::<arrow_array::types::Float64Type>().values().to_vec(),
            vec![6.5, 7.1]
        );
    }

    #[test]
    fn duplicate_right_keys_repeat_left_rows() {
        let attributes = table(vec![
            ("catchID", col(Int64Array::from(vec![20, 20, 40]))),
            ("site", col(StringArray::from(vec!["x", "y", "z"]))),
        ]);
        let joined = inner_join(&catchments(), &attributes, "catchID").unwrap();
        assert_eq!(i64_values(&joined, "catchID"), vec![20, 20, 40]);

        let site = &joined.column_by_name("site").unwrap()[0];
        let site: Vec<_> = site.as_string::<i32>().iter().flatten().collect();
        assert_eq!(site, ["x", "y", "z"]);
    }

    #[test]
    fn null_keys_never_match() {
        let attributes = table(vec![
            ("catchID", col(Int64Array::from(vec![None, Some(10)]))),
            ("n", col(Int64Array::from(vec![1, 2]))),
        ]);
        let joined = inner_join(&catchments(), &attributes, "catchID").unwrap();
        assert_eq!(i64_values(&joined, "n"), vec![2]);
    }

    #[test]
    fn conflicting_column_names() {
        let attributes = table(vec![
            ("catchID", col(Int64Array::from(vec![10]))),
            ("geometry", col(Int64Array::from(vec![1]))),
        ]);
        let err = inner_join(&catchments(), &attributes, "catchID").unwrap_err();
        assert!(matches!(err, CatchmentError::General(_)));
    }

    #[test]
    fn prepare_renames_and_casts_key() {
        let layer = table(vec![
            ("HYBAS_ID", col(Int32Array::from(vec![5, 6]))),
            ("SUB_AREA", col(Float64Array::from(vec![1.0, 2.0]))),
            ("geometry", col(BinaryArray::from(vec![b"a".as_ref(), b"b".as_ref()]))),
        ]);
        let prepared = prepare_catchments(layer, "geometry").unwrap();

        assert_eq!(prepared.num_columns(), 2);
        let key = prepared.schema().field(0);
        assert_eq!(key.name(), CATCHMENT_KEY);
        assert_eq!(key.data_type(), &DataType::Int64);
        assert_eq!(i64_values(&prepared, CATCHMENT_KEY), vec![5, 6]);
    }

    #[test]
    fn unparseable_keys_are_an_error() {
        let layer = table(vec![
            ("HYBAS_ID", col(StringArray::from(vec!["10", "abc"]))),
            ("geometry", col(BinaryArray::from(vec![b"a".as_ref(), b"b".as_ref()]))),
        ]);
        let err = prepare_catchments(layer, "geometry").unwrap_err();
        assert!(matches!(err, CatchmentError::IncorrectType(msg) if msg.contains("catchID")));
    }

    #[test]
    fn string_keys_are_parsed() {
        let attributes = table(vec![
            ("catchID", col(StringArray::from(vec![Some("40"), None]))),
            ("n", col(Int64Array::from(vec![3, 4]))),
        ]);
        let joined = inner_join(&catchments(), &attributes, "catchID").unwrap();
        assert_eq!(i64_values(&joined, "n"), vec![3]);
    }

    #[test]
    fn prepare_requires_a_key() {
        let layer = table(vec![(
            "geometry",
            col(BinaryArray::from(vec![b"a".as_ref()])),
        )]);
        let err = prepare_catchments(layer, "geometry").unwrap_err();
        assert!(matches!(err, CatchmentError::MissingColumn(name) if name == SOURCE_KEY));
    }

    #[test]
    fn float_keys_are_cast() {
        let attributes = table(vec![
            ("catchID", col(Float64Array::from(vec![20.0]))),
            ("n", col(Int64Array::from(vec![9]))),
        ]);
        let joined = inner_join(&catchments(), &attributes, "catchID").unwrap();
        assert_eq!(i64_values(&joined, "n"), vec![9]);
    }
}
