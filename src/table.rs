//! Abstractions for Arrow tables. Useful for dataset IO where data will have geometries and
//! attributes.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{FieldRef, Schema, SchemaRef};
use tracing::{debug, info};

use crate::algorithm::native::{BBoxColumns, BBOX_COLUMN_NAMES};
use crate::array::MultiPolygonArray;
use crate::error::{CatchmentError, Result};

/// Options for [`Table::append_bbox_columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentOptions {
    /// Name of the column holding the multipolygon geometries.
    pub geometry_column: String,

    /// Also mark rows without a bounding box as null. Their stored value stays NaN.
    pub with_validity: bool,
}

impl Default for AugmentOptions {
    fn default() -> Self {
        Self {
            geometry_column: "geometry".to_string(),
            with_validity: false,
        }
    }
}

/// What [`Table::append_bbox_columns`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentOutcome {
    /// The four bounding box columns were appended.
    Augmented,

    /// At least one bounding box column already existed; the table is unchanged.
    AlreadyAugmented,
}

/// A schema plus the record batches that share it.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Create a table, checking that every batch carries the same fields as `schema`.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for batch in &batches {
            if batch.schema().fields() != schema.fields() {
                return Err(CatchmentError::General(
                    "all record batches must have the table's fields".to_string(),
                ));
            }
        }
        Ok(Self { schema, batches })
    }

    /// A table holding a single batch.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }

    pub fn len(&self) -> usize {
        self.batches.iter().fold(0, |sum, val| sum + val.num_rows())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn into_inner(self) -> (SchemaRef, Vec<RecordBatch>) {
        (self.schema, self.batches)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Index of the column called `name`, if any.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name).ok()
    }

    /// The chunks of column `i`, one per batch.
    pub fn column(&self, i: usize) -> Vec<ArrayRef> {
        self.batches
            .iter()
            .map(|batch| batch.column(i).clone())
            .collect()
    }

    /// The chunks of the column called `name`.
    pub fn column_by_name(&self, name: &str) -> Result<Vec<ArrayRef>> {
        let i = self
            .column_index(name)
            .ok_or_else(|| CatchmentError::MissingColumn(name.to_string()))?;
        Ok(self.column(i))
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| CatchmentError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let schema = Arc::new(self.schema.project(&indices)?);
        let batches = self
            .batches
            .iter()
            .map(|batch| batch.project(&indices))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Table { schema, batches })
    }

    /// Rename column `from` to `to`, keeping its type and metadata.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let i = self
            .column_index(from)
            .ok_or_else(|| CatchmentError::MissingColumn(from.to_string()))?;
        let fields: Vec<FieldRef> = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .map(|(j, field)| {
                if j == i {
                    Arc::new(field.as_ref().clone().with_name(to))
                } else {
                    field.clone()
                }
            })
            .collect();
        self.replace_fields(fields)
    }

    /// Drop a key from the schema-level metadata.
    pub fn remove_schema_metadata(&mut self, key: &str) -> Result<()> {
        let mut metadata = self.schema.metadata().clone();
        if metadata.remove(key).is_none() {
            return Ok(());
        }
        let fields = self.schema.fields().iter().cloned().collect();
        self.rebuild(fields, metadata)
    }

    /// Swap the schema for one with the same number of fields and compatible types.
    fn replace_fields(&mut self, fields: Vec<FieldRef>) -> Result<()> {
        let metadata = self.schema.metadata().clone();
        self.rebuild(fields, metadata)
    }

    fn rebuild(&mut self, fields: Vec<FieldRef>, metadata: HashMap<String, String>) -> Result<()> {
        let schema = Arc::new(Schema::new_with_metadata(fields, metadata));
        self.batches = self
            .batches
            .iter()
            .map(|batch| RecordBatch::try_new(schema.clone(), batch.columns().to_vec()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.schema = schema;
        Ok(())
    }

    /// Replace column `i` in every batch, along with its field.
    pub fn replace_column(
        &mut self,
        i: usize,
        field: FieldRef,
        chunks: Vec<ArrayRef>,
    ) -> Result<()> {
        if chunks.len() != self.batches.len() {
            return Err(CatchmentError::General(
                "one chunk is required per record batch".to_string(),
            ));
        }
        let mut fields: Vec<FieldRef> = self.schema.fields().iter().cloned().collect();
        fields[i] = field;
        let schema = Arc::new(Schema::new_with_metadata(
            fields,
            self.schema.metadata().clone(),
        ));
        self.batches = self
            .batches
            .iter()
            .zip(chunks)
            .map(|(batch, chunk)| {
                let mut columns = batch.columns().to_vec();
                columns[i] = chunk;
                RecordBatch::try_new(schema.clone(), columns)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.schema = schema;
        Ok(())
    }

    /// Whether any of the bounding box column names is taken.
    pub fn has_bbox_columns(&self) -> bool {
        BBOX_COLUMN_NAMES
            .iter()
            .any(|name| self.column_index(name).is_some())
    }

    /// All rows as one batch.
    pub fn concat(&self) -> Result<RecordBatch> {
        Ok(arrow_select::concat::concat_batches(
            &self.schema,
            &self.batches,
        )?)
    }

    /// Append new columns. `columns` holds one entry per batch, each with one array per field.
    pub fn append_columns(
        &mut self,
        fields: &[FieldRef],
        columns: Vec<Vec<ArrayRef>>,
    ) -> Result<()> {
        if columns.len() != self.batches.len() {
            return Err(CatchmentError::General(
                "one set of columns is required per record batch".to_string(),
            ));
        }

        let mut schema_fields: Vec<FieldRef> = self.schema.fields().iter().cloned().collect();
        schema_fields.extend(fields.iter().cloned());
        let schema = Arc::new(Schema::new_with_metadata(
            schema_fields,
            self.schema.metadata().clone(),
        ));

        let batches = self
            .batches
            .iter()
            .zip(columns)
            .map(|(batch, new_columns)| {
                let mut arrays = batch.columns().to_vec();
                arrays.extend(new_columns);
                RecordBatch::try_new(schema.clone(), arrays)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.schema = schema;
        self.batches = batches;
        Ok(())
    }

    /// Append `bbox_minx`, `bbox_miny`, `bbox_maxx` and `bbox_maxy` computed from the geometry
    /// column.
    ///
    /// Does nothing if any of those columns already exists.
    ///
    /// # Errors
    ///
    /// - [`CatchmentError::MissingGeometryColumn`] if the geometry column does not exist.
    /// - [`CatchmentError::UnsupportedGeometryShape`] if it is not a (multi)polygon column.
    pub fn append_bbox_columns(&mut self, options: &AugmentOptions) -> Result<AugmentOutcome> {
        if self.has_bbox_columns() {
            info!("bounding box columns already present");
            return Ok(AugmentOutcome::AlreadyAugmented);
        }

        let geometry_index = self
            .column_index(&options.geometry_column)
            .ok_or_else(|| CatchmentError::MissingGeometryColumn(options.geometry_column.clone()))?;

        info!(rows = self.len(), "computing bounding boxes");
        let columns = self
            .column(geometry_index)
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                debug!(batch = i, rows = chunk.len(), "computing batch bounding boxes");
                let multi_polygons = MultiPolygonArray::try_from(chunk.as_ref())?;
                Ok(compute_bbox_columns(&multi_polygons, options.with_validity)
                    .into_columns()
                    .to_vec())
            })
            .collect::<Result<Vec<_>>>()?;

        let fields = BBoxColumns::fields(options.with_validity).map(Arc::new);
        self.append_columns(&fields, columns)?;
        Ok(AugmentOutcome::Augmented)
    }
}

#[cfg(not(feature = "rayon"))]
fn compute_bbox_columns(array: &MultiPolygonArray, with_validity: bool) -> BBoxColumns {
    use crate::algorithm::native::BoundingRects;
    array.bbox_columns(with_validity)
}

#[cfg(feature = "rayon")]
fn compute_bbox_columns(array: &MultiPolygonArray, with_validity: bool) -> BBoxColumns {
    array.par_bbox_columns(with_validity)
}

impl From<RecordBatch> for Table {
    fn from(value: RecordBatch) -> Self {
        Self::from_batch(value)
    }
}
