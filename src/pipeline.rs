//! The file conversion steps that prepare catchment data for the map viewer.
//!
//! Each step reads whole files into memory, converts them and writes the result next to the
//! input. Missing inputs are skipped with a log line.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::array::{MultiPolygonArray, MultiPolygonBuilder};
use crate::error::{CatchmentError, Result};
use crate::io::csv::{read_csv, CsvReaderOptions};
use crate::io::ipc::{read_ipc, write_ipc};
use crate::io::parquet::metadata::GEOPARQUET_METADATA_KEY;
use crate::io::parquet::{
    read_geoparquet, write_parquet, ParquetReaderOptions, ParquetWriterOptions,
};
use crate::io::wkb::from_wkb;
use crate::table::{AugmentOptions, AugmentOutcome, Table};

/// Attribute CSVs converted by [`csv_to_parquet`]: input name, output name and description.
pub const CSV_FILES: [(&str, &str, &str); 3] = [
    (
        "current.csv",
        "current.parquet",
        "Current scenario catchment landscape data",
    ),
    (
        "reference.csv",
        "reference.parquet",
        "Reference scenario catchment landscape data",
    ),
    (
        "column_metadata.csv",
        "column_Metadata.parquet",
        "Column metadata for landscape datasets",
    ),
];

/// Scenario tables joined with catchment geometries.
pub const SCENARIOS: [&str; 2] = ["current", "reference"];

fn file_size_mb(path: &Path) -> Result<f64> {
    Ok(fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0))
}

/// Write `table` to `path` through a sibling temporary file, so `path` may also be the input.
fn write_ipc_file(table: &Table, path: &Path) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let result = File::create(&tmp)
        .map_err(CatchmentError::from)
        .and_then(|file| write_ipc(table, file))
        .and_then(|()| Ok(fs::rename(&tmp, path)?));
    if result.is_err() && tmp.exists() {
        // The write error is reported, not a failure to clean up
        if let Err(err) = fs::remove_file(&tmp) {
            warn!("could not remove {}: {err}", tmp.display());
        }
    }
    result
}

/// Convert one CSV file to Parquet.
pub fn convert_csv_file(
    csv_path: &Path,
    parquet_path: &Path,
    csv_options: &CsvReaderOptions,
    parquet_options: &ParquetWriterOptions,
) -> Result<Table> {
    let table = read_csv(File::open(csv_path)?, csv_options)?;
    write_parquet(&table, File::create(parquet_path)?, parquet_options)?;

    let csv_size = file_size_mb(csv_path)?;
    let parquet_size = file_size_mb(parquet_path)?;
    let reduction = if csv_size > 0.0 {
        (1.0 - parquet_size / csv_size) * 100.0
    } else {
        0.0
    };
    info!(
        rows = table.len(),
        columns = table.num_columns(),
        "{csv_size:.1} MB -> {parquet_size:.1} MB ({reduction:.0}% reduction)"
    );
    Ok(table)
}

/// Convert the attribute CSVs in `data_dir` to Parquet files in `output_dir`.
///
/// Returns the number of converted files.
///
/// # Errors
///
/// [`CatchmentError::NoInputs`] if none of [`CSV_FILES`] exists.
pub fn csv_to_parquet(data_dir: &Path, output_dir: &Path) -> Result<usize> {
    fs::create_dir_all(output_dir)?;
    info!("converting CSVs in {} -> {}", data_dir.display(), output_dir.display());

    let csv_options = CsvReaderOptions::default();
    let parquet_options = ParquetWriterOptions::default();
    let mut converted = 0;
    for (input, output, description) in CSV_FILES {
        let csv_path = data_dir.join(input);
        if !csv_path.exists() {
            warn!("skipping {input} (not found)");
            continue;
        }
        info!("converting {input} -> {output} ({description})");
        convert_csv_file(
            &csv_path,
            &output_dir.join(output),
            &csv_options,
            &parquet_options,
        )?;
        converted += 1;
    }

    if converted == 0 {
        return Err(CatchmentError::NoInputs(format!(
            "no CSV files found to convert in {}",
            data_dir.display()
        )));
    }
    info!("converted {converted} file(s)");
    Ok(converted)
}

/// Join the catchment layer of a GeoPackage with each scenario CSV in `data_dir`, writing
/// `{scenario}.geoarrow` GeoParquet files.
#[cfg(feature = "gdal")]
pub fn join_catchments(gpkg_path: &Path, layer_name: &str, data_dir: &Path) -> Result<usize> {
    use crate::io::gdal::{read_gdal_layer, GdalReaderOptions};
    use crate::io::parquet::{write_geoparquet, GeoParquetWriterOptions};
    use crate::join::{inner_join, prepare_catchments, CATCHMENT_KEY};

    let gdal_options = GdalReaderOptions::default();
    info!("reading catchment geometries from {}", gpkg_path.display());
    let catchments = read_gdal_layer(gpkg_path, layer_name, &gdal_options)?;
    info!(rows = catchments.len(), "loaded catchment polygons");

    let geometry_field = catchments
        .schema()
        .field_with_name(&gdal_options.geometry_column)
        .map_err(|_| CatchmentError::MissingGeometryColumn(gdal_options.geometry_column.clone()))?;
    let crs = crate::io::extension_crs(geometry_field);
    let catchments = prepare_catchments(catchments, &gdal_options.geometry_column)?;

    let writer_options = GeoParquetWriterOptions {
        primary_column: gdal_options.geometry_column.clone(),
        crs,
        ..Default::default()
    };
    let mut written = 0;
    for scenario in SCENARIOS {
        let csv_path = data_dir.join(format!("{scenario}.csv"));
        if !csv_path.exists() {
            warn!("skipping {} (not found)", csv_path.display());
            continue;
        }
        let attributes = read_csv(File::open(&csv_path)?, &CsvReaderOptions::default())?;
        info!(rows = attributes.len(), "loaded {scenario}.csv");

        let joined = inner_join(&catchments, &attributes, CATCHMENT_KEY)?;
        info!(rows = joined.len(), "joined rows with geometries");

        let output = data_dir.join(format!("{scenario}.geoarrow"));
        write_geoparquet(&joined, File::create(&output)?, &writer_options)?;
        info!("wrote {} ({:.1} MB)", output.display(), file_size_mb(&output)?);
        written += 1;
    }

    if written == 0 {
        return Err(CatchmentError::NoInputs(format!(
            "no scenario CSV files found in {}",
            data_dir.display()
        )));
    }
    Ok(written)
}

/// Convert a GeoParquet file (WKB geometry) to an Arrow IPC file with the native multipolygon
/// encoding and separated coordinates.
pub fn geoparquet_to_arrow(src: &Path, dst: &Path) -> Result<()> {
    info!("reading {}", src.display());
    let (mut table, geo_meta) =
        read_geoparquet(File::open(src)?, &ParquetReaderOptions::default())?;
    info!(rows = table.len(), columns = table.num_columns(), "read GeoParquet");

    let name = geo_meta.primary_column.clone();
    let crs = geo_meta.primary()?.crs.clone();
    let index = table
        .column_index(&name)
        .ok_or_else(|| CatchmentError::MissingGeometryColumn(name.clone()))?;

    let arrays = table
        .column(index)
        .iter()
        .map(|chunk| from_wkb(chunk.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let field = match arrays.first() {
        Some(array) => array.extension_field(&name, crs.as_ref()),
        None => MultiPolygonBuilder::new()
            .finish()
            .extension_field(&name, crs.as_ref()),
    };
    let chunks = arrays
        .into_iter()
        .map(MultiPolygonArray::into_array_ref)
        .collect();
    table.replace_column(index, Arc::new(field), chunks)?;
    table.remove_schema_metadata(GEOPARQUET_METADATA_KEY)?;

    write_ipc_file(&table, dst)?;
    info!("wrote {} ({:.1} MB)", dst.display(), file_size_mb(dst)?);
    Ok(())
}

/// Convert every `{scenario}.geoarrow` in `data_dir` to `{scenario}.arrow`.
///
/// Returns the number of converted files.
pub fn geoparquet_dir_to_arrow(data_dir: &Path) -> Result<usize> {
    let mut converted = 0;
    for scenario in ["reference", "current"] {
        let src = data_dir.join(format!("{scenario}.geoarrow"));
        if !src.exists() {
            warn!("skipping {}: file not found", src.display());
            continue;
        }
        geoparquet_to_arrow(&src, &data_dir.join(format!("{scenario}.arrow")))?;
        converted += 1;
    }
    Ok(converted)
}

/// Append bounding box columns to an Arrow IPC file.
///
/// `output` defaults to rewriting `input`. If the bounding box columns already exist nothing is
/// written.
pub fn add_bbox(
    input: &Path,
    output: Option<&Path>,
    options: &AugmentOptions,
) -> Result<AugmentOutcome> {
    info!("reading {}", input.display());
    let mut table = read_ipc(File::open(input)?)?;
    info!(rows = table.len(), columns = table.num_columns(), "read Arrow IPC");

    let outcome = table.append_bbox_columns(options)?;
    if outcome == AugmentOutcome::AlreadyAugmented {
        info!("bbox columns already present, nothing to do");
        return Ok(outcome);
    }

    let output = output.unwrap_or(input);
    write_ipc_file(&table, output)?;
    info!("wrote {} ({:.1} MB)", output.display(), file_size_mb(output)?);
    Ok(outcome)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use arrow_array::cast::AsArray;
    use arrow_array::types::Float64Type;
    use arrow_array::{Array, ArrayRef, BinaryArray, Int64Array, RecordBatch};
    use arrow_schema::{Field, Schema};

    use super::*;
    use crate::array::MULTIPOLYGON_EXTENSION_NAME;
    use crate::io::parquet::{read_parquet, write_geoparquet};
    use crate::test::wkb;

    const SQUARE: &[(f64, f64)] = &[(0., 0.), (2., 0.), (2., 2.), (0., 2.), (0., 0.)];

    fn write_file(path: &Path, contents: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn write_scenario_geoparquet(path: &Path) {
        let values = [Some(wkb::polygon(&[SQUARE])), None];
        let geometry: ArrayRef =
            Arc::new(BinaryArray::from_iter(values.iter().map(|v| v.as_deref())));
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![11, 12]));
        let schema = Arc::new(Schema::new(vec![
            Field::new("catchID", ids.data_type().clone(), true),
            Field::new("geometry", geometry.data_type().clone(), true),
        ]));
        let table = Table::from(RecordBatch::try_new(schema, vec![ids, geometry]).unwrap());
        let options = crate::io::parquet::GeoParquetWriterOptions {
            crs: Some(serde_json::json!("OGC:CRS84")),
            ..Default::default()
        };
        write_geoparquet(&table, File::create(path).unwrap(), &options).unwrap();
    }

    #[test]
    fn failed_write_leaves_no_temporary_file() {
        let data = tempfile::tempdir().unwrap();
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
        let field = Field::new("catchID", ids.data_type().clone(), true);
        let schema = Arc::new(Schema::new(vec![field]));
        let table = Table::from(RecordBatch::try_new(schema, vec![ids]).unwrap());

        // A non-empty directory cannot be replaced by the finished file
        let target = data.path().join("current.arrow");
        fs::create_dir(&target).unwrap();
        write_file(&target.join("keep"), "x");

        assert!(write_ipc_file(&table, &target).is_err());
        assert!(!data.path().join("current.arrow.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn csv_to_parquet_converts_present_files() {
        let data = tempfile::tempdir().unwrap();
        let out = data.path().join("out");
        write_file(&data.path().join("current.csv"), "catchID,ph\n1,7.0\n2,NA\n");
        write_file(
            &data.path().join("column_metadata.csv"),
            "column,description\nph,acidity\n",
        );

        let converted = csv_to_parquet(data.path(), &out).unwrap();
        assert_eq!(converted, 2);
        assert!(out.join("current.parquet").exists());
        assert!(out.join("column_Metadata.parquet").exists());
        assert!(!out.join("reference.parquet").exists());

        let table = read_parquet(
            File::open(out.join("current.parquet")).unwrap(),
            &Default::default(),
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_by_name("ph").unwrap()[0].null_count(), 1);
    }

    #[test]
    fn csv_to_parquet_without_inputs() {
        let data = tempfile::tempdir().unwrap();
        let err = csv_to_parquet(data.path(), data.path()).unwrap_err();
        assert!(matches!(err, CatchmentError::NoInputs(_)));
    }

    #[test]
    fn to_arrow_then_add_bbox() {
        let data = tempfile::tempdir().unwrap();
        write_scenario_geoparquet(&data.path().join("current.geoarrow"));

        assert_eq!(geoparquet_dir_to_arrow(data.path()).unwrap(), 1);
        let arrow_path = data.path().join("current.arrow");
        assert!(!data.path().join("reference.arrow").exists());

        let table = read_ipc(File::open(&arrow_path).unwrap()).unwrap();
        let field = table.schema().field_with_name("geometry").unwrap();
        assert_eq!(
            field.metadata().get("ARROW:extension:name").unwrap(),
            MULTIPOLYGON_EXTENSION_NAME
        );
        assert_eq!(
            crate::io::extension_crs(field),
            Some(serde_json::json!("OGC:CRS84"))
        );
        assert!(!table.schema().metadata().contains_key("geo"));

        let outcome = add_bbox(&arrow_path, None, &Default::default()).unwrap();
        assert_eq!(outcome, AugmentOutcome::Augmented);

        let table = read_ipc(File::open(&arrow_path).unwrap()).unwrap();
        assert_eq!(table.num_columns(), 6);
        let maxx = table.column_by_name("bbox_maxx").unwrap();
        let maxx = maxx[0].as_primitive::<Float64Type>();
        assert_eq!(maxx.value(0), 2.0);
        assert!(maxx.value(1).is_nan());

        let outcome = add_bbox(&arrow_path, None, &Default::default()).unwrap();
        assert_eq!(outcome, AugmentOutcome::AlreadyAugmented);
    }

    #[test]
    fn add_bbox_to_separate_output() {
        let data = tempfile::tempdir().unwrap();
        let src = data.path().join("current.geoarrow");
        write_scenario_geoparquet(&src);
        let input = data.path().join("in.arrow");
        let output = data.path().join("out.arrow");
        geoparquet_to_arrow(&src, &input).unwrap();

        add_bbox(&input, Some(&output), &Default::default()).unwrap();
        assert_eq!(read_ipc(File::open(&input).unwrap()).unwrap().num_columns(), 2);
        assert_eq!(read_ipc(File::open(&output).unwrap()).unwrap().num_columns(), 6);
    }

    #[test]
    fn add_bbox_requires_geometry() {
        let data = tempfile::tempdir().unwrap();
        let path = data.path().join("plain.arrow");
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![1]));
        let schema = Arc::new(Schema::new(vec![Field::new("id", ids.data_type().clone(), true)]));
        let table = Table::from(RecordBatch::try_new(schema, vec![ids]).unwrap());
        write_ipc(&table, File::create(&path).unwrap()).unwrap();

        let err = add_bbox(&path, None, &Default::default()).unwrap_err();
        assert!(matches!(err, CatchmentError::MissingGeometryColumn(_)));
        assert_eq!(read_ipc(File::open(&path).unwrap()).unwrap().num_columns(), 1);
    }
}
