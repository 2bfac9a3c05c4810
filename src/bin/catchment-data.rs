//! Binary that prepares catchment data files for the map viewer.
//!
//! ```text
//! catchment-data csv2parquet --data-dir data
//! catchment-data join --gpkg resources/mbtiles/UoW_layers.gpkg
//! catchment-data to-arrow
//! catchment-data add-bbox data/current.arrow
//! ```
//!
//! Logging follows `RUST_LOG` when set, otherwise `-v` raises the level from `info`.

use std::path::PathBuf;

use catchment_data::error::Result;
use catchment_data::pipeline;
use catchment_data::table::{AugmentOptions, AugmentOutcome};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Log debug (-v) or trace (-vv) events
    #[clap(short, long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert the attribute CSV files to Parquet
    Csv2parquet {
        /// Directory containing the CSV files
        #[clap(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output directory for Parquet files [default: the data directory]
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },

    /// Join catchment geometries from a GeoPackage to the scenario CSVs and write GeoParquet
    #[cfg(feature = "gdal")]
    Join {
        /// Path to the GeoPackage
        #[clap(long)]
        gpkg: PathBuf,

        /// Layer holding the catchment polygons
        #[clap(long, default_value = "catchments_lev12")]
        layer: String,

        /// Directory containing the scenario CSVs; outputs are written here too
        #[clap(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Convert the scenario GeoParquet files to Arrow IPC with native geometries
    ToArrow {
        /// Directory containing the `.geoarrow` files
        #[clap(long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Append bbox_minx, bbox_miny, bbox_maxx and bbox_maxy columns to an Arrow IPC file
    AddBbox {
        /// Input Arrow IPC file
        input: PathBuf,

        /// Output file [default: overwrite the input]
        output: Option<PathBuf>,

        /// Name of the geometry column
        #[clap(long, default_value = "geometry")]
        geometry_column: String,

        /// Also mark rows without geometry as null
        #[clap(long)]
        with_validity: bool,
    },
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

impl Args {
    fn run(self) -> Result<()> {
        match self.cmd {
            Command::Csv2parquet {
                data_dir,
                output_dir,
            } => {
                let output_dir = output_dir.unwrap_or_else(|| data_dir.clone());
                pipeline::csv_to_parquet(&data_dir, &output_dir)?;
            }
            #[cfg(feature = "gdal")]
            Command::Join {
                gpkg,
                layer,
                data_dir,
            } => {
                pipeline::join_catchments(&gpkg, &layer, &data_dir)?;
            }
            Command::ToArrow { data_dir } => {
                pipeline::geoparquet_dir_to_arrow(&data_dir)?;
            }
            Command::AddBbox {
                input,
                output,
                geometry_column,
                with_validity,
            } => {
                let options = AugmentOptions {
                    geometry_column,
                    with_validity,
                };
                let outcome = pipeline::add_bbox(&input, output.as_deref(), &options)?;
                if outcome == AugmentOutcome::AlreadyAugmented {
                    info!("{} already has bbox columns", input.display());
                }
            }
        }
        info!("all done");
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    args.run()
}
