use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stem_map::{
    config::{read_config_json, ExtentConfig, PipelineConfig},
    crs::Crs,
    execute,
    geometry::Point,
    io::raster::read_geotiff_extent,
    surveying::forward,
    PipelineReport,
};

/// Parses `xmin,xmax,ymin,ymax`.
fn parse_extent(s: &str) -> Result<ExtentConfig, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values[..] {
        [xmin, xmax, ymin, ymax] => Ok(ExtentConfig {
            xmin,
            xmax,
            ymin,
            ymax,
        }),
        _ => Err("expected xmin,xmax,ymin,ymax".to_string()),
    }
}

fn print_report(report: &PipelineReport) {
    println!("{}", report);
}

/// Locate surveyed woody plant stems and clip them to a canopy height raster.
#[derive(Parser)]
#[command(name = "stem_map_cli", version)]
struct Cli {
    /// Reference system (e.g. EPSG:32611) for an explicit extent, or to
    /// override the raster's own
    #[arg(long, global = true)]
    crs: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline described by a JSON configuration file.
    Run { config: PathBuf },
    /// Locate stems from a survey table and a reference point table.
    Locate {
        survey: PathBuf,
        references: PathBuf,
        /// Output directory.
        #[arg(short, long)]
        out: PathBuf,
        /// Canopy height GeoTIFF providing the extent.
        #[arg(long, conflicts_with = "extent", required_unless_present = "extent")]
        raster: Option<PathBuf>,
        /// Explicit extent as xmin,xmax,ymin,ymax.
        #[arg(long, value_parser = parse_extent, allow_hyphen_values = true)]
        extent: Option<ExtentConfig>,
        #[arg(long, default_value_t = stem_map::config::DEFAULT_CROP_BUFFER)]
        crop_buffer: f64,
        /// Skip the GeoJSON output.
        #[arg(long)]
        no_geojson: bool,
        /// Skip the shapefile output.
        #[arg(long)]
        no_shapefile: bool,
    },
    /// Compute a stem position from a reference point, distance and azimuth.
    #[command(allow_negative_numbers = true)]
    Project {
        easting: f64,
        northing: f64,
        distance: f64,
        /// Degrees clockwise from north.
        azimuth: f64,
    },
    /// Print the extent and reference system of a GeoTIFF.
    Extent { raster: PathBuf },
}

fn run(cli: Cli) -> stem_map::Result<()> {
    match cli.command {
        Commands::Run { config } => {
            let mut cfg = read_config_json(&config)?;
            log::debug!("loaded configuration from {}", config.display());
            if cli.crs.is_some() {
                cfg.crs = cli.crs;
            }
            let report = execute(&cfg)?;
            print_report(&report);
            println!("Wrote {}", cfg.output_dir.display());
        }
        Commands::Locate {
            survey,
            references,
            out,
            raster,
            extent,
            crop_buffer,
            no_geojson,
            no_shapefile,
        } => {
            let cfg = PipelineConfig {
                raster,
                extent,
                crs: cli.crs,
                crop_buffer,
                write_geojson: !no_geojson,
                write_shapefile: !no_shapefile,
                ..PipelineConfig::new(survey, references, out)
            };
            let report = execute(&cfg)?;
            print_report(&report);
            println!("Wrote {}", cfg.output_dir.display());
        }
        Commands::Project {
            easting,
            northing,
            distance,
            azimuth,
        } => {
            let p = forward(Point::new(easting, northing), azimuth, distance);
            println!("Point: {:.3},{:.3}", p.x, p.y);
        }
        Commands::Extent { raster } => {
            let crs = cli.crs.as_deref().map(Crs::parse);
            let extent = read_geotiff_extent(&raster, crs.as_ref())?;
            let b = extent.bounds;
            println!(
                "Extent: xmin={:.3} xmax={:.3} ymin={:.3} ymax={:.3}",
                b.xmin, b.xmax, b.ymin, b.ymax
            );
            println!("CRS: {}", extent.crs);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
