//! Run configuration, loaded from JSON or assembled by the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crs::Crs;
use crate::error::{Result, StemMapError};
use crate::extent::SpatialExtent;

pub const DEFAULT_CROP_BUFFER: f64 = 5.0;

fn default_crop_buffer() -> f64 {
    DEFAULT_CROP_BUFFER
}

fn default_true() -> bool {
    true
}

fn default_table_name() -> String {
    "woody_utm.csv".to_string()
}

fn default_features_name() -> String {
    "woody_in_extent".to_string()
}

/// Explicit bounds used when no raster is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtentConfig {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

/// Inputs, outputs and parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Survey table (CSV).
    pub survey: PathBuf,
    /// Reference point coordinates (CSV).
    pub references: PathBuf,
    /// Canopy height raster providing the extent.
    #[serde(default)]
    pub raster: Option<PathBuf>,
    /// Explicit extent, alternative to `raster`.
    #[serde(default)]
    pub extent: Option<ExtentConfig>,
    /// CRS of an explicit extent, or override for a raster lacking GeoKeys.
    #[serde(default)]
    pub crs: Option<String>,
    /// CRS of the reference point coordinates, if it must be checked
    /// against the extent's.
    #[serde(default)]
    pub references_crs: Option<String>,
    pub output_dir: PathBuf,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// File stem of the point-feature outputs.
    #[serde(default = "default_features_name")]
    pub features_name: String,
    #[serde(default = "default_crop_buffer")]
    pub crop_buffer: f64,
    #[serde(default = "default_true")]
    pub write_geojson: bool,
    #[serde(default = "default_true")]
    pub write_shapefile: bool,
}

impl PipelineConfig {
    pub fn new(
        survey: impl Into<PathBuf>,
        references: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            survey: survey.into(),
            references: references.into(),
            raster: None,
            extent: None,
            crs: None,
            references_crs: None,
            output_dir: output_dir.into(),
            table_name: default_table_name(),
            features_name: default_features_name(),
            crop_buffer: DEFAULT_CROP_BUFFER,
            write_geojson: true,
            write_shapefile: true,
        }
    }

    /// Checks that exactly one extent source is given and that the numeric
    /// parameters are usable.
    pub fn validate(&self) -> Result<()> {
        match (&self.raster, &self.extent) {
            (Some(_), Some(_)) => {
                return Err(StemMapError::Config(
                    "`raster` and `extent` are mutually exclusive".into(),
                ))
            }
            (None, None) => {
                return Err(StemMapError::Config(
                    "one of `raster` or `extent` is required".into(),
                ))
            }
            (None, Some(_)) if self.crs.is_none() => {
                return Err(StemMapError::Config(
                    "an explicit `extent` needs a `crs`".into(),
                ))
            }
            _ => {}
        }
        if !self.crop_buffer.is_finite() || self.crop_buffer < 0.0 {
            return Err(StemMapError::InvalidBuffer(self.crop_buffer));
        }
        Ok(())
    }

    pub fn crs_override(&self) -> Option<Crs> {
        self.crs.as_deref().map(Crs::parse)
    }

    /// Extent given directly in the configuration, if any.
    pub fn explicit_extent(&self) -> Result<Option<SpatialExtent>> {
        let (Some(e), Some(crs)) = (self.extent, self.crs_override()) else {
            return Ok(None);
        };
        SpatialExtent::new(e.xmin, e.xmax, e.ymin, e.ymax, crs).map(Some)
    }

    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(&self.table_name)
    }

    pub fn shapefile_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.shp", self.features_name))
    }

    pub fn geojson_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.geojson", self.features_name))
    }
}

/// Reads a [`PipelineConfig`] from a JSON file. Relative paths inside the
/// document are resolved against the file's directory.
pub fn read_config_json(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let contents = crate::io::read_to_string(path)?;
    let mut config: PipelineConfig = serde_json::from_str(&contents)?;
    if let Some(base) = path.parent() {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        rebase(&mut config.survey);
        rebase(&mut config.references);
        rebase(&mut config.output_dir);
        if let Some(r) = config.raster.as_mut() {
            rebase(r);
        }
    }
    Ok(config)
}

pub fn write_config_json(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    crate::io::write_string(path, &json)?;
    Ok(())
}
