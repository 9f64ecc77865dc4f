//! Extent and reference system of a GeoTIFF canopy height raster.
//!
//! Only the georeferencing tags are read; pixel values are never decoded.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::crs::Crs;
use crate::error::{Result, StemMapError};
use crate::extent::SpatialExtent;

const GEOGRAPHIC_TYPE_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_KEY: u32 = 3072;
const USER_DEFINED: u32 = 32767;

/// Georeferencing read from the GeoTIFF tags.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGeoreference {
    pub width: u32,
    pub height: u32,
    pub res_x: f64,
    pub res_y: f64,
    /// Upper-left corner of the upper-left pixel.
    pub origin_x: f64,
    pub origin_y: f64,
    pub epsg: Option<u32>,
}

impl RasterGeoreference {
    /// Bounding rectangle covered by the pixels, as
    /// `(xmin, xmax, ymin, ymax)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let xmin = self.origin_x;
        let ymax = self.origin_y;
        let xmax = xmin + self.width as f64 * self.res_x;
        let ymin = ymax - self.height as f64 * self.res_y;
        (xmin, xmax, ymin, ymax)
    }
}

/// Finds the EPSG code in a GeoKeyDirectory, preferring the projected CRS
/// key over the geographic one. User-defined codes are ignored.
pub fn epsg_from_geokeys(directory: &[u32]) -> Option<u32> {
    if directory.len() < 4 {
        return None;
    }
    let count = directory[3] as usize;
    let entries: Vec<&[u32]> = directory[4..].chunks_exact(4).take(count).collect();
    let lookup = |key: u32| {
        entries
            .iter()
            // location 0 means the value is stored inline
            .find(|e| e[0] == key && e[1] == 0)
            .map(|e| e[3])
            .filter(|v| *v != 0 && *v != USER_DEFINED)
    };
    lookup(PROJECTED_CS_TYPE_KEY).or_else(|| lookup(GEOGRAPHIC_TYPE_KEY))
}

fn raster_err(path: &Path, reason: impl ToString) -> StemMapError {
    StemMapError::Raster {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Reads the dimensions, pixel scale, tie point and EPSG code of a GeoTIFF.
pub fn read_geotiff_georeference(path: impl AsRef<Path>) -> Result<RasterGeoreference> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| raster_err(path, e))?;
    let (width, height) = decoder.dimensions().map_err(|e| raster_err(path, e))?;

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)
        .map_err(|e| raster_err(path, e))?
        .ok_or_else(|| raster_err(path, "missing ModelPixelScale tag"))?
        .into_f64_vec()
        .map_err(|e| raster_err(path, e))?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)
        .map_err(|e| raster_err(path, e))?
        .ok_or_else(|| raster_err(path, "missing ModelTiepoint tag"))?
        .into_f64_vec()
        .map_err(|e| raster_err(path, e))?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(raster_err(path, "malformed ModelPixelScale/ModelTiepoint tags"));
    }
    let (res_x, res_y) = (scale[0], scale[1]);
    // tie point (i, j, k) -> (x, y, z)
    let origin_x = tiepoint[3] - tiepoint[0] * res_x;
    let origin_y = tiepoint[4] + tiepoint[1] * res_y;

    let epsg = match decoder
        .find_tag(Tag::GeoKeyDirectoryTag)
        .map_err(|e| raster_err(path, e))?
    {
        Some(v) => epsg_from_geokeys(&v.into_u32_vec().map_err(|e| raster_err(path, e))?),
        None => None,
    };

    log::debug!(
        "{}: {}x{} px, res=({}, {}), origin=({:.2}, {:.2}), epsg={:?}",
        path.display(),
        width,
        height,
        res_x,
        res_y,
        origin_x,
        origin_y,
        epsg
    );
    Ok(RasterGeoreference {
        width,
        height,
        res_x,
        res_y,
        origin_x,
        origin_y,
        epsg,
    })
}

/// Spatial extent of a GeoTIFF.
///
/// `crs_override` takes precedence over the raster's own GeoKeys. Without
/// an override a raster lacking an EPSG code is an error.
pub fn read_geotiff_extent(
    path: impl AsRef<Path>,
    crs_override: Option<&Crs>,
) -> Result<SpatialExtent> {
    let path = path.as_ref();
    let georef = read_geotiff_georeference(path)?;
    let crs = match (crs_override, georef.epsg) {
        (Some(crs), Some(code)) => {
            if crs.epsg() != Some(code) {
                log::warn!(
                    "{}: raster declares EPSG:{}, using configured {}",
                    path.display(),
                    code,
                    crs
                );
            }
            crs.clone()
        }
        (Some(crs), None) => crs.clone(),
        (None, Some(code)) => Crs::from_epsg(code),
        (None, None) => {
            return Err(raster_err(
                path,
                "no EPSG code in GeoKeyDirectory and no CRS configured",
            ))
        }
    };
    let (xmin, xmax, ymin, ymax) = georef.bounds();
    let extent = SpatialExtent::new(xmin, xmax, ymin, ymax, crs)?;
    log::info!(
        "raster extent x=[{:.2}, {:.2}] y=[{:.2}, {:.2}] in {}",
        xmin,
        xmax,
        ymin,
        ymax,
        extent.crs
    );
    Ok(extent)
}
