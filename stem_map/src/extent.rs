//! Spatial extent of the canopy height raster and the filters clipping
//! located plants against it.

use crate::crs::Crs;
use crate::error::{Result, StemMapError};
use crate::geometry::{BoundingBox, Point};
use crate::gis::Feature;
use crate::surveying::PlantLocation;

/// Bounding rectangle of a raster together with its reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialExtent {
    pub bounds: BoundingBox,
    pub crs: Crs,
}

impl SpatialExtent {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, crs: Crs) -> Result<Self> {
        let bounds = BoundingBox::new(xmin, xmax, ymin, ymax).ok_or(
            StemMapError::InvalidExtent {
                xmin,
                xmax,
                ymin,
                ymax,
            },
        )?;
        Ok(Self { bounds, crs })
    }

    /// Inclusive membership test against the bounds widened by `buffer`.
    pub fn contains(&self, p: Point, buffer: f64) -> bool {
        self.bounds.buffered(buffer).contains(p)
    }
}

/// Located plants tagged with the reference system of their coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoreferencedPlants {
    pub crs: Crs,
    pub plants: Vec<PlantLocation>,
}

impl GeoreferencedPlants {
    /// Attaches `crs` to the plants. Coordinates are not transformed.
    pub fn new(crs: Crs, plants: Vec<PlantLocation>) -> Self {
        Self { crs, plants }
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    /// Point features with the descriptive subset of fields.
    pub fn features(&self) -> Vec<Feature<Point>> {
        self.plants.iter().filter_map(Feature::from_plant).collect()
    }

    /// Bounds of the located plants, if any have a position.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let pts: Vec<Point> = self.plants.iter().filter_map(PlantLocation::position).collect();
        BoundingBox::from_points(&pts)
    }
}

/// Fails unless the plants and the extent share a reference system.
pub fn ensure_same_crs(plants: &GeoreferencedPlants, extent: &SpatialExtent) -> Result<()> {
    if plants.crs.same_as(&extent.crs) {
        Ok(())
    } else {
        Err(StemMapError::CrsMismatch {
            points: plants.crs.to_string(),
            extent: extent.crs.to_string(),
        })
    }
}

fn filter_by_extent(
    plants: &GeoreferencedPlants,
    extent: &SpatialExtent,
    buffer: f64,
) -> Result<GeoreferencedPlants> {
    if !buffer.is_finite() || buffer < 0.0 {
        return Err(StemMapError::InvalidBuffer(buffer));
    }
    ensure_same_crs(plants, extent)?;
    let kept = plants
        .plants
        .iter()
        .filter(|p| p.position().is_some_and(|pos| extent.contains(pos, buffer)))
        .cloned()
        .collect();
    Ok(GeoreferencedPlants::new(plants.crs.clone(), kept))
}

/// Plants lying inside the exact raster extent. This is the set whose size
/// is reported as the number of trees within the extent.
pub fn within_extent(
    plants: &GeoreferencedPlants,
    extent: &SpatialExtent,
) -> Result<GeoreferencedPlants> {
    let inside = filter_by_extent(plants, extent, 0.0)?;
    log::info!(
        "{} of {} located stems fall within the raster extent",
        inside.len(),
        plants.len()
    );
    Ok(inside)
}

/// Plants lying inside the raster extent widened by `buffer` on each side,
/// used when cropping around the plot.
pub fn crop_to_extent(
    plants: &GeoreferencedPlants,
    extent: &SpatialExtent,
    buffer: f64,
) -> Result<GeoreferencedPlants> {
    let cropped = filter_by_extent(plants, extent, buffer)?;
    log::debug!(
        "{} located stems within {} m of the raster extent",
        cropped.len(),
        buffer
    );
    Ok(cropped)
}
