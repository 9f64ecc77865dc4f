//! Core library for mapping surveyed woody plant stems.
//!
//! Stems are measured as a distance and compass azimuth from a surveyed
//! reference monument. This crate turns those offsets into absolute
//! easting/northing coordinates and clips the result to the extent of a
//! canopy height raster.

pub mod config;
pub mod crs;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod gis;
pub mod io;
pub mod pipeline;
pub mod surveying;

pub use config::PipelineConfig;
pub use crs::Crs;
pub use error::{Result, StemMapError};
pub use extent::{crop_to_extent, within_extent, GeoreferencedPlants, SpatialExtent};
pub use pipeline::{execute, run, PipelineOutput, PipelineReport, RunOptions};
