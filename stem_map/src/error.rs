use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StemMapError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("coordinate reference mismatch: points in {points}, extent in {extent}")]
    CrsMismatch { points: String, extent: String },

    #[error("invalid extent: xmin={xmin} xmax={xmax} ymin={ymin} ymax={ymax}")]
    InvalidExtent {
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    },

    #[error("buffer must be a finite, non-negative distance, got {0}")]
    InvalidBuffer(f64),

    #[error("raster {path}: {reason}")]
    Raster { path: PathBuf, reason: String },

    #[cfg(feature = "shapefile")]
    #[error("{0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("invalid configuration, {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StemMapError>;
