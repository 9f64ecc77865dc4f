//! Surveying specific utilities.

pub mod cogo;
pub use cogo::{azimuth_to_radians, forward, project_offset};

pub mod reference;
pub use reference::{
    ReferencePointKey, ReferenceResolver, ReferenceTable, Resolution, ResolvedReference,
};

pub mod stem;
pub use stem::{
    distinct_trees, drop_incomplete, filter_measured, FilterOutcome, PlantLocation, SurveyRecord,
};
