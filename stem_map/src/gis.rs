use std::collections::BTreeMap;

use crate::geometry::Point;
use crate::surveying::PlantLocation;

/// Descriptive fields carried from a located plant onto its point feature.
pub const PLANT_ATTRIBUTES: [&str; 3] = ["individualID", "scientificName", "taxonID"];

/// Wrapper linking geometry with optional feature class and GIS attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<T> {
    /// Optional feature class name, e.g. layer or category.
    pub class: Option<String>,
    /// Arbitrary attribute key/value pairs.
    pub attributes: BTreeMap<String, String>,
    /// Underlying geometry.
    pub geometry: T,
}

impl<T> Feature<T> {
    /// Creates a new feature with empty attributes.
    pub fn new(geometry: T) -> Self {
        Self {
            class: None,
            attributes: BTreeMap::new(),
            geometry,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl Feature<Point> {
    /// Point feature for a located plant, classed by taxon. Returns `None`
    /// when the plant has no complete position.
    pub fn from_plant(plant: &PlantLocation) -> Option<Self> {
        let geometry = plant.position()?;
        let record = &plant.record;
        let values = [&record.individual_id, &record.scientific_name, &record.taxon_id];
        let attributes = PLANT_ATTRIBUTES
            .iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Some(Self {
            class: Some(record.taxon_id.clone()),
            attributes,
            geometry,
        })
    }
}
