//! GeoJSON output of located plants.

use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::error::Result;
use crate::extent::GeoreferencedPlants;

fn crs_member(plants: &GeoreferencedPlants) -> Option<JsonObject> {
    let code = plants.crs.epsg()?;
    let name = serde_json::json!({
        "type": "name",
        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{code}") }
    });
    let mut members = JsonObject::new();
    members.insert("crs".to_string(), name);
    Some(members)
}

/// Builds a point FeatureCollection with the descriptive plant fields and
/// the coordinates as properties. A named `crs` member is added when the
/// reference system has an EPSG code.
pub fn plants_to_feature_collection(plants: &GeoreferencedPlants) -> FeatureCollection {
    let features = plants
        .features()
        .into_iter()
        .map(|f| {
            let mut properties: JsonObject = f
                .attributes
                .into_iter()
                .map(|(k, v)| (k, JsonValue::String(v)))
                .collect();
            properties.insert("easting".to_string(), f.geometry.x.into());
            properties.insert("northing".to_string(), f.geometry.y.into());
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    f.geometry.x,
                    f.geometry.y,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: crs_member(plants),
    }
}

/// Writes located plants to a GeoJSON file.
pub fn write_plant_points_geojson(
    path: impl AsRef<Path>,
    plants: &GeoreferencedPlants,
) -> Result<()> {
    let path = path.as_ref();
    let collection = plants_to_feature_collection(plants);
    let json = serde_json::to_string_pretty(&collection)?;
    crate::io::write_string(path, &json)?;
    log::info!(
        "wrote {} point features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}
