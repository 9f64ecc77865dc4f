//! ESRI shapefile output of located plants.

use std::collections::BTreeMap;
use std::path::Path;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point as ShpPoint, Reader, Shape, Writer};

use crate::error::{Result, StemMapError};
use crate::extent::GeoreferencedPlants;
use crate::geometry::Point;
use crate::gis::Feature;

/// dBase field names are limited to 10 characters, so the plant attributes
/// are abbreviated in the attribute table.
pub const PLANT_FIELDS: [(&str, &str); 3] = [
    ("individualID", "indvdlID"),
    ("scientificName", "scntfcN"),
    ("taxonID", "taxonID"),
];
const SHAPEFILE_PARTS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

pub const EASTING_FIELD: &str = "easting";
pub const NORTHING_FIELD: &str = "northing";

/// Record type for a point geometry and its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub geom: Point,
    pub attrs: BTreeMap<String, FieldValue>,
}

impl PointRecord {
    /// Attribute row for a plant feature.
    pub fn from_plant_feature(feature: &Feature<Point>) -> Self {
        let mut attrs = BTreeMap::new();
        for (long, short) in PLANT_FIELDS {
            let value = feature.attribute(long).map(|v| fit_character(short, v));
            attrs.insert(short.to_string(), FieldValue::Character(value));
        }
        attrs.insert(
            EASTING_FIELD.to_string(),
            FieldValue::Numeric(Some(feature.geometry.x)),
        );
        attrs.insert(
            NORTHING_FIELD.to_string(),
            FieldValue::Numeric(Some(feature.geometry.y)),
        );
        Self {
            geom: feature.geometry,
            attrs,
        }
    }
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name)
        .map_err(|_| StemMapError::Config(format!("invalid dBase field name `{name}`")))
}

/// Longest value a dBase character field can hold, in bytes.
pub const MAX_CHARACTER_LENGTH: usize = 254;

/// Cuts `value` to the dBase limit on a character boundary.
fn fit_character(field: &str, value: &str) -> String {
    if value.len() <= MAX_CHARACTER_LENGTH {
        return value.to_string();
    }
    let mut end = MAX_CHARACTER_LENGTH;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    log::warn!(
        "{} value of {} bytes cut to {}: {}",
        field,
        value.len(),
        end,
        value
    );
    value[..end].to_string()
}

/// Width of a character field: the longest value among the records.
fn character_width(records: &[PointRecord], field: &str) -> u8 {
    let width = records
        .iter()
        .filter_map(|rec| match rec.attrs.get(field) {
            Some(FieldValue::Character(Some(v))) => Some(v.len()),
            _ => None,
        })
        .max()
        .unwrap_or(1)
        .clamp(1, MAX_CHARACTER_LENGTH);
    width as u8
}

fn plant_table_builder(records: &[PointRecord]) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for (_, short) in PLANT_FIELDS {
        let width = character_width(records, short);
        builder = builder.add_character_field(field_name(short)?, width);
    }
    Ok(builder
        .add_numeric_field(field_name(EASTING_FIELD)?, 18, 5)
        .add_numeric_field(field_name(NORTHING_FIELD)?, 18, 5))
}

fn field_value_to_string(v: &FieldValue) -> String {
    match v {
        FieldValue::Character(Some(s)) => s.clone(),
        FieldValue::Numeric(Some(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Converts a shapefile point record back into a feature, restoring the
/// long attribute names.
pub fn point_record_to_feature(rec: PointRecord, class: Option<String>) -> Feature<Point> {
    let attributes = rec
        .attrs
        .iter()
        .map(|(k, v)| {
            let name = PLANT_FIELDS
                .iter()
                .find(|(_, short)| *short == k.as_str())
                .map(|(long, _)| long.to_string())
                .unwrap_or_else(|| k.clone());
            (name, field_value_to_string(v))
        })
        .collect();
    Feature {
        class,
        attributes,
        geometry: rec.geom,
    }
}

/// Writes the `.prj` sidecar next to a shapefile. Returns `false` when no
/// WKT is known for the reference system.
fn write_prj(path: &Path, plants: &GeoreferencedPlants) -> Result<bool> {
    match plants.crs.to_esri_wkt() {
        Some(wkt) => {
            crate::io::write_string(path.with_extension("prj"), &wkt)?;
            Ok(true)
        }
        None => {
            log::warn!(
                "no WKT known for {}, {} written without .prj",
                plants.crs,
                path.display()
            );
            Ok(false)
        }
    }
}

/// Removes a shapefile and its sidecars. Missing parts are ignored.
pub fn remove_shapefile(path: &Path) -> Result<()> {
    for ext in SHAPEFILE_PARTS {
        match std::fs::remove_file(path.with_extension(ext)) {
            Ok(()) => log::debug!("removed {}", path.with_extension(ext).display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Writes located plants as a point shapefile with the descriptive fields
/// and coordinates as attributes, plus a `.prj` sidecar for the CRS.
///
/// Files left by an earlier write to `path` are removed first, so an empty
/// set leaves no shapefile behind.
pub fn write_plant_points_shp(path: impl AsRef<Path>, plants: &GeoreferencedPlants) -> Result<()> {
    let path = path.as_ref();
    remove_shapefile(path)?;
    let records: Vec<PointRecord> = plants
        .features()
        .iter()
        .map(PointRecord::from_plant_feature)
        .collect();
    if records.is_empty() {
        log::warn!("no plants to write to {}", path.display());
        return Ok(());
    }
    let mut writer = Writer::from_path(path, plant_table_builder(&records)?)?;
    for rec in &records {
        let mut r = Record::default();
        for (k, v) in &rec.attrs {
            r.insert(k.clone(), v.clone());
        }
        let shp = ShpPoint {
            x: rec.geom.x,
            y: rec.geom.y,
        };
        writer.write_shape_and_record(&shp, &r)?;
    }
    drop(writer);
    write_prj(path, plants)?;
    log::info!("wrote {} point features to {}", records.len(), path.display());
    Ok(())
}

/// Reads Point records with attributes from a shapefile.
pub fn read_point_records_shp(path: impl AsRef<Path>) -> Result<Vec<PointRecord>> {
    let mut reader = Reader::from_path(path)?;
    let mut out = Vec::new();
    for res in reader.iter_shapes_and_records() {
        let (shape, record) = res?;
        let attrs: BTreeMap<_, _> = record.into_iter().collect();
        match shape {
            Shape::Point(p) => out.push(PointRecord {
                geom: Point::new(p.x, p.y),
                attrs,
            }),
            Shape::PointZ(p) => out.push(PointRecord {
                geom: Point::new(p.x, p.y),
                attrs,
            }),
            _ => {}
        }
    }
    Ok(out)
}
