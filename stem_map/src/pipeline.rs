//! Composition of the stem mapping steps.
//!
//! survey records -> measured filter -> reference lookup -> polar projection
//! -> complete-coordinate filter -> CRS attachment -> extent filter and crop.

use std::collections::BTreeSet;
use std::fmt;

use crate::config::{PipelineConfig, DEFAULT_CROP_BUFFER};
use crate::crs::Crs;
use crate::error::{Result, StemMapError};
use crate::extent::{crop_to_extent, within_extent, GeoreferencedPlants, SpatialExtent};
use crate::io::{raster, table};
use crate::surveying::{
    distinct_trees, drop_incomplete, filter_measured, PlantLocation, ReferencePointKey,
    ReferenceResolver, Resolution, SurveyRecord,
};

/// Parameters of [`run`] that do not come from the inputs themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Widening applied on each side of the extent for the cropped set.
    pub crop_buffer: f64,
    /// Reference system of the resolved coordinates. Defaults to the
    /// extent's own CRS.
    pub reference_crs: Option<Crs>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            crop_buffer: DEFAULT_CROP_BUFFER,
            reference_crs: None,
        }
    }
}

/// Diagnostic counts collected along the pipeline. "Trees" are distinct
/// `uid` values, "records" are rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub records_read: usize,
    pub trees_read: usize,
    pub records_measured: usize,
    pub trees_measured: usize,
    pub keys_requested: usize,
    pub keys_resolved: usize,
    pub records_located: usize,
    pub trees_located: usize,
    pub records_within_extent: usize,
    pub trees_within_extent: usize,
    pub records_cropped: usize,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records read: {} ({} trees)", self.records_read, self.trees_read)?;
        writeln!(
            f,
            "With distance and azimuth: {} ({} trees)",
            self.records_measured, self.trees_measured
        )?;
        writeln!(
            f,
            "Reference points resolved: {} of {}",
            self.keys_resolved, self.keys_requested
        )?;
        writeln!(
            f,
            "Located: {} ({} trees)",
            self.records_located, self.trees_located
        )?;
        writeln!(
            f,
            "Within extent: {} ({} trees)",
            self.records_within_extent, self.trees_within_extent
        )?;
        write!(f, "Within crop buffer: {}", self.records_cropped)
    }
}

/// Everything [`run`] produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Located plants with complete coordinates, for the tabular output.
    pub locations: Vec<PlantLocation>,
    /// Plants inside the exact extent, for the point-feature output.
    pub in_extent: GeoreferencedPlants,
    /// Plants inside the buffered extent.
    pub cropped: GeoreferencedPlants,
    pub report: PipelineReport,
}

/// Looks up every key once. The answer has an entry for each key; keys the
/// resolver skipped or answered with non-finite coordinates map to `None`.
pub fn resolve_references<R>(resolver: &R, keys: &BTreeSet<ReferencePointKey>) -> Resolution
where
    R: ReferenceResolver + ?Sized,
{
    let mut answer = resolver.resolve(keys);
    keys.iter()
        .map(|key| {
            let reference = answer
                .remove(key)
                .flatten()
                .filter(|r| r.point().is_finite());
            if reference.is_none() {
                log::warn!("reference point {} could not be resolved", key);
            }
            (key.clone(), reference)
        })
        .collect()
}

/// Computes absolute positions for the measured records.
///
/// Records whose reference is unresolved come back without coordinates.
pub fn locate_plants(records: Vec<SurveyRecord>, resolution: &Resolution) -> Vec<PlantLocation> {
    records
        .into_iter()
        .map(|record| {
            let reference = resolution.get(&record.reference_key()).copied().flatten();
            PlantLocation::locate(record, reference)
        })
        .collect()
}

/// Runs the whole pipeline on already parsed inputs.
///
/// Per-record gaps never fail the run; a CRS mismatch between the
/// reference coordinates and the extent does.
pub fn run<R>(
    records: Vec<SurveyRecord>,
    resolver: &R,
    extent: &SpatialExtent,
    options: &RunOptions,
) -> Result<PipelineOutput>
where
    R: ReferenceResolver + ?Sized,
{
    let mut report = PipelineReport {
        records_read: records.len(),
        trees_read: distinct_trees(&records),
        ..Default::default()
    };

    let measured = filter_measured(records);
    report.records_measured = measured.after;
    report.trees_measured = distinct_trees(&measured.kept);

    let keys: BTreeSet<ReferencePointKey> =
        measured.kept.iter().map(SurveyRecord::reference_key).collect();
    let resolution = resolve_references(resolver, &keys);
    report.keys_requested = keys.len();
    report.keys_resolved = resolution.values().filter(|r| r.is_some()).count();
    log::info!(
        "resolved {} of {} reference points",
        report.keys_resolved,
        report.keys_requested
    );

    let located = locate_plants(measured.kept, &resolution);
    let complete = drop_incomplete(located);
    report.records_located = complete.after;
    report.trees_located = distinct_trees(complete.kept.iter().map(|p| &p.record));

    let crs = options
        .reference_crs
        .clone()
        .unwrap_or_else(|| extent.crs.clone());
    let plants = GeoreferencedPlants::new(crs, complete.kept);
    if let Some(b) = plants.bounds() {
        log::debug!(
            "located stems span x=[{:.2}, {:.2}] y=[{:.2}, {:.2}] ({:.1} x {:.1} m)",
            b.xmin,
            b.xmax,
            b.ymin,
            b.ymax,
            b.width(),
            b.height()
        );
    }

    let in_extent = within_extent(&plants, extent)?;
    report.records_within_extent = in_extent.len();
    report.trees_within_extent = distinct_trees(in_extent.plants.iter().map(|p| &p.record));

    let cropped = crop_to_extent(&plants, extent, options.crop_buffer)?;
    report.records_cropped = cropped.len();

    Ok(PipelineOutput {
        locations: plants.plants,
        in_extent,
        cropped,
        report,
    })
}

fn write_features(config: &PipelineConfig, plants: &GeoreferencedPlants) -> Result<()> {
    if config.write_shapefile {
        #[cfg(feature = "shapefile")]
        {
            crate::io::shp::write_plant_points_shp(config.shapefile_path(), plants)?;
        }
        #[cfg(not(feature = "shapefile"))]
        {
            log::warn!("built without shapefile support, skipping shapefile output");
        }
    }
    if config.write_geojson {
        crate::io::geojson::write_plant_points_geojson(config.geojson_path(), plants)?;
    }
    Ok(())
}

/// Reads the configured inputs, runs the pipeline and writes the outputs.
pub fn execute(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;
    let records = table::read_survey_csv(&config.survey)?;
    let references = table::read_reference_csv(&config.references)?;
    let extent = match &config.raster {
        Some(path) => raster::read_geotiff_extent(path, config.crs_override().as_ref())?,
        None => config
            .explicit_extent()?
            .ok_or_else(|| StemMapError::Config("no extent source".into()))?,
    };
    let options = RunOptions {
        crop_buffer: config.crop_buffer,
        reference_crs: config.references_crs.as_deref().map(Crs::parse),
    };
    let output = run(records, &references, &extent, &options)?;

    std::fs::create_dir_all(&config.output_dir)?;
    table::write_plant_locations_csv(config.table_path(), &output.locations)?;
    log::info!(
        "wrote {} located stems to {}",
        output.locations.len(),
        config.table_path().display()
    );
    write_features(config, &output.in_extent)?;
    Ok(output.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveying::ResolvedReference;

    fn keys(names: &[&str]) -> BTreeSet<ReferencePointKey> {
        names.iter().map(|n| ReferencePointKey::from_composite(*n)).collect()
    }

    #[test]
    fn resolution_covers_every_key() {
        // answers only one key, with a NaN for another
        let resolver = |k: &ReferencePointKey| match k.as_str() {
            "A.1" => Some(ResolvedReference::new(1.0, 2.0)),
            "B.1" => Some(ResolvedReference::new(f64::NAN, 2.0)),
            _ => None,
        };
        let res = resolve_references(&resolver, &keys(&["A.1", "B.1", "C.1"]));
        assert_eq!(res.len(), 3);
        assert!(res[&ReferencePointKey::from_composite("A.1")].is_some());
        assert!(res[&ReferencePointKey::from_composite("B.1")].is_none());
        assert!(res[&ReferencePointKey::from_composite("C.1")].is_none());
    }

    #[test]
    fn report_display_lists_counts() {
        let report = PipelineReport {
            records_within_extent: 7,
            trees_within_extent: 6,
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("Within extent: 7 (6 trees)"));
    }
}
