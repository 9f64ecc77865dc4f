//! Stem measurements and the located plants derived from them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::cogo::project_offset;
use super::reference::{ReferencePointKey, ResolvedReference};
use crate::geometry::Point;

/// One stem measurement from the woody vegetation survey.
///
/// Missing or unparseable distances and azimuths are read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    pub uid: String,
    #[serde(rename = "individualID")]
    pub individual_id: String,
    pub scientific_name: String,
    #[serde(rename = "taxonID")]
    pub taxon_id: String,
    pub named_location: String,
    #[serde(rename = "pointID")]
    pub point_id: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub stem_distance: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub stem_azimuth: Option<f64>,
}

impl SurveyRecord {
    /// Key of the reference point this stem was measured from.
    pub fn reference_key(&self) -> ReferencePointKey {
        ReferencePointKey::new(&self.named_location, &self.point_id)
    }

    /// Distance and azimuth, if both are present and finite.
    pub fn measurement(&self) -> Option<(f64, f64)> {
        let d = self.stem_distance.filter(|v| v.is_finite())?;
        let a = self.stem_azimuth.filter(|v| v.is_finite())?;
        Some((d, a))
    }

    pub fn has_measurement(&self) -> bool {
        self.measurement().is_some()
    }
}

/// Records kept by a filter together with the counts before and after.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<T> {
    pub kept: Vec<T>,
    pub before: usize,
    pub after: usize,
}

impl<T> FilterOutcome<T> {
    pub fn dropped(&self) -> usize {
        self.before - self.after
    }
}

/// Keeps the records carrying both a stem distance and a stem azimuth.
pub fn filter_measured(records: Vec<SurveyRecord>) -> FilterOutcome<SurveyRecord> {
    let before = records.len();
    let kept: Vec<SurveyRecord> = records
        .into_iter()
        .filter(|r| {
            let keep = r.has_measurement();
            if !keep {
                log::debug!("{}: no usable distance/azimuth", r.uid);
            }
            keep
        })
        .collect();
    let after = kept.len();
    log::info!(
        "{} of {} stem records have distance and azimuth ({} dropped)",
        after,
        before,
        before - after
    );
    FilterOutcome {
        kept,
        before,
        after,
    }
}

/// Number of distinct trees (`uid` values) among the records.
pub fn distinct_trees<'a, I>(records: I) -> usize
where
    I: IntoIterator<Item = &'a SurveyRecord>,
{
    records
        .into_iter()
        .map(|r| r.uid.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// A survey record with its computed absolute position.
///
/// `easting` and `northing` are both present exactly when the reference was
/// resolved and the record had a usable distance and azimuth.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantLocation {
    pub record: SurveyRecord,
    pub named_location_point_id: ReferencePointKey,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
}

impl PlantLocation {
    /// Projects the record from its reference point.
    pub fn locate(record: SurveyRecord, reference: Option<ResolvedReference>) -> Self {
        let key = record.reference_key();
        let position = project_offset(
            reference.map(|r| r.point()),
            record.stem_distance,
            record.stem_azimuth,
        );
        Self {
            record,
            named_location_point_id: key,
            easting: position.map(|p| p.x),
            northing: position.map(|p| p.y),
        }
    }

    pub fn position(&self) -> Option<Point> {
        match (self.easting, self.northing) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.position().is_some()
    }
}

/// Keeps only locations with both an easting and a northing.
pub fn drop_incomplete(locations: Vec<PlantLocation>) -> FilterOutcome<PlantLocation> {
    let before = locations.len();
    let kept: Vec<PlantLocation> = locations
        .into_iter()
        .filter(|l| {
            let keep = l.is_complete();
            if !keep {
                log::debug!(
                    "{}: no coordinates, reference {} unresolved",
                    l.record.uid,
                    l.named_location_point_id
                );
            }
            keep
        })
        .collect();
    let after = kept.len();
    log::info!("{} of {} located stems have complete coordinates", after, before);
    FilterOutcome {
        kept,
        before,
        after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str, distance: Option<f64>, azimuth: Option<f64>) -> SurveyRecord {
        SurveyRecord {
            uid: uid.to_string(),
            individual_id: format!("NEON.PLA.{uid}"),
            scientific_name: "Quercus douglasii".to_string(),
            taxon_id: "QUDO".to_string(),
            named_location: "SJER_052.basePlot.vst".to_string(),
            point_id: "41".to_string(),
            stem_distance: distance,
            stem_azimuth: azimuth,
        }
    }

    #[test]
    fn filter_requires_both_measurements() {
        let records = vec![
            record("a", Some(1.0), Some(10.0)),
            record("b", None, Some(10.0)),
            record("c", Some(1.0), None),
            record("d", Some(f64::NAN), Some(10.0)),
            record("e", Some(2.0), Some(f64::INFINITY)),
        ];
        let out = filter_measured(records);
        assert_eq!(out.before, 5);
        assert_eq!(out.after, 1);
        assert_eq!(out.dropped(), 4);
        assert_eq!(out.kept[0].uid, "a");
    }

    #[test]
    fn reference_key_from_record() {
        let r = record("a", None, None);
        assert_eq!(r.reference_key().as_str(), "SJER_052.basePlot.vst.41");
    }

    #[test]
    fn locate_with_and_without_reference() {
        let r = record("a", Some(10.0), Some(90.0));
        let located = PlantLocation::locate(r.clone(), Some(ResolvedReference::new(100.0, 200.0)));
        let p = located.position().unwrap();
        assert!((p.x - 110.0).abs() < 1e-6);
        assert!((p.y - 200.0).abs() < 1e-6);
        assert_eq!(located.named_location_point_id, r.reference_key());

        let unresolved = PlantLocation::locate(r, None);
        assert!(unresolved.easting.is_none() && unresolved.northing.is_none());
        assert!(!unresolved.is_complete());
    }

    #[test]
    fn drop_incomplete_checks_both_axes() {
        let mut half = PlantLocation::locate(record("a", Some(1.0), Some(0.0)), Some(ResolvedReference::new(0.0, 0.0)));
        half.northing = None;
        let full = PlantLocation::locate(record("b", Some(1.0), Some(0.0)), Some(ResolvedReference::new(0.0, 0.0)));
        let out = drop_incomplete(vec![half, full]);
        assert_eq!(out.after, 1);
        assert_eq!(out.kept[0].record.uid, "b");
    }

    #[test]
    fn distinct_tree_count() {
        let records = vec![
            record("a", None, None),
            record("a", None, None),
            record("b", None, None),
        ];
        assert_eq!(distinct_trees(&records), 2);
    }
}
