use stem_map::crs::Crs;
use stem_map::extent::SpatialExtent;
use stem_map::pipeline::{run, RunOptions};
use stem_map::surveying::{
    ReferencePointKey, ReferenceTable, ResolvedReference, SurveyRecord,
};
use stem_map::StemMapError;

fn record(uid: &str, point_id: &str, distance: Option<f64>, azimuth: Option<f64>) -> SurveyRecord {
    SurveyRecord {
        uid: uid.to_string(),
        individual_id: format!("NEON.PLA.D17.SOAP.{uid}"),
        scientific_name: "Pinus ponderosa Lawson & C. Lawson".to_string(),
        taxon_id: "PIPO".to_string(),
        named_location: "SOAP_009.basePlot.vst".to_string(),
        point_id: point_id.to_string(),
        stem_distance: distance,
        stem_azimuth: azimuth,
    }
}

fn references() -> ReferenceTable {
    [(
        ReferencePointKey::new("SOAP_009.basePlot.vst", "41"),
        ResolvedReference::new(500000.0, 4700000.0),
    )]
    .into_iter()
    .collect()
}

fn extent() -> SpatialExtent {
    SpatialExtent::new(499000.0, 501000.0, 4699000.0, 4701000.0, Crs::from_epsg(32611)).unwrap()
}

#[test]
fn only_resolvable_complete_record_survives() {
    let records = vec![
        record("a", "41", Some(12.5), Some(30.0)),
        record("b", "43", Some(4.0), Some(200.0)),
        record("c", "41", Some(3.0), None),
    ];
    let out = run(records, &references(), &extent(), &RunOptions::default()).unwrap();

    assert_eq!(out.locations.len(), 1);
    let p = &out.locations[0];
    assert_eq!(p.record.uid, "a");
    let theta = 30.0f64.to_radians();
    assert!((p.easting.unwrap() - (500000.0 + 12.5 * theta.sin())).abs() < 1e-6);
    assert!((p.northing.unwrap() - (4700000.0 + 12.5 * theta.cos())).abs() < 1e-6);

    let r = out.report;
    assert_eq!(r.records_read, 3);
    assert_eq!(r.records_measured, 2);
    assert_eq!(r.keys_requested, 2);
    assert_eq!(r.keys_resolved, 1);
    assert_eq!(r.records_located, 1);
    assert_eq!(r.records_within_extent, 1);
    assert_eq!(out.in_extent.len(), 1);
    assert_eq!(out.in_extent.crs, Crs::from_epsg(32611));
}

#[test]
fn rerun_is_identical() {
    let records = vec![
        record("a", "41", Some(12.5), Some(30.0)),
        record("a", "41", Some(12.5), Some(30.0)),
        record("d", "41", Some(7.0), Some(300.0)),
        record("b", "43", Some(4.0), Some(200.0)),
    ];
    let first = run(records.clone(), &references(), &extent(), &RunOptions::default()).unwrap();
    let second = run(records, &references(), &extent(), &RunOptions::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.report.trees_located, 2);
    assert_eq!(first.report.records_located, 3);
}

#[test]
fn extent_count_and_crop_are_separate() {
    let edge = SpatialExtent::new(499990.0, 500010.0, 4699990.0, 4700008.0, Crs::from_epsg(32611))
        .unwrap();
    let records = vec![
        record("in", "41", Some(5.0), Some(90.0)),
        // 2 m north of the top edge
        record("near", "41", Some(10.0), Some(0.0)),
        record("far", "41", Some(40.0), Some(0.0)),
    ];
    let out = run(records, &references(), &edge, &RunOptions::default()).unwrap();
    let uids = |set: &stem_map::GeoreferencedPlants| -> Vec<String> {
        set.plants.iter().map(|p| p.record.uid.clone()).collect()
    };
    assert_eq!(uids(&out.in_extent), vec!["in"]);
    assert_eq!(uids(&out.cropped), vec!["in", "near"]);
    assert_eq!(out.report.records_within_extent, 1);
    assert_eq!(out.report.records_cropped, 2);
    assert_eq!(out.locations.len(), 3);
}

#[test]
fn mismatched_reference_crs_aborts() {
    let options = RunOptions {
        reference_crs: Some(Crs::from_epsg(32612)),
        ..RunOptions::default()
    };
    let records = vec![record("a", "41", Some(1.0), Some(0.0))];
    let err = run(records, &references(), &extent(), &options).unwrap_err();
    assert!(matches!(err, StemMapError::CrsMismatch { .. }));
}

#[test]
fn closure_resolver_is_accepted() {
    let resolver = |k: &ReferencePointKey| {
        k.as_str()
            .ends_with(".43")
            .then(|| ResolvedReference::new(500100.0, 4700100.0))
    };
    let records = vec![
        record("a", "41", Some(1.0), Some(0.0)),
        record("b", "43", Some(2.0), Some(180.0)),
    ];
    let out = run(records, &resolver, &extent(), &RunOptions::default()).unwrap();
    assert_eq!(out.locations.len(), 1);
    assert!((out.locations[0].northing.unwrap() - 4700098.0).abs() < 1e-6);
}
