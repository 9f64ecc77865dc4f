//! CSV tables: the survey input, the reference point lookup table and the
//! tabular plant-location output.

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};

use crate::error::{Result, StemMapError};
use crate::surveying::{
    PlantLocation, ReferencePointKey, ReferenceTable, ResolvedReference, SurveyRecord,
};

/// Columns every survey table must provide.
pub const SURVEY_COLUMNS: [&str; 8] = [
    "uid",
    "individualID",
    "scientificName",
    "taxonID",
    "namedLocation",
    "pointID",
    "stemDistance",
    "stemAzimuth",
];

/// Column order of the plant-location table.
pub const LOCATION_COLUMNS: [&str; 11] = [
    "uid",
    "individualID",
    "scientificName",
    "taxonID",
    "namedLocation",
    "pointID",
    "stemDistance",
    "stemAzimuth",
    "namedLocationPointID",
    "easting",
    "northing",
];

fn require_columns(headers: &StringRecord, columns: &[&str]) -> Result<()> {
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(missing(column));
        }
    }
    Ok(())
}

fn missing(column: &str) -> StemMapError {
    StemMapError::MissingColumn {
        column: column.to_string(),
    }
}

/// Where the reference key of a row comes from.
#[derive(Clone, Copy)]
enum KeyColumns {
    Composite(usize),
    Parts(usize, usize),
}

fn column_index(headers: &StringRecord, column: &str) -> Option<usize> {
    headers.iter().position(|h| h == column)
}

/// Reads survey records from any CSV source.
///
/// Rows may be ragged. Trailing measurement fields that are absent read as
/// `None`; a row lacking a descriptive field is skipped with a warning.
pub fn read_survey_table<R: io::Read>(source: R) -> Result<Vec<SurveyRecord>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    require_columns(&headers, &SURVEY_COLUMNS)?;
    let mut records: Vec<SurveyRecord> = Vec::new();
    let mut skipped = 0;
    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        if row.len() != headers.len() {
            log::warn!(
                "survey line {}: {} fields, header has {}",
                line,
                row.len(),
                headers.len()
            );
        }
        match row.deserialize::<SurveyRecord>(Some(&headers)) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("survey line {} skipped: {}", line, e);
                skipped += 1;
            }
        }
    }
    log::info!(
        "read {} survey records ({} unreadable rows skipped)",
        records.len(),
        skipped
    );
    Ok(records)
}

/// Reads survey records from a CSV file.
pub fn read_survey_csv(path: impl AsRef<Path>) -> Result<Vec<SurveyRecord>> {
    let file = std::fs::File::open(path)?;
    read_survey_table(file)
}

/// Reads reference point coordinates from any CSV source.
///
/// Keys come from a `namedLocationPointID` column, or are built from
/// `namedLocation` and `pointID`. Rows without finite `easting`/`northing`
/// are skipped, leaving the key unresolved. Short rows are tolerated.
pub fn read_reference_table<R: io::Read>(source: R) -> Result<ReferenceTable> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    require_columns(&headers, &["easting", "northing"])?;
    let key_columns = match column_index(&headers, "namedLocationPointID") {
        Some(i) => KeyColumns::Composite(i),
        None => match (
            column_index(&headers, "namedLocation"),
            column_index(&headers, "pointID"),
        ) {
            (Some(loc), Some(pt)) => KeyColumns::Parts(loc, pt),
            (None, _) => return Err(missing("namedLocationPointID")),
            (Some(_), None) => return Err(missing("pointID")),
        },
    };
    let easting_idx = column_index(&headers, "easting");
    let northing_idx = column_index(&headers, "northing");

    let mut table = ReferenceTable::new();
    for row in reader.records() {
        let row = row?;
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");
        let key = match key_columns {
            KeyColumns::Composite(i) => ReferencePointKey::from_composite(field(Some(i))),
            KeyColumns::Parts(loc, pt) => ReferencePointKey::new(field(Some(loc)), field(Some(pt))),
        };
        let coord = |idx| {
            field(idx)
                .parse::<f64>()
                .ok()
                .filter(|v: &f64| v.is_finite())
        };
        match (coord(easting_idx), coord(northing_idx)) {
            (Some(e), Some(n)) => {
                table.insert(key, ResolvedReference::new(e, n));
            }
            _ => log::warn!("reference {} has no usable coordinates", key),
        }
    }
    log::info!("read {} reference points", table.len());
    Ok(table)
}

/// Reads reference point coordinates from a CSV file.
pub fn read_reference_csv(path: impl AsRef<Path>) -> Result<ReferenceTable> {
    let file = std::fs::File::open(path)?;
    read_reference_table(file)
}

fn opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes located plants as CSV to any sink.
pub fn write_plant_table<W: io::Write>(sink: W, plants: &[PlantLocation]) -> Result<()> {
    let mut writer = Writer::from_writer(sink);
    writer.write_record(LOCATION_COLUMNS)?;
    for p in plants {
        let r = &p.record;
        let distance = opt(r.stem_distance);
        let azimuth = opt(r.stem_azimuth);
        let easting = opt(p.easting);
        let northing = opt(p.northing);
        writer.write_record([
            r.uid.as_str(),
            r.individual_id.as_str(),
            r.scientific_name.as_str(),
            r.taxon_id.as_str(),
            r.named_location.as_str(),
            r.point_id.as_str(),
            distance.as_str(),
            azimuth.as_str(),
            p.named_location_point_id.as_str(),
            easting.as_str(),
            northing.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes located plants to a CSV file.
pub fn write_plant_locations_csv(path: impl AsRef<Path>, plants: &[PlantLocation]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_plant_table(file, plants)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY: &str = "\
uid,individualID,scientificName,taxonID,namedLocation,pointID,stemDistance,stemAzimuth,plotID
u1,NEON.PLA.1,Pinus ponderosa,PIPO,SOAP_009.basePlot.vst,41,5.2,180,SOAP_009
u2,NEON.PLA.2,Pinus ponderosa,PIPO,SOAP_009.basePlot.vst,41,,270,SOAP_009
u3,NEON.PLA.3,Abies concolor,ABCO,SOAP_009.basePlot.vst,43,NA,12.5,SOAP_009
u4,NEON.PLA.4,Abies concolor,ABCO,SOAP_009.basePlot.vst,43, 3.0 ,abc,SOAP_009
";

    #[test]
    fn survey_missing_values_become_none() {
        let recs = read_survey_table(SURVEY.as_bytes()).unwrap();
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].stem_distance, Some(5.2));
        assert_eq!(recs[0].stem_azimuth, Some(180.0));
        assert_eq!(recs[1].stem_distance, None);
        assert_eq!(recs[2].stem_distance, None);
        assert_eq!(recs[3].stem_distance, Some(3.0));
        assert_eq!(recs[3].stem_azimuth, None);
        assert_eq!(recs[0].point_id, "41");
    }

    #[test]
    fn survey_missing_column_is_fatal() {
        let csv = "uid,individualID,scientificName,taxonID,namedLocation,pointID,stemDistance\n";
        match read_survey_table(csv.as_bytes()) {
            Err(StemMapError::MissingColumn { column }) => assert_eq!(column, "stemAzimuth"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ragged_survey_rows_do_not_abort() {
        let csv = "\
uid,individualID,scientificName,taxonID,namedLocation,pointID,stemDistance,stemAzimuth
u1,NEON.PLA.1,Pinus ponderosa,PIPO,SOAP_009.basePlot.vst,41,5.2,180
u2,NEON.PLA.2,Pinus ponderosa,PIPO,SOAP_009.basePlot.vst,41,7.5
u3,NEON.PLA.3
u4,NEON.PLA.4,Abies concolor,ABCO,SOAP_009.basePlot.vst,43,2,90
";
        let recs = read_survey_table(csv.as_bytes()).unwrap();
        let uids: Vec<&str> = recs.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, ["u1", "u2", "u4"]);
        assert_eq!(recs[1].stem_distance, Some(7.5));
        assert_eq!(recs[1].stem_azimuth, None);
        assert!(!recs[1].has_measurement());
        assert_eq!(recs[2].stem_azimuth, Some(90.0));
    }

    #[test]
    fn short_reference_rows_are_unresolved() {
        let csv = "namedLocationPointID,easting,northing\nA.1,10,20\nB.2,30\nC.3,1,2\n";
        let table = read_reference_table(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get(&ReferencePointKey::from_composite("B.2")).is_none());
        assert!(table.get(&ReferencePointKey::from_composite("C.3")).is_some());
    }

    #[test]
    fn reference_table_composite_and_parts() {
        let composite = "namedLocationPointID,easting,northing\nA.1,10.5,20.5\nB.2,NA,3\n";
        let table = read_reference_table(composite.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&ReferencePointKey::from_composite("A.1")),
            Some(ResolvedReference::new(10.5, 20.5))
        );

        let parts = "namedLocation,pointID,easting,northing\nSOAP_009.basePlot.vst,41,1,2\n";
        let table = read_reference_table(parts.as_bytes()).unwrap();
        assert!(table
            .get(&ReferencePointKey::from_composite("SOAP_009.basePlot.vst.41"))
            .is_some());
    }

    #[test]
    fn reference_table_needs_key_columns() {
        let csv = "easting,northing\n1,2\n";
        assert!(matches!(
            read_reference_table(csv.as_bytes()),
            Err(StemMapError::MissingColumn { .. })
        ));
    }

    #[test]
    fn plant_table_layout() {
        let recs = read_survey_table(SURVEY.as_bytes()).unwrap();
        let located = PlantLocation::locate(recs[0].clone(), Some(ResolvedReference::new(100.0, 200.0)));
        let mut buf = Vec::new();
        write_plant_table(&mut buf, &[located]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), LOCATION_COLUMNS.join(","));
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[8], "SOAP_009.basePlot.vst.41");
        let northing: f64 = row[10].parse().unwrap();
        assert!((northing - 194.8).abs() < 1e-6);
    }
}
