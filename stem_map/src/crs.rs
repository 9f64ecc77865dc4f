//! Coordinate reference system identifiers.
//!
//! No reprojection happens anywhere in this crate. A [`Crs`] is carried along
//! with point sets and extents so that mismatches can be detected, and so that
//! point-feature writers can tag their output.

use std::fmt;

/// How the definition string of a [`Crs`] should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrsKind {
    Epsg,
    Proj4,
    Wkt,
}

/// Representation of a coordinate reference system.
///
/// A CRS is stored internally as a definition string which can be an EPSG
/// identifier (`"EPSG:32611"`), a Proj4 definition or a WKT definition.  When
/// created from an EPSG code the numeric value is retained so that callers can
/// inspect it if necessary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    definition: String,
    epsg: Option<u32>,
    kind: CrsKind,
}

impl Crs {
    /// Creates a new CRS from the given EPSG code.
    pub fn from_epsg(code: u32) -> Self {
        Self {
            definition: format!("EPSG:{}", code),
            epsg: Some(code),
            kind: CrsKind::Epsg,
        }
    }

    /// Creates a CRS from a Proj4 definition string.
    pub fn from_proj4(definition: &str) -> Self {
        Self {
            definition: definition.trim().to_string(),
            epsg: None,
            kind: CrsKind::Proj4,
        }
    }

    /// Creates a CRS from a WKT definition string.
    pub fn from_wkt(definition: &str) -> Self {
        Self {
            definition: definition.trim().to_string(),
            epsg: None,
            kind: CrsKind::Wkt,
        }
    }

    /// Parses a user supplied definition. `EPSG:<code>` (any case) and bare
    /// numeric codes become EPSG definitions, strings starting with `+proj`
    /// are Proj4 and anything else is kept as WKT.
    pub fn parse(definition: &str) -> Self {
        let trimmed = definition.trim();
        let code = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("epsg:"))
            .map(|_| &trimmed[5..])
            .unwrap_or(trimmed);
        if let Ok(code) = code.parse::<u32>() {
            return Self::from_epsg(code);
        }
        if trimmed.starts_with("+proj") {
            Self::from_proj4(trimmed)
        } else {
            Self::from_wkt(trimmed)
        }
    }

    /// Returns the EPSG code for this CRS, if available.
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Returns the underlying definition string.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// WGS 84 / UTM for the given zone and hemisphere.
    pub fn wgs84_utm(zone: u8, south: bool) -> Self {
        let base = if south { 32700 } else { 32600 };
        Self::from_epsg(base + zone as u32)
    }

    /// Returns `true` when both values name the same reference system.
    ///
    /// EPSG codes are compared numerically. Other definitions are compared
    /// with whitespace removed.
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            (None, None) => squash(&self.definition) == squash(&other.definition),
            _ => false,
        }
    }

    /// ESRI flavoured WKT suitable for a shapefile `.prj` sidecar.
    ///
    /// Available for WKT definitions, WGS 84 geographic coordinates and the
    /// WGS 84 / NAD83 UTM zones.
    pub fn to_esri_wkt(&self) -> Option<String> {
        match self.kind {
            CrsKind::Wkt => Some(self.definition.clone()),
            CrsKind::Proj4 => None,
            CrsKind::Epsg => self.epsg.and_then(esri_wkt_for_epsg),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition)
    }
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

const GCS_WGS84: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",\
SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

const GCS_NAD83: &str = "GEOGCS[\"GCS_North_American_1983\",DATUM[\"D_North_American_1983\",\
SPHEROID[\"GRS_1980\",6378137.0,298.257222101]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

fn esri_wkt_for_epsg(code: u32) -> Option<String> {
    match code {
        4326 => Some(GCS_WGS84.to_string()),
        32601..=32660 => Some(utm_wkt("WGS_1984", GCS_WGS84, code - 32600, false)),
        32701..=32760 => Some(utm_wkt("WGS_1984", GCS_WGS84, code - 32700, true)),
        26901..=26923 => Some(utm_wkt("NAD_1983", GCS_NAD83, code - 26900, false)),
        _ => None,
    }
}

fn utm_wkt(datum: &str, geogcs: &str, zone: u32, south: bool) -> String {
    let central_meridian = -183.0 + 6.0 * zone as f64;
    let false_northing = if south { 10_000_000.0 } else { 0.0 };
    format!(
        "PROJCS[\"{datum}_UTM_Zone_{zone}{hemi}\",{geogcs},\
PROJECTION[\"Transverse_Mercator\"],PARAMETER[\"False_Easting\",500000.0],\
PARAMETER[\"False_Northing\",{false_northing:.1}],PARAMETER[\"Central_Meridian\",{central_meridian:.1}],\
PARAMETER[\"Scale_Factor\",0.9996],PARAMETER[\"Latitude_Of_Origin\",0.0],UNIT[\"Meter\",1.0]]",
        hemi = if south { "S" } else { "N" },
    )
}
