//! Reference monuments and the lookup service that positions them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::geometry::Point;

/// Separator between the named location and the point ID in a composite key.
pub const KEY_SEPARATOR: char = '.';

/// Composite identifier of a physical reference point:
/// `namedLocation` + `.` + `pointID`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferencePointKey(String);

impl ReferencePointKey {
    pub fn new(named_location: &str, point_id: &str) -> Self {
        Self(format!("{named_location}{KEY_SEPARATOR}{point_id}"))
    }

    /// Wraps an already concatenated key.
    pub fn from_composite(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferencePointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute planar coordinates of a reference point, in the raster's CRS.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedReference {
    pub easting: f64,
    pub northing: f64,
}

impl ResolvedReference {
    pub fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    pub fn point(&self) -> Point {
        Point::new(self.easting, self.northing)
    }
}

/// Result of a batched lookup. Every requested key has an entry; `None`
/// marks a key the resolver could not position.
pub type Resolution = BTreeMap<ReferencePointKey, Option<ResolvedReference>>;

/// Service mapping reference point keys to absolute coordinates.
///
/// Batching, caching, retries and deadlines belong to implementors. A
/// failure for one key must surface as `None` for that key only.
pub trait ReferenceResolver {
    fn resolve(&self, keys: &BTreeSet<ReferencePointKey>) -> Resolution;
}

impl<F> ReferenceResolver for F
where
    F: Fn(&ReferencePointKey) -> Option<ResolvedReference>,
{
    fn resolve(&self, keys: &BTreeSet<ReferencePointKey>) -> Resolution {
        keys.iter().map(|k| (k.clone(), self(k))).collect()
    }
}

/// In-memory resolver backed by a table of surveyed monuments.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<ReferencePointKey, ResolvedReference>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the coordinates of a reference point. Returns the
    /// previous value if the key was already present.
    pub fn insert(
        &mut self,
        key: ReferencePointKey,
        reference: ResolvedReference,
    ) -> Option<ResolvedReference> {
        self.entries.insert(key, reference)
    }

    pub fn get(&self, key: &ReferencePointKey) -> Option<ResolvedReference> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ReferencePointKey, ResolvedReference)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (ReferencePointKey, ResolvedReference)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl ReferenceResolver for ReferenceTable {
    fn resolve(&self, keys: &BTreeSet<ReferencePointKey>) -> Resolution {
        keys.iter().map(|k| (k.clone(), self.get(k))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_with_dot() {
        let key = ReferencePointKey::new("SJER_010.basePlot.vst", "41");
        assert_eq!(key.as_str(), "SJER_010.basePlot.vst.41");
        assert_eq!(key, ReferencePointKey::from_composite("SJER_010.basePlot.vst.41"));
    }

    #[test]
    fn table_answers_every_key() {
        let table: ReferenceTable = [(
            ReferencePointKey::from_composite("A.1"),
            ResolvedReference::new(1.0, 2.0),
        )]
        .into_iter()
        .collect();
        let keys: BTreeSet<_> = ["A.1", "B.2"]
            .into_iter()
            .map(ReferencePointKey::from_composite)
            .collect();
        let res = table.resolve(&keys);
        assert_eq!(res.len(), 2);
        assert_eq!(
            res[&ReferencePointKey::from_composite("A.1")],
            Some(ResolvedReference::new(1.0, 2.0))
        );
        assert_eq!(res[&ReferencePointKey::from_composite("B.2")], None);
    }

    #[test]
    fn closures_resolve() {
        let resolver = |k: &ReferencePointKey| {
            (k.as_str() == "X.1").then(|| ResolvedReference::new(5.0, 6.0))
        };
        let keys: BTreeSet<_> = [ReferencePointKey::from_composite("X.1")].into_iter().collect();
        let res = resolver.resolve(&keys);
        assert_eq!(res.values().flatten().count(), 1);
    }
}
