// ── Core source types ──
//
// SourceId, SourceKind and SourceParameters form the foundation of every
// scene entity. Identity is the id, never the position -- row indices in
// the presentation layer are positional and unstable across mutation.

use std::fmt;
use std::sync::RwLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── SourceId ────────────────────────────────────────────────────────

/// Canonical identifier for a scene source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Uuid);

impl SourceId {
    /// Mint a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SourceId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── SourceKind ──────────────────────────────────────────────────────

/// Tag enumerating the known source kinds.
///
/// Carried by every [`Source`] and used by the sandbox layer to resolve a
/// presentation delegate from its registry. Dispatch is by this explicit
/// tag, never by runtime type inspection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Rectangular dislocation (Okada) fault plane.
    Okada,
    /// Point pressure (Mogi) source.
    Mogi,
    /// Closed ring fault.
    Ringfault,
}

// ── SourceParameters ────────────────────────────────────────────────

/// The editable parameter set of one source.
///
/// Insertion-ordered name → value map so the presentation layer renders
/// fields in a stable, kind-defined order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceParameters(IndexMap<String, f64>);

impl SourceParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Set a parameter, appending it to the order if new.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for SourceParameters {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ── Source ──────────────────────────────────────────────────────────

/// One modelled deformation source.
///
/// Shared as `Arc<Source>` between the scene (the owner of order and
/// membership) and the presentation delegates. Parameter writes go through
/// the lock; all mutation runs on the sandbox worker, the lock only guards
/// reads from other threads.
#[derive(Debug)]
pub struct Source {
    id: SourceId,
    kind: SourceKind,
    name: String,
    parameters: RwLock<SourceParameters>,
}

impl Source {
    pub fn new(kind: SourceKind, name: impl Into<String>, parameters: SourceParameters) -> Self {
        Self::with_id(SourceId::new(), kind, name, parameters)
    }

    /// Construct with an explicit identity, e.g. when restoring a scene.
    pub fn with_id(
        id: SourceId,
        kind: SourceKind,
        name: impl Into<String>,
        parameters: SourceParameters,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            parameters: RwLock::new(parameters),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current parameter set.
    pub fn parameters(&self) -> SourceParameters {
        self.parameters.read().expect("parameter lock poisoned").clone()
    }

    /// Replace the parameter set wholesale.
    pub fn set_parameters(&self, parameters: SourceParameters) {
        *self.parameters.write().expect("parameter lock poisoned") = parameters;
    }

    /// Read a single parameter.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.read().expect("parameter lock poisoned").get(name)
    }
}

// ── Geometry projections ────────────────────────────────────────────

/// A point in local scene coordinates (metres east / north of the frame
/// origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub easting: f64,
    pub northing: f64,
}

/// Axis-aligned region-of-interest handle for outlining a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    /// Centre of the region, scene coordinates.
    pub center: GeoPoint,
    /// Half extent along easting, metres.
    pub half_width: f64,
    /// Half extent along northing, metres.
    pub half_length: f64,
}

impl RegionOfInterest {
    pub fn contains(&self, point: GeoPoint) -> bool {
        (point.easting - self.center.easting).abs() <= self.half_width
            && (point.northing - self.center.northing).abs() <= self.half_length
    }
}

// ── Editor descriptors ──────────────────────────────────────────────

/// Declarative description of the edit UI for one source kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorDescriptor {
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

/// One editable field in an [`EditorDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Parameter name as it appears in [`SourceParameters`].
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Display unit, e.g. `"m"` or `"deg"`.
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        unit: impl Into<String>,
        min: f64,
        max: f64,
        step: f64,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            unit: unit.into(),
            min,
            max,
            step,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parameters_preserve_insertion_order() {
        let params: SourceParameters =
            [("depth", 2_000.0), ("strike", 45.0), ("dip", 30.0)].into_iter().collect();
        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["depth", "strike", "dip"]);
    }

    #[test]
    fn parameters_set_overwrites_in_place() {
        let mut params: SourceParameters = [("depth", 2_000.0)].into_iter().collect();
        params.set("depth", 3_500.0);
        assert_eq!(params.get("depth"), Some(3_500.0));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn source_parameters_replace_wholesale() {
        let source = Source::new(
            SourceKind::Mogi,
            "chamber",
            [("depth", 4_000.0)].into_iter().collect(),
        );
        source.set_parameters([("depth", 5_000.0), ("volume", 1e6)].into_iter().collect());
        assert_eq!(source.parameter("depth"), Some(5_000.0));
        assert_eq!(source.parameter("volume"), Some(1e6));
    }

    #[test]
    fn parameters_serialize_in_field_order() {
        let params: SourceParameters =
            [("depth", 1.0), ("strike", 2.0)].into_iter().collect();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"depth":1.0,"strike":2.0}"#);
    }

    #[test]
    fn source_ids_are_unique() {
        let a = Source::new(SourceKind::Okada, "a", SourceParameters::new());
        let b = Source::new(SourceKind::Okada, "b", SourceParameters::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn roi_contains_its_center() {
        let roi = RegionOfInterest {
            center: GeoPoint { easting: 100.0, northing: -50.0 },
            half_width: 10.0,
            half_length: 20.0,
        };
        assert!(roi.contains(GeoPoint { easting: 105.0, northing: -40.0 }));
        assert!(!roi.contains(GeoPoint { easting: 120.0, northing: -50.0 }));
    }
}
