// ── Ring fault delegate ──

use std::sync::Arc;

use graben_model::{
    EditorDescriptor, FieldSpec, GeoPoint, RegionOfInterest, Source, SourceKind, SourceParameters,
};

use super::SourceDelegate;

/// Delegate for a closed ring fault, e.g. a caldera bounding fault.
pub struct RingfaultDelegate {
    source: Arc<Source>,
    row: usize,
}

impl RingfaultDelegate {
    pub(crate) fn create(source: Arc<Source>, row: usize) -> Box<dyn SourceDelegate> {
        Box::new(Self { source, row })
    }

    pub fn default_parameters() -> SourceParameters {
        [
            ("easting", 0.0),
            ("northing", 0.0),
            ("depth", 2_000.0),
            ("radius", 3_000.0),
            ("dip", 80.0),
            ("slip", 1.0),
        ]
        .into_iter()
        .collect()
    }

    pub fn template(name: &str) -> Source {
        Source::new(SourceKind::Ringfault, name, Self::default_parameters())
    }
}

impl SourceDelegate for RingfaultDelegate {
    fn source(&self) -> &Arc<Source> {
        &self.source
    }

    fn row(&self) -> usize {
        self.row
    }

    fn list_label(&self) -> String {
        let params = self.source.parameters();
        format!(
            "{}: Ringfault r {:.1} km at {:.1} km depth",
            self.source.name(),
            params.get("radius").unwrap_or_default() / 1_000.0,
            params.get("depth").unwrap_or_default() / 1_000.0,
        )
    }

    fn roi(&self) -> RegionOfInterest {
        let params = self.source.parameters();
        let radius = params.get("radius").unwrap_or_default();

        RegionOfInterest {
            center: GeoPoint {
                easting: params.get("easting").unwrap_or_default(),
                northing: params.get("northing").unwrap_or_default(),
            },
            half_width: radius,
            half_length: radius,
        }
    }

    fn editor(&self) -> EditorDescriptor {
        EditorDescriptor {
            title: format!("Ring fault: {}", self.source.name()),
            fields: vec![
                FieldSpec::new("easting", "Easting", "m", -500_000.0, 500_000.0, 100.0),
                FieldSpec::new("northing", "Northing", "m", -500_000.0, 500_000.0, 100.0),
                FieldSpec::new("depth", "Depth", "m", 0.0, 20_000.0, 100.0),
                FieldSpec::new("radius", "Radius", "m", 100.0, 20_000.0, 100.0),
                FieldSpec::new("dip", "Dip", "deg", 0.0, 90.0, 1.0),
                FieldSpec::new("slip", "Slip", "m", 0.0, 10.0, 0.1),
            ],
        }
    }
}
