// ── Okada rectangular dislocation delegate ──

use std::sync::Arc;

use graben_model::{
    EditorDescriptor, FieldSpec, GeoPoint, RegionOfInterest, Source, SourceKind, SourceParameters,
};

use super::SourceDelegate;

/// Delegate for a rectangular dislocation (Okada) fault plane.
pub struct OkadaDelegate {
    source: Arc<Source>,
    row: usize,
}

impl OkadaDelegate {
    pub(crate) fn create(source: Arc<Source>, row: usize) -> Box<dyn SourceDelegate> {
        Box::new(Self { source, row })
    }

    /// Parameter set of a fresh, mid-sized fault plane.
    pub fn default_parameters() -> SourceParameters {
        [
            ("easting", 0.0),
            ("northing", 0.0),
            ("depth", 4_000.0),
            ("length", 8_000.0),
            ("width", 4_000.0),
            ("strike", 45.0),
            ("dip", 30.0),
            ("rake", 90.0),
            ("slip", 2.0),
        ]
        .into_iter()
        .collect()
    }

    /// Convenience constructor for a source with default parameters.
    pub fn template(name: &str) -> Source {
        Source::new(SourceKind::Okada, name, Self::default_parameters())
    }
}

impl SourceDelegate for OkadaDelegate {
    fn source(&self) -> &Arc<Source> {
        &self.source
    }

    fn row(&self) -> usize {
        self.row
    }

    fn list_label(&self) -> String {
        let params = self.source.parameters();
        format!(
            "{}: Okada {:.1} x {:.1} km, strike {:.0} deg",
            self.source.name(),
            params.get("length").unwrap_or_default() / 1_000.0,
            params.get("width").unwrap_or_default() / 1_000.0,
            params.get("strike").unwrap_or_default(),
        )
    }

    fn roi(&self) -> RegionOfInterest {
        let params = self.source.parameters();
        let length = params.get("length").unwrap_or_default();
        let width = params.get("width").unwrap_or_default();
        let dip = params.get("dip").unwrap_or_default().to_radians();

        // Surface projection of the dipping plane: full length along
        // strike, width foreshortened by the dip angle.
        RegionOfInterest {
            center: GeoPoint {
                easting: params.get("easting").unwrap_or_default(),
                northing: params.get("northing").unwrap_or_default(),
            },
            half_width: length / 2.0,
            half_length: (width * dip.cos()) / 2.0,
        }
    }

    fn editor(&self) -> EditorDescriptor {
        EditorDescriptor {
            title: format!("Okada source: {}", self.source.name()),
            fields: vec![
                FieldSpec::new("easting", "Easting", "m", -500_000.0, 500_000.0, 100.0),
                FieldSpec::new("northing", "Northing", "m", -500_000.0, 500_000.0, 100.0),
                FieldSpec::new("depth", "Depth", "m", 0.0, 50_000.0, 100.0),
                FieldSpec::new("length", "Length", "m", 100.0, 200_000.0, 500.0),
                FieldSpec::new("width", "Width", "m", 100.0, 50_000.0, 500.0),
                FieldSpec::new("strike", "Strike", "deg", 0.0, 360.0, 1.0),
                FieldSpec::new("dip", "Dip", "deg", 0.0, 90.0, 1.0),
                FieldSpec::new("rake", "Rake", "deg", -180.0, 180.0, 1.0),
                FieldSpec::new("slip", "Slip", "m", 0.0, 20.0, 0.1),
            ],
        }
    }
}
