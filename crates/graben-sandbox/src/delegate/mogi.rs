// ── Mogi point-pressure delegate ──

use std::sync::Arc;

use graben_model::{
    EditorDescriptor, FieldSpec, GeoPoint, RegionOfInterest, Source, SourceKind, SourceParameters,
};

use super::SourceDelegate;

/// Delegate for a point pressure (Mogi) source.
pub struct MogiDelegate {
    source: Arc<Source>,
    row: usize,
}

impl MogiDelegate {
    pub(crate) fn create(source: Arc<Source>, row: usize) -> Box<dyn SourceDelegate> {
        Box::new(Self { source, row })
    }

    pub fn default_parameters() -> SourceParameters {
        [
            ("easting", 0.0),
            ("northing", 0.0),
            ("depth", 3_000.0),
            ("volume_change", 1e6),
        ]
        .into_iter()
        .collect()
    }

    pub fn template(name: &str) -> Source {
        Source::new(SourceKind::Mogi, name, Self::default_parameters())
    }
}

impl SourceDelegate for MogiDelegate {
    fn source(&self) -> &Arc<Source> {
        &self.source
    }

    fn row(&self) -> usize {
        self.row
    }

    fn list_label(&self) -> String {
        let params = self.source.parameters();
        format!(
            "{}: Mogi at {:.1} km depth, dV {:.2e} m3",
            self.source.name(),
            params.get("depth").unwrap_or_default() / 1_000.0,
            params.get("volume_change").unwrap_or_default(),
        )
    }

    fn roi(&self) -> RegionOfInterest {
        let params = self.source.parameters();
        // The surface footprint of a point source scales with its depth.
        let depth = params.get("depth").unwrap_or_default();

        RegionOfInterest {
            center: GeoPoint {
                easting: params.get("easting").unwrap_or_default(),
                northing: params.get("northing").unwrap_or_default(),
            },
            half_width: depth,
            half_length: depth,
        }
    }

    fn editor(&self) -> EditorDescriptor {
        EditorDescriptor {
            title: format!("Mogi source: {}", self.source.name()),
            fields: vec![
                FieldSpec::new("easting", "Easting", "m", -500_000.0, 500_000.0, 100.0),
                FieldSpec::new("northing", "Northing", "m", -500_000.0, 500_000.0, 100.0),
                FieldSpec::new("depth", "Depth", "m", 100.0, 50_000.0, 100.0),
                FieldSpec::new("volume_change", "Volume change", "m3", -1e9, 1e9, 1e4),
            ],
        }
    }
}
