//! Presentation delegates — per-kind projections of a scene source.
//!
//! One delegate wraps one live source and translates it into what the
//! presentation layer consumes: a list label, a region-of-interest handle,
//! the editable parameter set and an editor descriptor. Delegates are
//! created during a table rebuild and discarded wholesale on the next one;
//! they are never mutated in place across rebuilds.

mod mogi;
mod okada;
mod ringfault;

use std::collections::HashMap;
use std::sync::Arc;

use graben_model::{EditorDescriptor, RegionOfInterest, Source, SourceKind, SourceParameters};

use crate::error::SandboxError;

pub use mogi::MogiDelegate;
pub use okada::OkadaDelegate;
pub use ringfault::RingfaultDelegate;

/// One row's worth of presentation behaviour.
pub trait SourceDelegate: Send {
    /// The wrapped source.
    fn source(&self) -> &Arc<Source>;

    /// Positional row index assigned at creation time. Not re-tracked if
    /// the scene reorders without a count change; the next rebuild
    /// reassigns it.
    fn row(&self) -> usize;

    /// Formatted one-line label for list display.
    fn list_label(&self) -> String;

    /// Region-of-interest handle derived from the current parameters.
    fn roi(&self) -> RegionOfInterest;

    /// Declarative description of this kind's edit UI.
    fn editor(&self) -> EditorDescriptor;

    /// Snapshot of the source's editable parameters.
    fn parameters(&self) -> SourceParameters {
        self.source().parameters()
    }

    /// Write the editable parameters back to the source.
    fn set_parameters(&self, parameters: SourceParameters) {
        self.source().set_parameters(parameters);
    }
}

/// Constructor resolved from the registry during a rebuild.
pub type DelegateFactory = fn(Arc<Source>, usize) -> Box<dyn SourceDelegate>;

/// Source kind → delegate constructor table.
///
/// Populated once at startup with [`builtin`](Self::builtin); stays open
/// for embedder kinds via [`register`](Self::register). A kind with no
/// entry is a configuration defect surfaced as
/// [`SandboxError::UnknownSourceKind`].
#[derive(Debug, Clone)]
pub struct DelegateRegistry {
    factories: HashMap<SourceKind, DelegateFactory>,
}

impl DelegateRegistry {
    /// An empty table, for embedders composing their own kind set.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The table covering every built-in source kind.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(SourceKind::Okada, OkadaDelegate::create);
        registry.register(SourceKind::Mogi, MogiDelegate::create);
        registry.register(SourceKind::Ringfault, RingfaultDelegate::create);
        registry
    }

    /// Register (or replace) the factory for a kind.
    pub fn register(&mut self, kind: SourceKind, factory: DelegateFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn resolve(&self, kind: SourceKind) -> Result<DelegateFactory, SandboxError> {
        self.factories
            .get(&kind)
            .copied()
            .ok_or(SandboxError::UnknownSourceKind { kind })
    }

    /// Wrap a source in its kind's delegate, bound to a row index.
    pub fn wrap(
        &self,
        source: Arc<Source>,
        row: usize,
    ) -> Result<Box<dyn SourceDelegate>, SandboxError> {
        let factory = self.resolve(source.kind())?;
        Ok(factory(source, row))
    }
}

impl Default for DelegateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn builtin_covers_every_kind() {
        let registry = DelegateRegistry::builtin();
        for kind in SourceKind::iter() {
            assert!(registry.resolve(kind).is_ok(), "no factory for {kind}");
        }
    }

    #[test]
    fn empty_registry_reports_unknown_kind() {
        let registry = DelegateRegistry::empty();
        let err = registry.resolve(SourceKind::Mogi).unwrap_err();
        assert!(matches!(
            err,
            SandboxError::UnknownSourceKind { kind: SourceKind::Mogi }
        ));
    }

    #[test]
    fn wrap_binds_source_and_row() {
        let registry = DelegateRegistry::builtin();
        let source = Arc::new(OkadaDelegate::template("wrapped"));

        let delegate = registry.wrap(Arc::clone(&source), 3).unwrap();

        assert_eq!(delegate.row(), 3);
        assert_eq!(delegate.source().id(), source.id());
    }
}
