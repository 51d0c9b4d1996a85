// ── Row-indexed source table ──
//
// Mirrors the scene's ordered source collection as presentation delegates,
// one per row. The row set is owned and mutated only by the sandbox
// worker; reconciliation is a full discard-and-recreate pass, no
// incremental diffing. Correctness over efficiency -- scenes hold tens of
// sources, not thousands.

use std::sync::{Arc, Weak};

use tokio::sync::broadcast;
use tracing::debug;

use graben_model::{EditorDescriptor, RegionOfInterest, Source, SourceParameters};

use crate::delegate::{DelegateRegistry, SourceDelegate};
use crate::error::SandboxError;

const TABLE_CHANNEL_SIZE: usize = 256;

/// Query discriminator for [`SourceTable::data`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Formatted list label.
    Display,
    /// Region-of-interest handle.
    Roi,
    /// Editor descriptor.
    Editor,
}

/// Projection returned by [`SourceTable::data`], matching the queried role.
#[derive(Debug, Clone, PartialEq)]
pub enum RowData {
    Display(String),
    Roi(RegionOfInterest),
    Editor(EditorDescriptor),
}

/// Notifications emitted by the table towards presentation consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A rebuild is starting; row indices are about to be invalidated.
    AboutToReset,
    /// A rebuild finished with this many rows.
    Reset { rows: usize },
    /// Exactly this row's data changed in place.
    RowChanged { row: usize },
    /// The selection collaborator was replaced.
    SelectionChanged,
}

/// Selection collaborator: answers which table rows are currently
/// selected. The table only ever looks it up, it never owns it.
pub trait SelectionModel: Send + Sync {
    fn selected_rows(&self) -> Vec<usize>;
}

/// Row-indexed adapter over the scene's source collection.
///
/// Invariant: after any successful reconciliation,
/// `row_count() == model.sources().len()`; violated only transiently
/// between a scene mutation and the next reconciliation pass.
pub struct SourceTable {
    registry: DelegateRegistry,
    rows: Vec<Box<dyn SourceDelegate>>,
    selection: Option<Weak<dyn SelectionModel>>,
    events: broadcast::Sender<TableEvent>,
}

impl SourceTable {
    pub fn new(registry: DelegateRegistry) -> Self {
        let (events, _) = broadcast::channel(TABLE_CHANNEL_SIZE);
        Self::with_events(registry, events)
    }

    pub(crate) fn with_events(
        registry: DelegateRegistry,
        events: broadcast::Sender<TableEvent>,
    ) -> Self {
        Self {
            registry,
            rows: Vec::new(),
            selection: None,
            events,
        }
    }

    /// Subscribe to table notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    // ── Indexed queries ──────────────────────────────────────────────

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// One logical column per source; multi-attribute access goes through
    /// roles, not columns.
    pub fn column_count(&self) -> usize {
        1
    }

    /// Query one projection of a row. An out-of-range row yields nothing
    /// rather than an error.
    pub fn data(&self, row: usize, role: Role) -> Option<RowData> {
        let delegate = self.rows.get(row)?;
        match role {
            Role::Display => Some(RowData::Display(delegate.list_label())),
            Role::Roi => Some(RowData::Roi(delegate.roi())),
            Role::Editor => Some(RowData::Editor(delegate.editor())),
        }
    }

    pub fn item_parameters(&self, row: usize) -> Result<SourceParameters, SandboxError> {
        Ok(self.delegate(row)?.parameters())
    }

    /// Write a row's parameter set and notify listeners that exactly that
    /// row changed.
    pub fn set_item_parameters(
        &self,
        row: usize,
        parameters: SourceParameters,
    ) -> Result<(), SandboxError> {
        self.delegate(row)?.set_parameters(parameters);
        let _ = self.events.send(TableEvent::RowChanged { row });
        Ok(())
    }

    /// Resolve the source behind a row, e.g. to delegate its removal to
    /// the scene.
    pub fn row_source(&self, row: usize) -> Result<Arc<Source>, SandboxError> {
        Ok(Arc::clone(self.delegate(row)?.source()))
    }

    // ── Selection collaborator ───────────────────────────────────────

    pub fn set_selection_model(&mut self, selection: Weak<dyn SelectionModel>) {
        self.selection = Some(selection);
        let _ = self.events.send(TableEvent::SelectionChanged);
    }

    /// Rows the selection collaborator reports as selected; empty when no
    /// collaborator is set or it has been dropped.
    pub fn selected_rows(&self) -> Vec<usize> {
        self.selection
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|selection| selection.selected_rows())
            .unwrap_or_default()
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Count-heuristic reconcile, run on every generic model update.
    ///
    /// Rebuilds only when the row count drifted from the source count.
    /// Intentionally lossy: an in-place mutation or reorder that keeps
    /// the count is not detected here -- a forced [`rebuild`](Self::rebuild)
    /// (model swap) is the escape hatch. Returns whether a rebuild ran.
    pub fn reconcile(&mut self, sources: &[Arc<Source>]) -> Result<bool, SandboxError> {
        if self.rows.len() == sources.len() {
            return Ok(false);
        }
        self.rebuild(sources)?;
        Ok(true)
    }

    /// Full discard-and-recreate pass over the scene's current order.
    ///
    /// On an unregistered kind the pass aborts: the rows built so far
    /// stay in place and no `Reset` is emitted, leaving the count
    /// invariant unsatisfied until a registry fix and the next rebuild.
    pub fn rebuild(&mut self, sources: &[Arc<Source>]) -> Result<(), SandboxError> {
        let _ = self.events.send(TableEvent::AboutToReset);
        self.rows.clear();

        for (row, source) in sources.iter().enumerate() {
            let delegate = self.registry.wrap(Arc::clone(source), row)?;
            self.rows.push(delegate);
        }

        debug!(rows = self.rows.len(), "source table rebuilt");
        let _ = self.events.send(TableEvent::Reset { rows: self.rows.len() });
        Ok(())
    }

    fn delegate(&self, row: usize) -> Result<&dyn SourceDelegate, SandboxError> {
        self.rows
            .get(row)
            .map(|boxed| &**boxed)
            .ok_or(SandboxError::RowOutOfBounds {
                row,
                rows: self.rows.len(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::delegate::{MogiDelegate, OkadaDelegate};
    use graben_model::SourceKind;
    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast::error::TryRecvError;

    fn sources(names: &[&str]) -> Vec<Arc<Source>> {
        names
            .iter()
            .map(|name| Arc::new(OkadaDelegate::template(name)))
            .collect()
    }

    fn drain(rx: &mut broadcast::Receiver<TableEvent>) -> Vec<TableEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn rebuild_mirrors_source_order() {
        let mut table = SourceTable::new(DelegateRegistry::builtin());
        table.rebuild(&sources(&["a", "b"])).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 1);
        let Some(RowData::Display(label)) = table.data(1, Role::Display) else {
            panic!("expected display data");
        };
        assert!(label.starts_with("b:"));
    }

    #[test]
    fn reconcile_is_a_noop_when_count_matches() {
        let mut table = SourceTable::new(DelegateRegistry::builtin());
        let set = sources(&["a", "b"]);
        table.rebuild(&set).unwrap();

        let mut rx = table.subscribe();
        // Same count, even twice in a row: no rebuild, no notifications.
        assert!(!table.reconcile(&set).unwrap());
        assert!(!table.reconcile(&set).unwrap());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn reconcile_rebuilds_on_count_mismatch() {
        let mut table = SourceTable::new(DelegateRegistry::builtin());
        let set = sources(&["a", "b"]);
        table.rebuild(&set).unwrap();

        let shrunk = vec![Arc::clone(&set[0])];
        assert!(table.reconcile(&shrunk).unwrap());
        assert_eq!(table.row_count(), 1);

        let Some(RowData::Display(label)) = table.data(0, Role::Display) else {
            panic!("expected display data");
        };
        assert!(label.starts_with("a:"));
    }

    #[test]
    fn data_out_of_range_yields_nothing() {
        let mut table = SourceTable::new(DelegateRegistry::builtin());
        table.rebuild(&sources(&["only"])).unwrap();

        assert_eq!(table.data(1, Role::Display), None);
    }

    #[test]
    fn roi_and_editor_roles_dispatch() {
        let mut table = SourceTable::new(DelegateRegistry::builtin());
        table.rebuild(&sources(&["roi"])).unwrap();

        assert!(matches!(table.data(0, Role::Roi), Some(RowData::Roi(_))));
        assert!(matches!(table.data(0, Role::Editor), Some(RowData::Editor(_))));
    }

    #[test]
    fn set_item_parameters_notifies_exactly_that_row() {
        let mut table = SourceTable::new(DelegateRegistry::builtin());
        table.rebuild(&sources(&["a", "b"])).unwrap();
        let mut rx = table.subscribe();

        let params: SourceParameters = [("slip", 4.2)].into_iter().collect();
        table.set_item_parameters(1, params.clone()).unwrap();

        assert_eq!(drain(&mut rx), vec![TableEvent::RowChanged { row: 1 }]);
        assert_eq!(table.item_parameters(1).unwrap(), params);
    }

    #[test]
    fn parameter_access_out_of_range_errors() {
        let table = SourceTable::new(DelegateRegistry::builtin());
        let err = table.item_parameters(0).unwrap_err();
        assert!(matches!(err, SandboxError::RowOutOfBounds { row: 0, rows: 0 }));
    }

    #[test]
    fn unknown_kind_aborts_rebuild_mid_pass() {
        // Only Okada registered; the Mogi source in the middle cannot be
        // wrapped.
        let mut registry = DelegateRegistry::empty();
        registry.register(SourceKind::Okada, OkadaDelegate::create);
        let mut table = SourceTable::with_events(registry, broadcast::channel(16).0);

        let mixed = vec![
            Arc::new(OkadaDelegate::template("first")),
            Arc::new(MogiDelegate::template("unrenderable")),
            Arc::new(OkadaDelegate::template("third")),
        ];
        let mut rx = table.subscribe();

        let err = table.rebuild(&mixed).unwrap_err();
        assert!(matches!(
            err,
            SandboxError::UnknownSourceKind { kind: SourceKind::Mogi }
        ));

        // Post-state: the wrapped prefix survives, the count invariant is
        // broken, and the reset never completed.
        assert_eq!(table.row_count(), 1);
        assert_eq!(drain(&mut rx), vec![TableEvent::AboutToReset]);
    }

    #[test]
    fn selection_model_is_looked_up_not_owned() {
        struct FixedSelection(Vec<usize>);
        impl SelectionModel for FixedSelection {
            fn selected_rows(&self) -> Vec<usize> {
                self.0.clone()
            }
        }

        let mut table = SourceTable::new(DelegateRegistry::builtin());
        let mut rx = table.subscribe();

        let selection: Arc<dyn SelectionModel> = Arc::new(FixedSelection(vec![0, 2]));
        table.set_selection_model(Arc::downgrade(&selection));

        assert_eq!(drain(&mut rx), vec![TableEvent::SelectionChanged]);
        assert_eq!(table.selected_rows(), vec![0, 2]);

        drop(selection);
        assert!(table.selected_rows().is_empty());
    }
}
