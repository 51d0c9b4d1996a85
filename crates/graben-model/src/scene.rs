// ── Scene-model contract and reference implementation ──
//
// A scene owns the ordered source collection (the single source of truth
// for row count and order), a log sink, and one subscribable "updated"
// event. Subscription is holding a receiver; unsubscription is dropping
// it, so (re)subscription is symmetric and idempotent by construction.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::error::ModelError;
use crate::log::{LogLevel, LogRecord};
use crate::source::{Source, SourceId};

const LOG_CHANNEL_SIZE: usize = 256;

/// The contract every scene implementation satisfies.
///
/// The sandbox layer consumes exactly this surface: an ordered source
/// snapshot, membership mutation, the long-running reference optimization,
/// a versioned `updated` event and a log-record broadcast.
pub trait SceneModel: Send + 'static {
    /// Ordered snapshot of the current sources.
    fn sources(&self) -> Vec<Arc<Source>>;

    /// Append a source. Duplicate identity is a domain error.
    fn add_source(&mut self, source: Source) -> Result<SourceId, ModelError>;

    /// Remove a source by identity.
    fn remove_source(&mut self, id: SourceId) -> Result<(), ModelError>;

    /// Run the reference optimization to completion.
    ///
    /// Long-running and synchronous; the caller decides which execution
    /// context can afford to block on it.
    fn optimize_reference(&mut self) -> Result<(), ModelError>;

    /// Subscribe to the `updated` event: the version bumps on every
    /// mutation of the source collection.
    fn updated(&self) -> watch::Receiver<u64>;

    /// Subscribe to the scene's log sink.
    fn log_records(&self) -> broadcast::Receiver<Arc<LogRecord>>;
}

/// Optimization hook plugged into a [`MemoryScene`].
///
/// Receives the current source snapshot; adjusts parameters through the
/// sources' own locks. The computation itself is outside this crate.
pub type Optimizer = Box<dyn FnMut(&[Arc<Source>]) -> Result<(), ModelError> + Send>;

/// Reference in-memory [`SceneModel`].
///
/// Ordered `Vec` storage, a version counter bumped per mutation and a
/// log broadcast. Used by the sandbox's tests and by embedders without a
/// scene of their own.
pub struct MemoryScene {
    sources: Vec<Arc<Source>>,
    version: watch::Sender<u64>,
    log: broadcast::Sender<Arc<LogRecord>>,
    optimizer: Option<Optimizer>,
}

impl MemoryScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (log, _) = broadcast::channel(LOG_CHANNEL_SIZE);

        Self {
            sources: Vec::new(),
            version,
            log,
            optimizer: None,
        }
    }

    /// Create a scene seeded with sources, preserving iteration order.
    pub fn with_sources(sources: impl IntoIterator<Item = Source>) -> Self {
        let mut scene = Self::new();
        scene.sources = sources.into_iter().map(Arc::new).collect();
        scene
    }

    /// Attach the optimization hook invoked by
    /// [`optimize_reference`](SceneModel::optimize_reference).
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Increment the version counter. `send_modify` updates
    /// unconditionally, even with zero receivers.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    fn emit_log(&self, level: LogLevel, message: String) {
        let record = Arc::new(LogRecord::new(level, "graben::scene", message));
        let _ = self.log.send(record);
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneModel for MemoryScene {
    fn sources(&self) -> Vec<Arc<Source>> {
        self.sources.clone()
    }

    fn add_source(&mut self, source: Source) -> Result<SourceId, ModelError> {
        let id = source.id();
        if self.sources.iter().any(|s| s.id() == id) {
            return Err(ModelError::DuplicateSource { id });
        }

        self.emit_log(
            LogLevel::Info,
            format!("added {} source \"{}\"", source.kind(), source.name()),
        );
        self.sources.push(Arc::new(source));
        self.bump_version();
        Ok(id)
    }

    fn remove_source(&mut self, id: SourceId) -> Result<(), ModelError> {
        let position = self
            .sources
            .iter()
            .position(|s| s.id() == id)
            .ok_or(ModelError::UnknownSource { id })?;

        let removed = self.sources.remove(position);
        self.emit_log(
            LogLevel::Info,
            format!("removed {} source \"{}\"", removed.kind(), removed.name()),
        );
        self.bump_version();
        Ok(())
    }

    fn optimize_reference(&mut self) -> Result<(), ModelError> {
        let Some(optimizer) = self.optimizer.as_mut() else {
            debug!("no optimizer attached, skipping");
            return Ok(());
        };

        match optimizer(&self.sources) {
            Ok(()) => {
                self.emit_log(LogLevel::Info, "reference optimization converged".into());
                // Parameters may have moved; let subscribers re-read.
                self.bump_version();
                Ok(())
            }
            Err(err) => {
                self.emit_log(LogLevel::Error, format!("reference optimization failed: {err}"));
                Err(err)
            }
        }
    }

    fn updated(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn log_records(&self) -> broadcast::Receiver<Arc<LogRecord>> {
        self.log.subscribe()
    }
}
