// ── Sandbox container ──
//
// Owns the active scene model (swappable) and the source table, and runs
// them on a single-writer worker task. External callers talk over the
// command channel and await oneshot replies; all event emission and all
// table mutation happen on the worker, so ordering against rebuilds is
// total and no locking of adapter state is ever needed.

use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use graben_model::{LogRecord, SceneModel, Source, SourceId, SourceParameters};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::delegate::DelegateRegistry;
use crate::error::SandboxError;
use crate::events::{CursorTracker, EventStream, SandboxEvent};
use crate::table::{Role, RowData, SelectionModel, SourceTable, TableEvent};

const COMMAND_CHANNEL_SIZE: usize = 64;
const EVENT_CHANNEL_SIZE: usize = 256;

/// Message shown around the reference optimization run.
const OPTIMIZE_MESSAGE: &str = "Optimizing source, stay tuned!";

/// A scene shared between the sandbox and its supplier.
///
/// The sandbox exclusively owns the subscription lifecycle, not the
/// scene's memory: the caller may retain its handle and keep mutating the
/// scene from outside, which the worker picks up through the scene's
/// `updated` event.
pub type SharedScene = Arc<Mutex<dyn SceneModel>>;

/// Wrap a scene for sharing with a [`Sandbox`].
pub fn shared(model: impl SceneModel) -> SharedScene {
    Arc::new(Mutex::new(model))
}

/// Channel capacities and the delegate registry for one sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub command_capacity: usize,
    pub event_capacity: usize,
    pub registry: DelegateRegistry,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            command_capacity: COMMAND_CHANNEL_SIZE,
            event_capacity: EVENT_CHANNEL_SIZE,
            registry: DelegateRegistry::builtin(),
        }
    }
}

// ── Sandbox handle ───────────────────────────────────────────────────

/// Cheaply cloneable handle to a sandbox worker.
///
/// Dropping every clone does not stop the worker; call
/// [`shutdown`](Self::shutdown) for a clean exit.
#[derive(Clone)]
pub struct Sandbox {
    inner: Arc<SandboxInner>,
}

struct SandboxInner {
    command_tx: mpsc::Sender<CommandEnvelope>,
    event_tx: broadcast::Sender<SandboxEvent>,
    table_tx: broadcast::Sender<TableEvent>,
    cursor: CursorTracker,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Sandbox {
    /// Spawn a sandbox owning its scene. Must be called within a tokio
    /// runtime.
    pub fn spawn(model: impl SceneModel) -> Self {
        Self::spawn_shared(shared(model))
    }

    /// Spawn a sandbox over a scene the caller retains a handle to.
    pub fn spawn_shared(scene: SharedScene) -> Self {
        Self::spawn_with(SandboxConfig::default(), scene)
    }

    pub fn spawn_with(config: SandboxConfig, scene: SharedScene) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (table_tx, _) = broadcast::channel(config.event_capacity);
        let cancel = CancellationToken::new();

        let worker = Worker {
            model: scene,
            table: SourceTable::with_events(config.registry, table_tx.clone()),
            event_tx: event_tx.clone(),
        };
        let handle = tokio::spawn(run(worker, command_rx, cancel.clone()));

        Self {
            inner: Arc::new(SandboxInner {
                command_tx,
                event_tx,
                table_tx,
                cursor: CursorTracker::new(),
                cancel,
                worker: Mutex::new(Some(handle)),
            }),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SandboxEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Lifecycle events as a `Stream`.
    pub fn events(&self) -> EventStream<SandboxEvent> {
        EventStream::new(self.inner.event_tx.subscribe())
    }

    /// Subscribe to table notifications.
    pub fn subscribe_table(&self) -> broadcast::Receiver<TableEvent> {
        self.inner.table_tx.subscribe()
    }

    /// Table notifications as a `Stream`.
    pub fn table_events(&self) -> EventStream<TableEvent> {
        EventStream::new(self.inner.table_tx.subscribe())
    }

    /// The cursor/pointer pass-through broadcaster.
    pub fn cursor(&self) -> CursorTracker {
        self.inner.cursor.clone()
    }

    // ── Container operations ─────────────────────────────────────────

    /// Replace the active scene.
    ///
    /// Unsubscribes from the old scene (after which none of its events
    /// reach this sandbox), swaps, resubscribes, and emits `ModelChanged`
    /// followed by `ModelUpdated`, rebuilding the table in between.
    pub async fn set_model(&self, model: impl SceneModel) -> Result<(), SandboxError> {
        self.set_model_shared(shared(model)).await
    }

    pub async fn set_model_shared(&self, scene: SharedScene) -> Result<(), SandboxError> {
        match self.execute(Command::SetModel(scene)).await? {
            CommandResult::Ok => Ok(()),
            _ => Err(unexpected_result()),
        }
    }

    /// Append a source to the scene. Domain errors propagate unchanged.
    pub async fn add_source(&self, source: Source) -> Result<SourceId, SandboxError> {
        match self.execute(Command::AddSource(source)).await? {
            CommandResult::SourceId(id) => Ok(id),
            _ => Err(unexpected_result()),
        }
    }

    /// Remove a source from the scene by identity.
    pub async fn remove_source(&self, id: SourceId) -> Result<(), SandboxError> {
        match self.execute(Command::RemoveSource(id)).await? {
            CommandResult::Ok => Ok(()),
            _ => Err(unexpected_result()),
        }
    }

    /// Run the scene's reference optimization, bracketed by
    /// `ProcessingStarted` and `ProcessingFinished` events.
    ///
    /// Blocks the worker for the full duration: queue no other commands
    /// you need answered quickly, and dispatch this from a task that can
    /// afford to park. `ProcessingFinished` fires even when the
    /// optimization fails; the failure still reaches the caller here.
    pub async fn optimize_reference(&self) -> Result<(), SandboxError> {
        match self.execute(Command::OptimizeReference).await? {
            CommandResult::Ok => Ok(()),
            _ => Err(unexpected_result()),
        }
    }

    // ── Table-facing operations ──────────────────────────────────────

    pub async fn row_count(&self) -> Result<usize, SandboxError> {
        match self.execute(Command::RowCount).await? {
            CommandResult::Count(count) => Ok(count),
            _ => Err(unexpected_result()),
        }
    }

    pub async fn column_count(&self) -> Result<usize, SandboxError> {
        match self.execute(Command::ColumnCount).await? {
            CommandResult::Count(count) => Ok(count),
            _ => Err(unexpected_result()),
        }
    }

    /// Query one projection of a row; `None` for out-of-range rows or
    /// unrecognized roles.
    pub async fn row_data(&self, row: usize, role: Role) -> Result<Option<RowData>, SandboxError> {
        match self.execute(Command::RowData { row, role }).await? {
            CommandResult::Data(data) => Ok(data),
            _ => Err(unexpected_result()),
        }
    }

    pub async fn item_parameters(&self, row: usize) -> Result<SourceParameters, SandboxError> {
        match self.execute(Command::ItemParameters { row }).await? {
            CommandResult::Parameters(parameters) => Ok(parameters),
            _ => Err(unexpected_result()),
        }
    }

    pub async fn set_item_parameters(
        &self,
        row: usize,
        parameters: SourceParameters,
    ) -> Result<(), SandboxError> {
        match self
            .execute(Command::SetItemParameters { row, parameters })
            .await?
        {
            CommandResult::Ok => Ok(()),
            _ => Err(unexpected_result()),
        }
    }

    /// Remove the source behind a row, delegating to the scene.
    pub async fn remove_row(&self, row: usize) -> Result<(), SandboxError> {
        match self.execute(Command::RemoveRow { row }).await? {
            CommandResult::Ok => Ok(()),
            _ => Err(unexpected_result()),
        }
    }

    /// Install the selection collaborator. The table keeps a weak
    /// back-reference only.
    pub async fn set_selection_model(
        &self,
        selection: &Arc<dyn SelectionModel>,
    ) -> Result<(), SandboxError> {
        let weak: Weak<dyn SelectionModel> = Arc::downgrade(selection);
        match self.execute(Command::SetSelectionModel(weak)).await? {
            CommandResult::Ok => Ok(()),
            _ => Err(unexpected_result()),
        }
    }

    pub async fn selected_rows(&self) -> Result<Vec<usize>, SandboxError> {
        match self.execute(Command::SelectedRows).await? {
            CommandResult::Rows(rows) => Ok(rows),
            _ => Err(unexpected_result()),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Stop the worker and wait for it to exit. Commands issued
    /// afterwards fail with [`SandboxError::WorkerGone`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.worker.lock().await.take() {
            let _ = handle.await;
        }
    }

    // ── Command execution ────────────────────────────────────────────

    /// Send a command to the worker and await the result.
    async fn execute(&self, command: Command) -> Result<CommandResult, SandboxError> {
        let (response_tx, response_rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx,
            })
            .await
            .map_err(|_| SandboxError::WorkerGone)?;

        response_rx.await.map_err(|_| SandboxError::WorkerGone)?
    }
}

fn unexpected_result() -> SandboxError {
    SandboxError::Internal("unexpected command result variant".into())
}

// ── Worker ───────────────────────────────────────────────────────────

/// Subscriptions to the currently bound scene. Replaced wholesale on a
/// model swap; dropping the previous pair is the unsubscription.
type ModelSubscriptions = (watch::Receiver<u64>, broadcast::Receiver<Arc<LogRecord>>);

struct Worker {
    model: SharedScene,
    table: SourceTable,
    event_tx: broadcast::Sender<SandboxEvent>,
}

impl Worker {
    fn emit(&self, event: SandboxEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Bind the initial scene: the same sequence as a swap, minus a
    /// caller to report errors to. A failure is logged in `set_model`;
    /// the table stays partial until a registry fix and the next swap.
    async fn initial_bind(&mut self) -> ModelSubscriptions {
        let scene = Arc::clone(&self.model);
        let (subscriptions, _) = self.set_model(scene).await;
        subscriptions
    }

    async fn set_model(
        &mut self,
        scene: SharedScene,
    ) -> (ModelSubscriptions, Result<(), SandboxError>) {
        self.model = scene;

        let (updated_rx, log_rx, sources) = {
            let model = self.model.lock().await;
            (model.updated(), model.log_records(), model.sources())
        };

        self.emit(SandboxEvent::ModelChanged);
        let result = self.table.rebuild(&sources);
        if let Err(err) = &result {
            error!(%err, "row rebuild failed after model swap");
        }
        self.emit(SandboxEvent::ModelUpdated);
        if result.is_ok() {
            // The generic-update handler right after a forced rebuild:
            // counts match, so this is a no-op by construction.
            let _ = self.table.reconcile(&sources);
        }

        ((updated_rx, log_rx), result)
    }

    /// Process one command; returns fresh subscriptions after a swap.
    async fn handle_command(&mut self, envelope: CommandEnvelope) -> Option<ModelSubscriptions> {
        let CommandEnvelope {
            command,
            response_tx,
        } = envelope;

        if let Command::SetModel(scene) = command {
            let (subscriptions, result) = self.set_model(scene).await;
            let _ = response_tx.send(result.map(|()| CommandResult::Ok));
            return Some(subscriptions);
        }

        let result = self.route(command).await;
        let _ = response_tx.send(result);
        None
    }

    async fn route(&mut self, command: Command) -> Result<CommandResult, SandboxError> {
        match command {
            Command::AddSource(source) => {
                let id = self.model.lock().await.add_source(source)?;
                Ok(CommandResult::SourceId(id))
            }
            Command::RemoveSource(id) => {
                self.model.lock().await.remove_source(id)?;
                Ok(CommandResult::Ok)
            }
            Command::OptimizeReference => {
                self.emit(SandboxEvent::ProcessingStarted {
                    message: OPTIMIZE_MESSAGE.to_owned(),
                });
                let result = self.model.lock().await.optimize_reference();
                // Finished is guaranteed, error path included: consumers
                // gate busy indicators on the started/finished pair.
                self.emit(SandboxEvent::ProcessingFinished);
                result?;
                Ok(CommandResult::Ok)
            }
            Command::RowCount => Ok(CommandResult::Count(self.table.row_count())),
            Command::ColumnCount => Ok(CommandResult::Count(self.table.column_count())),
            Command::RowData { row, role } => Ok(CommandResult::Data(self.table.data(row, role))),
            Command::ItemParameters { row } => {
                Ok(CommandResult::Parameters(self.table.item_parameters(row)?))
            }
            Command::SetItemParameters { row, parameters } => {
                self.table.set_item_parameters(row, parameters)?;
                Ok(CommandResult::Ok)
            }
            Command::RemoveRow { row } => {
                let source = self.table.row_source(row)?;
                self.model.lock().await.remove_source(source.id())?;
                Ok(CommandResult::Ok)
            }
            Command::SetSelectionModel(selection) => {
                self.table.set_selection_model(selection);
                Ok(CommandResult::Ok)
            }
            Command::SelectedRows => Ok(CommandResult::Rows(self.table.selected_rows())),
            Command::SetModel(_) => Err(SandboxError::Internal(
                "model swap routed out of band".into(),
            )),
        }
    }

    /// The scene's generic `updated` event: re-emit, then reconcile with
    /// the count heuristic.
    async fn on_model_updated(&mut self) {
        self.emit(SandboxEvent::ModelUpdated);
        let sources = self.model.lock().await.sources();
        match self.table.reconcile(&sources) {
            Ok(true) => debug!("rows reconciled after model update"),
            Ok(false) => {}
            Err(err) => error!(%err, "row rebuild failed after model update"),
        }
    }
}

async fn run(
    mut worker: Worker,
    mut command_rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    let (mut updated_rx, mut log_rx) = worker.initial_bind().await;
    let mut updated_open = true;
    let mut log_open = true;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            envelope = command_rx.recv() => {
                let Some(envelope) = envelope else { break };
                if let Some((updated, log)) = worker.handle_command(envelope).await {
                    updated_rx = updated;
                    log_rx = log;
                    updated_open = true;
                    log_open = true;
                }
                // Fold a version bump caused by this command in before
                // the next one, so a follow-up query never observes a
                // stale row set.
                if updated_rx.has_changed().unwrap_or(false) {
                    let _ = updated_rx.borrow_and_update();
                    worker.on_model_updated().await;
                }
            }

            changed = updated_rx.changed(), if updated_open => {
                if changed.is_ok() {
                    worker.on_model_updated().await;
                } else {
                    updated_open = false;
                }
            }

            record = log_rx.recv(), if log_open => {
                match record {
                    Ok(record) => worker.emit(SandboxEvent::Log(record)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "log forwarding lagged, records dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => log_open = false,
                }
            }
        }
    }

    debug!("sandbox worker shut down");
}
