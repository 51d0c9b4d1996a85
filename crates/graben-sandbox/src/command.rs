// ── Command API ──
//
// All sandbox operations flow through a unified `Command` enum sent to
// the worker task. Queries and mutations alike are processed there, so
// ordering against rebuilds is total.

use std::sync::Weak;

use graben_model::{Source, SourceId, SourceParameters};

use crate::error::SandboxError;
use crate::sandbox::SharedScene;
use crate::table::{Role, RowData, SelectionModel};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, SandboxError>>,
}

/// All operations the worker processes.
pub(crate) enum Command {
    // ── Container operations ─────────────────────────────────────────
    SetModel(SharedScene),
    AddSource(Source),
    RemoveSource(SourceId),
    OptimizeReference,

    // ── Table queries ────────────────────────────────────────────────
    RowCount,
    ColumnCount,
    RowData { row: usize, role: Role },
    ItemParameters { row: usize },
    SelectedRows,

    // ── Table mutations ──────────────────────────────────────────────
    SetItemParameters { row: usize, parameters: SourceParameters },
    RemoveRow { row: usize },
    SetSelectionModel(Weak<dyn SelectionModel>),
}

/// Result payloads matching the command variants.
#[derive(Debug, Clone)]
pub(crate) enum CommandResult {
    Ok,
    SourceId(SourceId),
    Count(usize),
    Data(Option<RowData>),
    Parameters(SourceParameters),
    Rows(Vec<usize>),
}
