//! Unified error types surfaced by the runtime API.
//!
//! Rule violations are not errors at this level: the room worker turns them
//! into [`CommandOutcome`](super::CommandOutcome) values. What remains is
//! channel plumbing, missing templates and template loading.
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::oneshot;

use game_core::{GridError, RoomId, TemplateId};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("room {0} is closed")]
    RoomClosed(RoomId),

    #[error("map template {0} not found")]
    TemplateNotFound(TemplateId),

    #[error("room worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("room worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl RuntimeError {
    /// True when the target room has already finished.
    ///
    /// Late commands for a finished room are expected and safe to ignore.
    pub fn is_room_gone(&self) -> bool {
        matches!(
            self,
            RuntimeError::RoomClosed(_) | RuntimeError::ReplyChannelClosed(_)
        )
    }
}

/// Failures while loading map templates from disk.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid template layout")]
    Layout(#[from] GridError),
}
