//! School change notifications
//!
//! CRR names are the identity operators see everywhere, so renames and
//! deletions are broadcast to anything holding a school list (the service
//! forwards them to SSE clients).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchoolChange {
    Created { crr_name: String },
    Updated { crr_name: String, field: String },
    CrrNameChanged { old: String, new: String },
    Deleted { crr_name: String },
}

impl SchoolChange {
    /// SSE event name
    pub fn event_name(&self) -> &'static str {
        match self {
            SchoolChange::Created { .. } => "school_created",
            SchoolChange::Updated { .. } => "school_updated",
            SchoolChange::CrrNameChanged { .. } => "crr_name_changed",
            SchoolChange::Deleted { .. } => "school_deleted",
        }
    }
}

/// Broadcast channel for [`SchoolChange`] events
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<SchoolChange>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchoolChange> {
        self.tx.subscribe()
    }

    /// Publish a change; having no listeners is normal
    pub fn emit(&self, change: SchoolChange) {
        debug!("School change: {:?}", change);
        let _ = self.tx.send(change);
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
