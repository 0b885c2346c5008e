// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wire messages of the collaboration protocol.
//!
//! One JSON object per message. Inbound objects carry a `request_type` tag, outbound objects an
//! `event_type` tag.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandError, ModelCommand};
use crate::model::{Inspectable, ModelId, NodeId, ProcessModel};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum Request {
    /// Attach as a collaborator. Must be the first message of a connection.
    JoinSession {
        #[schemars(with = "String")]
        model_id: ModelId,
    },
    /// Attach as a read-only spectator. Must be the first message of a connection.
    WatchSession {
        #[schemars(with = "String")]
        model_id: ModelId,
    },
    ExecuteCommand {
        command: ModelCommand,
    },
    Inspector {
        node_id: NodeId,
    },
    Undo,
    Redo,
}

impl Request {
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::JoinSession { .. } => "join_session",
            Self::WatchSession { .. } => "watch_session",
            Self::ExecuteCommand { .. } => "execute_command",
            Self::Inspector { .. } => "inspector",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    UpdateModel {
        model: ProcessModel,
    },
    /// Everyone attached as collaborator except the recipient.
    UpdateCollaborators {
        collaborator_ids: Vec<ConnectionId>,
    },
    UpdateUndoRedo {
        can_undo: bool,
        can_redo: bool,
    },
    UpdateInspector {
        node_id: NodeId,
        inspectables: Vec<Inspectable>,
    },
    CloseInspector,
    SavedSuccess {
        model_id: ModelId,
    },
    RequestFailed {
        reason: FailureReason,
        message: String,
    },
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UpdateModel { .. } => "update_model",
            Self::UpdateCollaborators { .. } => "update_collaborators",
            Self::UpdateUndoRedo { .. } => "update_undo_redo",
            Self::UpdateInspector { .. } => "update_inspector",
            Self::CloseInspector => "close_inspector",
            Self::SavedSuccess { .. } => "saved_success",
            Self::RequestFailed { .. } => "request_failed",
        }
    }

    pub fn request_failed(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    InvalidOperation,
    MalformedRequest,
    PersistenceFailure,
}

impl From<&StoreError> for FailureReason {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            _ => Self::PersistenceFailure,
        }
    }
}

impl From<&CommandError> for FailureReason {
    fn from(err: &CommandError) -> Self {
        match err {
            CommandError::NodeNotFound(_) | CommandError::EdgeNotFound(_) => Self::NotFound,
            CommandError::EdgeRejected(_) | CommandError::Model(_) => Self::InvalidOperation,
            CommandError::Store(err) => err.into(),
        }
    }
}

/// Server-assigned identity of one connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConnectionId, Event, FailureReason, Request};
    use crate::command::ModelCommand;
    use crate::model::{ModelId, NodeId};

    #[test]
    fn requests_decode_by_request_type() {
        let request: Request = serde_json::from_value(json!({
            "request_type": "join_session",
            "model_id": "nets/a"
        }))
        .expect("join");
        assert_eq!(
            request,
            Request::JoinSession {
                model_id: ModelId::new("nets/a").expect("id")
            }
        );

        let request: Request = serde_json::from_value(json!({
            "request_type": "execute_command",
            "command": { "command_type": "move_node", "node_id": 3, "x": 1.5, "y": 2 }
        }))
        .expect("execute");
        assert_eq!(
            request,
            Request::ExecuteCommand {
                command: ModelCommand::MoveNode {
                    node_id: NodeId(3),
                    x: 1.5,
                    y: 2.0
                }
            }
        );

        let request: Request =
            serde_json::from_value(json!({ "request_type": "undo" })).expect("undo");
        assert_eq!(request.request_type(), "undo");
    }

    #[test]
    fn model_ids_are_validated_on_decode() {
        let result = serde_json::from_value::<Request>(json!({
            "request_type": "watch_session",
            "model_id": "../etc/passwd"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn events_encode_with_event_type() {
        let value = serde_json::to_value(Event::UpdateCollaborators {
            collaborator_ids: vec![ConnectionId(2), ConnectionId(5)],
        })
        .expect("json");
        assert_eq!(
            value,
            json!({ "event_type": "update_collaborators", "collaborator_ids": [2, 5] })
        );

        let value = serde_json::to_value(Event::request_failed(FailureReason::NotFound, "gone"))
            .expect("json");
        assert_eq!(
            value,
            json!({ "event_type": "request_failed", "reason": "not_found", "message": "gone" })
        );

        let value = serde_json::to_value(Event::CloseInspector).expect("json");
        assert_eq!(value, json!({ "event_type": "close_inspector" }));
    }
}
