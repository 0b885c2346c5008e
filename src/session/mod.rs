// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Collaborative editing sessions.
//!
//! A session pairs one loaded model (through its [`ModelController`]) with the connections
//! attached to it. Collaborators send requests; spectators only receive broadcasts. Outbound
//! events are queued per connection, so the registry never waits on a slow socket.
//!
//! [`ModelController`]: crate::controller::ModelController

use std::time::Duration;

use thiserror::Error;

use crate::model::ModelId;
use crate::store::StoreError;

pub mod protocol;
pub mod registry;

pub use protocol::{ConnectionId, Event, FailureReason, Request};
pub use registry::{Inbox, Outbox, Role, SessionHandle, SessionRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long an empty session survives after its last collaborator left.
    pub collaborator_grace: Duration,
    /// How long an empty session survives after its last spectator left.
    pub spectator_grace: Duration,
    pub max_message_bytes: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            collaborator_grace: Duration::from_secs(2),
            spectator_grace: Duration::from_secs(60),
            max_message_bytes: 1024 * 1024,
        }
    }
}

impl SessionSettings {
    pub fn grace_for(&self, role: Role) -> Duration {
        match role {
            Role::Collaborator => self.collaborator_grace,
            Role::Spectator => self.spectator_grace,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("session for model {model_id} is not open")]
    Closed { model_id: ModelId },
}

impl SessionError {
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Store(err) => err.into(),
            Self::Closed { .. } => FailureReason::NotFound,
        }
    }
}

#[cfg(test)]
mod tests;
