// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::protocol::{ConnectionId, Event, FailureReason, Request};
use super::{SessionError, SessionSettings};
use crate::command::CommandOutput;
use crate::controller::ModelController;
use crate::model::{ModelId, NodeId};
use crate::store::ModelStore;

/// Sending half of a connection's event queue.
pub type Outbox = mpsc::UnboundedSender<Arc<Event>>;
/// Receiving half of a connection's event queue.
pub type Inbox = mpsc::UnboundedReceiver<Arc<Event>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May send requests; also receives every model broadcast.
    Collaborator,
    /// Receives model broadcasts only.
    Spectator,
}

/// One open model with its attached connections.
struct EditorSession {
    controller: ModelController,
    collaborators: BTreeMap<ConnectionId, Outbox>,
    spectators: BTreeMap<ConnectionId, Outbox>,
    close_timer: Option<JoinHandle<()>>,
}

impl EditorSession {
    fn new(controller: ModelController) -> Self {
        Self {
            controller,
            collaborators: BTreeMap::new(),
            spectators: BTreeMap::new(),
            close_timer: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.collaborators.is_empty() && self.spectators.is_empty()
    }

    fn cancel_close(&mut self) {
        if let Some(timer) = self.close_timer.take() {
            timer.abort();
        }
    }

    fn model_event(&self) -> Arc<Event> {
        Arc::new(Event::UpdateModel {
            model: self.controller.model().clone(),
        })
    }

    fn undo_redo_event(&self) -> Arc<Event> {
        let state = self.controller.undo_redo_state();
        Arc::new(Event::UpdateUndoRedo {
            can_undo: state.can_undo,
            can_redo: state.can_redo,
        })
    }

    /// Model to every spectator, undo/redo availability to every collaborator.
    fn broadcast_state(&self) {
        let model = self.model_event();
        for outbox in self.spectators.values() {
            let _ = outbox.send(Arc::clone(&model));
        }
        let undo_redo = self.undo_redo_event();
        for outbox in self.collaborators.values() {
            let _ = outbox.send(Arc::clone(&undo_redo));
        }
    }

    /// Each collaborator gets the list of the other collaborators.
    fn push_presence(&self) {
        for (recipient, outbox) in &self.collaborators {
            let collaborator_ids = self
                .collaborators
                .keys()
                .copied()
                .filter(|id| id != recipient)
                .collect();
            let _ = outbox.send(Arc::new(Event::UpdateCollaborators { collaborator_ids }));
        }
    }
}

/// Process-wide set of open sessions, keyed by model id.
///
/// Sessions open lazily on the first join or watch of a model and close once they have been
/// empty for the grace period of the role that left last. All session state sits behind one
/// async mutex, so requests are applied one at a time in arrival order.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    store: Arc<dyn ModelStore>,
    settings: SessionSettings,
    sessions: Mutex<HashMap<ModelId, EditorSession>>,
    next_connection_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn ModelStore>, settings: SessionSettings) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                store,
                settings,
                sessions: Mutex::new(HashMap::new()),
                next_connection_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    pub fn store(&self) -> &Arc<dyn ModelStore> {
        &self.inner.store
    }

    /// Attaches `outbox` as a collaborator of `model_id`, loading the model if needed.
    ///
    /// The new collaborator receives the current model and undo/redo state; every collaborator
    /// receives refreshed presence.
    pub async fn join(
        &self,
        model_id: ModelId,
        outbox: Outbox,
    ) -> Result<SessionHandle, SessionError> {
        self.attach(model_id, outbox, Role::Collaborator).await
    }

    /// Attaches `outbox` as a spectator of `model_id`, loading the model if needed.
    pub async fn watch(
        &self,
        model_id: ModelId,
        outbox: Outbox,
    ) -> Result<SessionHandle, SessionError> {
        self.attach(model_id, outbox, Role::Spectator).await
    }

    async fn attach(
        &self,
        model_id: ModelId,
        outbox: Outbox,
        role: Role,
    ) -> Result<SessionHandle, SessionError> {
        let connection_id = ConnectionId(self.inner.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let mut sessions = self.inner.sessions.lock().await;

        if !sessions.contains_key(&model_id) {
            let model = self.inner.store.load(&model_id)?;
            info!(model_id = %model_id, model_type = %model.model_type(), "session opened");
            let controller = ModelController::new(model, Arc::clone(&self.inner.store));
            sessions.insert(model_id.clone(), EditorSession::new(controller));
        }
        let Some(session) = sessions.get_mut(&model_id) else {
            return Err(SessionError::Closed { model_id });
        };

        session.cancel_close();
        session.spectators.insert(connection_id, outbox.clone());
        if role == Role::Collaborator {
            session.collaborators.insert(connection_id, outbox.clone());
        }

        let _ = outbox.send(session.model_event());
        if role == Role::Collaborator {
            let _ = outbox.send(session.undo_redo_event());
        }
        session.push_presence();

        info!(
            model_id = %model_id,
            connection = %connection_id,
            role = ?role,
            collaborators = session.collaborators.len(),
            spectators = session.spectators.len(),
            "connection attached"
        );

        Ok(SessionHandle {
            registry: self.clone(),
            model_id,
            connection_id,
            role,
            outbox,
            detached: false,
        })
    }

    async fn detach(&self, model_id: &ModelId, connection_id: ConnectionId, role: Role) {
        let mut sessions = self.inner.sessions.lock().await;
        let Some(session) = sessions.get_mut(model_id) else {
            return;
        };

        session.collaborators.remove(&connection_id);
        session.spectators.remove(&connection_id);
        session.push_presence();
        info!(
            model_id = %model_id,
            connection = %connection_id,
            role = ?role,
            collaborators = session.collaborators.len(),
            spectators = session.spectators.len(),
            "connection detached"
        );

        if session.is_empty() {
            let grace = self.inner.settings.grace_for(role);
            info!(model_id = %model_id, grace_ms = grace.as_millis() as u64, "session scheduled to close");
            session.cancel_close();
            session.close_timer = Some(spawn_close_timer(
                Arc::downgrade(&self.inner),
                model_id.clone(),
                grace,
            ));
        }
    }

    async fn dispatch(&self, handle: &SessionHandle, request: Request) {
        let mut sessions = self.inner.sessions.lock().await;
        let Some(session) = sessions.get_mut(&handle.model_id) else {
            warn!(model_id = %handle.model_id, "request for a closed session");
            return;
        };
        let reply = |event: Event| {
            let _ = handle.outbox.send(Arc::new(event));
        };

        match request {
            Request::JoinSession { .. } | Request::WatchSession { .. } => {
                warn!(connection = %handle.connection_id, "connection is already attached");
                reply(Event::request_failed(
                    FailureReason::MalformedRequest,
                    "connection is already attached to a session",
                ));
            }
            Request::ExecuteCommand { command } => {
                let command_type = command.command_type();
                let undoable = command.is_undoable();
                info!(model_id = %handle.model_id, command = command_type, "received command");
                match session.controller.execute(command) {
                    Ok(CommandOutput::Saved(model_id)) => {
                        info!(model_id = %model_id, "model saved");
                        reply(Event::SavedSuccess { model_id });
                    }
                    Ok(CommandOutput::Edge(None)) => {
                        debug!(model_id = %handle.model_id, "edge rejected by model");
                        session.broadcast_state();
                    }
                    Ok(_) if undoable => session.broadcast_state(),
                    Ok(_) => {}
                    Err(err) => {
                        warn!(model_id = %handle.model_id, command = command_type, error = %err, "command failed");
                        reply(Event::request_failed((&err).into(), err.to_string()));
                    }
                }
            }
            Request::Undo => {
                info!(model_id = %handle.model_id, "received undo request");
                match session.controller.undo() {
                    Ok(_) => session.broadcast_state(),
                    Err(err) => {
                        warn!(model_id = %handle.model_id, error = %err, "undo failed");
                        reply(Event::request_failed((&err).into(), err.to_string()));
                    }
                }
            }
            Request::Redo => {
                info!(model_id = %handle.model_id, "received redo request");
                match session.controller.redo() {
                    Ok(_) => session.broadcast_state(),
                    Err(err) => {
                        warn!(model_id = %handle.model_id, error = %err, "redo failed");
                        reply(Event::request_failed((&err).into(), err.to_string()));
                    }
                }
            }
            Request::Inspector { node_id } => {
                info!(model_id = %handle.model_id, node_id = %node_id, "received inspector request");
                reply(inspector_event(session, node_id));
            }
        }
    }

    pub async fn is_open(&self, model_id: &ModelId) -> bool {
        self.inner.sessions.lock().await.contains_key(model_id)
    }

    /// `(collaborators, spectators)` of an open session.
    pub async fn member_counts(&self, model_id: &ModelId) -> Option<(usize, usize)> {
        let sessions = self.inner.sessions.lock().await;
        sessions
            .get(model_id)
            .map(|session| (session.collaborators.len(), session.spectators.len()))
    }

    pub async fn open_sessions(&self) -> Vec<ModelId> {
        let mut ids = self
            .inner
            .sessions
            .lock()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }
}

fn inspector_event(session: &EditorSession, node_id: NodeId) -> Event {
    match session.controller.model().get_node(node_id) {
        Some(node) => Event::UpdateInspector {
            node_id,
            inspectables: node.inspectables(),
        },
        None => {
            warn!(node_id = %node_id, "inspector request for unknown node");
            Event::CloseInspector
        }
    }
}

fn spawn_close_timer(
    registry: Weak<RegistryInner>,
    model_id: ModelId,
    grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        let Some(registry) = registry.upgrade() else {
            return;
        };
        let mut sessions = registry.sessions.lock().await;
        // A join or watch during the grace period keeps the session.
        if sessions.get(&model_id).is_some_and(EditorSession::is_empty) {
            sessions.remove(&model_id);
            info!(model_id = %model_id, "session closed");
        }
    })
}

/// A connection's attachment to one session.
///
/// Dropping the handle detaches the connection; [`SessionHandle::leave`] does the same but
/// waits for it.
pub struct SessionHandle {
    registry: SessionRegistry,
    model_id: ModelId,
    connection_id: ConnectionId,
    role: Role,
    outbox: Outbox,
    detached: bool,
}

impl SessionHandle {
    pub fn model_id(&self) -> &ModelId {
        &self.model_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Handles one inbound text frame. Malformed, oversized and spectator messages are logged
    /// and dropped.
    pub async fn handle_text(&self, text: &str) {
        let max = self.registry.inner.settings.max_message_bytes;
        if text.len() > max {
            warn!(connection = %self.connection_id, bytes = text.len(), max, "dropping oversized message");
            return;
        }
        match serde_json::from_str::<Request>(text) {
            Ok(request) => self.handle_request(request).await,
            Err(err) => {
                let request_type = serde_json::from_str::<Value>(text)
                    .ok()
                    .and_then(|value| value.get("request_type")?.as_str().map(str::to_owned));
                warn!(
                    connection = %self.connection_id,
                    request_type = request_type.as_deref().unwrap_or("<none>"),
                    error = %err,
                    "ignoring malformed request"
                );
            }
        }
    }

    pub async fn handle_request(&self, request: Request) {
        if self.role == Role::Spectator {
            warn!(
                connection = %self.connection_id,
                request_type = request.request_type(),
                "spectators cannot send requests"
            );
            return;
        }
        self.registry.dispatch(self, request).await;
    }

    /// Detaches from the session and schedules its close if it is now empty.
    pub async fn leave(mut self) {
        self.detached = true;
        self.registry
            .detach(&self.model_id, self.connection_id, self.role)
            .await;
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let registry = self.registry.clone();
        let model_id = self.model_id.clone();
        let (connection_id, role) = (self.connection_id, self.role);
        runtime.spawn(async move {
            registry.detach(&model_id, connection_id, role).await;
        });
    }
}
