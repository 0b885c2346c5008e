// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! WebSocket front end of the session registry.
//!
//! Every connection speaks the protocol in [`crate::session::protocol`]: the first text frame
//! must be `join_session` or `watch_session`, after which inbound frames are handed to the
//! connection's [`SessionHandle`] and queued events are written back as text frames.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session::{Event, Inbox, Outbox, Request, SessionHandle, SessionRegistry};
use crate::store::StoredModel;

pub const WS_ROUTE: &str = "/ws";

/// Routes: `GET /ws` (collaboration socket) and `GET /models` (stored model listing).
pub fn router(registry: SessionRegistry) -> Router {
    Router::new()
        .route(WS_ROUTE, get(upgrade))
        .route("/models", get(list_models))
        .with_state(registry)
}

/// Serves `registry` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    registry: SessionRegistry,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, route = WS_ROUTE, "listening");
    }
    let app = router(registry).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn list_models(
    State(registry): State<SessionRegistry>,
) -> Result<Json<Vec<StoredModel>>, (axum::http::StatusCode, String)> {
    registry.store().list().map(Json).map_err(|err| {
        warn!(error = %err, "listing models failed");
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State(registry): State<SessionRegistry>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, registry, peer))
}

async fn run_connection(mut socket: WebSocket, registry: SessionRegistry, peer: SocketAddr) {
    debug!(peer = %peer, "socket opened");
    let (outbox, mut inbox) = mpsc::unbounded_channel();

    let Some(handle) = attach(&mut socket, &registry, &outbox).await else {
        debug!(peer = %peer, "socket closed before attaching");
        return;
    };
    // The registry holds the only other senders; ours keeps `inbox` open until the loop ends.
    pump(&mut socket, &handle, &mut inbox).await;

    info!(
        peer = %peer,
        model_id = %handle.model_id(),
        connection = %handle.connection_id(),
        "socket closed"
    );
    handle.leave().await;
    drop(outbox);
}

/// Reads frames until one attaches the connection to a session.
async fn attach(
    socket: &mut WebSocket,
    registry: &SessionRegistry,
    outbox: &Outbox,
) -> Option<SessionHandle> {
    loop {
        let text = match socket.recv().await? {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        };
        if text.as_str().len() > registry.settings().max_message_bytes {
            warn!(bytes = text.as_str().len(), "dropping oversized message");
            continue;
        }

        let attached = match serde_json::from_str::<Request>(text.as_str()) {
            Ok(Request::JoinSession { model_id }) => registry.join(model_id, outbox.clone()).await,
            Ok(Request::WatchSession { model_id }) => registry.watch(model_id, outbox.clone()).await,
            Ok(other) => {
                warn!(request_type = other.request_type(), "expected join_session or watch_session");
                continue;
            }
            Err(err) => {
                warn!(error = %err, "ignoring malformed request");
                continue;
            }
        };

        match attached {
            Ok(handle) => return Some(handle),
            Err(err) => {
                warn!(error = %err, "attach failed");
                let event = Event::request_failed(err.reason(), err.to_string());
                if send_event(socket, &event).await.is_err() {
                    return None;
                }
            }
        }
    }
}

async fn pump(socket: &mut WebSocket, handle: &SessionHandle, inbox: &mut Inbox) {
    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => handle.handle_text(text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(connection = %handle.connection_id(), error = %err, "socket error");
                    break;
                }
            },
            Some(event) = inbox.recv() => {
                if send_event(socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &Event) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(err) => {
            warn!(event_type = event.event_type(), error = %err, "failed to encode event");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
