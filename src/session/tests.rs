// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio::sync::mpsc;

use super::{Event, FailureReason, Inbox, Outbox, Request, SessionError, SessionRegistry, SessionSettings};
use crate::command::ModelCommand;
use crate::model::{ModelId, ModelType, NodeId, NodeParams, Point, ProcessModel};
use crate::store::{MemoryStore, ModelStore, StoreError};

struct Ctx {
    store: Arc<MemoryStore>,
    registry: SessionRegistry,
    model_id: ModelId,
    place: NodeId,
}

#[fixture]
fn ctx() -> Ctx {
    let model_id = ModelId::new("nets/shared").expect("id");
    let mut model = ProcessModel::new(model_id.clone(), ModelType::PetriNet);
    let place = model
        .add_node(Point::new(0.0, 0.0), &NodeParams::with_node_type("place"))
        .expect("place")
        .id();
    let store = Arc::new(MemoryStore::with_models([model]));
    let registry = SessionRegistry::new(store.clone(), SessionSettings::default());
    Ctx {
        store,
        registry,
        model_id,
        place,
    }
}

fn channel() -> (Outbox, Inbox) {
    mpsc::unbounded_channel()
}

fn drain(inbox: &mut Inbox) -> Vec<Arc<Event>> {
    let mut events = Vec::new();
    while let Ok(event) = inbox.try_recv() {
        events.push(event);
    }
    events
}

fn event_types(events: &[Arc<Event>]) -> Vec<&'static str> {
    events.iter().map(|event| event.event_type()).collect()
}

/// Lets spawned detach and close tasks run.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[rstest]
#[tokio::test]
async fn join_sends_model_undo_state_and_presence(ctx: Ctx) {
    let (tx, mut rx) = channel();
    let _handle = ctx.registry.join(ctx.model_id.clone(), tx).await.expect("join");

    let events = drain(&mut rx);
    assert_eq!(
        event_types(&events),
        vec!["update_model", "update_undo_redo", "update_collaborators"]
    );
    assert_eq!(
        *events[1],
        Event::UpdateUndoRedo {
            can_undo: false,
            can_redo: false
        }
    );
    assert_eq!(
        *events[2],
        Event::UpdateCollaborators {
            collaborator_ids: Vec::new()
        }
    );
}

#[rstest]
#[tokio::test]
async fn watch_sends_model_only(ctx: Ctx) {
    let (tx, mut rx) = channel();
    let _handle = ctx.registry.watch(ctx.model_id.clone(), tx).await.expect("watch");
    assert_eq!(event_types(&drain(&mut rx)), vec!["update_model"]);
    assert_eq!(ctx.registry.member_counts(&ctx.model_id).await, Some((0, 1)));
}

#[rstest]
#[tokio::test]
async fn presence_excludes_the_recipient(ctx: Ctx) {
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();
    let a = ctx.registry.join(ctx.model_id.clone(), tx_a).await.expect("join a");
    drain(&mut rx_a);
    let b = ctx.registry.join(ctx.model_id.clone(), tx_b).await.expect("join b");

    let to_a = drain(&mut rx_a);
    assert_eq!(
        to_a.last().map(|event| (**event).clone()),
        Some(Event::UpdateCollaborators {
            collaborator_ids: vec![b.connection_id()]
        })
    );
    let to_b = drain(&mut rx_b);
    assert_eq!(
        to_b.last().map(|event| (**event).clone()),
        Some(Event::UpdateCollaborators {
            collaborator_ids: vec![a.connection_id()]
        })
    );

    b.leave().await;
    assert_eq!(
        drain(&mut rx_a).last().map(|event| (**event).clone()),
        Some(Event::UpdateCollaborators {
            collaborator_ids: Vec::new()
        })
    );
}

#[rstest]
#[tokio::test]
async fn inspector_replies_only_to_the_requester(ctx: Ctx) {
    let (tx_c, mut rx_c) = channel();
    let (tx_s, mut rx_s) = channel();
    let collaborator = ctx.registry.join(ctx.model_id.clone(), tx_c).await.expect("join");
    let _spectator = ctx.registry.watch(ctx.model_id.clone(), tx_s).await.expect("watch");
    drain(&mut rx_c);
    drain(&mut rx_s);

    collaborator
        .handle_request(Request::Inspector { node_id: ctx.place })
        .await;
    let events = drain(&mut rx_c);
    assert_eq!(event_types(&events), vec!["update_inspector"]);
    let Event::UpdateInspector {
        node_id,
        inspectables,
    } = &*events[0]
    else {
        panic!("expected update_inspector");
    };
    assert_eq!(*node_id, ctx.place);
    assert_eq!(inspectables[0].name, "id");

    collaborator
        .handle_request(Request::Inspector {
            node_id: NodeId(20_000),
        })
        .await;
    assert_eq!(event_types(&drain(&mut rx_c)), vec!["close_inspector"]);
    assert!(drain(&mut rx_s).is_empty());
}

#[rstest]
#[tokio::test]
async fn undoable_commands_broadcast_to_everyone(ctx: Ctx) {
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();
    let (tx_s, mut rx_s) = channel();
    let a = ctx.registry.join(ctx.model_id.clone(), tx_a).await.expect("join a");
    let _b = ctx.registry.join(ctx.model_id.clone(), tx_b).await.expect("join b");
    let _s = ctx.registry.watch(ctx.model_id.clone(), tx_s).await.expect("watch");
    drain(&mut rx_a);
    drain(&mut rx_b);
    drain(&mut rx_s);

    a.handle_request(Request::ExecuteCommand {
        command: ModelCommand::CreateNode {
            x: 10.0,
            y: 10.0,
            node_kwargs: NodeParams::with_node_type("transition"),
        },
    })
    .await;

    let expected_undo = Event::UpdateUndoRedo {
        can_undo: true,
        can_redo: false,
    };
    for rx in [&mut rx_a, &mut rx_b] {
        let events = drain(rx);
        assert_eq!(event_types(&events), vec!["update_model", "update_undo_redo"]);
        assert_eq!(*events[1], expected_undo);
    }
    let to_spectator = drain(&mut rx_s);
    assert_eq!(event_types(&to_spectator), vec!["update_model"]);
    let Event::UpdateModel { model } = &*to_spectator[0] else {
        panic!("expected update_model");
    };
    assert_eq!(model.node_count(), 2);

    a.handle_request(Request::Undo).await;
    let events = drain(&mut rx_b);
    assert_eq!(
        *events[1],
        Event::UpdateUndoRedo {
            can_undo: false,
            can_redo: true
        }
    );
}

#[rstest]
#[tokio::test]
async fn save_is_acknowledged_privately(ctx: Ctx) {
    let (tx_a, mut rx_a) = channel();
    let (tx_s, mut rx_s) = channel();
    let a = ctx.registry.join(ctx.model_id.clone(), tx_a).await.expect("join");
    let _s = ctx.registry.watch(ctx.model_id.clone(), tx_s).await.expect("watch");
    a.handle_request(Request::ExecuteCommand {
        command: ModelCommand::MoveNode {
            node_id: ctx.place,
            x: 4.0,
            y: 2.0,
        },
    })
    .await;
    drain(&mut rx_a);
    drain(&mut rx_s);

    a.handle_request(Request::ExecuteCommand {
        command: ModelCommand::SaveModel { path: None },
    })
    .await;

    assert_eq!(
        drain(&mut rx_a).iter().map(|event| (**event).clone()).collect::<Vec<_>>(),
        vec![Event::SavedSuccess {
            model_id: ctx.model_id.clone()
        }]
    );
    assert!(drain(&mut rx_s).is_empty());
    let saved = ctx.store.load(&ctx.model_id).expect("saved");
    assert_eq!(
        saved.get_node(ctx.place).map(|node| node.position()),
        Some(Point::new(4.0, 2.0))
    );
}

#[rstest]
#[tokio::test]
async fn failed_commands_are_reported_to_the_sender(ctx: Ctx) {
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();
    let a = ctx.registry.join(ctx.model_id.clone(), tx_a).await.expect("join a");
    let _b = ctx.registry.join(ctx.model_id.clone(), tx_b).await.expect("join b");
    drain(&mut rx_a);
    drain(&mut rx_b);

    a.handle_request(Request::ExecuteCommand {
        command: ModelCommand::DeleteNode {
            node_id: NodeId(20_000),
        },
    })
    .await;

    let events = drain(&mut rx_a);
    assert!(matches!(
        &*events[0],
        Event::RequestFailed {
            reason: FailureReason::NotFound,
            ..
        }
    ));
    assert!(drain(&mut rx_b).is_empty());
}

#[rstest]
#[tokio::test]
async fn spectator_and_malformed_messages_are_dropped(ctx: Ctx) {
    let (tx_a, mut rx_a) = channel();
    let (tx_s, mut rx_s) = channel();
    let a = ctx.registry.join(ctx.model_id.clone(), tx_a).await.expect("join");
    let spectator = ctx.registry.watch(ctx.model_id.clone(), tx_s).await.expect("watch");
    drain(&mut rx_a);
    drain(&mut rx_s);

    spectator
        .handle_text(r#"{"request_type":"execute_command","command":{"command_type":"clear_model"}}"#)
        .await;
    a.handle_text("not json").await;
    a.handle_text(r#"{"request_type":"teleport"}"#).await;

    assert!(drain(&mut rx_a).is_empty());
    assert!(drain(&mut rx_s).is_empty());

    // The collaborator's connection still works afterwards.
    a.handle_text(r#"{"request_type":"redo"}"#).await;
    assert_eq!(event_types(&drain(&mut rx_a)), vec!["update_model", "update_undo_redo"]);
    let Event::UpdateModel { model } = &*drain(&mut rx_s)[0] else {
        panic!("expected update_model");
    };
    assert_eq!(model.node_count(), 1);
}

#[tokio::test]
async fn oversized_messages_are_dropped() {
    let model_id = ModelId::new("tiny").expect("id");
    let store = Arc::new(MemoryStore::with_models([ProcessModel::new(
        model_id.clone(),
        ModelType::DcrGraph,
    )]));
    let settings = SessionSettings {
        max_message_bytes: 16,
        ..SessionSettings::default()
    };
    let registry = SessionRegistry::new(store, settings);
    let (tx, mut rx) = channel();
    let handle = registry.join(model_id, tx).await.expect("join");
    drain(&mut rx);

    handle
        .handle_text(r#"{"request_type":"undo","padding":"xxxxxxxxxxxxxxxx"}"#)
        .await;
    assert!(drain(&mut rx).is_empty());

    handle.handle_text(r#"{"request_type":"undo"}"#).await;
    assert!(drain(&mut rx).is_empty(), "still over the limit");
}

#[rstest]
#[tokio::test]
async fn join_of_unknown_model_fails_without_opening_a_session(ctx: Ctx) {
    let missing = ModelId::new("nets/missing").expect("id");
    let (tx, _rx) = channel();
    let err = ctx.registry.join(missing.clone(), tx).await.err().expect("missing");
    assert!(matches!(err, SessionError::Store(StoreError::NotFound { .. })));
    assert_eq!(err.reason(), FailureReason::NotFound);
    assert!(!ctx.registry.is_open(&missing).await);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn session_closes_after_collaborator_grace(ctx: Ctx) {
    let (tx, _rx) = channel();
    let handle = ctx.registry.join(ctx.model_id.clone(), tx).await.expect("join");
    handle.leave().await;

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    settle().await;
    assert!(ctx.registry.is_open(&ctx.model_id).await);

    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;
    assert!(!ctx.registry.is_open(&ctx.model_id).await);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn rejoin_during_grace_keeps_the_session(ctx: Ctx) {
    let (tx, _rx) = channel();
    let first = ctx.registry.join(ctx.model_id.clone(), tx).await.expect("join");
    first
        .handle_request(Request::ExecuteCommand {
            command: ModelCommand::MoveNode {
                node_id: ctx.place,
                x: 7.0,
                y: 7.0,
            },
        })
        .await;
    first.leave().await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    let (tx, mut rx) = channel();
    let _second = ctx.registry.join(ctx.model_id.clone(), tx).await.expect("rejoin");

    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;
    assert!(ctx.registry.is_open(&ctx.model_id).await);

    // Unsaved edits and history survived.
    let events = drain(&mut rx);
    let Event::UpdateModel { model } = &*events[0] else {
        panic!("expected update_model");
    };
    assert_eq!(
        model.get_node(ctx.place).map(|node| node.position()),
        Some(Point::new(7.0, 7.0))
    );
    assert_eq!(
        *events[1],
        Event::UpdateUndoRedo {
            can_undo: true,
            can_redo: false
        }
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn spectator_keeps_session_alive_until_its_own_grace_ends(ctx: Ctx) {
    let (tx_c, _rx_c) = channel();
    let (tx_s, _rx_s) = channel();
    let collaborator = ctx.registry.join(ctx.model_id.clone(), tx_c).await.expect("join");
    let spectator = ctx.registry.watch(ctx.model_id.clone(), tx_s).await.expect("watch");

    collaborator.leave().await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    settle().await;
    assert!(ctx.registry.is_open(&ctx.model_id).await);

    spectator.leave().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert!(ctx.registry.is_open(&ctx.model_id).await);

    tokio::time::sleep(Duration::from_secs(31)).await;
    settle().await;
    assert!(!ctx.registry.is_open(&ctx.model_id).await);
}

#[rstest]
#[tokio::test]
async fn dropping_a_handle_detaches_it(ctx: Ctx) {
    let (tx, _rx) = channel();
    let handle = ctx.registry.join(ctx.model_id.clone(), tx).await.expect("join");
    assert_eq!(ctx.registry.member_counts(&ctx.model_id).await, Some((1, 1)));

    drop(handle);
    settle().await;
    assert_eq!(ctx.registry.member_counts(&ctx.model_id).await, Some((0, 0)));
}
