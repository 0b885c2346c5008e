// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use rstest::{fixture, rstest};
use serde_json::json;

use super::{CommandError, CommandOutput, ModelCommand};
use crate::model::{
    EdgeId, EdgeParams, ModelId, ModelType, NodeId, NodeParams, Point, ProcessModel,
};
use crate::store::{MemoryStore, ModelStore};

struct Net {
    model: ProcessModel,
    place: NodeId,
    transition: NodeId,
}

#[fixture]
fn net() -> Net {
    let mut model = ProcessModel::new(ModelId::new("nets/cmd").expect("id"), ModelType::PetriNet);
    let place = model
        .add_node(Point::new(0.0, 0.0), &NodeParams::with_node_type("place"))
        .expect("place")
        .id();
    let transition = model
        .add_node(Point::new(10.0, 10.0), &NodeParams::with_node_type("transition"))
        .expect("transition")
        .id();
    model
        .add_edge(place, transition, &EdgeParams::default())
        .expect("edge");
    Net {
        model,
        place,
        transition,
    }
}

fn commands_for(net: &Net) -> Vec<ModelCommand> {
    vec![
        ModelCommand::CreateNode {
            x: 5.0,
            y: 6.0,
            node_kwargs: NodeParams::with_node_type("place"),
        },
        ModelCommand::DeleteNode {
            node_id: net.place,
        },
        ModelCommand::DeleteNode {
            node_id: net.transition,
        },
        ModelCommand::MoveNode {
            node_id: net.place,
            x: -3.0,
            y: 4.5,
        },
        ModelCommand::CreateEdge {
            start_node_id: net.transition,
            end_node_id: net.place,
            edge_kwargs: EdgeParams { ball_count: Some(2) },
        },
        ModelCommand::DeleteEdge {
            edge_id: EdgeId::new(net.place, net.transition),
        },
        ModelCommand::UpdateInspectableFields {
            node_id: net.place,
            node_kwargs: BTreeMap::from([
                ("name".to_owned(), json!("Inbox")),
                ("ball_count".to_owned(), json!(3)),
                ("id".to_owned(), json!(1)),
            ]),
        },
        ModelCommand::ClearModel,
    ]
}

#[rstest]
#[case::create_node(0)]
#[case::delete_place(1)]
#[case::delete_transition(2)]
#[case::move_node(3)]
#[case::create_edge(4)]
#[case::delete_edge(5)]
#[case::update_fields(6)]
#[case::clear_model(7)]
fn undo_restores_and_redo_replays(net: Net, #[case] index: usize) {
    let store = MemoryStore::new();
    let command = commands_for(&net).swap_remove(index);
    let before = net.model.clone();
    let mut model = net.model;

    let executed = command.execute(&mut model, &store).expect("execute");
    let after = model.clone();
    assert_ne!(after, before, "command should change the model");
    let applied = executed.applied.expect("undoable");

    applied.undo(&mut model).expect("undo");
    assert_eq!(model, before);

    applied.redo(&mut model).expect("redo");
    assert_eq!(model, after);
}

#[rstest]
fn redo_of_create_node_keeps_the_assigned_id(net: Net) {
    let store = MemoryStore::new();
    let mut model = net.model;
    let executed = ModelCommand::CreateNode {
        x: 1.0,
        y: 1.0,
        node_kwargs: NodeParams::with_node_type("transition"),
    }
    .execute(&mut model, &store)
    .expect("execute");
    let CommandOutput::Node(created) = executed.output else {
        panic!("expected node output");
    };
    let applied = executed.applied.expect("undoable");

    for _ in 0..5 {
        applied.undo(&mut model).expect("undo");
        assert!(!model.contains_node(created.id()));
        applied.redo(&mut model).expect("redo");
        assert_eq!(model.get_node(created.id()), Some(&created));
    }
}

#[rstest]
fn rejected_edge_is_a_recorded_no_op(net: Net) {
    let store = MemoryStore::new();
    let mut model = net.model;
    let before = model.clone();

    let executed = ModelCommand::CreateEdge {
        start_node_id: net.place,
        end_node_id: net.transition,
        edge_kwargs: EdgeParams::default(),
    }
    .execute(&mut model, &store)
    .expect("duplicate is not an error");

    assert_eq!(executed.output, CommandOutput::Edge(None));
    let applied = executed.applied.expect("still undoable");
    applied.undo(&mut model).expect("undo");
    applied.redo(&mut model).expect("redo");
    assert_eq!(model, before);
}

#[rstest]
#[case::delete_node(ModelCommand::DeleteNode { node_id: NodeId(20_000) })]
#[case::move_node(ModelCommand::MoveNode { node_id: NodeId(20_000), x: 0.0, y: 0.0 })]
#[case::update_fields(ModelCommand::UpdateInspectableFields {
    node_id: NodeId(20_000),
    node_kwargs: BTreeMap::new(),
})]
#[case::create_edge(ModelCommand::CreateEdge {
    start_node_id: NodeId(20_000),
    end_node_id: NodeId(20_001),
    edge_kwargs: EdgeParams::default(),
})]
#[case::delete_edge(ModelCommand::DeleteEdge { edge_id: EdgeId::new(NodeId(20_000), NodeId(20_001)) })]
fn missing_ids_are_not_found(net: Net, #[case] command: ModelCommand) {
    let store = MemoryStore::new();
    let mut model = net.model;
    let before = model.clone();

    let err = command.execute(&mut model, &store).expect_err("not found");
    assert!(err.is_not_found(), "{err}");
    assert_eq!(model, before);
}

#[rstest]
fn invalid_field_value_leaves_node_untouched(net: Net) {
    let store = MemoryStore::new();
    let mut model = net.model;
    let before = model.clone();

    let err = ModelCommand::UpdateInspectableFields {
        node_id: net.place,
        node_kwargs: BTreeMap::from([
            ("name".to_owned(), json!("Renamed")),
            ("ball_count".to_owned(), json!("many")),
        ]),
    }
    .execute(&mut model, &store)
    .expect_err("invalid value");

    assert!(matches!(err, CommandError::Model(_)));
    assert_eq!(model, before);
}

#[rstest]
fn save_model_is_not_undoable_and_supports_save_as(net: Net) {
    let store = MemoryStore::new();
    let mut model = net.model;

    let executed = ModelCommand::SaveModel { path: None }
        .execute(&mut model, &store)
        .expect("save");
    assert!(executed.applied.is_none());
    assert_eq!(executed.output, CommandOutput::Saved(model.id().clone()));
    assert_eq!(store.get(model.id()).as_ref(), Some(&model));

    let copy_id = ModelId::new("nets/copy").expect("id");
    ModelCommand::SaveModel {
        path: Some(copy_id.clone()),
    }
    .execute(&mut model, &store)
    .expect("save as");
    let copy = store.load(&copy_id).expect("copy");
    assert_eq!(copy.id(), &copy_id);
    assert_eq!(copy.node_count(), model.node_count());
    assert_eq!(model.id().as_str(), "nets/cmd");
}

#[test]
fn commands_decode_from_tagged_json() {
    let command: ModelCommand = serde_json::from_value(json!({
        "command_type": "create_edge",
        "start_node_id": 1,
        "end_node_id": 2
    }))
    .expect("decode");
    assert_eq!(
        command,
        ModelCommand::CreateEdge {
            start_node_id: NodeId(1),
            end_node_id: NodeId(2),
            edge_kwargs: EdgeParams::default(),
        }
    );

    let command: ModelCommand = serde_json::from_value(json!({
        "command_type": "delete_edge",
        "edge_id": [3, 4]
    }))
    .expect("decode");
    assert_eq!(command.command_type(), "delete_edge");

    assert!(serde_json::from_value::<ModelCommand>(json!({ "command_type": "explode" })).is_err());
}
