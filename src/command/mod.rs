// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation commands for process models.
//!
//! A [`ModelCommand`] is the wire-level description of one intended change. Executing it against
//! a model yields an [`AppliedCommand`] holding the state captured during execution (assigned ids,
//! removed nodes, prior field values). Undo and redo replay that captured state, so a redone
//! `create_node` gets back the id it had originally.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use thiserror::Error;

use crate::model::{
    Edge, EdgeId, EdgeParams, ModelError, ModelId, Node, NodeId, NodeParams, Point, ProcessModel,
};
use crate::store::{ModelStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "command_type", rename_all = "snake_case")]
pub enum ModelCommand {
    CreateNode {
        x: f64,
        y: f64,
        #[serde(default)]
        node_kwargs: NodeParams,
    },
    DeleteNode {
        node_id: NodeId,
    },
    MoveNode {
        node_id: NodeId,
        x: f64,
        y: f64,
    },
    CreateEdge {
        start_node_id: NodeId,
        end_node_id: NodeId,
        #[serde(default)]
        edge_kwargs: EdgeParams,
    },
    DeleteEdge {
        edge_id: EdgeId,
    },
    UpdateInspectableFields {
        node_id: NodeId,
        #[serde(default)]
        node_kwargs: BTreeMap<String, Value>,
    },
    ClearModel,
    /// Writes the model to the store. `path` saves a copy under another id.
    SaveModel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[schemars(with = "Option<String>")]
        path: Option<ModelId>,
    },
}

impl ModelCommand {
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::CreateNode { .. } => "create_node",
            Self::DeleteNode { .. } => "delete_node",
            Self::MoveNode { .. } => "move_node",
            Self::CreateEdge { .. } => "create_edge",
            Self::DeleteEdge { .. } => "delete_edge",
            Self::UpdateInspectableFields { .. } => "update_inspectable_fields",
            Self::ClearModel => "clear_model",
            Self::SaveModel { .. } => "save_model",
        }
    }

    pub fn is_undoable(&self) -> bool {
        !matches!(self, Self::SaveModel { .. })
    }

    pub fn is_save(&self) -> bool {
        matches!(self, Self::SaveModel { .. })
    }

    /// Validates and applies the command.
    ///
    /// On error the model is unchanged. Undoable commands return their captured state in
    /// [`Executed::applied`].
    pub fn execute(
        self,
        model: &mut ProcessModel,
        store: &dyn ModelStore,
    ) -> Result<Executed, CommandError> {
        let (output, applied) = match self {
            Self::CreateNode { x, y, node_kwargs } => {
                let node = model.add_node(Point::new(x, y), &node_kwargs)?;
                (
                    CommandOutput::Node(node.clone()),
                    AppliedCommand::CreateNode { node },
                )
            }
            Self::DeleteNode { node_id } => {
                let (node, edges) = model.delete_node(node_id)?;
                (CommandOutput::None, AppliedCommand::DeleteNode { node, edges })
            }
            Self::MoveNode { node_id, x, y } => {
                let to = Point::new(x, y);
                let from = model.move_node(node_id, to)?;
                (
                    CommandOutput::None,
                    AppliedCommand::MoveNode { node_id, from, to },
                )
            }
            Self::CreateEdge {
                start_node_id,
                end_node_id,
                edge_kwargs,
            } => {
                let edge = model.add_edge(start_node_id, end_node_id, &edge_kwargs)?;
                (
                    CommandOutput::Edge(edge.clone()),
                    AppliedCommand::CreateEdge { edge },
                )
            }
            Self::DeleteEdge { edge_id } => {
                let edge = model
                    .delete_edge(edge_id)
                    .ok_or(CommandError::EdgeNotFound(edge_id))?;
                (CommandOutput::None, AppliedCommand::DeleteEdge { edge })
            }
            Self::UpdateInspectableFields {
                node_id,
                node_kwargs,
            } => {
                let previous = model.update_node_fields(node_id, &node_kwargs)?;
                let next = node_kwargs
                    .into_iter()
                    .filter(|(name, _)| previous.contains_key(name))
                    .collect();
                (
                    CommandOutput::None,
                    AppliedCommand::UpdateInspectableFields {
                        node_id,
                        previous,
                        next,
                    },
                )
            }
            Self::ClearModel => {
                let (nodes, edges) = model.clear();
                (CommandOutput::None, AppliedCommand::ClearModel { nodes, edges })
            }
            Self::SaveModel { path } => {
                let saved_as = match path {
                    Some(id) => {
                        store.save(&model.with_id(id.clone()))?;
                        id
                    }
                    None => {
                        store.save(model)?;
                        model.id().clone()
                    }
                };
                return Ok(Executed {
                    output: CommandOutput::Saved(saved_as),
                    applied: None,
                });
            }
        };

        Ok(Executed {
            output,
            applied: Some(applied),
        })
    }
}

/// Result handed back to the caller of [`ModelCommand::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    None,
    Node(Node),
    /// `None` when the model rejected the edge; not an error.
    Edge(Option<Edge>),
    Saved(ModelId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub output: CommandOutput,
    pub applied: Option<AppliedCommand>,
}

/// An executed undoable command together with the state needed to reverse and replay it.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedCommand {
    CreateNode {
        node: Node,
    },
    DeleteNode {
        node: Node,
        edges: SmallVec<[Edge; 4]>,
    },
    MoveNode {
        node_id: NodeId,
        from: Point,
        to: Point,
    },
    CreateEdge {
        edge: Option<Edge>,
    },
    DeleteEdge {
        edge: Edge,
    },
    UpdateInspectableFields {
        node_id: NodeId,
        previous: BTreeMap<String, Value>,
        next: BTreeMap<String, Value>,
    },
    ClearModel {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    },
}

impl AppliedCommand {
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::CreateNode { .. } => "create_node",
            Self::DeleteNode { .. } => "delete_node",
            Self::MoveNode { .. } => "move_node",
            Self::CreateEdge { .. } => "create_edge",
            Self::DeleteEdge { .. } => "delete_edge",
            Self::UpdateInspectableFields { .. } => "update_inspectable_fields",
            Self::ClearModel { .. } => "clear_model",
        }
    }

    pub fn undo(&self, model: &mut ProcessModel) -> Result<(), CommandError> {
        match self {
            Self::CreateNode { node } => {
                model.delete_node(node.id())?;
            }
            Self::DeleteNode { node, edges } => {
                model.insert_node(node.clone())?;
                restore_edges(model, edges.iter())?;
            }
            Self::MoveNode { node_id, from, .. } => {
                model.move_node(*node_id, *from)?;
            }
            Self::CreateEdge { edge } => {
                if let Some(edge) = edge {
                    model.delete_edge(edge.id());
                }
            }
            Self::DeleteEdge { edge } => {
                restore_edges(model, std::iter::once(edge))?;
            }
            Self::UpdateInspectableFields {
                node_id, previous, ..
            } => {
                model.update_node_fields(*node_id, previous)?;
            }
            Self::ClearModel { nodes, edges } => {
                for node in nodes {
                    model.insert_node(node.clone())?;
                }
                restore_edges(model, edges.iter())?;
            }
        }
        Ok(())
    }

    /// Reapplies the captured effect. Never allocates new ids.
    pub fn redo(&self, model: &mut ProcessModel) -> Result<(), CommandError> {
        match self {
            Self::CreateNode { node } => {
                model.insert_node(node.clone())?;
            }
            Self::DeleteNode { node, .. } => {
                model.delete_node(node.id())?;
            }
            Self::MoveNode { node_id, to, .. } => {
                model.move_node(*node_id, *to)?;
            }
            Self::CreateEdge { edge } => {
                if let Some(edge) = edge {
                    restore_edges(model, std::iter::once(edge))?;
                }
            }
            Self::DeleteEdge { edge } => {
                model
                    .delete_edge(edge.id())
                    .ok_or(CommandError::EdgeNotFound(edge.id()))?;
            }
            Self::UpdateInspectableFields { node_id, next, .. } => {
                model.update_node_fields(*node_id, next)?;
            }
            Self::ClearModel { .. } => {
                model.clear();
            }
        }
        Ok(())
    }
}

fn restore_edges<'a>(
    model: &mut ProcessModel,
    edges: impl Iterator<Item = &'a Edge>,
) -> Result<(), CommandError> {
    for edge in edges {
        if !model.insert_edge(edge.clone()) {
            return Err(CommandError::EdgeRejected(edge.id()));
        }
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),
    #[error("edge {0} cannot be restored")]
    EdgeRejected(EdgeId),
    #[error(transparent)]
    Model(ModelError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_) | Self::EdgeNotFound(_) | Self::Store(StoreError::NotFound { .. })
        )
    }
}

impl From<ModelError> for CommandError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NodeNotFound(node_id) => Self::NodeNotFound(node_id),
            other => Self::Model(other),
        }
    }
}

#[cfg(test)]
mod tests;
