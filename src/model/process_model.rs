// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use thiserror::Error;

use super::ids::{EdgeId, ModelId, NodeId};
use super::inspect::InspectError;
use super::node::{Edge, EdgeParams, Node, NodeParams, Point};
use super::ModelType;

/// Node ids are drawn from `0..=MAX_NODE_ID`.
pub const MAX_NODE_ID: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("no free node id left (ids range over 0..={max})")]
    IdSpaceExhausted { max: u32 },
    #[error("invalid node parameters for {model_type}: {reason}")]
    InvalidNodeParams { model_type: ModelType, reason: String },
    #[error("{found} data cannot be stored in a {expected} model")]
    VariantMismatch {
        expected: ModelType,
        found: ModelType,
    },
    #[error("position ({x}, {y}) is not finite")]
    NonFinitePosition { x: f64, y: f64 },
    #[error(transparent)]
    Inspect(#[from] InspectError),
    #[error("invalid model: {reason}")]
    Invalid { reason: String },
}

impl ModelError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// A typed process graph.
///
/// The container is shared by every model type; `model_type` selects the node and edge
/// factories and the edge policy from its dispatch table and never changes.
///
/// Invariants kept by every mutating method:
/// - every edge's endpoints exist in `nodes`
/// - no self loops and no duplicate `(start, end)` pairs
/// - every node and edge belongs to the model's own variant
/// - the edge policy of the model type holds for every edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProcessModelRepr")]
pub struct ProcessModel {
    id: ModelId,
    model_type: ModelType,
    nodes: BTreeMap<NodeId, Node>,
    #[serde(serialize_with = "serialize_edges")]
    edges: BTreeMap<EdgeId, Edge>,
}

impl ProcessModel {
    pub fn new(id: ModelId, model_type: ModelType) -> Self {
        Self {
            id,
            model_type,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Copy of this model stored under another id.
    pub fn with_id(&self, id: ModelId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn get_edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    pub fn get_nodes(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn get_edges(&self) -> impl ExactSizeIterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn add_node(&mut self, position: Point, params: &NodeParams) -> Result<Node, ModelError> {
        self.add_node_with_rng(&mut rand::thread_rng(), position, params)
    }

    /// Allocates a fresh id by random probing, builds the variant node and inserts it.
    pub fn add_node_with_rng<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        position: Point,
        params: &NodeParams,
    ) -> Result<Node, ModelError> {
        ensure_finite(position)?;
        let node_id = self.new_node_id(rng)?;
        let data = self.model_type.table().build_node(node_id, params)?;
        let node = Node::new(node_id, position, data);
        self.nodes.insert(node_id, node.clone());
        Ok(node)
    }

    fn new_node_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<NodeId, ModelError> {
        if self.nodes.len() > MAX_NODE_ID as usize {
            return Err(ModelError::IdSpaceExhausted { max: MAX_NODE_ID });
        }
        loop {
            let candidate = NodeId(rng.gen_range(0..=MAX_NODE_ID));
            if !self.nodes.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Re-inserts a node captured earlier, keeping its id.
    pub fn insert_node(&mut self, node: Node) -> Result<(), ModelError> {
        self.check_variant(node.model_type())?;
        ensure_finite(node.position())?;
        if self.nodes.contains_key(&node.id()) {
            return Err(ModelError::DuplicateNode(node.id()));
        }
        self.nodes.insert(node.id(), node);
        Ok(())
    }

    /// Removes the node and every edge touching it in either direction.
    ///
    /// Returns the removed node and edges so the caller can restore them.
    pub fn delete_node(
        &mut self,
        node_id: NodeId,
    ) -> Result<(Node, SmallVec<[Edge; 4]>), ModelError> {
        let node = self
            .nodes
            .remove(&node_id)
            .ok_or(ModelError::NodeNotFound(node_id))?;

        let touching = self
            .edges
            .keys()
            .copied()
            .filter(|edge_id| edge_id.touches(node_id))
            .collect::<SmallVec<[EdgeId; 4]>>();
        let removed = touching
            .into_iter()
            .filter_map(|edge_id| self.edges.remove(&edge_id))
            .collect();

        Ok((node, removed))
    }

    /// Returns the previous position.
    pub fn move_node(&mut self, node_id: NodeId, position: Point) -> Result<Point, ModelError> {
        ensure_finite(position)?;
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(ModelError::NodeNotFound(node_id))?;
        let previous = node.position();
        node.set_position(position);
        Ok(previous)
    }

    /// Applies an inspector patch to one node and returns the prior values of the written
    /// fields.
    pub fn update_node_fields(
        &mut self,
        node_id: NodeId,
        patch: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, ModelError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(ModelError::NodeNotFound(node_id))?;
        Ok(node.patch_fields(patch)?)
    }

    /// Builds a candidate edge and inserts it if the model accepts it.
    ///
    /// A missing endpoint is an error. A self loop, a duplicate or a policy rejection yields
    /// `Ok(None)` and leaves the model untouched.
    pub fn add_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        params: &EdgeParams,
    ) -> Result<Option<Edge>, ModelError> {
        for node_id in [start, end] {
            if !self.nodes.contains_key(&node_id) {
                return Err(ModelError::NodeNotFound(node_id));
            }
        }

        let data = self.model_type.table().build_edge(params)?;
        let edge = Edge::new(start, end, data);
        if !self.is_valid_edge(&edge) {
            return Ok(None);
        }
        self.edges.insert(edge.id(), edge.clone());
        Ok(Some(edge))
    }

    /// Re-inserts an edge captured earlier. Returns `false` if the edge is no longer valid.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        if !self.is_valid_edge(&edge) {
            return false;
        }
        self.edges.insert(edge.id(), edge);
        true
    }

    pub fn is_valid_edge(&self, edge: &Edge) -> bool {
        let (Some(start), Some(end)) = (
            self.nodes.get(&edge.start_node_id()),
            self.nodes.get(&edge.end_node_id()),
        ) else {
            return false;
        };

        edge.start_node_id() != edge.end_node_id()
            && !self.edges.contains_key(&edge.id())
            && edge.data().model_type() == self.model_type
            && self.model_type.table().allows_edge(start, end)
    }

    /// No-op if the edge is absent.
    pub fn delete_edge(&mut self, edge_id: EdgeId) -> Option<Edge> {
        self.edges.remove(&edge_id)
    }

    /// Removes everything and hands back what was removed.
    pub fn clear(&mut self) -> (Vec<Node>, Vec<Edge>) {
        let nodes = std::mem::take(&mut self.nodes).into_values().collect();
        let edges = std::mem::take(&mut self.edges).into_values().collect();
        (nodes, edges)
    }

    fn check_variant(&self, found: ModelType) -> Result<(), ModelError> {
        if found == self.model_type {
            Ok(())
        } else {
            Err(ModelError::VariantMismatch {
                expected: self.model_type,
                found,
            })
        }
    }
}

fn ensure_finite(position: Point) -> Result<(), ModelError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonFinitePosition {
            x: position.x,
            y: position.y,
        })
    }
}

fn serialize_edges<S: Serializer>(
    edges: &BTreeMap<EdgeId, Edge>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(edges.values())
}

/// Stored shape. Nodes and edges stay raw until `model_type` picks their decoder.
#[derive(Deserialize)]
struct ProcessModelRepr {
    id: ModelId,
    model_type: ModelType,
    #[serde(default)]
    nodes: BTreeMap<NodeId, Value>,
    #[serde(default)]
    edges: Vec<Value>,
}

impl TryFrom<ProcessModelRepr> for ProcessModel {
    type Error = ModelError;

    fn try_from(repr: ProcessModelRepr) -> Result<Self, Self::Error> {
        let table = repr.model_type.table();
        let mut model = ProcessModel::new(repr.id, repr.model_type);

        for (key, raw) in repr.nodes {
            let node = table
                .decode_node(raw)
                .map_err(|err| ModelError::invalid(format!("node {key}: {err}")))?;
            if node.id() != key {
                return Err(ModelError::invalid(format!(
                    "node stored under key {key} has id {}",
                    node.id()
                )));
            }
            model.insert_node(node)?;
        }

        for raw in repr.edges {
            let edge = table
                .decode_edge(raw)
                .map_err(|err| ModelError::invalid(format!("edge: {err}")))?;
            let edge_id = edge.id();
            if !model.insert_edge(edge) {
                return Err(ModelError::invalid(format!(
                    "edge {edge_id} is not valid in a {} model",
                    model.model_type.label()
                )));
            }
        }

        Ok(model)
    }
}
