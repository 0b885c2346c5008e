// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dcr_graph::{self, DcrGraphEdge, DcrGraphNode};
use super::flowchart::{self, FlowchartEdge, FlowchartNode};
use super::ids::NodeId;
use super::node::{Edge, EdgeData, EdgeParams, EdgeRepr, Node, NodeData, NodeParams, NodeRepr};
use super::petri_net::{self, PetriNetEdge, PetriNetNode};
use super::process_model::ModelError;

/// The type of process model. Fixed for the life of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    PetriNet,
    DcrGraph,
    Flowchart,
}

impl ModelType {
    pub const ALL: [Self; 3] = [Self::PetriNet, Self::DcrGraph, Self::Flowchart];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PetriNet => "petri_net",
            Self::DcrGraph => "dcr_graph",
            Self::Flowchart => "flowchart",
        }
    }

    /// Human readable name (`Petri net`).
    pub fn label(self) -> &'static str {
        self.table().label
    }

    pub fn table(self) -> &'static ModelTypeTable {
        match self {
            Self::PetriNet => &PETRI_NET,
            Self::DcrGraph => &DCR_GRAPH,
            Self::Flowchart => &FLOWCHART,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = UnknownModelType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownModelType(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model type '{0}' (expected petri_net, dcr_graph or flowchart)")]
pub struct UnknownModelType(pub String);

/// Dispatch table entry: everything that differs between model types.
pub struct ModelTypeTable {
    pub model_type: ModelType,
    pub label: &'static str,
    build_node: fn(NodeId, &NodeParams) -> Result<NodeData, ModelError>,
    build_edge: fn(&EdgeParams) -> Result<EdgeData, ModelError>,
    edge_policy: fn(&Node, &Node) -> bool,
    decode_node: fn(Value) -> Result<Node, serde_json::Error>,
    decode_edge: fn(Value) -> Result<Edge, serde_json::Error>,
}

impl ModelTypeTable {
    pub fn build_node(&self, node_id: NodeId, params: &NodeParams) -> Result<NodeData, ModelError> {
        (self.build_node)(node_id, params)
    }

    pub fn build_edge(&self, params: &EdgeParams) -> Result<EdgeData, ModelError> {
        (self.build_edge)(params)
    }

    /// Variant-specific structural rule, checked after the generic ones (endpoints exist, no
    /// self loop, no duplicate).
    pub fn allows_edge(&self, start: &Node, end: &Node) -> bool {
        (self.edge_policy)(start, end)
    }

    pub fn decode_node(&self, value: Value) -> Result<Node, serde_json::Error> {
        (self.decode_node)(value)
    }

    pub fn decode_edge(&self, value: Value) -> Result<Edge, serde_json::Error> {
        (self.decode_edge)(value)
    }
}

fn decode_node<T>(value: Value) -> Result<Node, serde_json::Error>
where
    T: DeserializeOwned + Into<NodeData>,
{
    let repr: NodeRepr<T> = serde_json::from_value(value)?;
    Ok(Node::new(repr.id, repr.position, repr.data.into()))
}

fn decode_edge<T>(value: Value) -> Result<Edge, serde_json::Error>
where
    T: DeserializeOwned + Into<EdgeData>,
{
    let repr: EdgeRepr<T> = serde_json::from_value(value)?;
    Ok(Edge::new(repr.start_node_id, repr.end_node_id, repr.data.into()))
}

static PETRI_NET: ModelTypeTable = ModelTypeTable {
    model_type: ModelType::PetriNet,
    label: "Petri net",
    build_node: petri_net::build_node,
    build_edge: petri_net::build_edge,
    edge_policy: petri_net::allows_edge,
    decode_node: decode_node::<PetriNetNode>,
    decode_edge: decode_edge::<PetriNetEdge>,
};

static DCR_GRAPH: ModelTypeTable = ModelTypeTable {
    model_type: ModelType::DcrGraph,
    label: "DCR graph",
    build_node: dcr_graph::build_node,
    build_edge: dcr_graph::build_edge,
    edge_policy: dcr_graph::allows_edge,
    decode_node: decode_node::<DcrGraphNode>,
    decode_edge: decode_edge::<DcrGraphEdge>,
};

static FLOWCHART: ModelTypeTable = ModelTypeTable {
    model_type: ModelType::Flowchart,
    label: "Flowchart",
    build_node: flowchart::build_node,
    build_edge: flowchart::build_edge,
    edge_policy: flowchart::allows_edge,
    decode_node: decode_node::<FlowchartNode>,
    decode_edge: decode_edge::<FlowchartEdge>,
};
