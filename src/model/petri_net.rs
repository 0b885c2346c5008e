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
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::NodeId;
use super::inspect::{expect_count, expect_text, FieldSet, InspectError, Inspectable};
use super::node::{EdgeData, EdgeParams, Node, NodeData, NodeParams};
use super::process_model::ModelError;
use super::ModelType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PetriNodeType {
    Place,
    Transition,
}

impl PetriNodeType {
    pub const ALL: [Self; 2] = [Self::Place, Self::Transition];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Transition => "transition",
        }
    }
}

impl fmt::Display for PetriNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetriNodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetriNetNode {
    pub name: String,
    pub node_type: PetriNodeType,
    #[serde(default)]
    pub ball_count: u32,
    #[serde(default)]
    pub accepting_state: String,
}

impl FieldSet for PetriNetNode {
    fn fields(&self) -> Vec<Inspectable> {
        let node_types = PetriNodeType::ALL.map(PetriNodeType::as_str);
        vec![
            Inspectable::text("name", &self.name),
            // Changing the type would break place/transition alternation of existing arcs.
            Inspectable::choice("node_type", self.node_type.as_str(), &node_types).read_only(),
            Inspectable::number("ball_count", self.ball_count),
            Inspectable::text("accepting_state", &self.accepting_state),
        ]
    }

    fn set_field(&mut self, name: &str, value: &Value) -> Result<bool, InspectError> {
        match name {
            "name" => self.name = expect_text(name, value)?,
            "ball_count" => self.ball_count = expect_count(name, value)?,
            "accepting_state" => self.accepting_state = expect_text(name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Arc between a place and a transition; `ball_count` is the arc weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetriNetEdge {
    #[serde(default)]
    pub ball_count: u32,
}

pub(super) fn build_node(node_id: NodeId, params: &NodeParams) -> Result<NodeData, ModelError> {
    let Some(raw) = params.node_type.as_deref() else {
        return Err(ModelError::InvalidNodeParams {
            model_type: ModelType::PetriNet,
            reason: "node_type is required (place or transition)".to_owned(),
        });
    };
    let node_type = raw.parse::<PetriNodeType>().map_err(|()| ModelError::InvalidNodeParams {
        model_type: ModelType::PetriNet,
        reason: format!("unknown node_type '{raw}'"),
    })?;

    Ok(NodeData::PetriNet(PetriNetNode {
        name: params.name.clone().unwrap_or_else(|| format!("Node#{node_id}")),
        node_type,
        ball_count: 0,
        accepting_state: String::new(),
    }))
}

pub(super) fn build_edge(params: &EdgeParams) -> Result<EdgeData, ModelError> {
    Ok(EdgeData::PetriNet(PetriNetEdge {
        ball_count: params.ball_count.unwrap_or(0),
    }))
}

/// Places connect only to transitions and transitions only to places.
pub(super) fn allows_edge(start: &Node, end: &Node) -> bool {
    match (start.data(), end.data()) {
        (NodeData::PetriNet(start), NodeData::PetriNet(end)) => start.node_type != end.node_type,
        _ => false,
    }
}
