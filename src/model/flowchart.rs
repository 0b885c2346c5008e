// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::NodeId;
use super::inspect::{expect_choice, expect_text, FieldSet, InspectError, Inspectable};
use super::node::{EdgeData, EdgeParams, Node, NodeData, NodeParams};
use super::process_model::ModelError;
use super::ModelType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlowchartNodeType {
    #[default]
    Start,
    End,
    Task,
    Decision,
    Subprocess,
}

impl FlowchartNodeType {
    pub const ALL: [Self; 5] = [Self::Start, Self::End, Self::Task, Self::Decision, Self::Subprocess];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Task => "task",
            Self::Decision => "decision",
            Self::Subprocess => "subprocess",
        }
    }
}

impl FromStr for FlowchartNodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowchartNode {
    pub name: String,
    #[serde(default)]
    pub node_type: FlowchartNodeType,
    #[serde(default)]
    pub description: String,
}

impl FieldSet for FlowchartNode {
    fn fields(&self) -> Vec<Inspectable> {
        let node_types = FlowchartNodeType::ALL.map(FlowchartNodeType::as_str);
        vec![
            Inspectable::text("name", &self.name),
            Inspectable::choice("node_type", self.node_type.as_str(), &node_types),
            Inspectable::text("description", &self.description),
        ]
    }

    fn set_field(&mut self, name: &str, value: &Value) -> Result<bool, InspectError> {
        match name {
            "name" => self.name = expect_text(name, value)?,
            "node_type" => {
                let node_types = FlowchartNodeType::ALL.map(FlowchartNodeType::as_str);
                let raw = expect_choice(name, value, &node_types)?;
                self.node_type = raw.parse().unwrap_or_default();
            }
            "description" => self.description = expect_text(name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowchartEdge {}

pub(super) fn build_node(node_id: NodeId, params: &NodeParams) -> Result<NodeData, ModelError> {
    let node_type = match params.node_type.as_deref() {
        None => FlowchartNodeType::default(),
        Some(raw) => raw.parse().map_err(|()| ModelError::InvalidNodeParams {
            model_type: ModelType::Flowchart,
            reason: format!("unknown node_type '{raw}'"),
        })?,
    };

    Ok(NodeData::Flowchart(FlowchartNode {
        name: params.name.clone().unwrap_or_else(|| format!("Node #{node_id}")),
        node_type,
        description: String::new(),
    }))
}

pub(super) fn build_edge(_params: &EdgeParams) -> Result<EdgeData, ModelError> {
    Ok(EdgeData::Flowchart(FlowchartEdge {}))
}

pub(super) fn allows_edge(_start: &Node, _end: &Node) -> bool {
    true
}
