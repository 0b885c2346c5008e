// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::NodeId;
use super::inspect::{expect_text, FieldSet, InspectError, Inspectable};
use super::node::{EdgeData, EdgeParams, Node, NodeData, NodeParams};
use super::process_model::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcrGraphNode {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl FieldSet for DcrGraphNode {
    fn fields(&self) -> Vec<Inspectable> {
        vec![
            Inspectable::text("name", &self.name),
            Inspectable::text("description", &self.description),
        ]
    }

    fn set_field(&mut self, name: &str, value: &Value) -> Result<bool, InspectError> {
        match name {
            "name" => self.name = expect_text(name, value)?,
            "description" => self.description = expect_text(name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcrGraphEdge {}

pub(super) fn build_node(node_id: NodeId, params: &NodeParams) -> Result<NodeData, ModelError> {
    Ok(NodeData::DcrGraph(DcrGraphNode {
        name: params.name.clone().unwrap_or_else(|| format!("Node #{node_id}")),
        description: String::new(),
    }))
}

pub(super) fn build_edge(_params: &EdgeParams) -> Result<EdgeData, ModelError> {
    Ok(EdgeData::DcrGraph(DcrGraphEdge {}))
}

pub(super) fn allows_edge(_start: &Node, _end: &Node) -> bool {
    true
}
