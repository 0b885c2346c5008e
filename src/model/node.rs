// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dcr_graph::{DcrGraphEdge, DcrGraphNode};
use super::flowchart::{FlowchartEdge, FlowchartNode};
use super::ids::{EdgeId, NodeId};
use super::inspect::{FieldSet, InspectError, Inspectable};
use super::petri_net::{PetriNetEdge, PetriNetNode};
use super::ModelType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Variant kwargs accepted when creating a node.
///
/// Which keys matter depends on the model type; unused keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NodeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NodeParams {
    pub fn with_node_type(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            name: None,
        }
    }
}

/// Variant kwargs accepted when creating an edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeData {
    PetriNet(PetriNetNode),
    DcrGraph(DcrGraphNode),
    Flowchart(FlowchartNode),
}

impl NodeData {
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::PetriNet(_) => ModelType::PetriNet,
            Self::DcrGraph(_) => ModelType::DcrGraph,
            Self::Flowchart(_) => ModelType::Flowchart,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PetriNet(node) => &node.name,
            Self::DcrGraph(node) => &node.name,
            Self::Flowchart(node) => &node.name,
        }
    }

    fn field_set(&self) -> &dyn FieldSet {
        match self {
            Self::PetriNet(node) => node,
            Self::DcrGraph(node) => node,
            Self::Flowchart(node) => node,
        }
    }

    fn field_set_mut(&mut self) -> &mut dyn FieldSet {
        match self {
            Self::PetriNet(node) => node,
            Self::DcrGraph(node) => node,
            Self::Flowchart(node) => node,
        }
    }
}

macro_rules! impl_variant_from {
    ($target:ident, $($variant:ident($source:ty)),+ $(,)?) => {
        $(
            impl From<$source> for $target {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_variant_from!(
    NodeData,
    PetriNet(PetriNetNode),
    DcrGraph(DcrGraphNode),
    Flowchart(FlowchartNode),
);

impl_variant_from!(
    EdgeData,
    PetriNet(PetriNetEdge),
    DcrGraph(DcrGraphEdge),
    Flowchart(FlowchartEdge),
);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    id: NodeId,
    position: Point,
    #[serde(flatten)]
    data: NodeData,
}

impl Node {
    pub fn new(id: NodeId, position: Point, data: NodeData) -> Self {
        Self { id, position, data }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn model_type(&self) -> ModelType {
        self.data.model_type()
    }

    /// All displayable fields, `id` and `position` first as read-only info.
    pub fn inspectables(&self) -> Vec<Inspectable> {
        let mut fields = vec![
            Inspectable::info("id", Value::from(self.id.get())),
            Inspectable::info(
                "position",
                serde_json::json!({ "x": self.position.x, "y": self.position.y }),
            ),
        ];
        fields.extend(self.data.field_set().fields());
        fields
    }

    pub fn inspectable(&self, name: &str) -> Option<Inspectable> {
        self.inspectables().into_iter().find(|field| field.name == name)
    }

    /// Applies a `{field: value}` patch to the mutable fields.
    ///
    /// Unknown and read-only names are skipped. Every value is checked before the node changes;
    /// on error the node is left untouched. Returns the prior value of each written field.
    pub fn patch_fields(
        &mut self,
        patch: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, InspectError> {
        let current = self.inspectables();
        let mut staged = self.data.clone();
        let mut previous = BTreeMap::new();

        for (name, value) in patch {
            let Some(field) = current.iter().find(|field| &field.name == name && field.mutable)
            else {
                continue;
            };
            if staged.field_set_mut().set_field(name, value)? {
                previous.insert(name.clone(), field.value.clone());
            }
        }

        self.data = staged;
        Ok(previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EdgeData {
    PetriNet(PetriNetEdge),
    DcrGraph(DcrGraphEdge),
    Flowchart(FlowchartEdge),
}

impl EdgeData {
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::PetriNet(_) => ModelType::PetriNet,
            Self::DcrGraph(_) => ModelType::DcrGraph,
            Self::Flowchart(_) => ModelType::Flowchart,
        }
    }
}

/// Immutable edge value keyed by its endpoint pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    start_node_id: NodeId,
    end_node_id: NodeId,
    #[serde(flatten)]
    data: EdgeData,
}

impl Edge {
    pub fn new(start_node_id: NodeId, end_node_id: NodeId, data: EdgeData) -> Self {
        Self {
            start_node_id,
            end_node_id,
            data,
        }
    }

    pub fn id(&self) -> EdgeId {
        EdgeId::new(self.start_node_id, self.end_node_id)
    }

    pub fn start_node_id(&self) -> NodeId {
        self.start_node_id
    }

    pub fn end_node_id(&self) -> NodeId {
        self.end_node_id
    }

    pub fn data(&self) -> &EdgeData {
        &self.data
    }
}

/// Stored shape of a node: common fields plus the variant fields flattened beside them.
#[derive(Deserialize)]
pub(super) struct NodeRepr<T> {
    pub id: NodeId,
    pub position: Point,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Deserialize)]
pub(super) struct EdgeRepr<T> {
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
    #[serde(flatten)]
    pub data: T,
}
