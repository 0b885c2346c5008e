// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Process model graphs.
//!
//! One generic [`ProcessModel`] container holds nodes and edges of a single [`ModelType`]
//! (Petri net, DCR graph or flowchart). Per-type behavior lives in the variant modules and is
//! reached through the dispatch table in [`kind`].

pub mod dcr_graph;
pub mod flowchart;
pub mod ids;
pub mod inspect;
pub mod kind;
pub mod node;
pub mod petri_net;
pub mod process_model;

pub use dcr_graph::{DcrGraphEdge, DcrGraphNode};
pub use flowchart::{FlowchartEdge, FlowchartNode, FlowchartNodeType};
pub use ids::{EdgeId, IdError, ModelId, NodeId};
pub use inspect::{FieldKind, FieldSet, InspectError, Inspectable};
pub use kind::{ModelType, ModelTypeTable, UnknownModelType};
pub use node::{Edge, EdgeData, EdgeParams, Node, NodeData, NodeParams, Point};
pub use petri_net::{PetriNetEdge, PetriNetNode, PetriNodeType};
pub use process_model::{ModelError, ProcessModel, MAX_NODE_ID};
