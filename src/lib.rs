// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! pmedit: collaborative editing of process models (Petri nets, DCR graphs, flowcharts).
//!
//! Layers, leaves first: [`model`] (typed graphs and their validity rules), [`command`] (undoable
//! mutations), [`history`] and [`controller`] (undo/redo bound to one model), [`session`] (shared
//! sessions over many connections) and [`server`] (the WebSocket front end).

pub mod command;
pub mod config;
pub mod controller;
pub mod history;
pub mod model;
pub mod server;
pub mod session;
pub mod simulation;
pub mod store;
pub mod telemetry;
