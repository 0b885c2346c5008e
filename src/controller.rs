// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use serde::Serialize;

use crate::command::{CommandError, CommandOutput, ModelCommand};
use crate::history::CommandHistory;
use crate::model::ProcessModel;
use crate::store::ModelStore;

/// The single mutation entry point for one model: binds it to its history and its store.
pub struct ModelController {
    model: ProcessModel,
    history: CommandHistory,
    store: Arc<dyn ModelStore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UndoRedoState {
    pub can_undo: bool,
    pub can_redo: bool,
}

impl ModelController {
    pub fn new(model: ProcessModel, store: Arc<dyn ModelStore>) -> Self {
        Self {
            model,
            history: CommandHistory::new(),
            store,
        }
    }

    pub fn model(&self) -> &ProcessModel {
        &self.model
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn execute(&mut self, command: ModelCommand) -> Result<CommandOutput, CommandError> {
        self.history
            .execute(command, &mut self.model, self.store.as_ref())
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        self.history.undo(&mut self.model)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        self.history.redo(&mut self.model)
    }

    /// Forgets the history; the model is left as is.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn undo_redo_state(&self) -> UndoRedoState {
        UndoRedoState {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }
}
