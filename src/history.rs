// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Linear undo/redo history.

use crate::command::{AppliedCommand, CommandError, CommandOutput, ModelCommand};
use crate::model::ProcessModel;
use crate::store::ModelStore;

/// `commands[..applied]` is the applied prefix; the rest is the redo tail.
///
/// Recording a new command drops the redo tail. There is no branching.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    commands: Vec<AppliedCommand>,
    applied: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `command` and records it if it is undoable. Failed commands are not recorded.
    pub fn execute(
        &mut self,
        command: ModelCommand,
        model: &mut ProcessModel,
        store: &dyn ModelStore,
    ) -> Result<CommandOutput, CommandError> {
        let executed = command.execute(model, store)?;
        if let Some(applied) = executed.applied {
            self.record(applied);
        }
        Ok(executed.output)
    }

    pub fn record(&mut self, command: AppliedCommand) {
        self.commands.truncate(self.applied);
        self.commands.push(command);
        self.applied = self.commands.len();
    }

    /// Reverts the most recent applied command. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, model: &mut ProcessModel) -> Result<bool, CommandError> {
        let Some(index) = self.applied.checked_sub(1) else {
            return Ok(false);
        };
        let Some(command) = self.commands.get(index) else {
            return Ok(false);
        };
        command.undo(model)?;
        self.applied = index;
        Ok(true)
    }

    /// Replays the first command of the redo tail. Returns `false` when the tail is empty.
    pub fn redo(&mut self, model: &mut ProcessModel) -> Result<bool, CommandError> {
        let Some(command) = self.commands.get(self.applied) else {
            return Ok(false);
        };
        command.redo(model)?;
        self.applied += 1;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.applied = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.commands.len()
    }

    /// Number of applied commands.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[AppliedCommand] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::CommandHistory;
    use crate::command::ModelCommand;
    use crate::model::{ModelId, ModelType, NodeParams, ProcessModel};
    use crate::store::MemoryStore;

    struct Ctx {
        history: CommandHistory,
        model: ProcessModel,
        store: MemoryStore,
    }

    impl Ctx {
        fn create(&mut self, x: f64) {
            self.history
                .execute(
                    ModelCommand::CreateNode {
                        x,
                        y: 0.0,
                        node_kwargs: NodeParams::default(),
                    },
                    &mut self.model,
                    &self.store,
                )
                .expect("create");
        }
    }

    #[fixture]
    fn ctx() -> Ctx {
        Ctx {
            history: CommandHistory::new(),
            model: ProcessModel::new(ModelId::new("flow").expect("id"), ModelType::Flowchart),
            store: MemoryStore::new(),
        }
    }

    #[rstest]
    fn empty_history_has_nothing_to_undo_or_redo(mut ctx: Ctx) {
        assert!(!ctx.history.can_undo());
        assert!(!ctx.history.can_redo());
        assert!(!ctx.history.undo(&mut ctx.model).expect("undo"));
        assert!(!ctx.history.redo(&mut ctx.model).expect("redo"));
    }

    #[rstest]
    fn n_undos_then_n_redos_round_trip(mut ctx: Ctx) {
        let initial = ctx.model.clone();
        for step in 0..4 {
            ctx.create(f64::from(step));
        }
        let done = ctx.model.clone();

        while ctx.history.undo(&mut ctx.model).expect("undo") {}
        assert_eq!(ctx.model, initial);
        assert_eq!(ctx.history.applied(), 0);

        while ctx.history.redo(&mut ctx.model).expect("redo") {}
        assert_eq!(ctx.model, done);
        assert_eq!(ctx.history.applied(), 4);
    }

    #[rstest]
    fn new_command_discards_redo_tail(mut ctx: Ctx) {
        ctx.create(0.0);
        ctx.create(1.0);
        ctx.history.undo(&mut ctx.model).expect("undo");
        assert!(ctx.history.can_redo());

        ctx.create(2.0);
        assert!(!ctx.history.can_redo());
        assert_eq!(ctx.history.len(), 2);
        assert!(ctx.history.can_undo());
    }

    #[rstest]
    fn failed_and_non_undoable_commands_are_not_recorded(mut ctx: Ctx) {
        ctx.create(0.0);
        ctx.history.undo(&mut ctx.model).expect("undo");

        let missing = ModelCommand::DeleteNode {
            node_id: 20_000.into(),
        };
        assert!(ctx.history.execute(missing, &mut ctx.model, &ctx.store).is_err());
        ctx.history
            .execute(ModelCommand::SaveModel { path: None }, &mut ctx.model, &ctx.store)
            .expect("save");

        // The redo tail survives both.
        assert!(ctx.history.can_redo());
        assert_eq!(ctx.history.len(), 1);
    }

    #[rstest]
    fn clear_resets_the_stack(mut ctx: Ctx) {
        ctx.create(0.0);
        ctx.history.clear();
        assert!(ctx.history.is_empty());
        assert!(!ctx.history.can_undo());
    }
}
