// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bookkeeping for simulation runs: queued, then running, then finished or failed.
//!
//! Nothing here executes a simulation; the tracker only records which stage each run is in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::ModelId;

/// Highest simulation id; ids are drawn from `0..=MAX_SIMULATION_ID`.
pub const MAX_SIMULATION_ID: u32 = 1000;

pub type SimulationId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationParameters(pub BTreeMap<String, Value>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationResult(pub BTreeMap<String, Value>);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedSimulation {
    pub id: SimulationId,
    pub model_id: ModelId,
    pub parameters: SimulationParameters,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningSimulation {
    pub id: SimulationId,
    pub model_id: ModelId,
    pub parameters: SimulationParameters,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedSimulation {
    pub id: SimulationId,
    pub model_id: ModelId,
    pub parameters: SimulationParameters,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `None` marks a failed run.
    pub result: Option<SimulationResult>,
}

impl QueuedSimulation {
    pub fn status(&self) -> SimulationStatus {
        SimulationStatus::Queued
    }
}

impl RunningSimulation {
    pub fn status(&self) -> SimulationStatus {
        SimulationStatus::Running
    }
}

impl FinishedSimulation {
    pub fn status(&self) -> SimulationStatus {
        if self.result.is_some() {
            SimulationStatus::Finished
        } else {
            SimulationStatus::Failed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("simulation {0} is not queued")]
    NotQueued(SimulationId),
    #[error("simulation {0} is not running")]
    NotRunning(SimulationId),
    #[error("all {} simulation ids are taken", MAX_SIMULATION_ID as u64 + 1)]
    IdSpaceExhausted,
}

/// Tracks every simulation by stage. Ids stay unique across all three stages.
#[derive(Debug, Default)]
pub struct Simulator {
    queued: BTreeMap<SimulationId, QueuedSimulation>,
    running: BTreeMap<SimulationId, RunningSimulation>,
    finished: BTreeMap<SimulationId, FinishedSimulation>,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(
        &mut self,
        model_id: ModelId,
        parameters: SimulationParameters,
    ) -> Result<QueuedSimulation, SimulationError> {
        self.queue_with_rng(model_id, parameters, &mut rand::thread_rng())
    }

    pub fn queue_with_rng<R: Rng + ?Sized>(
        &mut self,
        model_id: ModelId,
        parameters: SimulationParameters,
        rng: &mut R,
    ) -> Result<QueuedSimulation, SimulationError> {
        let id = self.new_id(rng)?;
        let simulation = QueuedSimulation {
            id,
            model_id,
            parameters,
            queued_at: Utc::now(),
        };
        self.queued.insert(id, simulation.clone());
        Ok(simulation)
    }

    pub fn start(&mut self, id: SimulationId) -> Result<RunningSimulation, SimulationError> {
        let queued = self
            .queued
            .remove(&id)
            .ok_or(SimulationError::NotQueued(id))?;
        let running = RunningSimulation {
            id,
            model_id: queued.model_id,
            parameters: queued.parameters,
            start_time: Utc::now(),
        };
        self.running.insert(id, running.clone());
        Ok(running)
    }

    pub fn finish(
        &mut self,
        id: SimulationId,
        result: Option<SimulationResult>,
    ) -> Result<FinishedSimulation, SimulationError> {
        let running = self
            .running
            .remove(&id)
            .ok_or(SimulationError::NotRunning(id))?;
        let finished = FinishedSimulation {
            id,
            model_id: running.model_id,
            parameters: running.parameters,
            start_time: running.start_time,
            end_time: Utc::now(),
            result,
        };
        self.finished.insert(id, finished.clone());
        Ok(finished)
    }

    pub fn status(&self, id: SimulationId) -> Option<SimulationStatus> {
        if self.queued.contains_key(&id) {
            Some(SimulationStatus::Queued)
        } else if self.running.contains_key(&id) {
            Some(SimulationStatus::Running)
        } else {
            self.finished.get(&id).map(FinishedSimulation::status)
        }
    }

    pub fn queued(&self) -> impl Iterator<Item = &QueuedSimulation> {
        self.queued.values()
    }

    pub fn running(&self) -> impl Iterator<Item = &RunningSimulation> {
        self.running.values()
    }

    pub fn finished(&self) -> impl Iterator<Item = &FinishedSimulation> {
        self.finished.values()
    }

    fn is_taken(&self, id: SimulationId) -> bool {
        self.queued.contains_key(&id)
            || self.running.contains_key(&id)
            || self.finished.contains_key(&id)
    }

    fn new_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SimulationId, SimulationError> {
        let taken = self.queued.len() + self.running.len() + self.finished.len();
        if taken > MAX_SIMULATION_ID as usize {
            return Err(SimulationError::IdSpaceExhausted);
        }
        loop {
            let id = rng.gen_range(0..=MAX_SIMULATION_ID);
            if !self.is_taken(id) {
                return Ok(id);
            }
        }
    }
}
