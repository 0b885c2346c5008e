// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for process models.
//!
//! Models are loaded and saved whole, by id. [`ModelFolder`] keeps one `.pm` JSON document per
//! model under a root directory; [`MemoryStore`] keeps them in memory for tests and tooling.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::model::{ModelId, ModelType, ProcessModel};

pub mod memory;
pub mod model_folder;

pub use memory::MemoryStore;
pub use model_folder::{ModelFolder, WriteDurability, MODEL_FILE_EXTENSION};

/// Load/save boundary used by sessions and the `save_model` command.
pub trait ModelStore: Send + Sync {
    /// Fails with [`StoreError::NotFound`] for unknown ids and [`StoreError::Invalid`] when the
    /// stored document does not decode into a valid model of its declared type.
    fn load(&self, id: &ModelId) -> Result<ProcessModel, StoreError>;

    /// Overwrites whatever is stored under `model.id()`.
    fn save(&self, model: &ProcessModel) -> Result<(), StoreError>;

    fn exists(&self, id: &ModelId) -> Result<bool, StoreError>;

    /// Stored models sorted by id.
    fn list(&self) -> Result<Vec<StoredModel>, StoreError>;

    /// Creates and saves an empty model.
    fn create(&self, id: ModelId, model_type: ModelType) -> Result<ProcessModel, StoreError> {
        if self.exists(&id)? {
            return Err(StoreError::AlreadyExists { id });
        }
        let model = ProcessModel::new(id, model_type);
        self.save(&model)?;
        Ok(model)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StoredModel {
    pub id: ModelId,
    pub model_type: ModelType,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model {id} not found")]
    NotFound { id: ModelId },
    #[error("model {id} already exists")]
    AlreadyExists { id: ModelId },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored model {id} is invalid: {reason}")]
    Invalid { id: ModelId, reason: String },
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}
