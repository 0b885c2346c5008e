// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ModelStore, StoreError, StoredModel};
use crate::model::{ModelId, ProcessModel};

/// In-process store. Saved models are cloned in and out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    models: Mutex<BTreeMap<ModelId, ProcessModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: impl IntoIterator<Item = ProcessModel>) -> Self {
        let models = models
            .into_iter()
            .map(|model| (model.id().clone(), model))
            .collect();
        Self {
            models: Mutex::new(models),
        }
    }

    /// Last saved state of `id`, if any.
    pub fn get(&self, id: &ModelId) -> Option<ProcessModel> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ModelId, ProcessModel>> {
        self.models.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModelStore for MemoryStore {
    fn load(&self, id: &ModelId) -> Result<ProcessModel, StoreError> {
        self.get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    fn save(&self, model: &ProcessModel) -> Result<(), StoreError> {
        self.lock().insert(model.id().clone(), model.clone());
        Ok(())
    }

    fn exists(&self, id: &ModelId) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(id))
    }

    fn list(&self) -> Result<Vec<StoredModel>, StoreError> {
        Ok(self
            .lock()
            .values()
            .map(|model| StoredModel {
                id: model.id().clone(),
                model_type: model.model_type(),
            })
            .collect())
    }
}
