// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::error::Category;
use tracing::{debug, warn};

use super::{ModelStore, StoreError, StoredModel};
use crate::model::{ModelId, ModelType, ProcessModel};

pub const MODEL_FILE_EXTENSION: &str = "pm";

/// Directory of `<model id>.pm` JSON documents.
///
/// Ids with `/` separators map to nested directories (`models/a` -> `<root>/models/a.pm`).
#[derive(Debug, Clone)]
pub struct ModelFolder {
    root: PathBuf,
    durability: WriteDurability,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Temp file plus atomic rename, no fsync.
    #[default]
    BestEffort,

    /// Also syncs the written file and its directory where the platform allows it.
    Durable,
}

impl ModelFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self, id: &ModelId) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = id.segments().peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.{MODEL_FILE_EXTENSION}"));
            }
        }
        path
    }

    fn collect_models(&self, dir: &Path, out: &mut Vec<StoredModel>) -> Result<(), StoreError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

            if file_type.is_dir() {
                self.collect_models(&path, out)?;
                continue;
            }
            if !file_type.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(MODEL_FILE_EXTENSION)
            {
                continue;
            }

            let Some(id) = self.id_for_path(&path) else {
                debug!(path = %path.display(), "skipping file without a valid model id");
                continue;
            };
            match read_model_type(&path) {
                Ok(model_type) => out.push(StoredModel { id, model_type }),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable model"),
            }
        }

        Ok(())
    }

    fn id_for_path(&self, path: &Path) -> Option<ModelId> {
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let segments = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        ModelId::new(segments.join("/")).ok()
    }
}

impl ModelStore for ModelFolder {
    fn load(&self, id: &ModelId) -> Result<ProcessModel, StoreError> {
        let path = self.model_path(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.clone() })
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let model: ProcessModel = serde_json::from_str(&raw).map_err(|source| {
            if source.classify() == Category::Data {
                StoreError::Invalid {
                    id: id.clone(),
                    reason: source.to_string(),
                }
            } else {
                StoreError::Json {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        if model.id() != id {
            return Err(StoreError::Invalid {
                id: id.clone(),
                reason: format!("document declares id {}", model.id()),
            });
        }
        Ok(model)
    }

    fn save(&self, model: &ProcessModel) -> Result<(), StoreError> {
        let path = self.model_path(model.id());
        let mut contents = serde_json::to_vec_pretty(model).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        contents.push(b'\n');
        write_atomic(&self.root, &path, &contents, self.durability)
    }

    fn exists(&self, id: &ModelId) -> Result<bool, StoreError> {
        let path = self.model_path(id);
        match fs::metadata(&path) {
            Ok(md) => Ok(md.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn list(&self) -> Result<Vec<StoredModel>, StoreError> {
        let mut models = Vec::new();
        self.collect_models(&self.root, &mut models)?;
        models.sort();
        Ok(models)
    }
}

fn read_model_type(path: &Path) -> Result<ModelType, StoreError> {
    #[derive(Deserialize)]
    struct Header {
        model_type: ModelType,
    }

    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let header: Header = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(header.model_type)
}

include!("model_folder/helpers.rs");
