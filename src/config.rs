// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of pmedit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::SessionSettings;
use crate::store::{ModelFolder, WriteDurability};

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Runtime settings of `pmedit serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Root of the model folder.
    pub models_dir: PathBuf,
    /// Opt into fsync on save.
    pub durable_writes: bool,
    pub collaborator_grace: Duration,
    pub spectator_grace: Duration,
    /// Inbound frames above this size are dropped.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let session = SessionSettings::default();
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            durable_writes: false,
            collaborator_grace: session.collaborator_grace,
            spectator_grace: session.spectator_grace,
            max_message_bytes: session.max_message_bytes,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max message size must be at least one byte")]
    ZeroMessageLimit,
    #[error("models directory {path:?} exists but is not a directory")]
    ModelsDirNotADirectory { path: PathBuf },
}

impl ServerConfig {
    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn durable_writes(mut self, durable: bool) -> Self {
        self.durable_writes = durable;
        self
    }

    pub fn collaborator_grace(mut self, grace: Duration) -> Self {
        self.collaborator_grace = grace;
        self
    }

    pub fn spectator_grace(mut self, grace: Duration) -> Self {
        self.spectator_grace = grace;
        self
    }

    pub fn max_message_bytes(mut self, max: usize) -> Self {
        self.max_message_bytes = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_bytes == 0 {
            return Err(ConfigError::ZeroMessageLimit);
        }
        if self.models_dir.exists() && !self.models_dir.is_dir() {
            return Err(ConfigError::ModelsDirNotADirectory {
                path: self.models_dir.clone(),
            });
        }
        Ok(())
    }

    pub fn durability(&self) -> WriteDurability {
        if self.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        }
    }

    pub fn model_folder(&self) -> ModelFolder {
        ModelFolder::new(&self.models_dir).with_durability(self.durability())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            collaborator_grace: self.collaborator_grace,
            spectator_grace: self.spectator_grace,
            max_message_bytes: self.max_message_bytes,
        }
    }
}
