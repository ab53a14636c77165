// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::storage::{self, Storage};
use crate::tools::DEFAULT_USER_AGENT;
use crate::validators::ocr;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use typed_builder::TypedBuilder;

pub const DEFAULT_PARALLELISM: usize = 4;
/// Base name of the optional settings file in the working directory,
/// e.g. `digcoll.yml`
pub const CONFIG_FILE_BASE_NAME: &str = "digcoll";
pub const ENV_PREFIX: &str = "DIGCOLL";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load the basic/low-level configuration data: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to create the storage backend from the configuration data: {0}")]
    StorageCreation(#[from] storage::CreationError),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StorageSection {
    /// Name of the storage backend type, e.g. "local" or "webdav"
    pub r#type: String,
    #[serde(default)]
    pub config: Value,
}

const fn default_true() -> bool {
    true
}

fn default_ocr_base_url() -> String {
    ocr::DEFAULT_BASE_URL.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OcrCheck {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ocr_base_url")]
    pub base_url: String,
    /// Number of retries for a single status request
    pub retries: Option<u32>,
    /// Request timeout in milliseconds (ms)
    pub timeout: Option<u64>,
}

impl Default for OcrCheck {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_ocr_base_url(),
            retries: None,
            timeout: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct IntermediateSettings {
    pub user_agent: String,
    pub parallelism: usize,
    pub storage: StorageSection,
    pub mets_schema: Option<PathBuf>,
    #[serde(default)]
    pub ocr_check: OcrCheck,
}

/// The part of the settings that storage backends get to see.
#[derive(Debug)]
pub struct PartialSettings {
    pub user_agent: String,
}

#[derive(TypedBuilder)]
pub struct Settings {
    #[builder(default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,
    #[builder(default = DEFAULT_PARALLELISM)]
    pub parallelism: usize,
    pub storage: Arc<dyn Storage>,
    #[builder(default)]
    pub mets_schema: Option<PathBuf>,
    #[builder(default)]
    pub ocr_check: OcrCheck,
}

/// Values given on the command line,
/// taking precedence over files and environment.
#[derive(TypedBuilder, Debug, Default, Clone)]
pub struct Overrides {
    #[builder(default, setter(strip_option))]
    pub config_file: Option<PathBuf>,
    #[builder(default, setter(strip_option))]
    pub local_root: Option<PathBuf>,
    #[builder(default, setter(strip_option))]
    pub webdav: Option<String>,
    #[builder(default)]
    pub no_ocr_check: bool,
}

impl IntermediateSettings {
    #[must_use]
    pub fn partial(&self) -> PartialSettings {
        PartialSettings {
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn finalize(self) -> Result<Settings, SettingsError> {
        let storage_factories = storage::assemble_factories();
        let config_partial = Arc::new(self.partial());
        let storage_type = &self.storage.r#type;
        tracing::debug!("Storage has type: '{storage_type}' - creating ...");
        let factory = storage_factories
            .get(storage_type)
            .ok_or_else(|| storage::CreationError::UnknownStorageType(storage_type.clone()))?;
        let storage: Arc<dyn Storage> =
            Arc::from(factory.create(config_partial, self.storage.config.clone())?);

        Ok(Settings {
            user_agent: self.user_agent,
            parallelism: self.parallelism.max(1),
            storage,
            mets_schema: self.mets_schema,
            ocr_check: self.ocr_check,
        })
    }
}

/// Reads the settings from (in increasing order of precedence)
/// built-in defaults, `./digcoll.{yml,toml,json}`, an explicit config file,
/// `DIGCOLL_*` environment variables and the command line.
///
/// # Errors
///
/// - the config loader fails to build
/// - settings failed to load and deserialize into intermediate settings
/// - the intermediate settings fail to finalize into the final settings
pub fn load(overrides: &Overrides) -> Result<Settings, SettingsError> {
    let mut settings_loader = Config::builder()
        .set_default("user_agent", DEFAULT_USER_AGENT)?
        .set_default("parallelism", i64::try_from(DEFAULT_PARALLELISM).unwrap_or(1))?
        .set_default("storage.type", storage::local::STORAGE_TYPE.name)?
        .set_default("storage.config.root", ".")?
        .add_source(File::with_name(CONFIG_FILE_BASE_NAME).required(false));
    if let Some(config_file) = &overrides.config_file {
        settings_loader = settings_loader.add_source(File::from(config_file.as_path()));
    }
    // e.g. `DIGCOLL_STORAGE__CONFIG__ROOT=/data/IIIF_Files`
    settings_loader = settings_loader.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    if let Some(root) = &overrides.local_root {
        settings_loader = settings_loader
            .set_override("storage.type", storage::local::STORAGE_TYPE.name)?
            .set_override("storage.config.root", root.display().to_string())?;
    } else if let Some(base_url) = &overrides.webdav {
        settings_loader = settings_loader
            .set_override("storage.type", storage::webdav::STORAGE_TYPE.name)?
            .set_override("storage.config.base_url", base_url.as_str())?;
    }
    if overrides.no_ocr_check {
        settings_loader = settings_loader.set_override("ocr_check.enabled", false)?;
    }

    let intermediate_settings = settings_loader
        .build()?
        .try_deserialize::<IntermediateSettings>()?;

    tracing::debug!("{intermediate_settings:#?}");

    intermediate_settings.finalize()
}
