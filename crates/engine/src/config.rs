// RTLDB - Hardware Generator Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration of the debug information pipeline
//!
//! Settings are read from a TOML file and can be overridden from the
//! environment. Every field has a default, so an empty file is valid.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use rtldb_common::{
    env::{RTLDB_DEBUG_DB, RTLDB_OUTPUT_FILE},
    source::DEFAULT_CONTEXT_LINES,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugInfoConfig {
    /// Where the debug store is written; nothing is persisted when unset
    pub store_path: Option<PathBuf>,
    /// Name of the generated RTL file recorded with each breakpoint when the
    /// emitter does not report one
    pub output_file: Option<String>,
    /// Also extract breakpoints from generators without the debug flag
    pub include_non_debug_generators: bool,
    /// Copy high-level source positions into the records
    pub record_source_positions: bool,
    /// Lines of source printed around a statement in diagnostics
    pub source_context_lines: usize,
}

impl Default for DebugInfoConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            output_file: None,
            include_non_debug_generators: false,
            record_source_positions: true,
            source_context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

impl DebugInfoConfig {
    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Loaded debug info configuration from {}", path.display());
        Ok(config)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config as TOML")
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Applies [`RTLDB_DEBUG_DB`] and [`RTLDB_OUTPUT_FILE`] from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`, ignoring empty values.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());
        if let Some(path) = lookup(RTLDB_DEBUG_DB) {
            debug!(store_path = %path, "store path overridden from environment");
            self.store_path = Some(PathBuf::from(path));
        }
        if let Some(file) = lookup(RTLDB_OUTPUT_FILE) {
            self.output_file = Some(file);
        }
        self
    }

    /// Sets the store path.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Sets the output file name.
    pub fn with_output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = Some(file.into());
        self
    }
}
