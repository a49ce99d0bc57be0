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

//! End-to-end debug information build
//!
//! Runs after the hardware design is finalized and the RTL has been emitted:
//!
//! 1. Flatten the logic blocks of every debug-enabled generator into
//!    breakpoint records with stable ids
//! 2. Correlate the records with the emitter's output positions
//! 3. Persist records, hierarchy and variables to the debug store
//!
//! Any failure aborts the build before the store is touched, or rolls the
//! store transaction back, so a store is either complete or absent.

use std::{collections::HashSet, path::PathBuf};

use rtldb_common::{render_all_contexts, BreakpointRecord, Design};
use tracing::{debug, error, info, info_span, warn};

use crate::{
    correlate, store, DebugInfoConfig, DebugInfoError, DebugMetadata, EmissionMap, Flattener,
    IdentityRegistry,
};

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct DebugInfoSummary {
    /// Correlated records in generator pre-order, then program order
    pub records: Vec<BreakpointRecord>,
    /// Number of generators that contributed records
    pub generators: usize,
    /// Where the store was written, if anywhere
    pub store_path: Option<PathBuf>,
}

/// The debug information builder.
#[derive(Debug, Clone, Default)]
pub struct DebugInfoPipeline {
    config: DebugInfoConfig,
}

impl DebugInfoPipeline {
    /// Creates a pipeline with the given configuration.
    pub fn new(config: DebugInfoConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &DebugInfoConfig {
        &self.config
    }

    /// Flattens every selected generator of `design` into uncorrelated records.
    pub fn flatten(&self, design: &Design) -> Result<Vec<BreakpointRecord>, DebugInfoError> {
        Ok(self.flatten_counted(design)?.0)
    }

    fn flatten_counted(
        &self,
        design: &Design,
    ) -> Result<(Vec<BreakpointRecord>, usize), DebugInfoError> {
        let mut registry = IdentityRegistry::new();
        let mut records = Vec::new();
        let mut generators = 0;
        let mut paths = HashSet::new();

        for id in design.iter_preorder() {
            let generator = &design[id];
            let path = design.handle_name(id);
            if !paths.insert(path.clone()) {
                let err = DebugInfoError::DuplicateInstance { path };
                self.report(&err);
                return Err(err);
            }
            if !generator.debug && !self.config.include_non_debug_generators {
                debug!(generator = %path, "skipping generator without debug flag");
                continue;
            }
            generators += 1;

            let mut flattener = Flattener::new(&mut registry)
                .with_source_positions(self.config.record_source_positions);
            for (index, block) in generator.blocks.iter().enumerate() {
                let block_records = flattener
                    .flatten(&path, index, block)
                    .inspect_err(|err| self.report(err))?;
                records.extend(block_records);
            }
        }

        if records.iter().all(|r| r.source_positions.is_empty()) && !records.is_empty() {
            warn!("no source positions were recorded; breakpoints cannot be mapped back to the generator source");
        }
        Ok((records, generators))
    }

    /// Builds the debug information of `design` emitted as described by `emission`.
    pub fn run(
        &self,
        design: &Design,
        emission: &EmissionMap,
    ) -> Result<DebugInfoSummary, DebugInfoError> {
        let _span = info_span!("debug_info", generators = design.len()).entered();

        let (records, generators) = self.flatten_counted(design)?;
        debug!(records = records.len(), generators, "flattened design");

        let mut records = correlate(records, emission).inspect_err(|err| self.report(err))?;
        if emission.file().is_none() {
            if let Some(file) = &self.config.output_file {
                for position in records.iter_mut().filter_map(|r| r.output_position.as_mut()) {
                    position.file = Some(file.clone());
                }
            }
        }

        let store_path = self.config.store_path.clone();
        match &store_path {
            Some(path) => {
                let metadata = DebugMetadata::collect(design);
                store::write_store(path, &records, &metadata)
                    .map_err(DebugInfoError::from)
                    .inspect_err(|err| self.report(err))?;
            }
            None => debug!("no store path configured, skipping persistence"),
        }

        info!(records = records.len(), generators, "debug information built");
        Ok(DebugInfoSummary { records, generators, store_path })
    }

    fn report(&self, err: &DebugInfoError) {
        error!(%err, "debug information build failed");
        let context = render_all_contexts(err.sources(), self.config.source_context_lines);
        if !context.is_empty() {
            error!("\n{context}");
        }
    }
}
