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

//! Joining breakpoint records with emitter output positions.

use std::collections::HashMap;

use rtldb_common::{BreakpointRecord, OutputPosition, StmtId};
use tracing::debug;

use crate::DebugInfoError;

/// Positions reported by the RTL emitter, keyed by statement id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmissionMap {
    file: Option<String>,
    positions: HashMap<StmtId, (u32, u32)>,
}

impl EmissionMap {
    /// Creates an empty map for output written to `file`, if any.
    pub fn new(file: Option<String>) -> Self {
        Self { file, positions: HashMap::new() }
    }

    /// Records that statement `id` was emitted at `line`, `column`.
    pub fn insert(&mut self, id: StmtId, line: u32, column: u32) {
        self.positions.insert(id, (line, column));
    }

    /// The generated file, if the emitter reported one.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Output position of statement `id`.
    pub fn get(&self, id: StmtId) -> Option<OutputPosition> {
        self.positions
            .get(&id)
            .map(|&(line, column)| OutputPosition { file: self.file.clone(), line, column })
    }

    /// Number of positioned statements.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the emitter reported nothing.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl FromIterator<(StmtId, u32, u32)> for EmissionMap {
    fn from_iter<T: IntoIterator<Item = (StmtId, u32, u32)>>(iter: T) -> Self {
        let mut map = Self::default();
        for (id, line, column) in iter {
            map.insert(id, line, column);
        }
        map
    }
}

/// Fills in the output positions of `records` from `emission`.
///
/// Every grouped statement must have been emitted. The record position is
/// the one of its leading statement, and each target gets its own line.
pub fn correlate(
    records: Vec<BreakpointRecord>,
    emission: &EmissionMap,
) -> Result<Vec<BreakpointRecord>, DebugInfoError> {
    let records = records
        .into_iter()
        .map(|mut record| {
            for target in &mut record.targets {
                let (line, _) = emission.positions.get(&target.statement).copied().ok_or_else(|| {
                    DebugInfoError::MissingCorrelation {
                        id: target.statement,
                        record: record.id,
                        generator_path: record.generator_path.clone(),
                    }
                })?;
                target.output_line = Some(line);
            }
            record.output_position = Some(emission.get(record.id).ok_or_else(|| {
                DebugInfoError::MissingCorrelation {
                    id: record.id,
                    record: record.id,
                    generator_path: record.generator_path.clone(),
                }
            })?);
            Ok(record)
        })
        .collect::<Result<Vec<_>, DebugInfoError>>()?;

    debug!(records = records.len(), emitted = emission.len(), "correlated breakpoints");
    Ok(records)
}
