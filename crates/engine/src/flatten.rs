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

//! Flattening of statement trees into breakpoint records.
//!
//! Every assignment becomes part of exactly one [`BreakpointRecord`]. Inside a
//! branch, consecutive sibling assignments are grouped into a single record
//! since they share the same condition path and execute together; any nested
//! control statement or scope ends the run. Assignments outside any branch
//! are each their own record.

use rtldb_common::{AssignStmt, BreakpointRecord, BreakpointTarget, LogicBlock, SourcePosition};
use tracing::{debug, trace};

use crate::{
    identity::{self, IdentityRegistry},
    walk_block, DebugInfoError, StatementVisitor, WalkContext,
};

/// Turns logic blocks into breakpoint records, sharing one identity registry.
#[derive(Debug)]
pub struct Flattener<'r> {
    registry: &'r mut IdentityRegistry,
    record_source_positions: bool,
    records: Vec<BreakpointRecord>,
    // One slot per open sequence holding the run being grouped, if any.
    runs: Vec<Option<BreakpointRecord>>,
}

impl<'r> Flattener<'r> {
    /// Creates a flattener registering ids in `registry`.
    pub fn new(registry: &'r mut IdentityRegistry) -> Self {
        Self { registry, record_source_positions: true, records: Vec::new(), runs: Vec::new() }
    }

    /// Whether source positions are copied into records. Enabled by default.
    pub fn with_source_positions(mut self, enabled: bool) -> Self {
        self.record_source_positions = enabled;
        self
    }

    /// Flattens one block and returns its records in program order.
    pub fn flatten(
        &mut self,
        generator_path: &str,
        block_index: usize,
        block: &LogicBlock,
    ) -> Result<Vec<BreakpointRecord>, DebugInfoError> {
        self.records.clear();
        self.runs.clear();
        walk_block(generator_path, block_index, block, self)?;
        debug!(
            generator = generator_path,
            block = block_index,
            kind = block.kind.as_str(),
            records = self.records.len(),
            "flattened logic block"
        );
        Ok(std::mem::take(&mut self.records))
    }

    fn flush_run(&mut self) {
        if let Some(record) = self.runs.last_mut().and_then(Option::take) {
            self.records.push(record);
        }
    }

    fn open_record(
        &self,
        ctx: &WalkContext<'_>,
        stmt: &AssignStmt,
        target: BreakpointTarget,
    ) -> BreakpointRecord {
        BreakpointRecord {
            id: target.statement,
            generator_path: ctx.generator_path.to_string(),
            block_index: ctx.block_index,
            block_kind: ctx.block_kind.clone(),
            condition_path: ctx.condition_path(),
            targets: vec![target],
            source_positions: self.sources_of(stmt),
            output_position: None,
        }
    }

    fn sources_of(&self, stmt: &AssignStmt) -> Vec<SourcePosition> {
        if self.record_source_positions {
            stmt.sources.clone()
        } else {
            Vec::new()
        }
    }
}

impl StatementVisitor for Flattener<'_> {
    type Error = DebugInfoError;

    fn enter_sequence(&mut self, _ctx: &WalkContext<'_>) -> Result<(), Self::Error> {
        self.flush_run();
        self.runs.push(None);
        Ok(())
    }

    fn exit_sequence(&mut self, _ctx: &WalkContext<'_>) -> Result<(), Self::Error> {
        self.flush_run();
        self.runs.pop();
        Ok(())
    }

    fn visit_assign(&mut self, ctx: &WalkContext<'_>, stmt: &AssignStmt) -> Result<(), Self::Error> {
        let key = identity::canonical_key(stmt, ctx);
        let id = identity::id_of_key(&key);
        self.registry.register(id, key, &stmt.sources)?;

        if stmt.sources.is_empty() {
            trace!(%id, position = %ctx.position_string(), "assignment has no source position");
        }

        let target = BreakpointTarget {
            statement: id,
            variable: stmt.target_name(),
            value: stmt.value.to_string(),
            output_line: None,
        };

        if ctx.conditions().is_empty() {
            let record = self.open_record(ctx, stmt, target);
            self.records.push(record);
            return Ok(());
        }

        let sources = self.sources_of(stmt);
        let opened = match self.runs.last_mut() {
            Some(Some(run)) => {
                run.targets.push(target);
                run.source_positions.extend(sources);
                None
            }
            _ => Some(target),
        };
        if let Some(target) = opened {
            let record = self.open_record(ctx, stmt, target);
            match self.runs.last_mut() {
                Some(slot) => *slot = Some(record),
                None => self.records.push(record),
            }
        }
        Ok(())
    }
}

/// Flattens a single block with a fresh registry.
pub fn flatten_block(
    generator_path: &str,
    block_index: usize,
    block: &LogicBlock,
) -> Result<Vec<BreakpointRecord>, DebugInfoError> {
    let mut registry = IdentityRegistry::new();
    Flattener::new(&mut registry).flatten(generator_path, block_index, block)
}
