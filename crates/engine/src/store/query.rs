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

//! Read access to a written debug store.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use rtldb_common::{
    BlockKind, BreakpointRecord, BreakpointTarget, ConditionPath, Edge, OutputPosition,
    SourcePosition, StmtId, VarKind,
};

use super::schema::{build_info, SCHEMA_VERSION};
use crate::{HierarchyEntry, StoreError, VariableEntry};

const BREAKPOINT_COLUMNS: &str = "id, generator_path, block_index, block_kind, clock_signal, edge,
    condition_path, output_file, output_line, output_column";

/// A breakpoint row before its child rows are attached.
struct BreakpointRow {
    id: String,
    generator_path: String,
    block_index: i64,
    block_kind: String,
    clock_signal: Option<String>,
    edge: Option<String>,
    condition_path: String,
    output_file: Option<String>,
    output_line: Option<u32>,
    output_column: Option<u32>,
}

impl BreakpointRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            generator_path: row.get(1)?,
            block_index: row.get(2)?,
            block_kind: row.get(3)?,
            clock_signal: row.get(4)?,
            edge: row.get(5)?,
            condition_path: row.get(6)?,
            output_file: row.get(7)?,
            output_line: row.get(8)?,
            output_column: row.get(9)?,
        })
    }
}

/// A read-only handle on a debug store.
#[derive(Debug)]
pub struct DebugStore {
    conn: Connection,
}

impl DebugStore {
    /// Opens the store at `path` and checks its layout version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::from_connection(conn)
    }

    pub(crate) fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        let version = store.schema_version()?;
        if version != SCHEMA_VERSION {
            return Err(StoreError::Malformed(format!(
                "unsupported schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        Ok(store)
    }

    /// Layout version recorded in the store.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let value = self
            .build_info(build_info::SCHEMA_VERSION)
            .map_err(|_| StoreError::Malformed("missing build_info table".into()))?
            .ok_or_else(|| StoreError::Malformed("missing schema version".into()))?;
        value.parse().map_err(|_| StoreError::Malformed(format!("invalid schema version {value:?}")))
    }

    /// Value of a `build_info` key.
    pub fn build_info(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM build_info WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }

    /// The record with the given id.
    pub fn breakpoint(&self, id: StmtId) -> Result<Option<BreakpointRecord>, StoreError> {
        let sql = format!("SELECT {BREAKPOINT_COLUMNS} FROM breakpoint WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], BreakpointRow::from_row)
            .optional()?;
        row.map(|row| self.assemble(row)).transpose()
    }

    /// Every record in the order it was written.
    pub fn breakpoints(&self) -> Result<Vec<BreakpointRecord>, StoreError> {
        self.select_records("1", params![])
    }

    /// Records emitted at `line`, optionally restricted to one output file.
    ///
    /// A grouped record matches when any of its statements sits on the line.
    pub fn breakpoints_at_line(
        &self,
        file: Option<&str>,
        line: u32,
    ) -> Result<Vec<BreakpointRecord>, StoreError> {
        self.select_records(
            "(output_line = ?1
              OR id IN (SELECT breakpoint_id FROM breakpoint_target WHERE output_line = ?1))
             AND (?2 IS NULL OR output_file = ?2)",
            params![line, file],
        )
    }

    /// Records of the generator at `prefix` and every generator below it.
    ///
    /// Matching is per path segment: `top` covers `top.child` but not `topx`.
    pub fn breakpoints_under(&self, prefix: &str) -> Result<Vec<BreakpointRecord>, StoreError> {
        self.select_records(
            "generator_path = ?1 OR substr(generator_path, 1, length(?1) + 1) = ?1 || '.'",
            params![prefix],
        )
    }

    /// Every generator instance in pre-order.
    pub fn hierarchy(&self) -> Result<Vec<HierarchyEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT path, name, instance_name, parent_path, debug FROM hierarchy ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(HierarchyEntry {
                path: row.get(0)?,
                name: row.get(1)?,
                instance_name: row.get(2)?,
                parent_path: row.get(3)?,
                debug: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Variables of the generator at `generator_path`, in declaration order.
    pub fn variables(&self, generator_path: &str) -> Result<Vec<VariableEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT generator_path, name, width, is_signed, kind, instrumented
             FROM variable WHERE generator_path = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![generator_path], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?;

        let mut variables = Vec::new();
        for row in rows {
            let (generator_path, name, width, is_signed, kind, instrumented) = row?;
            variables.push(VariableEntry {
                generator_path,
                name,
                width,
                is_signed,
                kind: parse_var_kind(&kind)?,
                instrumented,
            });
        }
        Ok(variables)
    }

    fn select_records(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<BreakpointRecord>, StoreError> {
        let sql =
            format!("SELECT {BREAKPOINT_COLUMNS} FROM breakpoint WHERE {filter} ORDER BY ordinal");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params, BreakpointRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|row| self.assemble(row)).collect()
    }

    fn assemble(&self, row: BreakpointRow) -> Result<BreakpointRecord, StoreError> {
        let id = parse_id(&row.id)?;
        let block_kind = match (row.block_kind.as_str(), row.clock_signal, row.edge) {
            ("combinational", _, _) => BlockKind::Combinational,
            ("sequential", Some(clock), Some(edge)) => BlockKind::Sequential {
                clock,
                edge: Edge::parse(&edge)
                    .ok_or_else(|| StoreError::Malformed(format!("invalid edge {edge:?}")))?,
            },
            (kind, _, _) => {
                return Err(StoreError::Malformed(format!("invalid block kind {kind:?} for {id}")))
            }
        };
        let output_position = row.output_line.map(|line| OutputPosition {
            file: row.output_file.clone(),
            line,
            column: row.output_column.unwrap_or_default(),
        });

        Ok(BreakpointRecord {
            id,
            generator_path: row.generator_path,
            block_index: row.block_index as usize,
            block_kind,
            condition_path: ConditionPath(serde_json::from_str(&row.condition_path)?),
            targets: self.targets(&row.id)?,
            source_positions: self.sources(&row.id)?,
            output_position,
        })
    }

    fn targets(&self, breakpoint_id: &str) -> Result<Vec<BreakpointTarget>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT statement_id, variable_name, value, output_line
             FROM breakpoint_target WHERE breakpoint_id = ?1 ORDER BY ordinal",
        )?;
        let rows = stmt.query_map(params![breakpoint_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<u32>>(3)?,
            ))
        })?;

        let mut targets = Vec::new();
        for row in rows {
            let (statement, variable, value, output_line) = row?;
            targets.push(BreakpointTarget {
                statement: parse_id(&statement)?,
                variable,
                value,
                output_line,
            });
        }
        Ok(targets)
    }

    fn sources(&self, breakpoint_id: &str) -> Result<Vec<SourcePosition>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT filename, line_num FROM breakpoint_source
             WHERE breakpoint_id = ?1 ORDER BY ordinal",
        )?;
        let rows = stmt.query_map(params![breakpoint_id], |row| {
            Ok(SourcePosition { filename: row.get(0)?, line: row.get(1)? })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn parse_id(value: &str) -> Result<StmtId, StoreError> {
    value.parse().map_err(|e| StoreError::Malformed(format!("{e}")))
}

fn parse_var_kind(value: &str) -> Result<VarKind, StoreError> {
    Ok(match value {
        "input" => VarKind::Input,
        "output" => VarKind::Output,
        "clock" => VarKind::Clock,
        "reset" => VarKind::Reset,
        "var" => VarKind::Var,
        other => return Err(StoreError::Malformed(format!("invalid variable kind {other:?}"))),
    })
}
