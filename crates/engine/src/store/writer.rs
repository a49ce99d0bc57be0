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

//! Transactional writing of the debug store.

use std::{fs, path::Path};

use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use rtldb_common::BreakpointRecord;
use tracing::{debug, info, warn};

use super::schema::{self, build_info};
use crate::{DebugMetadata, StoreError};

/// Writes `records` and `metadata` to the store at `path`.
///
/// An existing store is truncated: tables are dropped and recreated in the
/// same transaction that inserts the new rows, so a failed write leaves the
/// previous content untouched. A failed first write removes the new file.
pub fn write_store(
    path: &Path,
    records: &[BreakpointRecord],
    metadata: &DebugMetadata,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let existed = path.exists();
    let mut conn = Connection::open(path)?;
    if let Err(err) = write_connection(&mut conn, records, metadata) {
        drop(conn);
        if !existed {
            if let Err(remove_err) = fs::remove_file(path) {
                warn!(path = %path.display(), %remove_err, "failed to remove partial debug store");
            }
        }
        return Err(err);
    }
    info!(path = %path.display(), records = records.len(), "wrote debug store");
    Ok(())
}

pub(crate) fn write_connection(
    conn: &mut Connection,
    records: &[BreakpointRecord],
    metadata: &DebugMetadata,
) -> Result<(), StoreError> {
    conn.pragma_update(None, "foreign_keys", true)?;

    let tx = conn.transaction()?;
    tx.execute_batch(schema::DROP_TABLES)?;
    tx.execute_batch(schema::CREATE_TABLES)?;

    insert_build_info(&tx, records.len())?;
    insert_metadata(&tx, metadata)?;
    insert_records(&tx, records)?;

    // Dropping an uncommitted transaction rolls it back.
    tx.commit()?;
    debug!(
        records = records.len(),
        generators = metadata.hierarchy.len(),
        variables = metadata.variables.len(),
        "committed debug store transaction"
    );
    Ok(())
}

fn insert_build_info(tx: &Transaction<'_>, record_count: usize) -> Result<(), StoreError> {
    let mut stmt = tx.prepare("INSERT INTO build_info (key, value) VALUES (?1, ?2)")?;
    stmt.execute(params![build_info::SCHEMA_VERSION, schema::SCHEMA_VERSION.to_string()])?;
    stmt.execute(params![build_info::CREATED_AT, Utc::now().to_rfc3339()])?;
    stmt.execute(params![build_info::TOOL_VERSION, env!("CARGO_PKG_VERSION")])?;
    stmt.execute(params![build_info::BREAKPOINT_COUNT, record_count.to_string()])?;
    Ok(())
}

fn insert_metadata(tx: &Transaction<'_>, metadata: &DebugMetadata) -> Result<(), StoreError> {
    let mut stmt = tx.prepare(
        "INSERT INTO hierarchy (path, name, instance_name, parent_path, debug)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for entry in &metadata.hierarchy {
        stmt.execute(params![
            entry.path,
            entry.name,
            entry.instance_name,
            entry.parent_path,
            entry.debug
        ])?;
    }

    let mut stmt = tx.prepare(
        "INSERT INTO variable (generator_path, name, width, is_signed, kind, instrumented)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for var in &metadata.variables {
        stmt.execute(params![
            var.generator_path,
            var.name,
            var.width,
            var.is_signed,
            var.kind.as_str(),
            var.instrumented
        ])?;
    }
    Ok(())
}

fn insert_records(tx: &Transaction<'_>, records: &[BreakpointRecord]) -> Result<(), StoreError> {
    let mut breakpoint = tx.prepare(
        "INSERT INTO breakpoint (
            id, ordinal, generator_path, block_index, block_kind, clock_signal, edge,
            condition_path, condition, output_file, output_line, output_column
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    let mut target = tx.prepare(
        "INSERT INTO breakpoint_target (
            breakpoint_id, ordinal, statement_id, variable_name, value, output_line
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut source = tx.prepare(
        "INSERT INTO breakpoint_source (breakpoint_id, ordinal, filename, line_num)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    for (ordinal, record) in records.iter().enumerate() {
        let id = record.id.to_string();
        let output = record.output_position.as_ref();
        breakpoint.execute(params![
            id,
            ordinal as i64,
            record.generator_path,
            record.block_index as i64,
            record.block_kind.as_str(),
            record.block_kind.clock(),
            record.block_kind.edge().map(|edge| edge.as_str()),
            serde_json::to_string(&record.condition_path.0)?,
            record.condition_path.conjunction(),
            output.and_then(|pos| pos.file.clone()),
            output.map(|pos| pos.line),
            output.map(|pos| pos.column),
        ])?;

        for (i, t) in record.targets.iter().enumerate() {
            target.execute(params![
                id,
                i as i64,
                t.statement.to_string(),
                t.variable,
                t.value,
                t.output_line
            ])?;
        }
        for (i, pos) in record.source_positions.iter().enumerate() {
            source.execute(params![id, i as i64, pos.filename, pos.line])?;
        }
    }
    Ok(())
}
