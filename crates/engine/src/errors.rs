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

//! Error types of the debug information pipeline.

use rtldb_common::{SourcePosition, StmtId};
use thiserror::Error;

/// Fatal errors of a debug information build.
///
/// None of these leave a store behind: hierarchy, identity and correlation
/// failures are raised before the store is opened, and store failures roll back.
#[derive(Debug, Error)]
pub enum DebugInfoError {
    /// Two structurally different statements derived the same id.
    #[error("identity collision: statement id {id} is derived by both `{first}` and `{second}`")]
    IdentityCollision {
        /// The shared id
        id: StmtId,
        /// Canonical key of the statement registered first
        first: String,
        /// Canonical key of the colliding statement
        second: String,
        /// Source positions of both statements, for diagnostics
        sources: Vec<SourcePosition>,
    },

    /// Two generator instances resolve to the same hierarchy path.
    #[error("duplicate generator instance `{path}`")]
    DuplicateInstance {
        /// The shared instance path
        path: String,
    },

    /// A record references a statement the emitter did not report a position for.
    #[error("breakpoint {record} in `{generator_path}` has no emitted position for statement {id}")]
    MissingCorrelation {
        /// The statement without a position
        id: StmtId,
        /// The record holding it
        record: StmtId,
        /// Instance path of the owning generator
        generator_path: String,
    },

    /// Writing the debug store failed.
    #[error("failed to write debug store: {0}")]
    Store(#[from] StoreError),
}

impl DebugInfoError {
    /// Source positions worth printing alongside the error.
    pub fn sources(&self) -> &[SourcePosition] {
        match self {
            Self::IdentityCollision { sources, .. } => sources,
            _ => &[],
        }
    }
}

/// Errors raised by the debug store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the store location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Condition path could not be encoded or decoded
    #[error("condition path encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The store content does not match the expected layout
    #[error("malformed debug store: {0}")]
    Malformed(String),
}
