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

//! Environment variable name constants for RTLDB configuration.
//!
//! # Environment Variables
//!
//! - [`RTLDB_DEBUG_DB`] - Overrides the debug store path of a build
//! - [`RTLDB_OUTPUT_FILE`] - Overrides the generated RTL file recorded in the store
//! - [`RTLDB_LOG_DIR`] - Overrides the directory used for file logging

/// Environment variable overriding where the debug store is written.
///
/// When set to a non-empty value it takes precedence over the `store_path`
/// entry of the configuration file.
///
/// ```bash
/// RTLDB_DEBUG_DB=/tmp/debug.db cargo run
/// ```
pub const RTLDB_DEBUG_DB: &str = "RTLDB_DEBUG_DB";

/// Environment variable overriding the generated RTL file name stored with
/// every breakpoint.
pub const RTLDB_OUTPUT_FILE: &str = "RTLDB_OUTPUT_FILE";

/// Environment variable overriding the log directory.
///
/// Defaults to `<temp_dir>/rtldb-logs/<component>` when unset.
pub const RTLDB_LOG_DIR: &str = "RTLDB_LOG_DIR";
