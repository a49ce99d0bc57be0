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

//! RTLDB Common - Shared types for RTLDB components
//!
//! This crate holds the statement tree handed over by the hardware generator
//! front end, the breakpoint records produced from it, and the logging setup
//! shared by the engine and its tests.

/// Generators, statements, expressions and breakpoint records
pub mod types;

/// Environment variable names recognised by RTLDB
pub mod env;
/// Logging setup and utilities for consistent logging across RTLDB components
pub mod logging;
/// Rendering of high-level source snippets for diagnostics
pub mod source;

pub use source::*;
pub use types::*;
