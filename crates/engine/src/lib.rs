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

//! RTLDB Engine - Breakpoint extraction and the debug store
//!
//! Takes a finalized [`rtldb_common::Design`] together with the positions the
//! RTL emitter reported for each statement, and produces a queryable store of
//! breakpoints a source-level debugger can attach to.

pub mod config;
pub use config::*;

pub mod correlate;
pub use correlate::*;

pub mod errors;
pub use errors::*;

pub mod flatten;
pub use flatten::*;

pub mod identity;
pub use identity::{statement_ids, IdentityRegistry, StmtLocation};

pub mod metadata;
pub use metadata::*;

pub mod pipeline;
pub use pipeline::*;

pub mod store;
pub use store::{write_store, DebugStore};

pub mod walk;
pub use walk::*;
