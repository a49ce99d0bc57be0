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

//! The persistent debug store
//!
//! A single SQLite file holding the breakpoint records of one build together
//! with the design hierarchy and variables. Writing is all-or-nothing and
//! replaces whatever the file held before; reading goes through
//! [`DebugStore`].

mod query;
pub mod schema;
mod writer;

pub use query::DebugStore;
pub use schema::SCHEMA_VERSION;
pub use writer::write_store;
