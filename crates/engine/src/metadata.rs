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

//! Design metadata persisted next to the breakpoints.

use rtldb_common::{Design, VarKind};
use serde::{Deserialize, Serialize};

/// One generator instance in the hierarchy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    /// Full instance path
    pub path: String,
    /// Definition name
    pub name: String,
    /// Instance name, the last segment of `path`
    pub instance_name: String,
    /// Path of the parent instance
    pub parent_path: Option<String>,
    /// Whether debug information was requested for this generator
    pub debug: bool,
}

/// One variable in the variable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    /// Instance path of the owning generator
    pub generator_path: String,
    /// Variable name
    pub name: String,
    /// Bit width
    pub width: u32,
    /// Signedness
    pub is_signed: bool,
    /// Port direction or internal variable
    pub kind: VarKind,
    /// Whether the signal is visible to the simulator
    pub instrumented: bool,
}

/// Hierarchy and variables of a design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugMetadata {
    /// Every generator in pre-order
    pub hierarchy: Vec<HierarchyEntry>,
    /// Every variable, grouped by generator
    pub variables: Vec<VariableEntry>,
}

impl DebugMetadata {
    /// Collects the metadata of every generator in `design`.
    pub fn collect(design: &Design) -> Self {
        let mut metadata = Self::default();
        for id in design.iter_preorder() {
            let generator = &design[id];
            let path = design.handle_name(id);
            metadata.hierarchy.push(HierarchyEntry {
                path: path.clone(),
                name: generator.name.clone(),
                instance_name: generator.instance_name.clone(),
                parent_path: generator.parent.map(|parent| design.handle_name(parent)),
                debug: generator.debug,
            });
            metadata.variables.extend(generator.variables.iter().map(|var| VariableEntry {
                generator_path: path.clone(),
                name: var.name.clone(),
                width: var.width,
                is_signed: var.is_signed,
                kind: var.kind,
                instrumented: var.instrumented,
            }));
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_hierarchy_and_variables() {
        let mut design = Design::new();
        let top = design.add_generator("top");
        design[top].clock("clk").input("in", 8);
        let child = design.add_child(top, "adder", "add0");
        design[child].output("sum", 9);
        design.mark_instrumented(child, "sum");

        let metadata = DebugMetadata::collect(&design);
        assert_eq!(metadata.hierarchy.len(), 2);
        assert_eq!(metadata.hierarchy[1].path, "top.add0");
        assert_eq!(metadata.hierarchy[1].name, "adder");
        assert_eq!(metadata.hierarchy[1].parent_path.as_deref(), Some("top"));
        assert!(metadata.hierarchy[0].parent_path.is_none());

        assert_eq!(metadata.variables.len(), 3);
        let sum = &metadata.variables[2];
        assert_eq!(sum.generator_path, "top.add0");
        assert_eq!(sum.kind, VarKind::Output);
        assert!(sum.instrumented);
        assert_eq!(metadata.variables[0].kind, VarKind::Clock);
    }
}
