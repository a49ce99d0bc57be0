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

//! Generators and the arena that owns them.
//!
//! A [`Design`] is the hand-over point from the hardware construction layer.
//! Generators live in a flat arena and refer to each other by [`GeneratorId`];
//! the parent link is a plain index, so the hierarchy never forms an owning
//! cycle.

use std::{
    fmt::{self, Display},
    ops::{Index, IndexMut},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Statement;

/// Index of a generator inside its [`Design`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneratorId(usize);

impl Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clock edge of a sequential block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Rising edge
    Posedge,
    /// Falling edge
    Negedge,
}

impl Edge {
    /// Returns the SystemVerilog keyword of this edge.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posedge => "posedge",
            Self::Negedge => "negedge",
        }
    }

    /// Parses the keyword produced by [`Edge::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "posedge" => Some(Self::Posedge),
            "negedge" => Some(Self::Negedge),
            _ => None,
        }
    }
}

/// Whether a logic block is combinational or clocked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// `always_comb`
    Combinational,
    /// `always_ff @(<edge> <clock>)`
    Sequential {
        /// Name of the clock signal
        clock: String,
        /// Triggering edge
        edge: Edge,
    },
}

impl BlockKind {
    /// Returns `"combinational"` or `"sequential"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Combinational => "combinational",
            Self::Sequential { .. } => "sequential",
        }
    }

    /// The clock signal of a sequential block.
    pub fn clock(&self) -> Option<&str> {
        match self {
            Self::Combinational => None,
            Self::Sequential { clock, .. } => Some(clock),
        }
    }

    /// The clock edge of a sequential block.
    pub fn edge(&self) -> Option<Edge> {
        match self {
            Self::Combinational => None,
            Self::Sequential { edge, .. } => Some(*edge),
        }
    }
}

/// A logic block of a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicBlock {
    /// Combinational or sequential
    pub kind: BlockKind,
    /// Top level statements in order
    pub stmts: Vec<Statement>,
}

impl LogicBlock {
    /// Creates an empty combinational block.
    pub fn combinational() -> Self {
        Self { kind: BlockKind::Combinational, stmts: Vec::new() }
    }

    /// Creates an empty sequential block triggered on `edge` of `clock`.
    pub fn sequential(clock: impl Into<String>, edge: Edge) -> Self {
        Self { kind: BlockKind::Sequential { clock: clock.into(), edge }, stmts: Vec::new() }
    }

    /// Appends a statement.
    pub fn add_stmt(&mut self, stmt: impl Into<Statement>) -> &mut Self {
        self.stmts.push(stmt.into());
        self
    }
}

/// Role of a variable within its generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    /// Input port
    Input,
    /// Output port
    Output,
    /// Clock input port
    Clock,
    /// Reset input port
    Reset,
    /// Internal variable
    Var,
}

impl VarKind {
    /// Returns a short stable name used in the debug store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Clock => "clock",
            Self::Reset => "reset",
            Self::Var => "var",
        }
    }
}

/// A named signal of a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, unique inside its generator
    pub name: String,
    /// Bit width
    pub width: u32,
    /// Whether the variable is signed
    pub is_signed: bool,
    /// Port direction or internal variable
    pub kind: VarKind,
    /// Set by the instrumentation pass when the signal is made visible to the simulator.
    pub instrumented: bool,
}

/// A hardware module instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    /// Definition name of the module
    pub name: String,
    /// Instance name used in the hierarchy path
    pub instance_name: String,
    /// Non-owning link to the parent instance
    pub parent: Option<GeneratorId>,
    /// Child instances in insertion order
    pub children: Vec<GeneratorId>,
    /// Ports and variables in declaration order
    pub variables: Vec<Variable>,
    /// Logic blocks in declaration order
    pub blocks: Vec<LogicBlock>,
    /// Whether debug information is requested for this generator
    pub debug: bool,
}

impl Generator {
    fn new(name: String, instance_name: String, parent: Option<GeneratorId>) -> Self {
        Self {
            name,
            instance_name,
            parent,
            children: Vec::new(),
            variables: Vec::new(),
            blocks: Vec::new(),
            debug: false,
        }
    }

    fn declare(&mut self, name: &str, width: u32, kind: VarKind) -> &mut Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == name) {
            var.width = width;
            var.kind = kind;
        } else {
            self.variables.push(Variable {
                name: name.to_string(),
                width,
                is_signed: false,
                kind,
                instrumented: false,
            });
        }
        self
    }

    /// Declares an input port.
    pub fn input(&mut self, name: &str, width: u32) -> &mut Self {
        self.declare(name, width, VarKind::Input)
    }

    /// Declares an output port.
    pub fn output(&mut self, name: &str, width: u32) -> &mut Self {
        self.declare(name, width, VarKind::Output)
    }

    /// Declares a clock port.
    pub fn clock(&mut self, name: &str) -> &mut Self {
        self.declare(name, 1, VarKind::Clock)
    }

    /// Declares a reset port.
    pub fn reset(&mut self, name: &str) -> &mut Self {
        self.declare(name, 1, VarKind::Reset)
    }

    /// Declares an internal variable.
    pub fn var(&mut self, name: &str, width: u32) -> &mut Self {
        self.declare(name, width, VarKind::Var)
    }

    /// Looks up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Appends a logic block and returns its index.
    pub fn add_block(&mut self, block: LogicBlock) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }
}

/// Arena owning every generator of a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    generators: Vec<Generator>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a top-level generator whose instance name equals its definition name.
    pub fn add_generator(&mut self, name: impl Into<String>) -> GeneratorId {
        let name = name.into();
        self.push(Generator::new(name.clone(), name, None))
    }

    /// Adds an instance of `name` called `instance_name` under `parent`.
    pub fn add_child(
        &mut self,
        parent: GeneratorId,
        name: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> GeneratorId {
        let id = self.push(Generator::new(name.into(), instance_name.into(), Some(parent)));
        self.generators[parent.0].children.push(id);
        id
    }

    fn push(&mut self, generator: Generator) -> GeneratorId {
        self.generators.push(generator);
        GeneratorId(self.generators.len() - 1)
    }

    /// Returns the generator with the given id, if any.
    pub fn get(&self, id: GeneratorId) -> Option<&Generator> {
        self.generators.get(id.0)
    }

    /// Number of generators.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether the design holds no generator.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Generators without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = GeneratorId> + '_ {
        self.generators
            .iter()
            .enumerate()
            .filter(|(_, g)| g.parent.is_none())
            .map(|(i, _)| GeneratorId(i))
    }

    /// Every generator in depth-first pre-order, roots and children in insertion order.
    pub fn iter_preorder(&self) -> Vec<GeneratorId> {
        let mut order = Vec::with_capacity(self.generators.len());
        let mut stack: Vec<GeneratorId> = self.roots().collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        order
    }

    /// Dot-joined instance path from the root, e.g. `top.child.leaf`.
    pub fn handle_name(&self, id: GeneratorId) -> String {
        let mut names = vec![self[id].instance_name.as_str()];
        let mut current = self[id].parent;
        while let Some(parent) = current {
            names.push(self[parent].instance_name.as_str());
            current = self[parent].parent;
        }
        names.iter().rev().join(".")
    }

    /// Marks a variable as made visible to the simulator.
    ///
    /// Returns `false` when the generator has no variable of that name.
    pub fn mark_instrumented(&mut self, id: GeneratorId, name: &str) -> bool {
        match self[id].variables.iter_mut().find(|v| v.name == name) {
            Some(var) => {
                var.instrumented = true;
                true
            }
            None => false,
        }
    }
}

impl Index<GeneratorId> for Design {
    type Output = Generator;

    fn index(&self, id: GeneratorId) -> &Generator {
        &self.generators[id.0]
    }
}

impl IndexMut<GeneratorId> for Design {
    fn index_mut(&mut self, id: GeneratorId) -> &mut Generator {
        &mut self.generators[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_name_follows_parent_links() {
        let mut design = Design::new();
        let top = design.add_generator("top");
        let mid = design.add_child(top, "mid_def", "mid");
        let leaf = design.add_child(mid, "leaf_def", "leaf0");

        assert_eq!(design.handle_name(top), "top");
        assert_eq!(design.handle_name(mid), "top.mid");
        assert_eq!(design.handle_name(leaf), "top.mid.leaf0");
    }

    #[test]
    fn test_preorder_is_insertion_ordered() {
        let mut design = Design::new();
        let top = design.add_generator("top");
        let a = design.add_child(top, "m", "a");
        let b = design.add_child(top, "m", "b");
        let a0 = design.add_child(a, "n", "a0");
        let other = design.add_generator("other");

        assert_eq!(design.iter_preorder(), vec![top, a, a0, b, other]);
        assert_eq!(design.roots().collect::<Vec<_>>(), vec![top, other]);
    }

    #[test]
    fn test_mark_instrumented() {
        let mut design = Design::new();
        let top = design.add_generator("top");
        design[top].input("in1", 16).output("out", 16);

        assert!(design.mark_instrumented(top, "out"));
        assert!(!design.mark_instrumented(top, "missing"));
        assert!(design[top].variable("out").unwrap().instrumented);
        assert!(!design[top].variable("in1").unwrap().instrumented);
    }

    #[test]
    fn test_redeclaration_updates_in_place() {
        let mut design = Design::new();
        let top = design.add_generator("top");
        design[top].var("x", 1).output("x", 4);

        assert_eq!(design[top].variables.len(), 1);
        assert_eq!(design[top].variable("x").unwrap().kind, VarKind::Output);
        assert_eq!(design[top].variable("x").unwrap().width, 4);
    }
}
