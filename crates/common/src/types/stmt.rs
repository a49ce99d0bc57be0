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

//! The statement tree of a logic block.
//!
//! Statements are a closed sum type so that every pass walking the tree is
//! forced to handle each kind exhaustively. Each statement sequence owns its
//! children exclusively.

use serde::{Deserialize, Serialize};

use crate::{Expr, SourcePosition};

/// Blocking versus non-blocking assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssignKind {
    /// `a = b`
    Blocking,
    /// `a <= b`
    NonBlocking,
    /// Decided later by the emitter from the enclosing block kind.
    #[default]
    Undefined,
}

impl AssignKind {
    /// Returns a short stable name used in identities and the debug store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::NonBlocking => "nonblocking",
            Self::Undefined => "undefined",
        }
    }
}

/// A single statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// An assignment, the only debuggable leaf.
    Assign(AssignStmt),
    /// An if/else statement; an else body holding a single `If` is an else-if.
    If(IfStmt),
    /// A case statement.
    Switch(SwitchStmt),
    /// A nested scope.
    Block(ScopedBlock),
}

impl From<AssignStmt> for Statement {
    fn from(stmt: AssignStmt) -> Self {
        Self::Assign(stmt)
    }
}

impl From<IfStmt> for Statement {
    fn from(stmt: IfStmt) -> Self {
        Self::If(stmt)
    }
}

impl From<SwitchStmt> for Statement {
    fn from(stmt: SwitchStmt) -> Self {
        Self::Switch(stmt)
    }
}

impl From<ScopedBlock> for Statement {
    fn from(stmt: ScopedBlock) -> Self {
        Self::Block(stmt)
    }
}

/// `target = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignStmt {
    /// The assigned expression, a variable or a slice of one.
    pub target: Expr,
    /// The driving expression.
    pub value: Expr,
    /// Blocking or non-blocking.
    pub kind: AssignKind,
    /// High-level source locations that created this statement, innermost first.
    pub sources: Vec<SourcePosition>,
}

impl AssignStmt {
    /// Creates an assignment with an undefined kind and no source positions.
    pub fn new(target: Expr, value: Expr) -> Self {
        Self { target, value, kind: AssignKind::Undefined, sources: Vec::new() }
    }

    /// Sets the assignment kind.
    pub fn with_kind(mut self, kind: AssignKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches a source position.
    pub fn with_source(mut self, filename: impl Into<String>, line: u32) -> Self {
        self.sources.push(SourcePosition::new(filename, line));
        self
    }

    /// The name of the assigned variable, or the rendered target for concatenations.
    pub fn target_name(&self) -> String {
        self.target.root_var().map(str::to_string).unwrap_or_else(|| self.target.to_string())
    }
}

/// `if (predicate) then_body else else_body`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfStmt {
    /// The branch predicate
    pub predicate: Expr,
    /// Statements executed when the predicate holds
    pub then_body: Vec<Statement>,
    /// Statements executed otherwise; empty when there is no else
    pub else_body: Vec<Statement>,
}

impl IfStmt {
    /// Creates an if statement with empty bodies.
    pub fn new(predicate: Expr) -> Self {
        Self { predicate, then_body: Vec::new(), else_body: Vec::new() }
    }

    /// Appends a statement to the then body.
    pub fn then_stmt(mut self, stmt: impl Into<Statement>) -> Self {
        self.then_body.push(stmt.into());
        self
    }

    /// Appends a statement to the else body.
    pub fn else_stmt(mut self, stmt: impl Into<Statement>) -> Self {
        self.else_body.push(stmt.into());
        self
    }

    /// Returns the chained if when the else body is an else-if.
    pub fn else_if(&self) -> Option<&Self> {
        match self.else_body.as_slice() {
            [Statement::If(chained)] => Some(chained),
            _ => None,
        }
    }
}

/// One arm of a [`SwitchStmt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// The case label; `None` marks the default arm.
    pub label: Option<Expr>,
    /// Statements of this arm
    pub body: Vec<Statement>,
}

/// `case (target) ... endcase`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchStmt {
    /// The switched expression
    pub target: Expr,
    /// Arms in declaration order
    pub cases: Vec<SwitchCase>,
}

impl SwitchStmt {
    /// Creates a switch with no arms.
    pub fn new(target: Expr) -> Self {
        Self { target, cases: Vec::new() }
    }

    /// Adds a labelled arm.
    pub fn case(mut self, label: Expr, body: Vec<Statement>) -> Self {
        self.cases.push(SwitchCase { label: Some(label), body });
        self
    }

    /// Adds the default arm.
    pub fn default_case(mut self, body: Vec<Statement>) -> Self {
        self.cases.push(SwitchCase { label: None, body });
        self
    }
}

/// A nested `begin ... end` scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedBlock {
    /// Statements of the scope
    pub stmts: Vec<Statement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_else_if_detection() {
        let chained = IfStmt::new(Expr::var("b"))
            .then_stmt(AssignStmt::new(Expr::var("o"), Expr::constant(1, 1)));
        let stmt = IfStmt::new(Expr::var("a"))
            .then_stmt(AssignStmt::new(Expr::var("o"), Expr::constant(0, 1)))
            .else_stmt(chained.clone());
        assert_eq!(stmt.else_if(), Some(&chained));

        let plain = IfStmt::new(Expr::var("a"))
            .else_stmt(AssignStmt::new(Expr::var("o"), Expr::constant(0, 1)));
        assert!(plain.else_if().is_none());
    }

    #[test]
    fn test_target_name() {
        let stmt = AssignStmt::new(Expr::var("out").slice(3, 0), Expr::var("a"));
        assert_eq!(stmt.target_name(), "out");

        let cat = AssignStmt::new(Expr::Concat(vec![Expr::var("a"), Expr::var("b")]), Expr::var("c"));
        assert_eq!(cat.target_name(), "{a, b}");
    }
}
