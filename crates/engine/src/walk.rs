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

//! Depth-first traversal of a logic block's statement tree.
//!
//! The walker owns the bookkeeping every pass needs: the structural position
//! of the current statement and the stack of predicates guarding it. Passes
//! implement [`StatementVisitor`] and only see sequences and assignments.

use std::fmt::{self, Display};

use itertools::Itertools;
use rtldb_common::{AssignStmt, BlockKind, ConditionPath, IfStmt, LogicBlock, Statement, SwitchStmt};
use serde::{Deserialize, Serialize};

/// One step of the structural position of a statement inside its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Index within a statement sequence
    Index(usize),
    /// Then body of an if
    Then,
    /// Else body of an if
    Else,
    /// Labelled arm of a switch, by arm index
    Case(usize),
    /// Default arm of a switch
    Default,
    /// Nested scope
    Scope,
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Then => write!(f, "then"),
            Self::Else => write!(f, "else"),
            Self::Case(i) => write!(f, "case{i}"),
            Self::Default => write!(f, "default"),
            Self::Scope => write!(f, "scope"),
        }
    }
}

/// Traversal state handed to visitors.
#[derive(Debug, Clone)]
pub struct WalkContext<'a> {
    /// Instance path of the generator owning the block
    pub generator_path: &'a str,
    /// Index of the block within the generator
    pub block_index: usize,
    /// Kind of the block
    pub block_kind: &'a BlockKind,
    position: Vec<PathSegment>,
    conditions: Vec<String>,
}

impl<'a> WalkContext<'a> {
    fn new(generator_path: &'a str, block_index: usize, block_kind: &'a BlockKind) -> Self {
        Self { generator_path, block_index, block_kind, position: Vec::new(), conditions: Vec::new() }
    }

    /// Structural position of the current statement from the block root.
    pub fn position(&self) -> &[PathSegment] {
        &self.position
    }

    /// Position rendered as a dotted string, e.g. `0.else.0.then.1`.
    pub fn position_string(&self) -> String {
        self.position.iter().join(".")
    }

    /// Predicates currently in force, outermost first.
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Snapshot of the current condition path.
    pub fn condition_path(&self) -> ConditionPath {
        ConditionPath(self.conditions.clone())
    }

    fn enter_branch(&mut self, segment: PathSegment, predicates: Vec<String>) -> usize {
        let pushed = predicates.len();
        self.position.push(segment);
        self.conditions.extend(predicates);
        pushed
    }

    fn exit_branch(&mut self, pushed: usize) {
        self.position.pop();
        self.conditions.truncate(self.conditions.len() - pushed);
    }
}

/// Callbacks invoked by [`walk_block`].
pub trait StatementVisitor {
    /// Error type aborting the walk.
    type Error;

    /// Called before the first statement of every sequence, including the block body.
    fn enter_sequence(&mut self, _ctx: &WalkContext<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after the last statement of every sequence.
    fn exit_sequence(&mut self, _ctx: &WalkContext<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every assignment, in program order.
    fn visit_assign(&mut self, ctx: &WalkContext<'_>, stmt: &AssignStmt) -> Result<(), Self::Error>;
}

/// Walks `block` depth first, driving `visitor`.
pub fn walk_block<V: StatementVisitor>(
    generator_path: &str,
    block_index: usize,
    block: &LogicBlock,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut ctx = WalkContext::new(generator_path, block_index, &block.kind);
    walk_sequence(&mut ctx, &block.stmts, visitor)
}

fn walk_sequence<V: StatementVisitor>(
    ctx: &mut WalkContext<'_>,
    stmts: &[Statement],
    visitor: &mut V,
) -> Result<(), V::Error> {
    visitor.enter_sequence(ctx)?;
    for (i, stmt) in stmts.iter().enumerate() {
        ctx.position.push(PathSegment::Index(i));
        walk_statement(ctx, stmt, visitor)?;
        ctx.position.pop();
    }
    visitor.exit_sequence(ctx)
}

fn walk_statement<V: StatementVisitor>(
    ctx: &mut WalkContext<'_>,
    stmt: &Statement,
    visitor: &mut V,
) -> Result<(), V::Error> {
    match stmt {
        Statement::Assign(assign) => visitor.visit_assign(ctx, assign),
        Statement::If(if_stmt) => walk_if(ctx, if_stmt, visitor),
        Statement::Switch(switch) => walk_switch(ctx, switch, visitor),
        Statement::Block(scope) => {
            ctx.position.push(PathSegment::Scope);
            walk_sequence(ctx, &scope.stmts, visitor)?;
            ctx.position.pop();
            Ok(())
        }
    }
}

fn walk_if<V: StatementVisitor>(
    ctx: &mut WalkContext<'_>,
    if_stmt: &IfStmt,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let pushed = ctx.enter_branch(PathSegment::Then, vec![if_stmt.predicate.to_string()]);
    walk_sequence(ctx, &if_stmt.then_body, visitor)?;
    ctx.exit_branch(pushed);

    // An else-if needs no special casing: the chained if pushes its own
    // predicate on top of the negation pushed here.
    if !if_stmt.else_body.is_empty() {
        let pushed =
            ctx.enter_branch(PathSegment::Else, vec![if_stmt.predicate.negate().to_string()]);
        walk_sequence(ctx, &if_stmt.else_body, visitor)?;
        ctx.exit_branch(pushed);
    }
    Ok(())
}

fn walk_switch<V: StatementVisitor>(
    ctx: &mut WalkContext<'_>,
    switch: &SwitchStmt,
    visitor: &mut V,
) -> Result<(), V::Error> {
    for (i, case) in switch.cases.iter().enumerate() {
        let pushed = match &case.label {
            Some(label) => ctx.enter_branch(
                PathSegment::Case(i),
                vec![switch.target.clone().equals(label.clone()).to_string()],
            ),
            None => {
                let negations = switch
                    .cases
                    .iter()
                    .filter_map(|c| c.label.as_ref())
                    .map(|label| switch.target.clone().equals(label.clone()).negate().to_string())
                    .collect();
                ctx.enter_branch(PathSegment::Default, negations)
            }
        };
        walk_sequence(ctx, &case.body, visitor)?;
        ctx.exit_branch(pushed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rtldb_common::{Expr, ScopedBlock};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        assigns: Vec<(String, String, Vec<String>)>,
        sequences: usize,
    }

    impl StatementVisitor for Recorder {
        type Error = ();

        fn enter_sequence(&mut self, _ctx: &WalkContext<'_>) -> Result<(), ()> {
            self.sequences += 1;
            Ok(())
        }

        fn visit_assign(&mut self, ctx: &WalkContext<'_>, stmt: &AssignStmt) -> Result<(), ()> {
            self.assigns.push((
                stmt.target_name(),
                ctx.position_string(),
                ctx.conditions().to_vec(),
            ));
            Ok(())
        }
    }

    fn assign(target: &str, value: i64) -> AssignStmt {
        AssignStmt::new(Expr::var(target), Expr::constant(value, 16))
    }

    #[test]
    fn test_else_if_chain_conditions() {
        let p1 = Expr::var("in1").equals(Expr::constant(2, 16));
        let p2 = Expr::var("in1").equals(Expr::constant(1, 16));
        let chain = IfStmt::new(p1)
            .then_stmt(assign("out", 2))
            .else_stmt(IfStmt::new(p2).then_stmt(assign("out", 0)).else_stmt(assign("out", 3)));
        let mut block = LogicBlock::combinational();
        block.add_stmt(chain);

        let mut recorder = Recorder::default();
        walk_block("mod", 0, &block, &mut recorder).unwrap();

        assert_eq!(recorder.assigns.len(), 3);
        assert_eq!(recorder.assigns[0].1, "0.then.0");
        assert_eq!(recorder.assigns[0].2, vec!["in1 == 16'h2"]);
        assert_eq!(recorder.assigns[1].1, "0.else.0.then.0");
        assert_eq!(recorder.assigns[1].2, vec!["!(in1 == 16'h2)", "in1 == 16'h1"]);
        assert_eq!(recorder.assigns[2].1, "0.else.0.else.0");
        assert_eq!(recorder.assigns[2].2, vec!["!(in1 == 16'h2)", "!(in1 == 16'h1)"]);
    }

    #[test]
    fn test_switch_default_negates_every_label() {
        let switch = SwitchStmt::new(Expr::var("sel"))
            .case(Expr::constant(0, 2), vec![assign("out", 1).into()])
            .case(Expr::constant(1, 2), vec![assign("out", 2).into()])
            .default_case(vec![assign("out", 3).into()]);
        let mut block = LogicBlock::combinational();
        block.add_stmt(switch);

        let mut recorder = Recorder::default();
        walk_block("mod", 0, &block, &mut recorder).unwrap();

        assert_eq!(recorder.assigns[0].2, vec!["sel == 2'h0"]);
        assert_eq!(recorder.assigns[1].1, "0.case1.0");
        assert_eq!(recorder.assigns[2].1, "0.default.0");
        assert_eq!(recorder.assigns[2].2, vec!["!(sel == 2'h0)", "!(sel == 2'h1)"]);
    }

    #[test]
    fn test_scope_keeps_conditions_and_restores_state() {
        let scoped = ScopedBlock { stmts: vec![assign("a", 1).into()] };
        let if_stmt = IfStmt::new(Expr::var("en")).then_stmt(scoped);
        let mut block = LogicBlock::combinational();
        block.add_stmt(if_stmt).add_stmt(assign("b", 2));

        let mut recorder = Recorder::default();
        walk_block("mod", 0, &block, &mut recorder).unwrap();

        assert_eq!(recorder.assigns[0].1, "0.then.0.scope.0");
        assert_eq!(recorder.assigns[0].2, vec!["en"]);
        assert_eq!(recorder.assigns[1].1, "1");
        assert!(recorder.assigns[1].2.is_empty());
        // block body, then body, scope body
        assert_eq!(recorder.sequences, 3);
    }

    #[test]
    fn test_if_without_else_visits_nothing_for_missing_branch() {
        let mut block = LogicBlock::combinational();
        block.add_stmt(IfStmt::new(Expr::var("en")).then_stmt(assign("a", 1)));

        let mut recorder = Recorder::default();
        walk_block("mod", 0, &block, &mut recorder).unwrap();

        assert_eq!(recorder.assigns.len(), 1);
        assert_eq!(recorder.sequences, 2);
    }
}
