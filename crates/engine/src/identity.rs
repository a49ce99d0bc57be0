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

//! Stable statement identities.
//!
//! An id is the leading eight bytes of a SHA-256 digest over the statement's
//! canonical key: where it lives (generator path, block, structural position)
//! and what it is (condition path, target, value, assignment kind). Nothing
//! that varies between runs, such as memory addresses or visitation counters,
//! takes part in the key, so an unchanged design always yields the same ids.

use std::collections::{hash_map::Entry, HashMap};

use rtldb_common::{AssignStmt, BlockKind, Design, SourcePosition, StmtId};
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::{walk_block, DebugInfoError, PathSegment, StatementVisitor, WalkContext};

const FIELD_SEPARATOR: char = '\u{1f}';

/// Builds the canonical key of an assignment at the walker's current position.
pub fn canonical_key(stmt: &AssignStmt, ctx: &WalkContext<'_>) -> String {
    let block = match ctx.block_kind {
        BlockKind::Combinational => "combinational".to_string(),
        BlockKind::Sequential { clock, edge } => format!("sequential@{} {clock}", edge.as_str()),
    };
    [
        ctx.generator_path.to_string(),
        format!("{}:{block}", ctx.block_index),
        ctx.position_string(),
        ctx.condition_path().conjunction(),
        stmt.target.to_string(),
        stmt.value.to_string(),
        stmt.kind.as_str().to_string(),
    ]
    .join(&FIELD_SEPARATOR.to_string())
}

/// Derives the id of a canonical key.
pub fn id_of_key(key: &str) -> StmtId {
    StmtId::from_digest(&Sha256::digest(key.as_bytes()))
}

/// Derives the id of an assignment at the walker's current position.
pub fn assign(stmt: &AssignStmt, ctx: &WalkContext<'_>) -> StmtId {
    id_of_key(&canonical_key(stmt, ctx))
}

#[derive(Debug)]
struct Registered {
    key: String,
    sources: Vec<SourcePosition>,
}

/// Tracks every id handed out during one build and rejects collisions.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    seen: HashMap<StmtId, Registered>,
}

impl IdentityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` as derived from `key`.
    ///
    /// Each statement is registered exactly once per build, so an id that is
    /// already taken is an [`DebugInfoError::IdentityCollision`], even when
    /// both statements share the same canonical key.
    pub fn register(
        &mut self,
        id: StmtId,
        key: String,
        sources: &[SourcePosition],
    ) -> Result<(), DebugInfoError> {
        match self.seen.entry(id) {
            Entry::Occupied(entry) => {
                let first = entry.get();
                let mut all_sources = first.sources.clone();
                all_sources.extend_from_slice(sources);
                Err(DebugInfoError::IdentityCollision {
                    id,
                    first: first.key.clone(),
                    second: key,
                    sources: all_sources,
                })
            }
            Entry::Vacant(entry) => {
                trace!(%id, key = %entry.key(), "registered statement");
                entry.insert(Registered { key, sources: sources.to_vec() });
                Ok(())
            }
        }
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Where an assignment lives in a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StmtLocation {
    /// Instance path of the owning generator
    pub generator_path: String,
    /// Index of the logic block within the generator
    pub block_index: usize,
    /// Structural position within the block
    pub position: Vec<PathSegment>,
}

#[derive(Default)]
struct IdCollector {
    ids: Vec<(StmtId, StmtLocation)>,
}

impl StatementVisitor for IdCollector {
    type Error = std::convert::Infallible;

    fn visit_assign(&mut self, ctx: &WalkContext<'_>, stmt: &AssignStmt) -> Result<(), Self::Error> {
        self.ids.push((
            assign(stmt, ctx),
            StmtLocation {
                generator_path: ctx.generator_path.to_string(),
                block_index: ctx.block_index,
                position: ctx.position().to_vec(),
            },
        ));
        Ok(())
    }
}

/// Ids of every assignment in `design`, in generator pre-order then program order.
///
/// This is what an RTL emitter uses to tag the lines it writes; the ids
/// match the ones the flattener derives for the same statements.
pub fn statement_ids(design: &Design) -> Vec<(StmtId, StmtLocation)> {
    let mut collector = IdCollector::default();
    for id in design.iter_preorder() {
        let path = design.handle_name(id);
        for (index, block) in design[id].blocks.iter().enumerate() {
            if let Err(never) = walk_block(&path, index, block, &mut collector) {
                match never {}
            }
        }
    }
    collector.ids
}

#[cfg(test)]
mod tests {
    use rtldb_common::{AssignKind, Expr, IfStmt, LogicBlock};

    use super::*;

    fn sample_design() -> Design {
        let mut design = Design::new();
        let top = design.add_generator("top");
        let mut block = LogicBlock::combinational();
        block
            .add_stmt(AssignStmt::new(Expr::var("a"), Expr::constant(1, 4)))
            .add_stmt(AssignStmt::new(Expr::var("a"), Expr::constant(1, 4)))
            .add_stmt(
                IfStmt::new(Expr::var("en"))
                    .then_stmt(AssignStmt::new(Expr::var("b"), Expr::var("a")))
                    .else_stmt(AssignStmt::new(Expr::var("b"), Expr::var("a"))),
            );
        design[top].add_block(block);
        design
    }

    #[test]
    fn test_ids_are_deterministic() {
        let first = statement_ids(&sample_design());
        let second = statement_ids(&sample_design());
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_identical_text_at_different_positions_differ() {
        let ids = statement_ids(&sample_design());
        // Same target and value, different sequence index.
        assert_ne!(ids[0].0, ids[1].0);
        // Same target and value, then versus else.
        assert_ne!(ids[2].0, ids[3].0);
        assert_eq!(ids[3].1.position, vec![PathSegment::Index(2), PathSegment::Else, PathSegment::Index(0)]);
    }

    #[test]
    fn test_assign_kind_and_path_participate() {
        let mut design = sample_design();
        let before = statement_ids(&design);

        let top = design.roots().next().unwrap();
        if let rtldb_common::Statement::Assign(stmt) = &mut design[top].blocks[0].stmts[0] {
            stmt.kind = AssignKind::Blocking;
        }
        let after = statement_ids(&design);
        assert_ne!(before[0].0, after[0].0);
        assert_eq!(before[1].0, after[1].0);

        design[top].instance_name = "renamed".into();
        let renamed = statement_ids(&design);
        assert_ne!(after[1].0, renamed[1].0);
    }

    #[test]
    fn test_source_positions_do_not_participate() {
        let mut design = sample_design();
        let before = statement_ids(&design);
        let top = design.roots().next().unwrap();
        if let rtldb_common::Statement::Assign(stmt) = &mut design[top].blocks[0].stmts[0] {
            stmt.sources.push(SourcePosition::new("gen.py", 10));
        }
        assert_eq!(before, statement_ids(&design));
    }

    #[test]
    fn test_registry_detects_collision() {
        let mut registry = IdentityRegistry::new();
        let id = StmtId::from(7);
        registry.register(id, "key-a".into(), &[SourcePosition::new("a.py", 1)]).unwrap();
        assert_eq!(registry.len(), 1);

        let err = registry.register(id, "key-b".into(), &[SourcePosition::new("b.py", 2)]).unwrap_err();
        match err {
            DebugInfoError::IdentityCollision { first, second, sources, .. } => {
                assert_eq!(first, "key-a");
                assert_eq!(second, "key-b");
                assert_eq!(sources.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_key_registered_twice_collides() {
        let mut registry = IdentityRegistry::new();
        let id = id_of_key("key-a");
        registry.register(id, "key-a".into(), &[SourcePosition::new("a.py", 1)]).unwrap();

        let err = registry.register(id, "key-a".into(), &[SourcePosition::new("a.py", 1)]).unwrap_err();
        match err {
            DebugInfoError::IdentityCollision { id: shared, first, second, sources } => {
                assert_eq!(shared, id);
                assert_eq!(first, second);
                assert_eq!(sources.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_changing_a_target_changes_only_that_id() {
        let mut design = sample_design();
        let before = statement_ids(&design);

        let top = design.roots().next().unwrap();
        if let rtldb_common::Statement::Assign(stmt) = &mut design[top].blocks[0].stmts[1] {
            stmt.target = Expr::var("a").slice(3, 0);
        }
        let after = statement_ids(&design);
        assert_eq!(before.len(), after.len());
        for (i, ((old, _), (new, _))) in before.iter().zip(&after).enumerate() {
            if i == 1 {
                assert_ne!(old, new);
            } else {
                assert_eq!(old, new, "statement {i} changed");
            }
        }
    }
}
