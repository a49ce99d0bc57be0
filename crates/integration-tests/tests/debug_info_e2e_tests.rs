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

//! End-to-end tests of the debug information build
//!
//! Each test builds a design, emits it with the reference writer, runs the
//! pipeline into a temporary store and checks the store through both the
//! engine's query layer and raw SQL.

use std::collections::HashSet;

use rtldb_common::{AssignStmt, Expr, LogicBlock, SourcePosition, Statement};
use rtldb_engine::{
    statement_ids, DebugInfoConfig, DebugInfoError, DebugInfoPipeline, DebugStore, EmissionMap,
};
use rtldb_integration_tests::test_utils::{
    designs::{self, SOURCE_FILE},
    emitter::emit_design,
    init, raw,
};
use tempfile::TempDir;
use tracing::info;

const OUTPUT_FILE: &str = "design.sv";

fn pipeline(dir: &TempDir) -> DebugInfoPipeline {
    DebugInfoPipeline::new(DebugInfoConfig::default().with_store_path(dir.path().join("debug.db")))
}

#[test]
fn test_single_assignment_produces_one_row() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let design = designs::single_assignment();
    let rtl = emit_design(&design, Some(OUTPUT_FILE));

    let summary = pipeline(&dir).run(&design, &rtl.emission).unwrap();
    let store_path = summary.store_path.unwrap();
    assert_eq!(raw::row_count(&store_path, "breakpoint").unwrap(), 1);
    assert_eq!(raw::row_count(&store_path, "breakpoint_source").unwrap(), 1);

    let store = DebugStore::open(&store_path).unwrap();
    let records = store.breakpoints().unwrap();
    let record = &records[0];
    assert_eq!(record.generator_path, "mod");
    assert_eq!(record.target_names(), vec!["out"]);
    assert!(record.condition_path.is_empty());
    assert_eq!(record.source_positions, vec![SourcePosition::new(SOURCE_FILE, 5)]);

    let pos = record.output_position.as_ref().unwrap();
    assert_eq!(pos.file.as_deref(), Some(OUTPUT_FILE));
    assert_eq!(rtl.line(pos.line).unwrap().trim(), "out = in;");
}

#[test]
fn test_if_chain_produces_one_record_per_branch() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let design = designs::if_chain();
    let rtl = emit_design(&design, Some(OUTPUT_FILE));

    let summary = pipeline(&dir).run(&design, &rtl.emission).unwrap();
    let store_path = summary.store_path.unwrap();
    let store = DebugStore::open(&store_path).unwrap();
    let records = store.breakpoints().unwrap();
    assert_eq!(records.len(), 4);

    let paths: HashSet<_> = records.iter().map(|r| r.condition_path.clone()).collect();
    assert_eq!(paths.len(), 4);
    for record in &records {
        info!("{record}");
        assert!(!record.condition_path.is_empty());
        assert_eq!(record.target_names(), vec!["out"]);
        let line = record.output_position.as_ref().unwrap().line;
        assert!(rtl.line(line).unwrap().trim_start().starts_with("out = 16'h"));
    }

    assert_eq!(records[0].condition_path.predicates(), ["in1 == 16'h2"]);
    assert_eq!(
        records[3].condition_path.predicates(),
        ["!(in1 == 16'h2)", "!(in1 == 16'h1)", "!(in1 == 16'h3)"]
    );
    let stored = raw::column(&store_path, "breakpoint", "condition").unwrap();
    assert_eq!(stored[1], "(!(in1 == 16'h2)) && (in1 == 16'h1)");
}

#[test]
fn test_sequential_block_groups_register_updates() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let design = designs::sequential_and_combinational();
    let rtl = emit_design(&design, Some(OUTPUT_FILE));

    let summary = pipeline(&dir).run(&design, &rtl.emission).unwrap();
    assert_eq!(summary.records.len(), 4);

    let store = DebugStore::open(summary.store_path.unwrap()).unwrap();
    let records = store.breakpoints().unwrap();
    let sequential: Vec<_> = records.iter().filter(|r| r.block_kind.clock().is_some()).collect();
    assert_eq!(sequential.len(), 2);
    for record in &sequential {
        assert_eq!(record.block_index, 0);
        assert_eq!(record.target_names(), vec!["count", "seen"]);
        assert_eq!(record.source_positions.len(), 2);
        for target in &record.targets {
            let line = rtl.line(target.output_line.unwrap()).unwrap();
            assert!(line.contains(&format!("{} <=", target.variable)), "{line}");
        }
    }
    assert_eq!(sequential[0].condition_path.predicates(), ["rst"]);
    assert_eq!(sequential[1].condition_path.predicates(), ["!rst"]);

    let combinational: Vec<_> = records.iter().filter(|r| r.block_index == 1).collect();
    assert_eq!(combinational.len(), 2);
    assert!(combinational.iter().all(|r| r.condition_path.is_empty() && r.targets.len() == 1));
}

#[test]
fn test_missing_emitted_position_aborts_without_store() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let design = designs::if_chain();
    let rtl = emit_design(&design, Some(OUTPUT_FILE));

    let ids = statement_ids(&design);
    let partial: EmissionMap = ids
        .iter()
        .skip(1)
        .filter_map(|(id, _)| rtl.emission.get(*id).map(|pos| (*id, pos.line, pos.column)))
        .collect();

    let pipeline = pipeline(&dir);
    match pipeline.run(&design, &partial).unwrap_err() {
        DebugInfoError::MissingCorrelation { id, generator_path, .. } => {
            assert_eq!(id, ids[0].0);
            assert_eq!(generator_path, "mod");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!pipeline.config().store_path.as_ref().unwrap().exists());
}

#[test]
fn test_ids_are_stable_across_builds() {
    init::init_test_environment();
    let design = designs::sequential_and_combinational();
    let rtl = emit_design(&design, None);
    let pipeline = DebugInfoPipeline::default();

    let first = pipeline.run(&design, &rtl.emission).unwrap();
    let second = pipeline.run(&design, &emit_design(&design, None).emission).unwrap();
    let ids = |records: &[rtldb_common::BreakpointRecord]| {
        records.iter().map(|r| r.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first.records), ids(&second.records));

    // Appending an unrelated block leaves existing ids untouched.
    let mut extended = design.clone();
    let top = extended.roots().next().unwrap();
    let mut extra = LogicBlock::combinational();
    extra.add_stmt(AssignStmt::new(Expr::var("out"), Expr::constant(0, 8)));
    extended[top].add_block(extra);
    let third = pipeline.run(&extended, &emit_design(&extended, None).emission).unwrap();
    assert_eq!(ids(&third.records[..4]), ids(&first.records));
    assert_eq!(third.records.len(), 5);

    // Editing one driving expression changes only the ids of that statement's record.
    let mut edited = design.clone();
    if let Statement::Assign(stmt) = &mut edited[top].blocks[1].stmts[1] {
        stmt.value = Expr::var("in").slice(0, 0);
    }
    let fourth = pipeline.run(&edited, &emit_design(&edited, None).emission).unwrap();
    assert_eq!(ids(&fourth.records[..3]), ids(&first.records[..3]));
    assert_ne!(fourth.records[3].id, first.records[3].id);
}

#[test]
fn test_rebuild_replaces_previous_store() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&dir);

    let design = designs::if_chain();
    let summary = pipeline.run(&design, &emit_design(&design, None).emission).unwrap();
    let store_path = summary.store_path.unwrap();
    assert_eq!(raw::row_count(&store_path, "breakpoint").unwrap(), 4);

    let design = designs::single_assignment();
    pipeline.run(&design, &emit_design(&design, None).emission).unwrap();
    assert_eq!(raw::row_count(&store_path, "breakpoint").unwrap(), 1);
    assert_eq!(raw::row_count(&store_path, "hierarchy").unwrap(), 1);
}

#[test]
fn test_hierarchy_and_prefix_queries() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let design = designs::hierarchy_with_switch();
    let rtl = emit_design(&design, Some(OUTPUT_FILE));

    let summary = pipeline(&dir).run(&design, &rtl.emission).unwrap();
    assert_eq!(summary.generators, 4);
    let store = DebugStore::open(summary.store_path.unwrap()).unwrap();

    let under_top = store.breakpoints_under("top").unwrap();
    assert_eq!(under_top.len(), 6);
    assert!(under_top.iter().all(|r| r.generator_path.starts_with("top.dec")));
    assert_eq!(store.breakpoints_under("top.dec1").unwrap().len(), 3);
    assert_eq!(store.breakpoints_under("topx").unwrap().len(), 1);

    // Identical definitions at different instance paths get distinct ids.
    let ids: HashSet<_> = store.breakpoints().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 7);

    let default_arm = &store.breakpoints_under("top.dec0").unwrap()[2];
    assert_eq!(default_arm.condition_path.predicates(), ["!(sel == 2'h0)", "!(sel == 2'h1)"]);

    let hierarchy = store.hierarchy().unwrap();
    let paths: Vec<_> = hierarchy.iter().map(|h| h.path.as_str()).collect();
    assert_eq!(paths, vec!["top", "top.dec0", "top.dec1", "topx"]);
    assert_eq!(hierarchy[2].name, "decoder");
    assert_eq!(store.variables("top.dec1").unwrap().len(), 2);
}

#[test]
fn test_line_lookup_finds_every_record() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let design = designs::sequential_and_combinational();
    let rtl = emit_design(&design, Some(OUTPUT_FILE));

    let summary = pipeline(&dir).run(&design, &rtl.emission).unwrap();
    let store = DebugStore::open(summary.store_path.unwrap()).unwrap();

    for record in &summary.records {
        for target in &record.targets {
            let found = store.breakpoints_at_line(Some(OUTPUT_FILE), target.output_line.unwrap()).unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id, record.id);
        }
    }
    assert!(store.breakpoints_at_line(Some(OUTPUT_FILE), 1).unwrap().is_empty());
}

#[test]
fn test_config_file_drives_pipeline() {
    init::init_test_environment();
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("from-config.db");
    let config_path = dir.path().join("rtldb.toml");
    std::fs::write(
        &config_path,
        format!(
            "store_path = {:?}\noutput_file = \"top.sv\"\nrecord_source_positions = false\n",
            store_path.to_string_lossy()
        ),
    )
    .unwrap();

    let config = DebugInfoConfig::load(&config_path).unwrap();
    let design = designs::single_assignment();
    let summary =
        DebugInfoPipeline::new(config).run(&design, &emit_design(&design, None).emission).unwrap();

    let store = DebugStore::open(&store_path).unwrap();
    let record = &store.breakpoints().unwrap()[0];
    assert!(record.source_positions.is_empty());
    assert_eq!(record.output_position.as_ref().unwrap().file.as_deref(), Some("top.sv"));
    assert_eq!(summary.records[0], *record);
}
