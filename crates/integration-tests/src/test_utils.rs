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

//! Test utilities for integration tests

/// Initialization utilities for tests
pub mod init {
    /// Initialize logging for a test; safe to call from every test
    pub fn init_test_environment() {
        rtldb_common::logging::ensure_test_logging(None);
    }
}

/// Ready-made designs used across the end-to-end tests
pub mod designs {
    use rtldb_common::{
        AssignKind, AssignStmt, Design, Edge, Expr, IfStmt, LogicBlock, Statement, SwitchStmt,
    };

    /// Source file the test designs pretend to be written in
    pub const SOURCE_FILE: &str = "generator.py";

    /// `out = in` in a single combinational block
    pub fn single_assignment() -> Design {
        let mut design = Design::new();
        let top = design.add_generator("mod");
        design[top].debug = true;
        design[top].input("in", 1).output("out", 1);

        let mut comb = LogicBlock::combinational();
        comb.add_stmt(
            AssignStmt::new(Expr::var("out"), Expr::var("in")).with_source(SOURCE_FILE, 5),
        );
        design[top].add_block(comb);
        design
    }

    /// An if / else-if / else-if / else chain assigning `out` in every branch
    pub fn if_chain() -> Design {
        let in1 = || Expr::var("in1");
        let out = |value: i64, line: u32| {
            AssignStmt::new(Expr::var("out"), Expr::constant(value, 16)).with_source(SOURCE_FILE, line)
        };

        let mut design = Design::new();
        let top = design.add_generator("mod");
        design[top].debug = true;
        design[top].input("in1", 16).output("out", 16);

        let chain = IfStmt::new(in1().equals(Expr::constant(2, 16))).then_stmt(out(2, 10)).else_stmt(
            IfStmt::new(in1().equals(Expr::constant(1, 16))).then_stmt(out(0, 12)).else_stmt(
                IfStmt::new(in1().equals(Expr::constant(3, 16)))
                    .then_stmt(out(1, 14))
                    .else_stmt(out(3, 16)),
            ),
        );
        let mut comb = LogicBlock::combinational();
        comb.add_stmt(chain);
        design[top].add_block(comb);
        design
    }

    /// A clocked register pair with reset next to two combinational outputs
    pub fn sequential_and_combinational() -> Design {
        let mut design = Design::new();
        let top = design.add_generator("counter");
        design[top].debug = true;
        design[top]
            .clock("clk")
            .reset("rst")
            .input("in", 8)
            .output("out", 8)
            .output("valid", 1)
            .var("count", 8)
            .var("seen", 1);

        let nb = |target: &str, value: Expr, line: u32| {
            AssignStmt::new(Expr::var(target), value)
                .with_kind(AssignKind::NonBlocking)
                .with_source(SOURCE_FILE, line)
        };
        let mut seq = LogicBlock::sequential("clk", Edge::Posedge);
        seq.add_stmt(
            IfStmt::new(Expr::var("rst"))
                .then_stmt(nb("count", Expr::constant(0, 8), 20))
                .then_stmt(nb("seen", Expr::constant(0, 1), 21))
                .else_stmt(nb("count", Expr::var("in"), 23))
                .else_stmt(nb("seen", Expr::constant(1, 1), 24)),
        );
        design[top].add_block(seq);

        let mut comb = LogicBlock::combinational();
        comb.add_stmt(
            AssignStmt::new(Expr::var("out"), Expr::var("count")).with_source(SOURCE_FILE, 27),
        )
        .add_stmt(
            AssignStmt::new(Expr::var("valid"), Expr::var("seen")).with_source(SOURCE_FILE, 28),
        );
        design[top].add_block(comb);
        design
    }

    /// A decoder driven by a case statement, instantiated twice under a top
    pub fn hierarchy_with_switch() -> Design {
        let mut design = Design::new();
        let top = design.add_generator("top");
        design[top].debug = true;
        design[top].input("sel", 2).output("y", 4);

        for instance in ["dec0", "dec1"] {
            let child = design.add_child(top, "decoder", instance);
            design[child].debug = true;
            design[child].input("sel", 2).output("y", 4);

            let arm = |value: i64, line: u32| -> Vec<Statement> {
                vec![AssignStmt::new(Expr::var("y"), Expr::constant(value, 4))
                    .with_source(SOURCE_FILE, line)
                    .into()]
            };
            let mut comb = LogicBlock::combinational();
            comb.add_stmt(
                SwitchStmt::new(Expr::var("sel"))
                    .case(Expr::constant(0, 2), arm(1, 40))
                    .case(Expr::constant(1, 2), arm(2, 41))
                    .default_case(arm(8, 42)),
            );
            design[child].add_block(comb);
        }

        // A sibling whose name shares the `top` prefix without being below it.
        let other = design.add_generator("topx");
        design[other].debug = true;
        design[other].output("z", 1);
        let mut comb = LogicBlock::combinational();
        comb.add_stmt(AssignStmt::new(Expr::var("z"), Expr::constant(0, 1)));
        design[other].add_block(comb);
        design
    }
}

/// A small SystemVerilog writer standing in for the real RTL emitter
pub mod emitter {
    use std::vec::IntoIter;

    use rtldb_common::{
        AssignKind, AssignStmt, BlockKind, Design, LogicBlock, Statement, StmtId, VarKind,
    };
    use rtldb_engine::{statement_ids, EmissionMap, StmtLocation};

    /// Generated text and the position of every assignment in it
    #[derive(Debug, Clone)]
    pub struct EmittedRtl {
        /// SystemVerilog source
        pub text: String,
        /// Line and column of every emitted assignment
        pub emission: EmissionMap,
    }

    impl EmittedRtl {
        /// The 1-based line `line` of the output.
        pub fn line(&self, line: u32) -> Option<&str> {
            self.text.lines().nth(line.checked_sub(1)? as usize)
        }
    }

    struct Writer {
        lines: Vec<String>,
        indent: usize,
        ids: IntoIter<(StmtId, StmtLocation)>,
        emission: EmissionMap,
    }

    impl Writer {
        fn push(&mut self, text: impl AsRef<str>) {
            self.lines.push(format!("{}{}", "    ".repeat(self.indent), text.as_ref()));
        }

        fn block(&mut self, block: &LogicBlock) {
            match &block.kind {
                BlockKind::Combinational => self.push("always_comb begin"),
                BlockKind::Sequential { clock, edge } => {
                    self.push(format!("always_ff @({} {clock}) begin", edge.as_str()))
                }
            }
            self.indent += 1;
            self.stmts(&block.stmts, &block.kind);
            self.indent -= 1;
            self.push("end");
        }

        fn stmts(&mut self, stmts: &[Statement], kind: &BlockKind) {
            for stmt in stmts {
                self.stmt(stmt, kind);
            }
        }

        fn stmt(&mut self, stmt: &Statement, kind: &BlockKind) {
            match stmt {
                Statement::Assign(assign) => self.assign(assign, kind),
                Statement::If(if_stmt) => {
                    self.push(format!("if ({}) begin", if_stmt.predicate));
                    self.nested(&if_stmt.then_body, kind);
                    if if_stmt.else_body.is_empty() {
                        self.push("end");
                    } else {
                        self.push("end else begin");
                        self.nested(&if_stmt.else_body, kind);
                        self.push("end");
                    }
                }
                Statement::Switch(switch) => {
                    self.push(format!("unique case ({})", switch.target));
                    self.indent += 1;
                    for case in &switch.cases {
                        match &case.label {
                            Some(label) => self.push(format!("{label}: begin")),
                            None => self.push("default: begin"),
                        }
                        self.nested(&case.body, kind);
                        self.push("end");
                    }
                    self.indent -= 1;
                    self.push("endcase");
                }
                Statement::Block(scope) => {
                    self.push("begin");
                    self.nested(&scope.stmts, kind);
                    self.push("end");
                }
            }
        }

        fn nested(&mut self, stmts: &[Statement], kind: &BlockKind) {
            self.indent += 1;
            self.stmts(stmts, kind);
            self.indent -= 1;
        }

        fn assign(&mut self, assign: &AssignStmt, kind: &BlockKind) {
            let op = match (assign.kind, kind) {
                (AssignKind::Blocking, _) => "=",
                (AssignKind::NonBlocking, _) => "<=",
                (AssignKind::Undefined, BlockKind::Combinational) => "=",
                (AssignKind::Undefined, BlockKind::Sequential { .. }) => "<=",
            };
            self.push(format!("{} {op} {};", assign.target, assign.value));
            if let Some((id, _)) = self.ids.next() {
                let line = self.lines.len() as u32;
                self.emission.insert(id, line, (self.indent * 4) as u32);
            }
        }
    }

    /// Writes every generator of `design` as a module, recording statement positions.
    pub fn emit_design(design: &Design, file: Option<&str>) -> EmittedRtl {
        let mut writer = Writer {
            lines: Vec::new(),
            indent: 0,
            ids: statement_ids(design).into_iter(),
            emission: EmissionMap::new(file.map(str::to_string)),
        };

        for id in design.iter_preorder() {
            let generator = &design[id];
            writer.push(format!("module {} (", generator.name));
            writer.indent += 1;
            let ports: Vec<_> = generator
                .variables
                .iter()
                .filter(|v| v.kind != VarKind::Var)
                .map(|v| {
                    let dir = if v.kind == VarKind::Output { "output" } else { "input" };
                    format!("{dir} logic [{}:0] {}", v.width.saturating_sub(1), v.name)
                })
                .collect();
            let port_count = ports.len();
            for (i, port) in ports.into_iter().enumerate() {
                writer.push(if i + 1 < port_count { format!("{port},") } else { port });
            }
            writer.indent -= 1;
            writer.push(");");
            writer.indent += 1;
            for var in generator.variables.iter().filter(|v| v.kind == VarKind::Var) {
                writer.push(format!("logic [{}:0] {};", var.width.saturating_sub(1), var.name));
            }
            for block in &generator.blocks {
                writer.block(block);
            }
            writer.indent -= 1;
            writer.push("endmodule");
            writer.push("");
        }

        EmittedRtl { text: writer.lines.join("\n"), emission: writer.emission }
    }
}

/// Raw access to a written store, bypassing the engine's query layer
pub mod raw {
    use std::path::Path;

    use rusqlite::Connection;

    /// Number of rows in `table`.
    pub fn row_count(path: &Path, table: &str) -> eyre::Result<i64> {
        let conn = Connection::open(path)?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Every value of `column` in `table`, in insertion order.
    pub fn column(path: &Path, table: &str, column: &str) -> eyre::Result<Vec<String>> {
        let conn = Connection::open(path)?;
        let mut stmt = conn.prepare(&format!("SELECT {column} FROM {table} ORDER BY rowid"))?;
        let values = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }
}
