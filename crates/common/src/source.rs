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

//! Source snippets for diagnostics
//!
//! When the pipeline has to report a statement, it points back at the
//! high-level code that created it. These helpers render a few lines around
//! a [`SourcePosition`] with the offending line marked.

use std::{
    fs,
    io::{BufRead, BufReader},
};

use crate::SourcePosition;

/// Default number of lines printed before and after the marked line.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Renders `context_lines` lines around `position`, marking the position's line with `>`.
///
/// Returns `None` when the file cannot be read or the line is out of range.
pub fn render_source_context(position: &SourcePosition, context_lines: usize) -> Option<String> {
    let file = fs::File::open(&position.filename).ok()?;
    let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();
    render_lines(&position.filename, &lines, position.line as usize, context_lines)
}

/// Renders context for every position that can be read, separated by blank lines.
pub fn render_all_contexts(positions: &[SourcePosition], context_lines: usize) -> String {
    positions
        .iter()
        .filter_map(|pos| render_source_context(pos, context_lines))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_lines(
    filename: &str,
    lines: &[String],
    line_number: usize,
    context_lines: usize,
) -> Option<String> {
    if line_number == 0 || line_number > lines.len() {
        return None;
    }

    let start = line_number.saturating_sub(context_lines).max(1);
    let end = (line_number + context_lines).min(lines.len());
    let width = end.to_string().len();

    let mut context = format!("{filename}\n");
    for n in start..=end {
        let marker = if n == line_number { '>' } else { ' ' };
        context.push_str(&format!("{marker} {n:>width$} | {}\n", lines[n - 1]));
    }
    Some(context)
}
