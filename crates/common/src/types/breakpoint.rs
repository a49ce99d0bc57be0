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

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use eyre::{bail, eyre, Error, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::BlockKind;

/// A content-derived statement identifier.
///
/// The same statement at the same place in an unchanged design always maps
/// to the same id across builds. Rendered as 16 lowercase hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(u64);

impl StmtId {
    /// Builds an id from the leading eight bytes of a digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 8];
        let n = digest.len().min(8);
        bytes[..n].copy_from_slice(&digest[..n]);
        Self(u64::from_be_bytes(bytes))
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for StmtId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<StmtId> for u64 {
    fn from(value: StmtId) -> Self {
        value.0
    }
}

impl Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0.to_be_bytes()))
    }
}

impl FromStr for StmtId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| eyre!("Invalid statement id {s:?}: {e}"))?;
        if bytes.len() != 8 {
            bail!("Invalid statement id {s:?}: expected 16 hex digits");
        }
        Ok(Self::from_digest(&bytes))
    }
}

/// A location in the high-level source that produced a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Path of the source file
    pub filename: String,
    /// Line number (1-based)
    pub line: u32,
}

impl SourcePosition {
    /// Creates a new source position.
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self { filename: filename.into(), line }
    }
}

impl Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

/// A location in the generated RTL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputPosition {
    /// The generated file, when the emitter wrote to one
    pub file: Option<String>,
    /// Line number (1-based)
    pub line: u32,
    /// Column or byte offset within the line
    pub column: u32,
}

impl Display for OutputPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

impl FromStr for OutputPosition {
    type Err = Error;

    /// Parses `<line>`, `<line>:<column>`, `<file>:<line>` or `<file>:<line>:<column>`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let number = |p: &str, what: &str| {
            p.parse::<u32>().map_err(|e| eyre!("Invalid {what} {p:?}: {e}"))
        };
        match parts.as_slice() {
            [line] => Ok(Self { file: None, line: number(*line, "line")?, column: 0 }),
            [a, b] => match a.parse::<u32>() {
                Ok(line) => Ok(Self { file: None, line, column: number(*b, "column")? }),
                Err(_) => Ok(Self { file: Some(a.to_string()), line: number(*b, "line")?, column: 0 }),
            },
            [file, line, column] => Ok(Self {
                file: Some(file.to_string()),
                line: number(*line, "line")?,
                column: number(*column, "column")?,
            }),
            _ => bail!("Invalid output position format. Expected [<file>:]<line>[:<column>], got: {s}"),
        }
    }
}

/// The ordered conjunction of predicates guarding a breakpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionPath(pub Vec<String>);

impl ConditionPath {
    /// Whether the breakpoint is unconditional.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The predicates in the order they are entered.
    pub fn predicates(&self) -> &[String] {
        &self.0
    }

    /// Renders the conjunction as a single expression, `1` when unconditional.
    pub fn conjunction(&self) -> String {
        match self.0.as_slice() {
            [] => "1".to_string(),
            [single] => single.clone(),
            many => many.iter().map(|p| format!("({p})")).join(" && "),
        }
    }
}

impl Display for ConditionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.conjunction())
    }
}

/// One assignment folded into a breakpoint record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointTarget {
    /// Id of the assignment statement
    pub statement: StmtId,
    /// Name of the assigned variable
    pub variable: String,
    /// Rendered driving expression
    pub value: String,
    /// Line of this assignment in the generated RTL, once correlated
    pub output_line: Option<u32>,
}

/// The persisted debugging unit: one reachable group of assignments sharing
/// a condition path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointRecord {
    /// Id of the leading statement of the group
    pub id: StmtId,
    /// Instance path of the owning generator
    pub generator_path: String,
    /// Index of the logic block within its generator
    pub block_index: usize,
    /// Kind of the logic block
    pub block_kind: BlockKind,
    /// Predicates that must hold to reach this record
    pub condition_path: ConditionPath,
    /// Grouped assignments in statement order
    pub targets: Vec<BreakpointTarget>,
    /// Source positions of the grouped statements; empty when unavailable
    pub source_positions: Vec<SourcePosition>,
    /// Location in the generated RTL, once correlated
    pub output_position: Option<OutputPosition>,
}

impl BreakpointRecord {
    /// Names of the assigned variables in order.
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.variable.as_str()).collect()
    }

    /// Ids of every grouped statement in order.
    pub fn statement_ids(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.targets.iter().map(|t| t.statement)
    }
}

impl Display for BreakpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}[{}]", self.id, self.generator_path, self.block_index)?;
        if let Some(pos) = &self.output_position {
            write!(f, " @{pos}")?;
        }
        write!(f, " {{{}}}", self.target_names().join(", "))?;
        if !self.condition_path.is_empty() {
            write!(f, " if {}", self.condition_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stmt_id_hex_round_trip() {
        let id = StmtId::from(0x0123_4567_89ab_cdef);
        assert_eq!(id.to_string(), "0123456789abcdef");
        assert_eq!("0123456789abcdef".parse::<StmtId>().unwrap(), id);
        assert!("0123".parse::<StmtId>().is_err());
        assert!("not-hex".parse::<StmtId>().is_err());
    }

    #[test]
    fn test_from_digest_takes_leading_bytes() {
        let digest = [0xffu8, 0, 0, 0, 0, 0, 0, 1, 0xaa, 0xbb];
        assert_eq!(StmtId::from_digest(&digest).as_u64(), 0xff00_0000_0000_0001);
    }

    #[test]
    fn test_output_position_parse() {
        let pos: OutputPosition = "test.sv:12:4".parse().unwrap();
        assert_eq!(pos, OutputPosition { file: Some("test.sv".into()), line: 12, column: 4 });

        let pos: OutputPosition = "test.sv:12".parse().unwrap();
        assert_eq!(pos, OutputPosition { file: Some("test.sv".into()), line: 12, column: 0 });

        let pos: OutputPosition = "12:3".parse().unwrap();
        assert_eq!(pos, OutputPosition { file: None, line: 12, column: 3 });

        let pos: OutputPosition = "7".parse().unwrap();
        assert_eq!(pos.line, 7);

        assert!("a:b:c:d".parse::<OutputPosition>().is_err());
        assert!("test.sv:x".parse::<OutputPosition>().is_err());
    }

    #[test]
    fn test_condition_conjunction() {
        assert_eq!(ConditionPath::default().conjunction(), "1");
        let single = ConditionPath(vec!["a == 1'h1".into()]);
        assert_eq!(single.conjunction(), "a == 1'h1");
        let many = ConditionPath(vec!["!(a == 1'h1)".into(), "b".into()]);
        assert_eq!(many.conjunction(), "(!(a == 1'h1)) && (b)");
    }
}
