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

//! Expressions appearing on either side of an assignment or as a branch predicate.
//!
//! Expressions are plain owned trees. They carry just enough structure for the
//! breakpoint pipeline to render them in SystemVerilog syntax and to derive
//! stable identities from that rendering; widths are not checked here.

use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise invert `~a`
    Invert,
    /// Arithmetic negation `-a`
    Minus,
    /// Logical not `!a`
    Not,
    /// Reduction or `|a`
    ReduceOr,
    /// Reduction and `&a`
    ReduceAnd,
    /// Reduction xor `^a`
    ReduceXor,
}

impl UnaryOp {
    /// Returns the SystemVerilog token of this operator.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Invert => "~",
            Self::Minus => "-",
            Self::Not => "!",
            Self::ReduceOr => "|",
            Self::ReduceAnd => "&",
            Self::ReduceXor => "^",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `<<`
    ShiftLeft,
    /// `>>`
    LogicalShiftRight,
    /// `>>>`
    SignedShiftRight,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessEqThan,
    /// `>=`
    GreaterEqThan,
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
}

impl BinaryOp {
    /// Returns the SystemVerilog token of this operator.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::ShiftLeft => "<<",
            Self::LogicalShiftRight => ">>",
            Self::SignedShiftRight => ">>>",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessEqThan => "<=",
            Self::GreaterEqThan => ">=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
        }
    }
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// A reference to a named variable or port of the enclosing generator.
    Var(String),
    /// A sized constant.
    Const {
        /// The constant value
        value: i64,
        /// Bit width of the constant
        width: u32,
        /// Whether the constant is signed
        is_signed: bool,
    },
    /// A unary operation.
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left hand side
        lhs: Box<Expr>,
        /// Right hand side
        rhs: Box<Expr>,
    },
    /// A bit slice `base[high:low]`.
    Slice {
        /// The sliced expression
        base: Box<Expr>,
        /// High bit (inclusive)
        high: u32,
        /// Low bit (inclusive)
        low: u32,
    },
    /// A concatenation `{a, b, ...}`.
    Concat(Vec<Expr>),
}

impl Expr {
    /// Creates a variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Creates an unsigned constant of the given width.
    pub fn constant(value: i64, width: u32) -> Self {
        Self::Const { value, width, is_signed: false }
    }

    /// Creates a signed constant of the given width.
    pub fn signed_constant(value: i64, width: u32) -> Self {
        Self::Const { value, width, is_signed: true }
    }

    /// Builds `self <op> rhs`.
    pub fn binary(self, op: BinaryOp, rhs: Self) -> Self {
        Self::Binary { op, lhs: Box::new(self), rhs: Box::new(rhs) }
    }

    /// Builds `<op> self`.
    pub fn unary(self, op: UnaryOp) -> Self {
        Self::Unary { op, operand: Box::new(self) }
    }

    /// Builds `self == rhs`.
    pub fn equals(self, rhs: Self) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    /// Builds `self[high:low]`.
    pub fn slice(self, high: u32, low: u32) -> Self {
        Self::Slice { base: Box::new(self), high, low }
    }

    /// Returns the logical negation `!(self)`.
    pub fn negate(&self) -> Self {
        self.clone().unary(UnaryOp::Not)
    }

    /// Returns the root variable name when the expression is a (possibly sliced) variable.
    ///
    /// Assignment targets are always of this shape; concatenated targets return `None`.
    pub fn root_var(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            Self::Slice { base, .. } => base.root_var(),
            _ => None,
        }
    }

    /// Returns every variable name referenced by this expression, left to right.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Var(name) => names.push(name),
            Self::Const { .. } => {}
            Self::Unary { operand, .. } => operand.collect_variables(names),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Self::Slice { base, .. } => base.collect_variables(names),
            Self::Concat(parts) => parts.iter().for_each(|p| p.collect_variables(names)),
        }
    }

    fn is_atomic(&self) -> bool {
        matches!(self, Self::Var(_) | Self::Const { .. } | Self::Slice { .. } | Self::Concat(_))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "{name}"),
            Self::Const { value, width, is_signed } => {
                if *value < 0 {
                    write!(f, "-{width}'{}h{:X}", if *is_signed { "s" } else { "" }, value.unsigned_abs())
                } else {
                    write!(f, "{width}'{}h{value:X}", if *is_signed { "s" } else { "" })
                }
            }
            Self::Unary { op, operand } => {
                if operand.is_atomic() {
                    write!(f, "{}{operand}", op.token())
                } else {
                    write!(f, "{}({operand})", op.token())
                }
            }
            Self::Binary { op, lhs, rhs } => {
                let wrap = |e: &Self| {
                    if matches!(e, Self::Binary { .. }) {
                        format!("({e})")
                    } else {
                        e.to_string()
                    }
                };
                write!(f, "{} {} {}", wrap(lhs), op.token(), wrap(rhs))
            }
            Self::Slice { base, high, low } => {
                if high == low {
                    write!(f, "{base}[{high}]")
                } else {
                    write!(f, "{base}[{high}:{low}]")
                }
            }
            Self::Concat(parts) => write!(f, "{{{}}}", parts.iter().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relational_display() {
        let pred = Expr::var("in1").equals(Expr::constant(2, 16));
        assert_eq!(pred.to_string(), "in1 == 16'h2");
    }

    #[test]
    fn test_negate_wraps_compound_operand() {
        let pred = Expr::var("in1").equals(Expr::constant(1, 16));
        assert_eq!(pred.negate().to_string(), "!(in1 == 16'h1)");
        assert_eq!(Expr::var("en").negate().to_string(), "!en");
    }

    #[test]
    fn test_nested_binary_is_parenthesized() {
        let e = Expr::var("a")
            .binary(BinaryOp::Add, Expr::var("b"))
            .binary(BinaryOp::Mul, Expr::var("c"));
        assert_eq!(e.to_string(), "(a + b) * c");
    }

    #[test]
    fn test_slice_and_concat_display() {
        assert_eq!(Expr::var("a").slice(3, 0).to_string(), "a[3:0]");
        assert_eq!(Expr::var("a").slice(5, 5).to_string(), "a[5]");
        let cat = Expr::Concat(vec![Expr::var("a"), Expr::var("b")]);
        assert_eq!(cat.to_string(), "{a, b}");
    }

    #[test]
    fn test_signed_and_negative_constants() {
        assert_eq!(Expr::signed_constant(-3, 8).to_string(), "-8'sh3");
        assert_eq!(Expr::constant(255, 8).to_string(), "8'hFF");
    }

    #[test]
    fn test_root_var_and_variables() {
        assert_eq!(Expr::var("out").slice(3, 0).root_var(), Some("out"));
        assert_eq!(Expr::Concat(vec![Expr::var("a")]).root_var(), None);

        let e = Expr::var("a").binary(BinaryOp::Add, Expr::var("b").slice(1, 0));
        assert_eq!(e.variables(), vec!["a", "b"]);
    }
}
