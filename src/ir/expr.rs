use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::guard;
use super::node::{Node, NodeType};
use super::sql_node::{ColumnRef, CompareOp, Comparison, Literal, Query, Term};
use crate::impl_node_display;

/// Operators of the expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        f.write_str(symbol)
    }
}

impl From<CompareOp> for BinaryOperator {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Eq => BinaryOperator::Eq,
            CompareOp::Ne => BinaryOperator::Ne,
            CompareOp::Gt => BinaryOperator::Gt,
            CompareOp::Ge => BinaryOperator::Ge,
            CompareOp::Lt => BinaryOperator::Lt,
            CompareOp::Le => BinaryOperator::Le,
        }
    }
}

/// A node of the expression tree.
///
/// Untagged: each variant is recognised by its own field names, so the text
/// of an `Expr` is exactly the text of the variant it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Literal(LiteralExpr),
    Column(ColumnExpr),
    Binary(BinaryExpr),
}

/// A constant. Leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralExpr {
    pub value: Literal,
}

/// A column reference. Leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnExpr {
    pub column: ColumnRef,
}

/// `left op right`. Owns both operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOperator,
    #[serde(serialize_with = "guard::nested")]
    pub left: Box<Expr>,
    #[serde(serialize_with = "guard::nested")]
    pub right: Box<Expr>,
}

impl Expr {
    pub fn literal(value: impl Into<Literal>) -> Expr {
        Expr::Literal(LiteralExpr { value: value.into() })
    }

    pub fn column(column: ColumnRef) -> Expr {
        Expr::Column(ColumnExpr { column })
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Column(_) => 1,
            Expr::Binary(b) => 1 + b.left.size() + b.right.size(),
        }
    }

    /// Number of child links on the longest path from this node to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Column(_) => 0,
            Expr::Binary(b) => 1 + b.left.depth().max(b.right.depth()),
        }
    }
}

impl From<&Term> for Expr {
    fn from(term: &Term) -> Self {
        match term {
            Term::Column(column) => Expr::column(column.clone()),
            Term::Literal(value) => Expr::literal(value.clone()),
        }
    }
}

impl From<&Comparison> for Expr {
    fn from(comparison: &Comparison) -> Self {
        Expr::binary(
            comparison.op.into(),
            Expr::from(&comparison.left),
            Expr::from(&comparison.right),
        )
    }
}

impl Query {
    /// The `where` clauses as a single expression: a balanced `AND` tree
    /// whose leaves are the comparisons in clause order. `None` when there
    /// are no clauses.
    ///
    /// Nesting grows with the logarithm of the clause count, so the result
    /// stays within the default depth limit for any realistic query.
    pub fn predicate(&self) -> Option<Expr> {
        let clauses: Vec<Expr> = self.where_clauses.iter().map(Expr::from).collect();
        let predicate = conjoin(clauses)?;
        trace!("Built predicate with {} nodes, depth {}", predicate.size(), predicate.depth());
        Some(predicate)
    }
}

fn conjoin(mut clauses: Vec<Expr>) -> Option<Expr> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        n => {
            let right = clauses.split_off(n / 2);
            Some(Expr::binary(BinaryOperator::And, conjoin(clauses)?, conjoin(right)?))
        }
    }
}

impl Node for Expr {
    fn node_type(&self) -> NodeType {
        match self {
            Expr::Literal(_) => NodeType::LiteralExpr,
            Expr::Column(_) => NodeType::ColumnExpr,
            Expr::Binary(_) => NodeType::BinaryExpr,
        }
    }
}

impl Node for LiteralExpr {
    fn node_type(&self) -> NodeType {
        NodeType::LiteralExpr
    }
}

impl Node for ColumnExpr {
    fn node_type(&self) -> NodeType {
        NodeType::ColumnExpr
    }
}

impl Node for BinaryExpr {
    fn node_type(&self) -> NodeType {
        NodeType::BinaryExpr
    }
}

impl_node_display!(Expr, LiteralExpr, ColumnExpr, BinaryExpr);
