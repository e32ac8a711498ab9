//! Nodes of a JSON SQL query document.
//!
//! A query selects columns out of the cross product of the tables listed in
//! `from`, keeping the rows for which every comparison in `where` holds:
//!
//! ```json
//! {
//!     "select": [{"column": {"name": "name", "table": "c"}, "as": "country"}],
//!     "from": [{"source": "countries", "as": "c"}],
//!     "where": [{"op": ">", "left": {"column": {"name": "population", "table": null}}, "right": {"literal": 1000000}}]
//! }
//! ```
//!
//! The documents are only read and re-encoded here, never evaluated.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::node::{Node, NodeType};
use crate::impl_node_display;

/// A complete query document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub select: Vec<Selector>,
    pub from: Vec<TableRef>,
    #[serde(rename = "where", default)]
    pub where_clauses: Vec<Comparison>,
}

impl Query {
    /// Parses a query document.
    pub fn from_json(text: &str) -> Result<Query, serde_json::Error> {
        let query: Query = serde_json::from_str(text)?;
        debug!(
            "Parsed query: {} selectors, {} tables, {} comparisons",
            query.select.len(),
            query.from.len(),
            query.where_clauses.len()
        );
        Ok(query)
    }

    /// Aliases of the tables in `from`, in order.
    pub fn table_aliases(&self) -> Vec<&str> {
        self.from.iter().map(|t| t.alias.as_str()).collect()
    }
}

/// One output column: a column reference and the name it is output under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub column: ColumnRef,
    #[serde(rename = "as")]
    pub alias: String,
}

/// A table in the `from` list: the table file name and the alias it is referenced by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub source: String,
    #[serde(rename = "as")]
    pub alias: String,
}

/// A column, optionally qualified with a table alias.
///
/// An unqualified column (`"table": null`) has to be resolved against all tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, table: Option<&str>) -> Self {
        ColumnRef {
            name: name.into(),
            table: table.map(str::to_string),
        }
    }

    /// `table.name`, or just `name` when unqualified.
    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.name),
            None => self.name.clone(),
        }
    }
}

/// A scalar value: integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Str(String),
}

impl Literal {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Literal::Int(_) => ColumnType::Int,
            Literal::Str(_) => ColumnType::Str,
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

/// Type of a table column, as named in table documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Str,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "int"),
            ColumnType::Str => write!(f, "str"),
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    Column(ColumnRef),
    Literal(Literal),
}

/// Comparison operators allowed in `where`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
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
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A `where` clause: `left op right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub op: CompareOp,
    pub left: Term,
    pub right: Term,
}

impl Node for Query {
    fn node_type(&self) -> NodeType {
        NodeType::Query
    }
}

impl Node for Selector {
    fn node_type(&self) -> NodeType {
        NodeType::Selector
    }
}

impl Node for TableRef {
    fn node_type(&self) -> NodeType {
        NodeType::TableRef
    }
}

impl Node for ColumnRef {
    fn node_type(&self) -> NodeType {
        NodeType::ColumnRef
    }
}

impl Node for Literal {
    fn node_type(&self) -> NodeType {
        NodeType::Literal
    }
}

impl Node for Term {
    fn node_type(&self) -> NodeType {
        NodeType::Term
    }
}

impl Node for Comparison {
    fn node_type(&self) -> NodeType {
        NodeType::Comparison
    }
}

impl_node_display!(Query, Selector, TableRef, ColumnRef, Literal, Term, Comparison);
