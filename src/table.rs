//! Table documents.
//!
//! A table file holds one JSON array: a header of `[name, type]` pairs
//! followed by one array of cells per row.
//!
//! ```json
//! [
//!     [["name", "str"], ["population", "int"]],
//!     ["Chile", 19000000],
//!     ["Peru", 33000000]
//! ]
//! ```

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::impl_node_display;
use crate::ir::node::{Node, NodeType};
use crate::ir::sql_node::{ColumnType, Literal};

/// A header entry, written as `["name", "type"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, ColumnType)", into = "(String, ColumnType)")]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        ColumnDef { name: name.into(), ty }
    }
}

impl From<(String, ColumnType)> for ColumnDef {
    fn from((name, ty): (String, ColumnType)) -> Self {
        ColumnDef { name, ty }
    }
}

impl From<ColumnDef> for (String, ColumnType) {
    fn from(def: ColumnDef) -> Self {
        (def.name, def.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Literal>>,
}

impl Table {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Table { columns, rows: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.ty)
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&self.columns)?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(TableVisitor)
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = Table;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array holding a header of [name, type] pairs followed by rows")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Table, A::Error> {
        let columns: Vec<ColumnDef> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let mut rows = Vec::new();
        while let Some(row) = seq.next_element::<Vec<Literal>>()? {
            if row.len() != columns.len() {
                return Err(de::Error::custom(format!(
                    "row {} has {} cells but the header declares {} columns",
                    rows.len() + 1,
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row);
        }
        Ok(Table { columns, rows })
    }
}

impl Node for Table {
    fn node_type(&self) -> NodeType {
        NodeType::Table
    }
}

impl Node for ColumnDef {
    fn node_type(&self) -> NodeType {
        NodeType::Custom("ColumnDef")
    }
}

impl_node_display!(Table, ColumnDef);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::CanonicalText;

    const COUNTRIES: &str = r#"[
        [["name", "str"], ["population", "int"]],
        ["Chile", 19000000],
        ["Peru", 33000000]
    ]"#;

    #[test]
    fn test_parse_table() {
        let table: Table = serde_json::from_str(COUNTRIES).unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns[0], ColumnDef::new("name", ColumnType::Str));
        assert_eq!(table.column_index("population"), Some(1));
        assert_eq!(table.column_type("population"), Some(ColumnType::Int));
        assert_eq!(table.column_type("area"), None);
        assert_eq!(table.rows[1][0], Literal::from("Peru"));
    }

    #[test]
    fn test_table_text() {
        let table: Table = serde_json::from_str(COUNTRIES).unwrap();
        assert_eq!(
            table.to_text().unwrap(),
            r#"[[["name","str"],["population","int"]],["Chile",19000000],["Peru",33000000]]"#
        );
    }

    #[test]
    fn test_header_only_table() {
        let table: Table = serde_json::from_str(r#"[[["id", "int"]]]"#).unwrap();
        assert!(table.is_empty());
        assert_eq!(table, Table::new(vec![ColumnDef::new("id", ColumnType::Int)]));
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(serde_json::from_str::<Table>("[]").is_err());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = serde_json::from_str::<Table>(r#"[[["a", "int"], ["b", "int"]], [1]]"#).unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 cells"), "unexpected error: {err}");
    }

    #[test]
    fn test_unknown_column_type_rejected() {
        assert!(serde_json::from_str::<Table>(r#"[[["a", "float"]]]"#).is_err());
    }
}
