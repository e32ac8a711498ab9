//! Module for generating random query and table documents for property-based testing.
//!
//! `QueryDoc` and `TableDoc` mirror the JSON document formats without
//! depending on the crate under test; `to_json` renders them as document text,
//! which the tests then parse with the real loader types.
//!
//! Names are drawn from small pools so that generated queries reuse
//! aliases and columns the way hand-written ones do.

use quickcheck::{Arbitrary, Gen};
use serde_json::{Value, json};

/// A scalar cell or literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    Str(String),
}

/// A possibly unqualified column reference.
#[derive(Clone, Debug)]
pub struct Column {
    pub name: String,
    pub table: Option<String>,
}

/// One side of a comparison.
#[derive(Clone, Debug)]
pub enum Operand {
    Column(Column),
    Literal(Scalar),
}

#[derive(Clone, Debug)]
pub struct Clause {
    pub op: &'static str,
    pub left: Operand,
    pub right: Operand,
}

/// A whole query document.
#[derive(Clone, Debug)]
pub struct QueryDoc {
    pub select: Vec<(Column, String)>,
    pub from: Vec<(String, String)>,
    pub clauses: Vec<Clause>,
}

/// A table document whose rows always match the header width.
#[derive(Clone, Debug)]
pub struct TableDoc {
    pub columns: Vec<(String, &'static str)>,
    pub rows: Vec<Vec<Scalar>>,
}

const OPERATORS: &[&str] = &["=", "!=", ">", ">=", "<", "<="];
const TABLES: &[&str] = &["countries", "cities", "people", "orders"];
const ALIASES: &[&str] = &["a", "b", "c", "t1", "t2"];
const COLUMNS: &[&str] = &["id", "name", "population", "country", "age", "total"];

/// Maximum number of entries in any generated list.
const MAX_LEN: u32 = 5;

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: u32, max: u32) -> u32 {
    min + (u32::arbitrary(g) % (max - min + 1))
}

fn pick(g: &mut Gen, pool: &[&'static str]) -> &'static str {
    *g.choose(pool).unwrap()
}

/// Generates string content including characters JSON must escape.
fn gen_string_content(g: &mut Gen) -> String {
    let len = gen_range(g, 0, 6);
    (0..len)
        .map(|_| char::arbitrary(g))
        .collect()
}

fn gen_scalar(g: &mut Gen) -> Scalar {
    if bool::arbitrary(g) {
        Scalar::Int(i64::arbitrary(g))
    } else {
        Scalar::Str(gen_string_content(g))
    }
}

fn gen_column(g: &mut Gen) -> Column {
    Column {
        name: pick(g, COLUMNS).to_string(),
        table: if bool::arbitrary(g) { Some(pick(g, ALIASES).to_string()) } else { None },
    }
}

fn gen_operand(g: &mut Gen) -> Operand {
    if gen_range(g, 0, 2) == 0 {
        Operand::Literal(gen_scalar(g))
    } else {
        Operand::Column(gen_column(g))
    }
}

impl Arbitrary for Scalar {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_scalar(g)
    }
}

impl Arbitrary for Clause {
    fn arbitrary(g: &mut Gen) -> Self {
        Clause {
            op: pick(g, OPERATORS),
            left: gen_operand(g),
            right: gen_operand(g),
        }
    }
}

impl Arbitrary for QueryDoc {
    fn arbitrary(g: &mut Gen) -> Self {
        QueryDoc {
            select: (0..gen_range(g, 1, MAX_LEN))
                .map(|_| (gen_column(g), pick(g, COLUMNS).to_string()))
                .collect(),
            from: (0..gen_range(g, 1, 3))
                .map(|_| (pick(g, TABLES).to_string(), pick(g, ALIASES).to_string()))
                .collect(),
            clauses: (0..gen_range(g, 0, MAX_LEN)).map(|_| Clause::arbitrary(g)).collect(),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let mut smaller = Vec::new();
        if !self.clauses.is_empty() {
            let mut q = self.clone();
            q.clauses.pop();
            smaller.push(q);
        }
        if self.select.len() > 1 {
            let mut q = self.clone();
            q.select.pop();
            smaller.push(q);
        }
        Box::new(smaller.into_iter())
    }
}

impl Arbitrary for TableDoc {
    fn arbitrary(g: &mut Gen) -> Self {
        let width = gen_range(g, 1, 4) as usize;
        let columns: Vec<(String, &'static str)> = (0..width)
            .map(|i| (format!("{}{}", pick(g, COLUMNS), i), *g.choose(&["int", "str"]).unwrap()))
            .collect();
        let rows = (0..gen_range(g, 0, MAX_LEN))
            .map(|_| {
                columns
                    .iter()
                    .map(|(_, ty)| match *ty {
                        "int" => Scalar::Int(i64::arbitrary(g)),
                        _ => Scalar::Str(gen_string_content(g)),
                    })
                    .collect()
            })
            .collect();
        TableDoc { columns, rows }
    }
}

impl Scalar {
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Int(i) => json!(i),
            Scalar::Str(s) => json!(s),
        }
    }
}

impl Column {
    pub fn to_value(&self) -> Value {
        json!({ "name": self.name, "table": self.table })
    }
}

impl Operand {
    pub fn to_value(&self) -> Value {
        match self {
            Operand::Column(c) => json!({ "column": c.to_value() }),
            Operand::Literal(s) => json!({ "literal": s.to_value() }),
        }
    }
}

impl QueryDoc {
    /// Renders the document as JSON text. Keys come out sorted, not in the
    /// order the canonical text uses.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    fn to_value(&self) -> Value {
        let select: Vec<Value> = self
            .select
            .iter()
            .map(|(column, alias)| json!({ "column": column.to_value(), "as": alias }))
            .collect();
        let from: Vec<Value> = self
            .from
            .iter()
            .map(|(source, alias)| json!({ "source": source, "as": alias }))
            .collect();
        let clauses: Vec<Value> = self
            .clauses
            .iter()
            .map(|c| json!({ "op": c.op, "left": c.left.to_value(), "right": c.right.to_value() }))
            .collect();
        json!({ "where": clauses, "from": from, "select": select })
    }

    /// The same document as [`QueryDoc::to_json`], with every object's keys
    /// in reverse order and extra whitespace between tokens.
    pub fn to_json_reordered(&self) -> String {
        let mut out = String::new();
        write_reordered(&self.to_value(), &mut out);
        out
    }
}

fn write_reordered(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push_str("{\n  ");
            for (i, (key, field)) in map.iter().rev().enumerate() {
                if i > 0 {
                    out.push_str(" ,\n  ");
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(" : ");
                write_reordered(field, out);
            }
            out.push_str("\n}");
        }
        Value::Array(items) => {
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_reordered(item, out);
            }
            out.push_str(" ]");
        }
        other => out.push_str(&other.to_string()),
    }
}

impl TableDoc {
    pub fn to_json(&self) -> String {
        let mut doc = vec![json!(self.columns.iter().map(|(n, t)| json!([n, t])).collect::<Vec<_>>())];
        doc.extend(self.rows.iter().map(|row| json!(row.iter().map(Scalar::to_value).collect::<Vec<_>>())));
        Value::Array(doc).to_string()
    }
}
