use std::collections::{BTreeMap, HashMap};

use indoc::indoc;
use serde::Serialize;

use sql_evaluator::error::EncodingError;
use sql_evaluator::ir::encoder::EncodeOptions;
use sql_evaluator::ir::expr::{BinaryOperator, Expr};
use sql_evaluator::ir::node::{CanonicalText, Node, NodeType};
use sql_evaluator::ir::sql_node::{ColumnRef, CompareOp, Comparison, Literal, Query, Selector, TableRef, Term};
use sql_evaluator::serde_helpers::ordered_map;

fn sample_query() -> Query {
    Query {
        select: vec![
            Selector {
                column: ColumnRef::new("name", Some("c")),
                alias: "country".to_string(),
            },
            Selector {
                column: ColumnRef::new("population", None),
                alias: "pop".to_string(),
            },
        ],
        from: vec![TableRef {
            source: "countries".to_string(),
            alias: "c".to_string(),
        }],
        where_clauses: vec![Comparison {
            op: CompareOp::Gt,
            left: Term::Column(ColumnRef::new("population", Some("c"))),
            right: Term::Literal(Literal::Int(1_000_000)),
        }],
    }
}

#[test]
fn test_literal_leaf_scenario() {
    let text = Expr::literal(42).to_text().unwrap();
    assert_eq!(text, r#"{"value":42}"#);
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, serde_json::json!({ "value": 42 }));
}

#[test]
fn test_binary_operator_scenario() {
    let expr = Expr::binary(BinaryOperator::Add, Expr::literal(1), Expr::literal(2));
    assert_eq!(
        expr.to_text().unwrap(),
        r#"{"op":"+","left":{"value":1},"right":{"value":2}}"#
    );
}

#[test]
fn test_leaf_has_no_child_objects() {
    let text = Expr::column(ColumnRef::new("age", None)).to_text().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let column = &value["column"];
    assert!(column.as_object().unwrap().values().all(|v| !v.is_object() && !v.is_array()));
    assert!(!text.contains("left") && !text.contains("right"));
}

#[test]
fn test_structurally_equal_trees_give_equal_text() {
    let a = sample_query();
    let b = sample_query();
    assert_eq!(a, b);
    assert_eq!(a.to_text().unwrap(), b.to_text().unwrap());

    let x = Expr::binary(BinaryOperator::Mul, Expr::literal("a"), Expr::column(ColumnRef::new("n", None)));
    let y = x.clone();
    assert_eq!(x.to_text().unwrap(), y.to_text().unwrap());
}

#[test]
fn test_text_follows_mutation() {
    let mut query = sample_query();
    let before = query.to_text().unwrap();
    assert_eq!(query.to_text().unwrap(), before);

    query.where_clauses[0].right = Term::Literal(Literal::Int(5));
    let after = query.to_text().unwrap();
    assert_ne!(after, before);
    assert!(after.contains(r#""right":{"literal":5}"#));

    query.where_clauses[0].right = Term::Literal(Literal::Int(1_000_000));
    assert_eq!(query.to_text().unwrap(), before);
}

#[test]
fn test_nested_child_mutation_changes_parent_text() {
    let mut expr = Expr::binary(BinaryOperator::Sub, Expr::literal(1), Expr::literal(2));
    let before = expr.to_text().unwrap();
    if let Expr::Binary(binary) = &mut expr {
        *binary.right = Expr::literal(3);
    }
    assert_ne!(expr.to_text().unwrap(), before);
}

#[test]
fn test_query_pretty_text() {
    let text = sample_query().to_text_with(&EncodeOptions::pretty(2)).unwrap();
    let expected = indoc! {r#"
        {
          "select": [
            {
              "column": {
                "name": "name",
                "table": "c"
              },
              "as": "country"
            },
            {
              "column": {
                "name": "population",
                "table": null
              },
              "as": "pop"
            }
          ],
          "from": [
            {
              "source": "countries",
              "as": "c"
            }
          ],
          "where": [
            {
              "op": ">",
              "left": {
                "column": {
                  "name": "population",
                  "table": "c"
                }
              },
              "right": {
                "literal": 1000000
              }
            }
          ]
        }"#};
    assert_eq!(text, expected);
}

#[test]
fn test_pretty_and_compact_carry_the_same_structure() {
    let query = sample_query();
    let compact: serde_json::Value = serde_json::from_str(&query.to_text().unwrap()).unwrap();
    let pretty: serde_json::Value =
        serde_json::from_str(&query.to_text_with(&EncodeOptions::pretty(4)).unwrap()).unwrap();
    assert_eq!(compact, pretty);
}

#[test]
fn test_display_is_canonical_text() {
    let query = sample_query();
    assert_eq!(format!("{}", query), query.to_text().unwrap());
    assert_eq!(Expr::literal("x").to_string(), r#"{"value":"x"}"#);
}

#[test]
fn test_key_order_and_whitespace_do_not_affect_text() {
    let canonical = sample_query().to_text().unwrap();
    let shuffled = indoc! {r#"
        {
            "where": [{"right": {"literal": 1000000}, "left": {"column": {"table": "c", "name": "population"}}, "op": ">"}],
            "from":   [ {"as": "c", "source": "countries"} ],
            "select": [
                {"as": "country", "column": {"table": "c", "name": "name"}},
                {"as": "pop", "column": {"table": null, "name": "population"}}
            ]
        }
    "#};
    let query = Query::from_json(shuffled).unwrap();
    assert_eq!(query, sample_query());
    assert_eq!(query.to_text().unwrap(), canonical);
}

#[test]
fn test_query_text_decodes_back() {
    let query = sample_query();
    let text = query.to_text().unwrap();
    let decoded = Query::from_json(&text).unwrap();
    assert_eq!(decoded, query);
    assert_eq!(decoded.to_text().unwrap(), text);
}

/// A variant defined outside the crate, with an unordered container.
#[derive(Debug, Serialize)]
struct Projection {
    name: String,
    #[serde(serialize_with = "ordered_map")]
    renames: HashMap<String, String>,
}

impl Node for Projection {
    fn node_type(&self) -> NodeType {
        NodeType::Custom("Projection")
    }
}

#[test]
fn test_custom_variant_mapping_is_sorted() {
    let mut renames = HashMap::new();
    for (from, to) in [("z", "last"), ("a", "first"), ("m", "middle")] {
        renames.insert(from.to_string(), to.to_string());
    }
    let node = Projection {
        name: "p".to_string(),
        renames,
    };
    assert_eq!(
        node.to_text().unwrap(),
        r#"{"name":"p","renames":{"a":"first","m":"middle","z":"last"}}"#
    );
}

#[derive(Debug, Serialize)]
struct Grid {
    cells: BTreeMap<(u8, u8), String>,
}

impl Node for Grid {
    fn node_type(&self) -> NodeType {
        NodeType::Custom("Grid")
    }
}

#[test]
fn test_unrepresentable_field_is_an_error() {
    let mut cells = BTreeMap::new();
    cells.insert((0, 0), "origin".to_string());
    let err = Grid { cells }.to_text().unwrap_err();
    assert!(matches!(err, EncodingError::Unsupported(_)), "unexpected error: {err}");
}
