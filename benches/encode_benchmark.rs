//! Benchmarks for canonical text encoding
//!
//! Measures performance of:
//! - Query document encoding (compact and pretty)
//! - Deep expression trees under the traversal guard

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use sql_evaluator::ir::encoder::EncodeOptions;
use sql_evaluator::ir::expr::{BinaryOperator, Expr};
use sql_evaluator::ir::node::CanonicalText;
use sql_evaluator::ir::sql_node::{ColumnRef, CompareOp, Comparison, Literal, Query, Selector, TableRef, Term};

fn generate_query(clauses: usize) -> Query {
    Query {
        select: (0..8)
            .map(|i| Selector {
                column: ColumnRef::new(format!("col{}", i), Some("t")),
                alias: format!("out{}", i),
            })
            .collect(),
        from: vec![TableRef {
            source: "wide".to_string(),
            alias: "t".to_string(),
        }],
        where_clauses: (0..clauses)
            .map(|i| Comparison {
                op: CompareOp::Ge,
                left: Term::Column(ColumnRef::new(format!("col{}", i % 8), None)),
                right: Term::Literal(Literal::Int(i as i64)),
            })
            .collect(),
    }
}

fn generate_left_deep(depth: usize) -> Expr {
    (1..depth).fold(Expr::literal(0), |acc, i| {
        Expr::binary(BinaryOperator::Add, acc, Expr::literal(i as i64))
    })
}

// ============================================================================
// Benchmark: Query encoding
// ============================================================================

fn bench_query_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_encoding");
    let query = generate_query(32);

    group.bench_function("compact", |b| b.iter(|| black_box(query.to_text().unwrap())));

    let pretty = EncodeOptions::pretty(4);
    group.bench_function("pretty", |b| {
        b.iter(|| black_box(query.to_text_with(&pretty).unwrap()))
    });

    group.finish();
}

// ============================================================================
// Benchmark: Expression depth
// ============================================================================

fn bench_expression_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression_depth");

    for depth in [10, 50, 100].iter() {
        let expr = generate_left_deep(*depth);
        group.bench_with_input(BenchmarkId::new("left_deep", depth), &expr, |b, expr| {
            b.iter(|| black_box(expr.to_text().unwrap()))
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Predicate construction
// ============================================================================

fn bench_predicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate");
    let query = generate_query(64);

    group.bench_function("build_and_encode", |b| {
        b.iter(|| {
            let predicate = query.predicate().unwrap();
            black_box(predicate.to_text().unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_query_encoding, bench_expression_depth, bench_predicate);
criterion_main!(benches);
