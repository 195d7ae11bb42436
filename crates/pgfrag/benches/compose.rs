use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgfrag::{Fragment, IntoArg, builders, compose, escape_identifier};
use serde_json::json;

fn filter(i: i64) -> Fragment {
    compose(
        &["", " = ", ""],
        vec![builders::id(&format!("col_{i}")).into_arg(), format!("v{i}").into_arg()],
    )
    .unwrap_or_default()
}

fn bench_nested_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose/nested");

    for n in [4_i64, 32, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let where_clause = builders::and((0..n).map(filter));
                let q = compose(
                    &["SELECT * FROM ", " WHERE ", ""],
                    vec![builders::id("users").into_arg(), where_clause.into_arg()],
                );
                black_box(q)
            });
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose/render");

    for n in [4_i64, 32, 256] {
        let q = builders::and((0..n).map(filter));
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql()));
        });
    }

    group.finish();
}

fn bench_insert_values(c: &mut Criterion) {
    let rows: Vec<_> = (0..100)
        .map(|i| json!({"id": i, "name": format!("user {i}"), "active": i % 2 == 0}))
        .collect();

    c.bench_function("builders/insert_values_100", |b| {
        b.iter(|| black_box(builders::insert_values(&rows, None)))
    });
}

fn bench_escape_identifier(c: &mut Criterion) {
    c.bench_function("ident/plain", |b| {
        b.iter(|| black_box(escape_identifier(black_box("user_accounts"))))
    });
    c.bench_function("ident/unicode", |b| {
        b.iter(|| black_box(escape_identifier(black_box("café_😀"))))
    });
}

criterion_group!(
    benches,
    bench_nested_compose,
    bench_render,
    bench_insert_values,
    bench_escape_identifier
);
criterion_main!(benches);
