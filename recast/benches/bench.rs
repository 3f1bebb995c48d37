use criterion::{Criterion, black_box, criterion_group, criterion_main};
use recast::{CompiledPattern, Dialect, map_options, translate_template};

fn document() -> String {
    "Contact alice@example.com or bob@company.org before 2024-05-01. ".repeat(200)
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_case_insensitive", |b| {
        b.iter(|| CompiledPattern::new(black_box(r"(\w+)@(\w+)\.(\w+)"), map_options(false)))
    });
}

fn bench_test_scan(c: &mut Criterion) {
    let pattern = CompiledPattern::new(r"(\w+)@(\w+)\.(\w+)", map_options(true)).unwrap();
    let text = document();

    c.bench_function("test_with_context", |b| {
        b.iter(|| black_box(pattern.find_all(black_box(&text))))
    });
}

fn bench_translate(c: &mut Criterion) {
    c.bench_function("translate_template", |b| {
        b.iter(|| {
            translate_template(
                black_box("Found: $$1 = $1, whole=$&, name=${tag}"),
                Dialect::JavaScript,
            )
        })
    });
}

fn bench_substitute(c: &mut Criterion) {
    let pattern = CompiledPattern::new(r"(?<user>\w+)@(\w+)", map_options(true)).unwrap();
    let template = translate_template("${user} at $2", Dialect::JavaScript);
    let text = document();

    c.bench_function("substitute_named", |b| {
        b.iter(|| black_box(pattern.substitute(&template, black_box(&text))))
    });
}

criterion_group!(
    benches,
    bench_compile,
    bench_test_scan,
    bench_translate,
    bench_substitute,
);

criterion_main!(benches);
