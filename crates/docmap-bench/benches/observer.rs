//! Observer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docmap_bench::fixtures::{generate_users, user_to_document, Schema};
use docmap_core::{Mapper, Observer};

fn bench_watch(c: &mut Criterion) {
    let mut group = c.benchmark_group("observer");
    let schema = Schema::new();
    let mapper = Mapper::new(&schema.registry);
    let mapping = schema.registry.get_mapping(schema.user).unwrap();
    let document = user_to_document(&generate_users(1)[0]);

    group.bench_function("watch", |b| {
        let value = mapper.read_document(mapping, &document).unwrap();
        b.iter(|| {
            let observer = Observer::new(schema.registry.clone(), || {});
            observer.watch(black_box(&value));
            black_box(observer);
        });
    });

    group.bench_function("watch_and_mutate", |b| {
        b.iter(|| {
            let value = mapper.read_document(mapping, &document).unwrap();
            let observer = Observer::new(schema.registry.clone(), || {});
            observer.watch(&value);
            if let Some(object) = value.as_object() {
                object.set("name", "Mallory");
            }
            black_box(observer.dispatch());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_watch);
criterion_main!(benches);
