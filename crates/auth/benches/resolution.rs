use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use cerbero_auth::catalog;
use cerbero_auth::{has_all_permissions, has_permission};

/// Realistic held sets: a narrow operator, a wide manager, the full catalog.
fn held_sets() -> Vec<(&'static str, Vec<String>)> {
    let narrow = vec!["dashboard:acceder".to_string(), "leads:acceder".to_string()];
    let wide: Vec<String> = catalog::resources()
        .into_iter()
        .map(|r| format!("{r}:gestionar"))
        .collect();
    let full: Vec<String> = catalog::assignable()
        .into_iter()
        .map(|d| d.name.to_string())
        .collect();
    vec![("narrow", narrow), ("modular", wide), ("full_catalog", full)]
}

fn bench_has_permission(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_permission");
    for (label, held) in held_sets() {
        group.bench_with_input(BenchmarkId::new("granted_or_denied", label), &held, |b, held| {
            b.iter(|| {
                black_box(has_permission(black_box(held.as_slice()), black_box("vacantes:eliminar")));
            })
        });
    }
    group.finish();
}

fn bench_has_all(c: &mut Criterion) {
    let required = ["leads:crear", "leads:editar", "vacantes:acceder", "roles:editar"];
    let mut group = c.benchmark_group("has_all_permissions");
    for (label, held) in held_sets() {
        group.bench_with_input(BenchmarkId::new("four_requirements", label), &held, |b, held| {
            b.iter(|| black_box(has_all_permissions(black_box(held.as_slice()), &required[..])))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_has_permission, bench_has_all);
criterion_main!(benches);
