use std::collections::BTreeSet;
use std::str::FromStr;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pep508_resolvo::{
    Factory, FactoryOptions, InMemoryRepository, InstallRequest, PackageMetadata, PackageName,
    Pep508RequestConstructor, Version, resolve,
};

/// A layered index: every project in layer `n` depends on two projects of
/// layer `n + 1`, each published in several versions.
fn layered_repo(layers: usize, width: usize, versions: usize) -> InMemoryRepository {
    let mut repo = InMemoryRepository::new();
    for layer in 0..layers {
        for i in 0..width {
            let name = PackageName::from_str(&format!("p{layer}-{i}")).unwrap();
            let deps: Vec<String> = if layer + 1 < layers {
                vec![
                    format!("p{}-{}>=1.1", layer + 1, i),
                    format!("p{}-{}", layer + 1, (i + 1) % width),
                ]
            } else {
                Vec::new()
            };
            for minor in 0..versions {
                let version = Version::from_str(&format!("1.{minor}")).unwrap();
                repo.add(PackageMetadata::new(name.clone(), version).with_requires_dist(deps.clone()));
            }
        }
    }
    repo
}

fn bench_found_candidates(c: &mut Criterion) {
    let repo = layered_repo(1, 50, 20);
    let requests: Vec<InstallRequest> = (0..50)
        .map(|i| InstallRequest::parse(&format!("p0-{i}>=1.5")).unwrap())
        .collect();

    c.bench_function("iter_found_candidates", |b| {
        b.iter(|| {
            let factory = Factory::new(
                &repo,
                &repo,
                &Pep508RequestConstructor,
                FactoryOptions::from_version_info(&[3, 11]),
            );
            for request in &requests {
                black_box(factory.iter_found_candidates(request, &BTreeSet::new()));
            }
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for (layers, width) in [(3, 4), (5, 8)] {
        let repo = layered_repo(layers, width, 5);
        let roots: Vec<InstallRequest> = (0..width)
            .map(|i| InstallRequest::parse(&format!("p0-{i}")).unwrap())
            .collect();

        group.bench_function(format!("{layers}x{width}"), |b| {
            b.iter(|| {
                let factory = Factory::new(
                    &repo,
                    &repo,
                    &Pep508RequestConstructor,
                    FactoryOptions::from_version_info(&[3, 11]),
                );
                black_box(resolve(&factory, &roots).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_found_candidates, bench_resolve);
criterion_main!(benches);
