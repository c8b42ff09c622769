use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use subtheme::{ClusteringConfig, ResultClusterer};

fn bench_query_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_search_results");

    // Synthetic corpus
    let mut rng = StdRng::seed_from_u64(42);
    let n = 2000;
    let d = 256;

    let corpus: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..d).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect())
        .collect();

    let engine = ResultClusterer::new(ClusteringConfig::default().with_pca_components(64));
    engine.fit_global_pca(&corpus).unwrap();

    for m in [50, 200] {
        let candidates = &corpus[..m];
        group.bench_function(format!("m{m}_d{d}_k64"), |b| {
            b.iter(|| {
                engine
                    .cluster_search_results(black_box(&corpus[0]), black_box(candidates))
                    .unwrap();
            })
        });
    }

    group.finish();
}

fn bench_fit(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let corpus: Vec<Vec<f32>> = (0..1000)
        .map(|_| (0..128).map(|_| rng.random::<f32>()).collect())
        .collect();

    c.bench_function("fit_global_pca_n1000_d128_k32", |b| {
        b.iter(|| {
            let engine = ResultClusterer::new(ClusteringConfig::default().with_pca_components(32));
            engine.fit_global_pca(black_box(&corpus)).unwrap();
        })
    });
}

criterion_group!(benches, bench_query_path, bench_fit);
criterion_main!(benches);
